// SPDX-License-Identifier: MPL-2.0

//! Packed decimal strings.
//!
//! A packed decimal string of `len` digits takes `len / 2 + 1` bytes. Digits are stored two per
//! byte, most significant first, and the low nibble of the last byte holds the sign: `0xb` and
//! `0xd` are negative, anything else positive.

use super::{Cpu, Width};
use crate::{exc::{self, Fault}, instr::Instr};

/// The longest string the decimal instructions accept.
const MAX_DIGITS: u32 = 31;

const POSITIVE: u8 = 0xc;
const NEGATIVE: u8 = 0xd;

const FILL: u8 = b' ';

/// Pattern operators of `editpc`.
mod pattern {
    pub const END: u8 = 0x00;
    pub const END_FLOAT: u8 = 0x01;
    /// Followed in the low nibble by a digit count.
    pub const MOVE: u8 = 0x90;
    /// Followed in the low nibble by a digit count.
    pub const FLOAT: u8 = 0xa0;
}

impl Cpu {
    fn write_mem_8(&mut self, addr: u32, value: u8) -> Result<(), Fault> {
        self.mem.write_8(addr, value).map_err(|e| self.mem_fault(e))
    }

    fn read_mem_8(&self, addr: u32) -> Result<u8, Fault> {
        self.mem.read_8(addr).map_err(|e| self.mem_fault(e))
    }

    /// `cvtlp src, dstlen, dstaddr`: converts a longword to a packed decimal string.
    pub(super) fn cvtlp(&mut self, instr: &Instr) -> Result<(), Fault> {
        let [src, len, dst] = self.locate_all::<3>(instr)?;
        let value = Width::Long.sign_extend(self.read(src, Width::Long)?);
        let len = self.read(len, Width::Word)? as u32;
        let addr = self.address(dst)?;
        if len > MAX_DIGITS {
            return Err(self.fault(exc::Kind::ReservedOperand { mnemonic: instr.desc.mnemonic }));
        }

        // The sign shares the last byte with the least significant digit.
        let mut pos = addr.wrapping_add(len / 2);
        let mut cur = addr;
        while cur != pos {
            self.write_mem_8(cur, 0)?;
            cur = cur.wrapping_add(1);
        }
        self.write_mem_8(pos, if value < 0 { NEGATIVE } else { POSITIVE })?;

        let mut rest = value.unsigned_abs();
        for idx in 0..len {
            if rest == 0 {
                break;
            }
            let digit = (rest % 10) as u8;
            if idx % 2 == 0 {
                let byte = self.read_mem_8(pos)?;
                self.write_mem_8(pos, byte | digit << 4)?;
            } else {
                pos = pos.wrapping_sub(1);
                self.write_mem_8(pos, digit)?;
            }
            rest /= 10;
        }

        for idx in 0..3 {
            self.reg.set(idx, 0);
        }
        self.reg.set(3, pos);
        self.reg.set_flags(value < 0, value == 0, rest > 0, false);

        Ok(())
    }

    /// `editpc srclen, srcaddr, pattern, dstaddr`: formats a packed decimal string as text under
    /// the control of a pattern.
    pub(super) fn editpc(&mut self, instr: &Instr) -> Result<(), Fault> {
        let [len, src, pattern, dst] = self.locate_all::<4>(instr)?;
        let len = self.read(len, Width::Word)? as u32;
        let src = self.address(src)?;
        let pattern = self.address(pattern)?;
        let dst = self.address(dst)?;
        if len > MAX_DIGITS {
            return Err(self.fault(exc::Kind::ReservedOperand { mnemonic: instr.desc.mnemonic }));
        }

        let sign = self.read_mem_8(src.wrapping_add(len / 2))? & 0xf;
        let negative = sign == 0xb || sign == NEGATIVE;
        let mut edit = Edit {
            remaining: len,
            src,
            pattern,
            dst,
            sign: if negative { b'-' } else { b' ' },
            zero: true,
            significance: None,
        };

        loop {
            let op = self.read_mem_8(edit.pattern)?;
            match op {
                pattern::END => break,
                pattern::END_FLOAT => {
                    if edit.significance.is_none() {
                        edit.significance = Some(edit.src);
                        let sign = edit.sign;
                        self.emit(&mut edit, sign)?;
                    }
                }
                _ if op & 0xf0 == pattern::MOVE || op & 0xf0 == pattern::FLOAT => {
                    let float = op & 0xf0 == pattern::FLOAT;
                    for _ in 0..(op & 0xf) {
                        let at = edit.src;
                        let digit = self.next_digit(&mut edit)?;
                        if digit != 0 {
                            edit.zero = false;
                            if edit.significance.is_none() {
                                edit.significance = Some(at);
                                if float {
                                    let sign = edit.sign;
                                    self.emit(&mut edit, sign)?;
                                }
                            }
                        }
                        let ch = if edit.significance.is_some() { b'0' + digit } else { FILL };
                        self.emit(&mut edit, ch)?;
                    }
                }
                _ => return Err(self.fault(exc::Kind::EditPattern { op })),
            }
            edit.pattern = edit.pattern.wrapping_add(1);
        }

        self.reg.set(0, len);
        self.reg.set(1, edit.significance.unwrap_or(0));
        self.reg.set(2, 0);
        self.reg.set(3, edit.pattern);
        self.reg.set(4, 0);
        self.reg.set(5, edit.dst);
        self.reg.set_flags(
            negative && !edit.zero,
            edit.zero,
            edit.remaining != 0,
            edit.significance.is_some(),
        );

        Ok(())
    }

    fn next_digit(&mut self, edit: &mut Edit) -> Result<u8, Fault> {
        if edit.remaining == 0 {
            return Err(self.fault(exc::Kind::DecimalSourceExhausted));
        }
        let byte = self.read_mem_8(edit.src)?;
        // With an odd count left, the next digit is the high nibble of the current byte.
        let digit = if edit.remaining % 2 == 1 {
            byte >> 4
        } else {
            edit.src = edit.src.wrapping_add(1);
            byte & 0xf
        };
        edit.remaining -= 1;

        Ok(digit)
    }

    fn emit(&mut self, edit: &mut Edit, ch: u8) -> Result<(), Fault> {
        self.write_mem_8(edit.dst, ch)?;
        edit.dst = edit.dst.wrapping_add(1);

        Ok(())
    }
}

/// The progress of an `editpc`.
struct Edit {
    /// Source digits not yet read.
    remaining: u32,
    /// The source byte holding the next digit.
    src: u32,
    pattern: u32,
    dst: u32,
    sign: u8,
    /// Whether or not every digit read so far was zero.
    zero: bool,
    /// The source byte at which significance began.
    significance: Option<u32>,
}

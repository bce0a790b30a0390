// SPDX-License-Identifier: MPL-2.0

//! Variable-length bit fields.
//!
//! A field is named by a base operand and a signed bit position. When the base is a register the
//! field lies in that register and the next; otherwise the base is a byte address and the position
//! may reach any bit of memory.

use super::{Cpu, Location, Width};
use crate::{exc::{self, Fault}, instr::{Instr, Op}};

impl Cpu {
    fn reserved_operand(&self, instr: &Instr) -> Fault {
        self.fault(exc::Kind::ReservedOperand { mnemonic: instr.desc.mnemonic })
    }

    /// The byte holding bit `pos` of the field at `base`, and the bit's index within it.
    fn bit_address(base: u32, pos: u32) -> (u32, u32) {
        let pos = pos as i32;

        (base.wrapping_add((pos >> 3) as u32), (pos & 7) as u32)
    }

    pub(super) fn read_bit(&self, base: Location, pos: u32, instr: &Instr) -> Result<bool, Fault> {
        match base {
            Location::Register(reg) => {
                if pos > 31 {
                    return Err(self.reserved_operand(instr));
                }

                Ok((self.reg.get(usize::from(reg)) >> pos) & 1 == 1)
            }
            _ => {
                let (addr, bit) = Self::bit_address(self.address(base)?, pos);
                let byte = self.mem.read_8(addr).map_err(|e| self.mem_fault(e))?;

                Ok((byte >> bit) & 1 == 1)
            }
        }
    }

    pub(super) fn write_bit(
        &mut self,
        base: Location,
        pos: u32,
        set: bool,
        instr: &Instr,
    ) -> Result<(), Fault> {
        match base {
            Location::Register(reg) => {
                if pos > 31 {
                    return Err(self.reserved_operand(instr));
                }
                let value = self.reg.get_mut(usize::from(reg));
                if set {
                    *value |= 1 << pos;
                } else {
                    *value &= !(1 << pos);
                }

                Ok(())
            }
            _ => {
                let (addr, bit) = Self::bit_address(self.address(base)?, pos);
                let byte = self.mem.read_8(addr).map_err(|e| self.mem_fault(e))?;
                let byte = if set { byte | 1 << bit } else { byte & !(1 << bit) };

                self.mem.write_8(addr, byte).map_err(|e| self.mem_fault(e))
            }
        }
    }

    /// Reads `size` bits starting at bit `pos` of `base`, zero-extended.
    fn read_field(&self, base: Location, pos: u32, size: u32, instr: &Instr) -> Result<u64, Fault> {
        if size == 0 {
            return Ok(0);
        }
        let mask = Width::Quad.mask() >> (64 - size);

        match base {
            Location::Register(reg) => {
                if pos > 31 {
                    return Err(self.reserved_operand(instr));
                }
                let idx = usize::from(reg);
                let pair = u64::from(self.reg.get(idx)) | u64::from(self.reg.get(idx + 1)) << 32;

                Ok((pair >> pos) & mask)
            }
            _ => {
                let (addr, bit) = Self::bit_address(self.address(base)?, pos);
                let len = (bit + size + 7) / 8;
                let bytes = self.mem.read_uint(addr, len).map_err(|e| self.mem_fault(e))?;

                Ok((bytes >> bit) & mask)
            }
        }
    }

    /// `extv pos, size, base, dst` and `extzv`, which sign- and zero-extend the field.
    pub(super) fn ext(&mut self, instr: &Instr) -> Result<(), Fault> {
        let [pos, size, base, dst] = self.locate_all::<4>(instr)?;
        let pos = self.read(pos, Width::Long)? as u32;
        let size = self.read(size, Width::Byte)? as u32;
        if size > 32 {
            return Err(self.reserved_operand(instr));
        }

        let field = self.read_field(base, pos, size, instr)?;
        let value = if instr.op() == Op::Extv && size > 0 {
            let shift = 64 - size;

            (((field << shift) as i64) >> shift) as u64
        } else {
            field
        };
        let value = Width::Long.truncate(value);
        self.write(dst, Width::Long, value)?;
        self.set_nz(Width::Long, value, false, Some(false));

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use crate::exc;

    fn exec(code: &[u8]) -> super::Cpu {
        let mut text = vec![0x00, 0x00];
        text.extend(code);
        text.push(0x04);
        let (cpu, result) = run(&text);
        assert!(result.is_ok(), "{:?}", result);

        cpu
    }

    #[test]
    fn extzv_reads_register_fields() {
        // movl $0xabcd,r1; extzv $4,$8,r1,r0
        let cpu = exec(&[0xd0, 0x8f, 0xcd, 0xab, 0x00, 0x00, 0x51, 0xef, 0x04, 0x08, 0x51, 0x50]);

        assert_eq!(cpu.reg().get(0), 0xbc);
        assert!(!cpu.reg().flags().n);
    }

    #[test]
    fn extv_sign_extends() {
        // movl $0xabcd,r1; extv $4,$8,r1,r0
        let cpu = exec(&[0xd0, 0x8f, 0xcd, 0xab, 0x00, 0x00, 0x51, 0xee, 0x04, 0x08, 0x51, 0x50]);

        assert_eq!(cpu.reg().get(0), 0xffff_ffbc);
        assert!(cpu.reg().flags().n);
    }

    #[test]
    fn fields_span_register_pairs() {
        // movl $0xf0000000,r1; movl $5,r2; extzv $28,$8,r1,r0
        let cpu = exec(&[
            0xd0, 0x8f, 0x00, 0x00, 0x00, 0xf0, 0x51, 0xd0, 0x05, 0x52, 0xef, 0x1c, 0x08, 0x51,
            0x50,
        ]);

        assert_eq!(cpu.reg().get(0), 0x5f);
    }

    #[test]
    fn fields_cross_memory_bytes() {
        // movw $0x0ff0,*0x100; extzv $4,$8,*0x100,r0
        let cpu = exec(&[
            0xb0, 0x8f, 0xf0, 0x0f, 0x9f, 0x00, 0x01, 0x00, 0x00, 0xef, 0x04, 0x08, 0x9f, 0x00,
            0x01, 0x00, 0x00, 0x50,
        ]);

        assert_eq!(cpu.reg().get(0), 0xff);
    }

    #[test]
    fn empty_fields_are_zero() {
        // movl $-1,r1; extv $0,$0,r1,r0
        let cpu = exec(&[0xd0, 0x8f, 0xff, 0xff, 0xff, 0xff, 0x51, 0xee, 0x00, 0x00, 0x51, 0x50]);

        assert_eq!(cpu.reg().get(0), 0);
        assert!(cpu.reg().flags().z);
    }

    #[test]
    fn oversized_fields_are_reserved() {
        // extzv $0,$33,r1,r0
        let (_, result) = run(&[0x00, 0x00, 0xef, 0x00, 0x21, 0x51, 0x50, 0x04]);

        assert_eq!(result.unwrap_err().kind, exc::Kind::ReservedOperand { mnemonic: "extzv" });
    }
}

// SPDX-License-Identifier: MPL-2.0

//! Character strings.

use super::{Cpu, Width};
use crate::{exc::Fault, instr::{Instr, Op}};

impl Cpu {
    /// `locc char, len, addr` finds the first byte equal to `char`; `skpc` finds the first that
    /// is not.
    ///
    /// `r0` is left holding the number of bytes remaining, counting the one found, and `r1` its
    /// address.
    pub(super) fn locc(&mut self, instr: &Instr) -> Result<(), Fault> {
        let [ch, len, addr] = self.locate_all::<3>(instr)?;
        let ch = self.read(ch, Width::Byte)? as u8;
        let mut remaining = self.read(len, Width::Word)? as u32;
        let mut addr = self.address(addr)?;

        let want_equal = instr.op() == Op::Locc;
        while remaining > 0 {
            let byte = self.mem.read_8(addr).map_err(|e| self.mem_fault(e))?;
            if (byte == ch) == want_equal {
                break;
            }
            addr = addr.wrapping_add(1);
            remaining -= 1;
        }

        self.reg.set(0, remaining);
        self.reg.set(1, addr);
        self.reg.set_flags(false, remaining == 0, false, false);

        Ok(())
    }

    /// `movc3 len, src, dst`, which copies correctly even when the strings overlap.
    pub(super) fn movc3(&mut self, instr: &Instr) -> Result<(), Fault> {
        let [len, src, dst] = self.locate_all::<3>(instr)?;
        let len = self.read(len, Width::Word)? as u32;
        let src = self.address(src)?;
        let dst = self.address(dst)?;

        let bytes = self.mem.slice(src, len).map_err(|e| self.mem_fault(e))?.to_vec();
        self.mem.load(dst, &bytes).map_err(|e| self.mem_fault(e))?;

        for idx in 0..6 {
            self.reg.set(idx, 0);
        }
        self.reg.set(1, src.wrapping_add(len));
        self.reg.set(3, dst.wrapping_add(len));
        self.reg.set_flags(false, true, false, false);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;

    /// Runs `code` with `data` placed at 0x100.
    fn exec(code: &[u8], data: &[u8]) -> super::Cpu {
        let mut text = vec![0x00, 0x00];
        text.extend(code);
        text.push(0x04);
        let (mut cpu, _) = cpu(&text);
        cpu.mem_mut().load(0x100, data).unwrap();
        let result = cpu.run();
        assert!(result.is_ok(), "{:?}", result);

        cpu
    }

    #[test]
    fn locc_finds_the_character() {
        // locc $0x2f,$8,*0x100
        let cpu = exec(&[0x3a, 0x2f, 0x08, 0x9f, 0x00, 0x01, 0x00, 0x00], b"usr/bin\0");

        assert_eq!((cpu.reg().get(0), cpu.reg().get(1)), (5, 0x103));
        assert!(!cpu.reg().flags().z);
    }

    #[test]
    fn locc_reports_a_miss() {
        // locc $0x3a,$8,*0x100
        let cpu = exec(&[0x3a, 0x3a, 0x08, 0x9f, 0x00, 0x01, 0x00, 0x00], b"usr/bin\0");

        assert_eq!((cpu.reg().get(0), cpu.reg().get(1)), (0, 0x108));
        assert!(cpu.reg().flags().z);
    }

    #[test]
    fn skpc_skips_the_character() {
        // skpc $0x20,$6,*0x100
        let cpu = exec(&[0x3b, 0x20, 0x06, 0x9f, 0x00, 0x01, 0x00, 0x00], b"   ab ");

        assert_eq!((cpu.reg().get(0), cpu.reg().get(1)), (3, 0x103));
    }

    #[test]
    fn movc3_copies_overlapping_strings() {
        // movc3 $4,*0x100,*0x102
        let cpu = exec(
            &[0x28, 0x04, 0x9f, 0x00, 0x01, 0x00, 0x00, 0x9f, 0x02, 0x01, 0x00, 0x00],
            b"abcd",
        );

        assert_eq!(cpu.mem().slice(0x100, 6).unwrap(), b"ababcd");
        assert_eq!(cpu.reg().get(1), 0x104);
        assert_eq!(cpu.reg().get(3), 0x106);
        assert!(cpu.reg().flags().z);
    }
}

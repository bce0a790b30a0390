// SPDX-License-Identifier: MPL-2.0

//! Procedure calls.
//!
//! `calls` builds this frame, from high addresses to low:
//!
//! ```text
//!         argument list          <- ap
//!         (0-3 alignment bytes)
//!         saved r11..r0, per mask
//!         saved pc
//!         saved fp
//!         saved ap
//!         status (mask, alignment, flags)
//! fp ->   condition handler (0)
//! ```

use super::{Cpu, Halt, Width};
use crate::{exc::Fault, instr::Instr, reg::{self, CallStatus}};

/// Registers a procedure's entry mask may save.
const SAVED_REGS: u16 = 0x0fff;

/// The frame pointer the entry procedure runs with; no `calls` frame lies below it.
const ENTRY_FP: u32 = 0;

impl Cpu {
    /// `calls numarg, dst`.
    pub(super) fn calls(&mut self, instr: &Instr) -> Result<(), Fault> {
        let [numarg, dst] = self.locate_all::<2>(instr)?;
        let numarg = self.read(numarg, Width::Long)? as u32;
        let proc = self.address(dst)?;
        let mask = self.mem.read_16(proc).map_err(|e| self.mem_fault(e))? & SAVED_REGS;

        self.push(numarg)?;
        let ap = self.reg.sp();
        *self.reg.sp_mut() = ap & !3;
        for idx in (0..12).rev() {
            if (mask >> idx) & 1 == 1 {
                self.push(self.reg.get(idx))?;
            }
        }
        self.push(self.reg.pc())?;
        self.push(self.reg.fp())?;
        self.push(self.reg.ap())?;

        let mut status = CallStatus(0);
        status.set_flags(self.reg.flags());
        status.set_mask(mask);
        status.set_calls(true);
        status.set_align((ap & 3) as u8);
        self.push(status.0)?;
        self.push(0)?;

        self.reg.set(reg::AP, ap);
        self.reg.set(reg::FP, self.reg.sp());
        *self.reg.pc_mut() = proc.wrapping_add(2);
        *self.reg.flags_mut() = Default::default();

        self.push_frame(proc);
        tracing::debug!("{}", self.call_chain(|it| it.name.clone()));

        Ok(())
    }

    /// Unwinds the frame `calls` built.
    ///
    /// Returning from the entry procedure, recognized by its frame pointer, halts the program
    /// instead.
    pub(super) fn ret(&mut self) -> Result<Option<Halt>, Fault> {
        if self.reg.fp() == ENTRY_FP {
            let r0 = self.reg.get(0);
            tracing::debug!("returned from entry with r0 = {:#x}", r0);

            return Ok(Some(Halt::Return(r0)));
        }

        *self.reg.sp_mut() = self.reg.fp().wrapping_add(4);
        let status = CallStatus(self.pop()?);
        *self.reg.flags_mut() = status.flags();
        let ap = self.pop()?;
        self.reg.set(reg::AP, ap);
        let fp = self.pop()?;
        self.reg.set(reg::FP, fp);
        *self.reg.pc_mut() = self.pop()?;

        let mask = status.mask();
        for idx in 0..12 {
            if (mask >> idx) & 1 == 1 {
                let value = self.pop()?;
                self.reg.set(idx, value);
            }
        }
        *self.reg.sp_mut() = self.reg.sp().wrapping_add(u32::from(status.align()));
        if status.calls() {
            let argc = self.pop()? & 0xff;
            *self.reg.sp_mut() = self.reg.sp().wrapping_add(argc * 4);
        }

        // The entry frame stays for diagnostics even if a frame was unwound by hand.
        if self.frames.len() > 1 {
            self.frames.pop();
        }
        tracing::debug!("{}", self.call_chain(|it| it.name.clone()));

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use crate::reg::{Flags, AP, FP};

    #[test]
    fn calls_and_ret_balance() {
        let mut code = vec![0x00, 0x00];
        calls(&mut code, 0, 0x10);
        code.push(0x04);
        code.resize(0x10, 0x01);
        // .word 0; ret
        code.extend([0x00, 0x00, 0x04]);
        let (mut cpu, _) = cpu(&code);
        let sp = cpu.reg().sp();

        assert_eq!(cpu.step(), Ok(None));
        assert_eq!(cpu.frames().len(), 2);
        assert_eq!(cpu.reg().pc(), 0x12);
        assert_eq!(cpu.reg().fp(), cpu.reg().sp());
        assert_eq!(cpu.reg().get(AP), sp - 4);

        assert_eq!(cpu.step(), Ok(None));
        assert_eq!(cpu.frames().len(), 1);
        assert_eq!(cpu.reg().sp(), sp);
        assert_eq!(cpu.reg().pc(), 9);
    }

    #[test]
    fn saved_registers_survive_calls() {
        for _ in 0..50 {
            let mask = rand::random::<u16>() & 0x0fff;
            let argc = rand::random::<u8>() % 4;
            let skew = rand::random::<u8>() % 4;

            let mut code = vec![0x00, 0x00];
            // subl2 $skew,sp
            code.extend([0xc2, skew, 0x5e]);
            for reg in 0..12 {
                movl_imm(&mut code, 0x100 + u32::from(reg), reg);
            }
            for arg in 0..argc {
                // pushl $arg
                code.extend([0xdd, arg]);
            }
            calls(&mut code, argc, 0x100);
            code.push(0x04);
            code.resize(0x100, 0x01);

            code.extend(mask.to_le_bytes());
            for reg in 0..12 {
                if (mask >> reg) & 1 == 1 {
                    // clrl rN
                    code.extend([0xd4, 0x50 | reg as u8]);
                }
            }
            code.push(0x04);

            let (mut cpu, _) = cpu(&code);
            let sp = cpu.reg().sp();

            assert_eq!(cpu.run(), Ok(super::Halt::Return(0x100)));
            assert_eq!(cpu.reg().sp(), sp - u32::from(skew), "mask = {:#x}", mask);
            for reg in 0..12 {
                assert_eq!(cpu.reg().get(reg), 0x100 + reg as u32, "mask = {:#x}", mask);
            }
            assert_eq!((cpu.reg().get(AP), cpu.reg().get(FP)), (0, 0));
        }
    }

    #[test]
    fn arguments_are_found_through_ap() {
        let mut code = vec![0x00, 0x00];
        // pushl $7
        code.extend([0xdd, 0x07]);
        calls(&mut code, 1, 0x10);
        code.push(0x04);
        code.resize(0x10, 0x01);
        // .word 0; movl 4(ap),r0; ret
        code.extend([0x00, 0x00, 0xd0, 0xac, 0x04, 0x50, 0x04]);

        let (_, result) = run(&code);

        assert_eq!(result, Ok(super::Halt::Return(7)));
    }

    #[test]
    fn ret_halts_once_fp_reaches_the_entry_frame() {
        let mut code = vec![0x00, 0x00];
        calls(&mut code, 0, 0x10);
        // movl $1,r0; ret
        code.extend([0xd0, 0x01, 0x50, 0x04]);
        code.resize(0x10, 0x01);
        // .word 0; movl 12(fp),fp; movl $7,r0; ret
        code.extend([0x00, 0x00, 0xd0, 0xad, 0x0c, 0x5d, 0xd0, 0x07, 0x50, 0x04]);

        let (cpu, result) = run(&code);

        assert_eq!(result, Ok(super::Halt::Return(7)));
        assert_eq!(cpu.frames().len(), 2);
    }

    #[test]
    fn ret_restores_flags() {
        let mut code = vec![0x00, 0x00];
        // cmpl $1,$2
        code.extend([0xd1, 0x01, 0x02]);
        calls(&mut code, 0, 0x10);
        code.push(0x04);
        code.resize(0x10, 0x01);
        // .word 0; clrl r1; ret
        code.extend([0x00, 0x00, 0xd4, 0x51, 0x04]);

        let (cpu, _) = run(&code);

        assert_eq!(cpu.reg().flags(), Flags { n: true, z: false, v: false, c: true });
    }
}

// SPDX-License-Identifier: MPL-2.0

//! Branches, jumps, subroutines, and loops.

use super::{alu::Arith, Cpu, Location, Width};
use crate::{exc::Fault, instr::{Instr, Op}, reg::Flags};

impl Cpu {
    fn jump_to(&mut self, target: Location) {
        if let Location::Value(addr) = target {
            *self.reg.pc_mut() = addr as u32;
        }
    }

    fn condition(&self, op: Op) -> bool {
        let Flags { n, z, v, c } = self.reg.flags();
        match op {
            Op::Bneq => !z,
            Op::Beql => z,
            Op::Bgtr => !(n || z),
            Op::Bleq => n || z,
            Op::Bgeq => !n,
            Op::Blss => n,
            Op::Bgtru => !(c || z),
            Op::Blequ => c || z,
            Op::Bvc => !v,
            Op::Bvs => v,
            Op::Bcc => !c,
            Op::Blssu => c,
            // `brb` and `brw`.
            _ => true,
        }
    }

    pub(super) fn branch(&mut self, instr: &Instr) -> Result<(), Fault> {
        let [target] = self.locate_all::<1>(instr)?;
        if self.condition(instr.op()) {
            self.jump_to(target);
        }

        Ok(())
    }

    pub(super) fn jmp(&mut self, instr: &Instr) -> Result<(), Fault> {
        let [dst] = self.locate_all::<1>(instr)?;
        *self.reg.pc_mut() = self.address(dst)?;

        Ok(())
    }

    pub(super) fn bsb(&mut self, instr: &Instr) -> Result<(), Fault> {
        let [target] = self.locate_all::<1>(instr)?;
        self.push(self.reg.pc())?;
        self.jump_to(target);

        Ok(())
    }

    pub(super) fn jsb(&mut self, instr: &Instr) -> Result<(), Fault> {
        let [dst] = self.locate_all::<1>(instr)?;
        let addr = self.address(dst)?;
        self.push(self.reg.pc())?;
        *self.reg.pc_mut() = addr;

        Ok(())
    }

    pub(super) fn rsb(&mut self) -> Result<(), Fault> {
        *self.reg.pc_mut() = self.pop()?;

        Ok(())
    }

    /// `bbs`, `bbc`, and their variants that set or clear the bit after testing it.
    pub(super) fn bit_branch(&mut self, instr: &Instr) -> Result<(), Fault> {
        let [pos, base, target] = self.locate_all::<3>(instr)?;
        let pos = self.read(pos, Width::Long)? as u32;
        let was_set = self.read_bit(base, pos, instr)?;

        match instr.op() {
            Op::Bbss | Op::Bbcs | Op::Bbssi => self.write_bit(base, pos, true, instr)?,
            Op::Bbsc | Op::Bbcc | Op::Bbcci => self.write_bit(base, pos, false, instr)?,
            _ => {}
        }
        // Even opcodes branch on a set bit.
        if was_set == (instr.desc.code & 1 == 0) {
            self.jump_to(target);
        }

        Ok(())
    }

    pub(super) fn blb(&mut self, instr: &Instr) -> Result<(), Fault> {
        let [src, target] = self.locate_all::<2>(instr)?;
        let low_bit = self.read(src, Width::Long)? & 1 == 1;
        if low_bit == (instr.op() == Op::Blbs) {
            self.jump_to(target);
        }

        Ok(())
    }

    /// `acb limit, add, index, dst`: adds and branches while the index has not passed the limit.
    pub(super) fn acb(&mut self, instr: &Instr) -> Result<(), Fault> {
        let width = self.operand_width(instr, 0)?;
        let [limit, add, index, target] = self.locate_all::<4>(instr)?;
        let limit = self.read(limit, width)?;
        let add = self.read(add, width)?;

        let (result, v, _) = Arith::Add.apply(width, add, self.read(index, width)?);
        self.write(index, width, result)?;
        self.set_nz(width, result, v, None);

        let (result, limit) = (width.sign_extend(result), width.sign_extend(limit));
        let more = if width.is_negative(add) { result >= limit } else { result <= limit };
        if more {
            self.jump_to(target);
        }

        Ok(())
    }

    /// `aoblss` and `aobleq`.
    pub(super) fn aob(&mut self, instr: &Instr) -> Result<(), Fault> {
        let width = Width::Long;
        let [limit, index, target] = self.locate_all::<3>(instr)?;
        let limit = width.sign_extend(self.read(limit, width)?);

        let (result, v, _) = Arith::Add.apply(width, 1, self.read(index, width)?);
        self.write(index, width, result)?;
        self.set_nz(width, result, v, None);

        let result = width.sign_extend(result);
        let more = match instr.op() {
            Op::Aoblss => result < limit,
            _ => result <= limit,
        };
        if more {
            self.jump_to(target);
        }

        Ok(())
    }

    /// `sobgeq` and `sobgtr`.
    pub(super) fn sob(&mut self, instr: &Instr) -> Result<(), Fault> {
        let width = Width::Long;
        let [index, target] = self.locate_all::<2>(instr)?;

        let (result, v, _) = Arith::Sub.apply(width, 1, self.read(index, width)?);
        self.write(index, width, result)?;
        self.set_nz(width, result, v, None);

        let result = width.sign_extend(result);
        let more = match instr.op() {
            Op::Sobgeq => result >= 0,
            _ => result > 0,
        };
        if more {
            self.jump_to(target);
        }

        Ok(())
    }

    /// `case sel, base, limit`, followed in the instruction stream by a table of `limit + 1` word
    /// displacements from the start of the table.
    pub(super) fn case(&mut self, instr: &Instr) -> Result<(), Fault> {
        let width = Width::from_band(instr.desc.code);
        let [sel, base, limit] = self.locate_all::<3>(instr)?;
        let sel = self.read(sel, width)?;
        let base = self.read(base, width)?;
        let limit = self.read(limit, width)?;

        let offset = width.truncate(sel.wrapping_sub(base));
        self.compare(width, offset, limit);

        let table = self.reg.pc();
        let target = if offset <= limit {
            let entry = table.wrapping_add(offset as u32 * 2);
            let disp = self.mem.read_16(entry).map_err(|e| self.mem_fault(e))? as i16;

            table.wrapping_add(i32::from(disp) as u32)
        } else {
            table.wrapping_add((limit as u32).wrapping_add(1).wrapping_mul(2))
        };
        *self.reg.pc_mut() = target;

        Ok(())
    }
}

// SPDX-License-Identifier: MPL-2.0

//! Integer arithmetic and logic.

use super::Cpu;
use crate::{exc::Fault, instr::Instr};

/// The size of an integer operand.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Width {
    Byte,
    Word,
    Long,
    Quad,
}

impl Width {
    /// The width of the integer families, which the opcode encodes in bits 5 and 6.
    pub fn from_band(code: u16) -> Self {
        match (code & 0x7f) >> 5 {
            0 => Self::Byte,
            1 => Self::Word,
            2 => Self::Long,
            _ => Self::Quad,
        }
    }

    pub fn from_size(size: u32) -> Option<Self> {
        match size {
            1 => Some(Self::Byte),
            2 => Some(Self::Word),
            4 => Some(Self::Long),
            8 => Some(Self::Quad),
            _ => None,
        }
    }

    pub fn size(self) -> u32 {
        match self {
            Self::Byte => 1,
            Self::Word => 2,
            Self::Long => 4,
            Self::Quad => 8,
        }
    }

    pub fn bits(self) -> u32 {
        self.size() * 8
    }

    pub fn mask(self) -> u64 {
        u64::MAX >> (64 - self.bits())
    }

    pub fn truncate(self, value: u64) -> u64 {
        value & self.mask()
    }

    pub fn sign_extend(self, value: u64) -> i64 {
        let shift = 64 - self.bits();

        ((value << shift) as i64) >> shift
    }

    pub fn is_negative(self, value: u64) -> bool {
        (value >> (self.bits() - 1)) & 1 == 1
    }
}

/// A two- or three-operand instruction family.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Arith {
    Add,
    Sub,
    Mul,
    Div,
    Bis,
    Bic,
    Xor,
}

impl Arith {
    /// Combines `src` into `dst`, returning the result with its overflow and carry.
    ///
    /// A carry of `None` leaves the C flag as it was.
    pub(super) fn apply(self, width: Width, src: u64, dst: u64) -> (u64, bool, Option<bool>) {
        let neg = |value| width.is_negative(value);
        match self {
            Self::Add => {
                let result = width.truncate(dst.wrapping_add(src));
                let v = neg(src) == neg(dst) && neg(result) != neg(dst);

                (result, v, Some(result < dst))
            }
            Self::Sub => {
                let result = width.truncate(dst.wrapping_sub(src));
                let v = neg(src) != neg(dst) && neg(result) != neg(dst);

                (result, v, Some(dst < src))
            }
            Self::Mul => {
                let product = i128::from(width.sign_extend(dst)) * i128::from(width.sign_extend(src));
                let result = width.truncate(product as u64);

                (result, i128::from(width.sign_extend(result)) != product, Some(false))
            }
            Self::Div => {
                // Division by zero leaves the dividend in place.
                if src == 0 {
                    return (dst, true, Some(false));
                }
                let quotient =
                    i128::from(width.sign_extend(dst)) / i128::from(width.sign_extend(src));
                let result = width.truncate(quotient as u64);

                (result, i128::from(width.sign_extend(result)) != quotient, Some(false))
            }
            Self::Bis => (dst | src, false, None),
            Self::Bic => (dst & !src, false, None),
            Self::Xor => (dst ^ src, false, None),
        }
    }
}

impl Cpu {
    pub(super) fn arith(&mut self, instr: &Instr, arith: Arith) -> Result<(), Fault> {
        let width = Width::from_band(instr.desc.code);
        let (src, dst, out) = if instr.operands.len() == 2 {
            let [src, dst] = self.locate_all::<2>(instr)?;

            (src, dst, dst)
        } else {
            let [src, dst, out] = self.locate_all::<3>(instr)?;

            (src, dst, out)
        };
        let src = self.read(src, width)?;
        let dst = self.read(dst, width)?;

        let (result, v, c) = arith.apply(width, src, dst);
        self.write(out, width, result)?;
        self.set_nz(width, result, v, c);

        Ok(())
    }

    pub(super) fn mov(&mut self, instr: &Instr) -> Result<(), Fault> {
        let width = Width::from_band(instr.desc.code);
        let [src, dst] = self.locate_all::<2>(instr)?;
        let value = self.read(src, width)?;
        self.write(dst, width, value)?;
        self.set_nz(width, value, false, None);

        Ok(())
    }

    pub(super) fn cmp(&mut self, instr: &Instr) -> Result<(), Fault> {
        let width = Width::from_band(instr.desc.code);
        let [lhs, rhs] = self.locate_all::<2>(instr)?;
        let lhs = self.read(lhs, width)?;
        let rhs = self.read(rhs, width)?;
        self.compare(width, lhs, rhs);

        Ok(())
    }

    /// Sets the condition codes as `cmp` does.
    pub(super) fn compare(&mut self, width: Width, lhs: u64, rhs: u64) {
        self.reg.set_flags(
            width.sign_extend(lhs) < width.sign_extend(rhs),
            lhs == rhs,
            false,
            lhs < rhs,
        );
    }

    pub(super) fn tst(&mut self, instr: &Instr) -> Result<(), Fault> {
        let width = Width::from_band(instr.desc.code);
        let [src] = self.locate_all::<1>(instr)?;
        let value = self.read(src, width)?;
        self.set_nz(width, value, false, Some(false));

        Ok(())
    }

    pub(super) fn clr(&mut self, instr: &Instr) -> Result<(), Fault> {
        let width = Width::from_band(instr.desc.code);
        let [dst] = self.locate_all::<1>(instr)?;
        self.write(dst, width, 0)?;
        self.set_nz(width, 0, false, None);

        Ok(())
    }

    pub(super) fn inc(&mut self, instr: &Instr) -> Result<(), Fault> {
        let width = Width::from_band(instr.desc.code);
        let [dst] = self.locate_all::<1>(instr)?;
        let value = self.read(dst, width)?;
        let result = width.truncate(value.wrapping_add(1));
        self.write(dst, width, result)?;
        let v = !width.is_negative(value) && width.is_negative(result);
        self.set_nz(width, result, v, Some(result == 0));

        Ok(())
    }

    pub(super) fn dec(&mut self, instr: &Instr) -> Result<(), Fault> {
        let width = Width::from_band(instr.desc.code);
        let [dst] = self.locate_all::<1>(instr)?;
        let value = self.read(dst, width)?;
        let result = width.truncate(value.wrapping_sub(1));
        self.write(dst, width, result)?;
        let v = width.is_negative(value) && !width.is_negative(result);
        self.set_nz(width, result, v, Some(value == 0));

        Ok(())
    }

    pub(super) fn mneg(&mut self, instr: &Instr) -> Result<(), Fault> {
        let width = Width::from_band(instr.desc.code);
        let [src, dst] = self.locate_all::<2>(instr)?;
        let value = self.read(src, width)?;
        let result = width.truncate(value.wrapping_neg());
        self.write(dst, width, result)?;
        // Only the most negative value is its own negation.
        let v = value != 0 && value == result;
        self.set_nz(width, result, v, Some(result != 0));

        Ok(())
    }

    pub(super) fn mcom(&mut self, instr: &Instr) -> Result<(), Fault> {
        let width = Width::from_band(instr.desc.code);
        let [src, dst] = self.locate_all::<2>(instr)?;
        let result = width.truncate(!self.read(src, width)?);
        self.write(dst, width, result)?;
        self.set_nz(width, result, false, None);

        Ok(())
    }

    pub(super) fn bit(&mut self, instr: &Instr) -> Result<(), Fault> {
        let width = Width::from_band(instr.desc.code);
        let [mask, src] = self.locate_all::<2>(instr)?;
        let result = self.read(mask, width)? & self.read(src, width)?;
        self.set_nz(width, result, false, None);

        Ok(())
    }

    /// The width of the operand at `idx`, for instructions whose opcode does not encode it.
    pub(super) fn operand_width(&self, instr: &Instr, idx: usize) -> Result<Width, Fault> {
        instr
            .operands
            .get(idx)
            .and_then(|it| Width::from_size(it.kind.size()))
            .ok_or_else(|| {
                self.fault(crate::exc::Kind::ReservedOperand { mnemonic: instr.desc.mnemonic })
            })
    }

    pub(super) fn movz(&mut self, instr: &Instr) -> Result<(), Fault> {
        let (src_width, dst_width) = (self.operand_width(instr, 0)?, self.operand_width(instr, 1)?);
        let [src, dst] = self.locate_all::<2>(instr)?;
        let value = self.read(src, src_width)?;
        self.write(dst, dst_width, value)?;
        self.reg.set_flags(false, value == 0, false, self.reg.flags().c);

        Ok(())
    }

    pub(super) fn cvt(&mut self, instr: &Instr) -> Result<(), Fault> {
        let (src_width, dst_width) = (self.operand_width(instr, 0)?, self.operand_width(instr, 1)?);
        let [src, dst] = self.locate_all::<2>(instr)?;
        let value = src_width.sign_extend(self.read(src, src_width)?);
        let result = dst_width.truncate(value as u64);
        self.write(dst, dst_width, result)?;
        let v = dst_width.sign_extend(result) != value;
        self.set_nz(dst_width, result, v, Some(false));

        Ok(())
    }

    pub(super) fn mova(&mut self, instr: &Instr) -> Result<(), Fault> {
        let [src, dst] = self.locate_all::<2>(instr)?;
        let addr = self.address(src)?;
        self.write(dst, Width::Long, u64::from(addr))?;
        self.set_nz(Width::Long, u64::from(addr), false, None);

        Ok(())
    }

    pub(super) fn pusha(&mut self, instr: &Instr) -> Result<(), Fault> {
        let [src] = self.locate_all::<1>(instr)?;
        let addr = self.address(src)?;
        self.push(addr)?;
        self.set_nz(Width::Long, u64::from(addr), false, None);

        Ok(())
    }

    pub(super) fn pushl(&mut self, instr: &Instr) -> Result<(), Fault> {
        let [src] = self.locate_all::<1>(instr)?;
        let value = self.read(src, Width::Long)?;
        self.push(value as u32)?;
        self.set_nz(Width::Long, value, false, None);

        Ok(())
    }

    /// `ashl cnt, src, dst`: shifts left for positive counts and arithmetically right otherwise.
    pub(super) fn ashl(&mut self, instr: &Instr) -> Result<(), Fault> {
        let [count, src, dst] = self.locate_all::<3>(instr)?;
        let count = Width::Byte.sign_extend(self.read(count, Width::Byte)?);
        let value = Width::Long.sign_extend(self.read(src, Width::Long)?);

        let (result, v) = if count >= 0 {
            let shifted = i128::from(value) << count.min(64);
            let result = Width::Long.truncate(shifted as u64);

            (result, i128::from(Width::Long.sign_extend(result)) != shifted)
        } else {
            (Width::Long.truncate((value >> (-count).min(63)) as u64), false)
        };
        self.write(dst, Width::Long, result)?;
        self.set_nz(Width::Long, result, v, Some(false));

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{super::testing::*, *};
    use crate::reg::Flags;

    /// Runs `code` from the entry point, then returns the CPU.
    fn exec(code: &[u8]) -> Cpu {
        let mut text = vec![0x00, 0x00];
        text.extend(code);
        text.push(0x04);
        let (cpu, result) = run(&text);
        assert!(result.is_ok(), "{:?}", result);

        cpu
    }

    fn flags(n: bool, z: bool, v: bool, c: bool) -> Flags {
        Flags { n, z, v, c }
    }

    macro_rules! def_alu_test {
        ($fn_name:ident, [$($byte:expr),* $(,)?], r0 = $r0:expr, $flags:expr $(,)?) => {
            #[test]
            fn $fn_name() {
                let cpu = exec(&[$($byte),*]);

                assert_eq!(cpu.reg().get(0), $r0, "r0 = {:#x}", cpu.reg().get(0));
                assert_eq!(cpu.reg().flags(), $flags);
            }
        };
    }

    // movl $0x7fffffff,r0; incl r0
    def_alu_test!(
        incl_overflows,
        [0xd0, 0x8f, 0xff, 0xff, 0xff, 0x7f, 0x50, 0xd6, 0x50],
        r0 = 0x8000_0000,
        flags(true, false, true, false),
    );
    // clrl r0; decl r0
    def_alu_test!(
        decl_borrows,
        [0xd4, 0x50, 0xd7, 0x50],
        r0 = 0xffff_ffff,
        flags(true, false, false, true),
    );
    // mnegl $5,r0
    def_alu_test!(mnegl, [0xce, 0x05, 0x50], r0 = 0xffff_fffb, flags(true, false, false, true));
    // movl $0xffffffff,r0; addl2 $1,r0
    def_alu_test!(
        addl_carries,
        [0xd0, 0x8f, 0xff, 0xff, 0xff, 0xff, 0x50, 0xc0, 0x01, 0x50],
        r0 = 0,
        flags(false, true, false, true),
    );
    // movl $3,r1; subl3 $5,r1,r0
    def_alu_test!(
        subl3_borrows,
        [0xd0, 0x03, 0x51, 0xc3, 0x05, 0x51, 0x50],
        r0 = 0xffff_fffe,
        flags(true, false, false, true),
    );
    // movl $6,r0; mull2 $7,r0
    def_alu_test!(mull, [0xd0, 0x06, 0x50, 0xc4, 0x07, 0x50], r0 = 42, flags(false, false, false, false));
    // movl $0x2b,r0; divl2 $5,r0
    def_alu_test!(divl, [0xd0, 0x2b, 0x50, 0xc6, 0x05, 0x50], r0 = 8, flags(false, false, false, false));
    // movl $7,r0; divl2 $0,r0
    def_alu_test!(
        divl_by_zero_keeps_dividend,
        [0xd0, 0x07, 0x50, 0xc6, 0x00, 0x50],
        r0 = 7,
        flags(false, false, true, false),
    );
    // movl $0x12345678,r0; movb $0xff,r0
    def_alu_test!(
        byte_writes_keep_upper_bits,
        [0xd0, 0x8f, 0x78, 0x56, 0x34, 0x12, 0x50, 0x90, 0x8f, 0xff, 0x50],
        r0 = 0x1234_56ff,
        flags(true, false, false, false),
    );
    // movl $0xf0,r0; bicl2 $0x30,r0; bisl2 $1,r0; xorl2 $0xff,r0
    def_alu_test!(
        logic,
        [
            0xd0, 0x8f, 0xf0, 0x00, 0x00, 0x00, 0x50, 0xca, 0x8f, 0x30, 0x00, 0x00, 0x00, 0x50,
            0xc8, 0x01, 0x50, 0xcc, 0x8f, 0xff, 0x00, 0x00, 0x00, 0x50,
        ],
        r0 = 0x3e,
        flags(false, false, false, false),
    );
    // movl $0x80,r0; cvtbl r0,r0
    def_alu_test!(
        cvtbl_sign_extends,
        [0xd0, 0x8f, 0x80, 0x00, 0x00, 0x00, 0x50, 0x98, 0x50, 0x50],
        r0 = 0xffff_ff80,
        flags(true, false, false, false),
    );
    // movl $0x180,r1; cvtlb r1,r0
    def_alu_test!(
        cvtlb_truncates,
        [0xd0, 0x8f, 0x80, 0x01, 0x00, 0x00, 0x51, 0xf6, 0x51, 0x50],
        r0 = 0x80,
        flags(true, false, true, false),
    );
    // movl $0xffffffff,r1; movzbl r1,r0
    def_alu_test!(
        movzbl,
        [0xd0, 0x8f, 0xff, 0xff, 0xff, 0xff, 0x51, 0x9a, 0x51, 0x50],
        r0 = 0xff,
        flags(false, false, false, false),
    );
    // movl $1,r0; ashl $4,r0,r0
    def_alu_test!(ashl_left, [0xd0, 0x01, 0x50, 0x78, 0x04, 0x50, 0x50], r0 = 16, flags(false, false, false, false));
    // mnegl $0x40,r0; ashl $-2,r0,r0
    def_alu_test!(
        ashl_right_keeps_sign,
        [0xce, 0x8f, 0x40, 0x00, 0x00, 0x00, 0x50, 0x78, 0x8f, 0xfe, 0x50, 0x50],
        r0 = 0xffff_fff0,
        flags(true, false, false, false),
    );
    // clrl r0; tstl r0
    def_alu_test!(tstl_zero, [0xd4, 0x50, 0xd5, 0x50], r0 = 0, flags(false, true, false, false));

    #[test]
    fn cmpl_orders_signed_and_unsigned() {
        // movl $-1,r1; cmpl r1,$1
        let cpu = exec(&[0xd0, 0x8f, 0xff, 0xff, 0xff, 0xff, 0x51, 0xd1, 0x51, 0x01]);

        assert_eq!(cpu.reg().flags(), flags(true, false, false, false));
    }

    #[test]
    fn movab_yields_addresses() {
        // movab 4(r2),r0
        let cpu = exec(&[0xd0, 0x8f, 0x00, 0x10, 0x00, 0x00, 0x52, 0x9e, 0xa2, 0x04, 0x50]);

        assert_eq!(cpu.reg().get(0), 0x1004);
    }

    #[test]
    fn autoincrement_steps_by_operand_size() {
        // movl $0x100,r1; movw (r1)+,r0; movl (r1)+,r0
        let cpu = exec(&[
            0xd0, 0x8f, 0x00, 0x01, 0x00, 0x00, 0x51, 0xb0, 0x81, 0x50, 0xd0, 0x81, 0x50,
        ]);

        assert_eq!(cpu.reg().get(1), 0x106);
    }

    #[test]
    fn pushl_and_pop_through_autoincrement() {
        let (mut cpu, _) = cpu(&[0x00, 0x00, 0xdd, 0x8f, 0x78, 0x56, 0x34, 0x12, 0xd0, 0x8e, 0x50, 0x04]);
        let sp = cpu.reg().sp();
        cpu.run().unwrap();

        assert_eq!(cpu.reg().get(0), 0x1234_5678);
        assert_eq!(cpu.reg().sp(), sp);
    }

    #[test]
    fn indexed_operands_scale_by_size() {
        // movl $2,r1; moval 0x10[r1],r0
        let cpu = exec(&[0xd0, 0x02, 0x51, 0xde, 0x41, 0x9f, 0x10, 0x00, 0x00, 0x00, 0x50]);

        assert_eq!(cpu.reg().get(0), 0x18);
    }

    #[test]
    fn movq_fills_register_pairs() {
        // movq $-1,r2 is encoded with a quadword immediate.
        let mut code = vec![0x7d, 0x8f];
        code.extend(u64::MAX.to_le_bytes());
        code.push(0x52);
        let cpu = exec(&code);

        assert_eq!((cpu.reg().get(2), cpu.reg().get(3)), (u32::MAX, u32::MAX));
    }

    #[test]
    fn widths_sign_extend() {
        for _ in 0..100 {
            let value = rand::random::<u64>();
            for width in [Width::Byte, Width::Word, Width::Long, Width::Quad] {
                let extended = width.sign_extend(value);

                assert_eq!(width.truncate(extended as u64), width.truncate(value));
                assert_eq!(extended < 0, width.is_negative(value));
            }
        }
    }

    #[test]
    fn bands_encode_widths() {
        assert_eq!(Width::from_band(0x80), Width::Byte);
        assert_eq!(Width::from_band(0x3c), Width::Word);
        assert_eq!(Width::from_band(0xd0), Width::Long);
        assert_eq!(Width::from_band(0x7d), Width::Quad);
    }
}

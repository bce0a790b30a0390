// SPDX-License-Identifier: MPL-2.0

//! The register file.

use std::fmt;

/// The argument pointer.
pub const AP: usize = 12;
/// The frame pointer.
pub const FP: usize = 13;
/// The stack pointer.
pub const SP: usize = 14;
/// The program counter.
pub const PC: usize = 15;

/// Assembler names of each register.
pub const NAMES: [&str; 16] = [
    "r0", "r1", "r2", "r3", "r4", "r5", "r6", "r7",
    "r8", "r9", "r10", "r11", "ap", "fp", "sp", "pc",
];

/// The assembler name of register `index`, which is taken modulo 16.
pub fn name(index: u8) -> &'static str {
    NAMES[usize::from(index & 0xf)]
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct File {
    /// General-purpose registers, including the four with architectural roles.
    r: [u32; 16],
    flags: Flags,
}

impl fmt::Display for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..4 {
            for col in 0..4 {
                let idx = row * 4 + col;
                if col > 0 {
                    f.write_str(" ")?;
                }
                write!(f, "{:>3}:{:08x}", NAMES[idx], self.r[idx])?;
            }
            writeln!(f)?;
        }
        write!(f, "psl:{}", self.flags)
    }
}

impl File {
    pub fn get(&self, index: usize) -> u32 {
        self.r[index & 0xf]
    }

    pub fn set(&mut self, index: usize, value: u32) {
        self.r[index & 0xf] = value;
    }

    pub fn get_mut(&mut self, index: usize) -> &mut u32 {
        &mut self.r[index & 0xf]
    }

    pub fn pc(&self) -> u32 {
        self.r[PC]
    }

    pub fn pc_mut(&mut self) -> &mut u32 {
        &mut self.r[PC]
    }

    pub fn sp(&self) -> u32 {
        self.r[SP]
    }

    pub fn sp_mut(&mut self) -> &mut u32 {
        &mut self.r[SP]
    }

    pub fn ap(&self) -> u32 {
        self.r[AP]
    }

    pub fn fp(&self) -> u32 {
        self.r[FP]
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    pub fn flags_mut(&mut self) -> &mut Flags {
        &mut self.flags
    }

    pub fn set_flags(&mut self, n: bool, z: bool, v: bool, c: bool) {
        self.flags = Flags { n, z, v, c };
    }
}

/// The condition codes.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Flags {
    /// Negative.
    pub n: bool,
    /// Zero.
    pub z: bool,
    /// Overflow.
    pub v: bool,
    /// Carry, or borrow.
    pub c: bool,
}

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = |set: bool, letter: char| if set { letter } else { '-' };

        write!(
            f,
            "{}{}{}{}",
            letter(self.n, 'N'),
            letter(self.z, 'Z'),
            letter(self.v, 'V'),
            letter(self.c, 'C'),
        )
    }
}

bitfield::bitfield! {
    /// The status longword that `calls` and `callg` save on the stack.
    #[derive(Clone, Copy, Eq, PartialEq)]
    pub struct CallStatus(u32);
    impl Debug;
    pub c, set_c: 0;
    pub v, set_v: 1;
    pub z, set_z: 2;
    pub n, set_n: 3;
    // Set by `calls`, which pushes an argument count for `ret` to pop.
    pub calls, set_calls: 29;
    // Saved registers `r0` through `r11`, bit 0 being `r0`.
    pub u16, mask, set_mask: 27, 16;
    // Bytes by which the stack pointer was rounded down before the frame.
    pub u8, align, set_align: 31, 30;
}

impl CallStatus {
    pub fn flags(&self) -> Flags {
        Flags { n: self.n(), z: self.z(), v: self.v(), c: self.c() }
    }

    pub fn set_flags(&mut self, flags: Flags) {
        self.set_n(flags.n);
        self.set_z(flags.z);
        self.set_v(flags.v);
        self.set_c(flags.c);
    }
}

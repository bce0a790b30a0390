// SPDX-License-Identifier: MPL-2.0

//! The instruction catalog.
//!
//! VAX opcodes are one byte long, except that the bytes `0xfd`, `0xfe`, and `0xff` escape into a
//! second byte. The catalog is therefore four banks of 256 entries: one for plain opcodes and one
//! for each escape byte.

use std::{fmt, sync::OnceLock};

use vaxrun_aout::SymbolTable;

use crate::{mem::{self, Cursor}, opn};

/// The data type of an operand.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Kind {
    Byte,
    Word,
    Long,
    Quad,
    Octa,
    FFloat,
    DFloat,
    GFloat,
    HFloat,
    /// A byte-sized branch displacement.
    RelByte,
    /// A word-sized branch displacement.
    RelWord,
}

impl Kind {
    /// The size, in bytes, of a value of this kind.
    pub fn size(self) -> u32 {
        match self {
            Self::Byte | Self::RelByte => 1,
            Self::Word | Self::RelWord => 2,
            Self::Long | Self::FFloat => 4,
            Self::Quad | Self::DFloat | Self::GFloat => 8,
            Self::Octa | Self::HFloat => 16,
        }
    }

    /// The letter by which the architecture handbook abbreviates this kind.
    pub fn letter(self) -> char {
        match self {
            Self::Byte => 'b',
            Self::Word => 'w',
            Self::Long => 'l',
            Self::Quad => 'q',
            Self::Octa => 'o',
            Self::FFloat => 'f',
            Self::DFloat => 'd',
            Self::GFloat => 'g',
            Self::HFloat => 'h',
            Self::RelByte => '1',
            Self::RelWord => '2',
        }
    }

    /// Text appended to literal and immediate values of this kind.
    ///
    /// Floating-point values are shown in their raw encoding, so the suffix names the encoding.
    pub fn value_suffix(self) -> &'static str {
        match self {
            Self::FFloat => " [f-float]",
            Self::DFloat => " [d-float]",
            Self::GFloat => " [g-float]",
            Self::HFloat => " [h-float]",
            _ => "",
        }
    }

    /// Whether or not this kind is a branch displacement rather than an operand specifier.
    pub fn is_relative(self) -> bool {
        matches!(self, Self::RelByte | Self::RelWord)
    }
}

/// One entry of the catalog.
#[derive(Debug, Eq, PartialEq)]
pub struct Descriptor {
    pub op: Op,
    /// The opcode; escaped opcodes carry the escape byte in the high byte.
    pub code: u16,
    pub mnemonic: &'static str,
    pub operands: &'static [Kind],
}

impl Descriptor {
    /// The number of opcode bytes.
    pub fn code_len(&self) -> u32 {
        if self.code > 0xff {
            2
        } else {
            1
        }
    }
}

macro_rules! kind {
    (b) => { Kind::Byte };
    (w) => { Kind::Word };
    (l) => { Kind::Long };
    (q) => { Kind::Quad };
    (o) => { Kind::Octa };
    (f) => { Kind::FFloat };
    (d) => { Kind::DFloat };
    (g) => { Kind::GFloat };
    (h) => { Kind::HFloat };
    (rb) => { Kind::RelByte };
    (rw) => { Kind::RelWord };
}

macro_rules! def_catalog {
    (
        $(
            $variant_name:ident = $code:literal $mnemonic:literal [$($kind:tt)*]
        ),* $(,)?
    ) => {
        /// An instruction, independent of its operands.
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        pub enum Op {
            $(
                $variant_name,
            )*
        }

        /// Every catalogued instruction.
        pub static DESCRIPTORS: &[Descriptor] = &[
            $(
                Descriptor {
                    op: Op::$variant_name,
                    code: $code,
                    mnemonic: $mnemonic,
                    operands: &[$(kind!($kind)),*],
                },
            )*
        ];
    };
}

mod table;

pub use table::{Op, DESCRIPTORS};

/// The escape bytes, in bank order.
const ESCAPES: [u8; 3] = [0xfd, 0xfe, 0xff];

/// Whether or not `byte` introduces a two-byte opcode.
pub fn is_escape(byte: u8) -> bool {
    ESCAPES.contains(&byte)
}

/// The catalog, built on first use.
pub fn catalog() -> &'static Catalog {
    static CATALOG: OnceLock<Catalog> = OnceLock::new();

    CATALOG.get_or_init(Catalog::build)
}

/// The banks of descriptors, indexed by opcode.
pub struct Catalog {
    banks: [[Option<&'static Descriptor>; 256]; 4],
}

impl Catalog {
    fn build() -> Self {
        let mut banks = [[None; 256]; 4];
        for desc in DESCRIPTORS {
            if let Some((bank, idx)) = Self::locate(desc.code) {
                banks[bank][usize::from(idx)] = Some(desc);
            }
        }

        Self { banks }
    }

    fn locate(code: u16) -> Option<(usize, u8)> {
        let [hi, lo] = code.to_be_bytes();
        match hi {
            0 if !is_escape(lo) => Some((0, lo)),
            _ => ESCAPES.iter().position(|it| *it == hi).map(|bank| (bank + 1, lo)),
        }
    }

    /// Looks up a one- or two-byte opcode.
    pub fn get(&self, code: u16) -> Option<&'static Descriptor> {
        Self::locate(code).and_then(|(bank, idx)| self.banks[bank][usize::from(idx)])
    }

    /// Fetches an opcode from `cursor`.
    ///
    /// When the first byte has no entry of its own, a second byte is always fetched, whether or
    /// not the first was an escape byte, so that unknown opcodes render as a raw word.
    pub fn decode(&self, cursor: &mut Cursor) -> Result<Opcode, mem::Error> {
        let first = cursor.fetch_8()?;
        if let Some(desc) = self.get(u16::from(first)) {
            return Ok(Opcode::Known(desc));
        }

        let code = u16::from(first) << 8 | u16::from(cursor.fetch_8()?);

        Ok(self.get(code).map_or(Opcode::Raw(code), Opcode::Known))
    }
}

/// A decoded opcode.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Opcode {
    Known(&'static Descriptor),
    /// Two bytes that are not a catalogued opcode.
    Raw(u16),
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(desc) => f.write_str(desc.mnemonic),
            Self::Raw(code) => write!(f, ".word {:#x}", code),
        }
    }
}

impl Instr {
    /// Decodes the operands of `desc`, whose opcode began at `addr` and has just been fetched
    /// through `cursor`.
    pub fn decode(
        addr: u32,
        desc: &'static Descriptor,
        cursor: &mut Cursor,
    ) -> Result<Self, mem::Error> {
        let operands = desc
            .operands
            .iter()
            .map(|kind| opn::decode(cursor, *kind))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            addr,
            len: cursor.pos().wrapping_sub(addr),
            desc,
            operands,
        })
    }
}

/// A decoded instruction.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Instr {
    /// The address of the opcode.
    pub addr: u32,
    /// The length, in bytes, of the whole instruction.
    pub len: u32,
    pub desc: &'static Descriptor,
    pub operands: Vec<opn::Operand>,
}

impl Instr {
    pub fn op(&self) -> Op {
        self.desc.op
    }

    /// The address of the following instruction.
    pub fn next_addr(&self) -> u32 {
        self.addr.wrapping_add(self.len)
    }

    /// Addresses this instruction refers to, which may deserve a label.
    pub fn targets(&self) -> impl Iterator<Item = u32> + '_ {
        self.operands.iter().filter_map(|it| it.spec.target())
    }

    /// Renders this instruction as assembly, naming addresses after the procedures in `symbols`.
    pub fn render(&self, symbols: &SymbolTable) -> String {
        let mut text = String::from(self.desc.mnemonic);
        for (idx, operand) in self.operands.iter().enumerate() {
            text.push(if idx == 0 { ' ' } else { ',' });
            text.push_str(&operand.render(symbols));
        }

        text
    }
}

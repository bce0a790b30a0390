// SPDX-License-Identifier: MPL-2.0

//! Operand specifiers.
//!
//! Each operand is introduced by a specifier byte whose high nibble selects the addressing mode
//! and whose low nibble names a register. Decoding a specifier consumes it and whatever it is
//! followed by in the instruction stream, but touches no register: register side effects belong to
//! the interpreter.

use std::fmt::Write as _;

use vaxrun_aout::SymbolTable;
use vaxrun_util::Int;

use crate::{instr::Kind, mem::{self, Cursor}, reg};

/// A decoded operand specifier.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Specifier {
    /// A 6-bit literal, encoded in the specifier byte itself.
    Literal(u8),
    /// `base[rN]`: the address of `base` plus `rN` times the operand size.
    Index { base: Box<Specifier>, reg: u8 },
    Register(u8),
    /// `(rN)`.
    Deferred(u8),
    /// `-(rN)`.
    AutoDecrement(u8),
    /// `(rN)+`.
    AutoIncrement(u8),
    /// A value inline in the instruction stream at `addr`.
    Immediate { addr: u32, value: u128 },
    /// `*(rN)+`.
    AutoIncrementDeferred(u8),
    /// An address inline in the instruction stream.
    Absolute(u32),
    /// `disp(rN)` or `*disp(rN)`.
    Displacement { reg: u8, disp: i32, deferred: bool },
    /// A displacement from the program counter, already resolved to an address.
    Relative { target: u32, deferred: bool },
    /// A branch displacement, already resolved to its target.
    Branch(u32),
    /// A specifier that is never valid in its position, such as an index of an index.
    Reserved(u8),
}

/// A decoded operand: its specifier and the data type the instruction accesses it as.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Operand {
    pub kind: Kind,
    pub spec: Specifier,
}

/// Decodes one operand of the given kind from `cursor`.
///
/// Branch displacements are read as signed integers and added to the address that follows them.
pub fn decode(cursor: &mut Cursor, kind: Kind) -> Result<Operand, mem::Error> {
    let spec = if kind.is_relative() {
        let disp = cursor.fetch_disp(kind.size())?;

        Specifier::Branch(cursor.pos().wrapping_add(disp as u32))
    } else {
        decode_specifier(cursor, kind, true)?
    };

    Ok(Operand { kind, spec })
}

fn decode_specifier(
    cursor: &mut Cursor,
    kind: Kind,
    may_index: bool,
) -> Result<Specifier, mem::Error> {
    let byte = cursor.fetch_8()?;
    let reg = byte & 0xf;
    let is_pc = usize::from(reg) == reg::PC;

    let spec = match byte >> 4 {
        0..=3 => Specifier::Literal(byte),
        4 if may_index => Specifier::Index {
            base: Box::new(decode_specifier(cursor, kind, false)?),
            reg,
        },
        4 => Specifier::Reserved(byte),
        5 => Specifier::Register(reg),
        6 => Specifier::Deferred(reg),
        7 => Specifier::AutoDecrement(reg),
        8 if is_pc => {
            let addr = cursor.pos();

            Specifier::Immediate { addr, value: cursor.fetch_wide(kind.size())? }
        }
        8 => Specifier::AutoIncrement(reg),
        9 if is_pc => Specifier::Absolute(cursor.fetch_32()?),
        9 => Specifier::AutoIncrementDeferred(reg),
        mode => {
            let deferred = mode & 1 == 1;
            let disp = cursor.fetch_disp(1 << ((mode - 0xa) >> 1))?;
            if is_pc {
                Specifier::Relative {
                    target: cursor.pos().wrapping_add(disp as u32),
                    deferred,
                }
            } else {
                Specifier::Displacement { reg, disp, deferred }
            }
        }
    };

    Ok(spec)
}

impl Specifier {
    /// The address this specifier names statically, if any.
    pub fn target(&self) -> Option<u32> {
        match self {
            Self::Branch(addr) | Self::Absolute(addr) => Some(*addr),
            Self::Relative { target, .. } => Some(*target),
            Self::Index { base, .. } => base.target(),
            _ => None,
        }
    }

    /// The literal or immediate value of this specifier, if it has one.
    pub fn constant(&self) -> Option<u128> {
        match self {
            Self::Literal(byte) => Some(u128::from(*byte)),
            Self::Immediate { value, .. } => Some(*value),
            _ => None,
        }
    }

    fn render(&self, kind: Kind, symbols: &SymbolTable, out: &mut String) {
        let star = |deferred: bool| if deferred { "*" } else { "" };
        // Writing to a `String` cannot fail.
        let _ = match self {
            Self::Literal(byte) => write!(out, "${}{}", Int::from(*byte), kind.value_suffix()),
            Self::Index { base, reg } => {
                base.render(kind, symbols, out);

                write!(out, "[{}]", reg::name(*reg))
            }
            Self::Register(reg) => write!(out, "{}", reg::name(*reg)),
            Self::Deferred(reg) => write!(out, "({})", reg::name(*reg)),
            Self::AutoDecrement(reg) => write!(out, "-({})", reg::name(*reg)),
            Self::AutoIncrement(reg) => write!(out, "({})+", reg::name(*reg)),
            Self::Immediate { value, .. } => {
                if *value < 10 {
                    write!(out, "${}{}", value, kind.value_suffix())
                } else {
                    write!(out, "${:#x}{}", value, kind.value_suffix())
                }
            }
            Self::AutoIncrementDeferred(reg) => write!(out, "*({})+", reg::name(*reg)),
            Self::Absolute(addr) => {
                out.push('*');

                write_address(out, *addr, symbols)
            }
            Self::Displacement { reg, disp: 0, deferred } => {
                write!(out, "{}({})", star(*deferred), reg::name(*reg))
            }
            Self::Displacement { reg, disp, deferred } => {
                write!(out, "{}{}({})", star(*deferred), Int::from(*disp), reg::name(*reg))
            }
            Self::Relative { target, deferred } => {
                out.push_str(star(*deferred));

                write_address(out, *target, symbols)
            }
            Self::Branch(target) => write!(out, "{:#x}", target),
            Self::Reserved(_) => {
                out.push_str("???");

                Ok(())
            }
        };
    }
}

fn write_address(out: &mut String, addr: u32, symbols: &SymbolTable) -> std::fmt::Result {
    write!(out, "{:#x}", addr)?;
    if let Some(name) = symbols.procedure_at(addr) {
        write!(out, "<{}>", name)?;
    }

    Ok(())
}

impl Operand {
    /// Renders this operand as assembly, naming addresses after the procedures in `symbols`.
    pub fn render(&self, symbols: &SymbolTable) -> String {
        let mut out = String::new();
        self.spec.render(self.kind, symbols, &mut out);

        out
    }
}

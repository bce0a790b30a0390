// SPDX-License-Identifier: MPL-2.0

//! CPU faults.
//!
//! Every fault is fatal: the interpreter stops at the faulting instruction and never resumes.

use std::fmt;

use crate::mem;

impl Fault {
    /// Creates a new `Fault` of the given kind, raised by the instruction at `addr`.
    pub fn new(addr: u32, kind: Kind) -> Self {
        Self { addr, kind }
    }
}

/// A fatal condition raised by the instruction at a known address.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Fault {
    /// The address of the faulting instruction.
    pub addr: u32,
    pub kind: Kind,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Kind {
    /// The opcode is not in the catalog. `len` is 1 for plain bytes and 2 for escaped opcodes.
    UnknownOpcode { code: u16, len: u8 },
    /// The opcode is in the catalog, but the interpreter does not execute it.
    Unimplemented { code: u16, mnemonic: &'static str },
    /// The operand specifier cannot be used for this kind of access.
    AddressingMode { specifier: u8 },
    Memory(mem::Error),
    /// The instruction requires kernel mode.
    PrivilegedInstr { mnemonic: &'static str },
    ReservedOperand { mnemonic: &'static str },
    Syscall { number: u32 },
    /// `editpc` ran out of source digits.
    DecimalSourceExhausted,
    /// `editpc` found a pattern operator it does not know.
    EditPattern { op: u8 },
    /// Writing to the output sink failed.
    Io(String),
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}: {}", self.addr, self.kind)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownOpcode { code, len: 1 } => write!(f, "unknown opcode {:02x}", code),
            Self::UnknownOpcode { code, .. } => write!(f, "unknown opcode {:04x}", code),
            Self::Unimplemented { code, mnemonic } => {
                write!(f, "unimplemented instruction {} ({:02x})", mnemonic, code)
            }
            Self::AddressingMode { specifier } => {
                write!(f, "unsupported operand specifier {:02x}", specifier)
            }
            Self::Memory(e) => write!(f, "{}", e),
            Self::PrivilegedInstr { mnemonic } => write!(f, "privileged instruction {}", mnemonic),
            Self::ReservedOperand { mnemonic } => write!(f, "reserved operand in {}", mnemonic),
            Self::Syscall { number } => {
                write!(f, "unknown syscall {:02x} ({})", number, crate::sym::for_syscall(*number))
            }
            Self::DecimalSourceExhausted => f.write_str("editpc: source is too short"),
            Self::EditPattern { op } => write!(f, "editpc: unknown operator {:02x}", op),
            Self::Io(e) => write!(f, "output failed: {}", e),
        }
    }
}

impl std::error::Error for Fault {}

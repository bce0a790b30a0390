// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A VAX user-mode processor.
//!
//! This crate decodes the VAX instruction set into symbolic assembly and interprets the integer,
//! control-flow, call, and decimal-editing subset that compiled C programs of the era rely on.

pub mod disasm;
pub mod exc;
pub mod instr;
pub mod mem;
pub mod opn;
pub mod reg;
pub mod sym;

mod cpu;

pub use cpu::{Config, Cpu, Frame, Halt, LoadError, Location, Status, Width};
pub use disasm::Disassembler;
pub use exc::Fault;
pub use instr::Instr;
pub use mem::Memory;

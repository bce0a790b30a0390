// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Runs and disassembles VAX executables.

pub mod log;

use std::{io, path::Path};

pub use vaxrun_aout::{self as aout, AOut};
pub use vaxrun_cpu::{self as cpu, Config, Cpu, Fault, Halt};

/// The exit status of a run that ended in a fault.
pub const FAULT_STATUS: i32 = 70;

impl Core {
    pub fn new(aout: AOut) -> Self {
        Self { aout }
    }

    /// Reads the container at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, aout::Error> {
        AOut::open(path).map(Self::new)
    }
}

/// A loaded container.
#[derive(Clone, Debug)]
pub struct Core {
    aout: AOut,
}

impl Core {
    pub fn aout(&self) -> &AOut {
        &self.aout
    }

    /// Writes a listing of the text segment to `out`.
    ///
    /// Raw blobs are listed from address 0 with no entry point.
    pub fn disassemble(&self, out: &mut impl io::Write) -> io::Result<()> {
        let range = self.aout.text_range();
        let mem = cpu::Memory::from_bytes(range.start, self.aout.text.clone());
        let dis = cpu::Disassembler::new(&mem, &self.aout.symbols, self.aout.entry());

        for line in dis.decode_range(range.start, range.end) {
            writeln!(out, "{}", line)?;
        }

        Ok(())
    }

    /// The listing [`disassemble`](Self::disassemble) writes.
    pub fn disassembly(&self) -> String {
        let mut out = Vec::new();
        // Writing to a `Vec` cannot fail.
        let _ = self.disassemble(&mut out);

        String::from_utf8_lossy(&out).into_owned()
    }

    /// Prepares a [`Cpu`] to run the program with the given `argv`.
    pub fn cpu(&self, args: &[impl AsRef<str>], config: &Config) -> Result<Cpu, cpu::LoadError> {
        Cpu::load(&self.aout, args, config)
    }

    /// Runs the program to completion, returning its exit status.
    ///
    /// A fault is reported through `tracing` along with its diagnosis.
    pub fn run(&self, args: &[impl AsRef<str>], config: &Config) -> Result<i32, cpu::LoadError> {
        let mut cpu = self.cpu(args, config)?;
        let status = match cpu.run() {
            Ok(halt) => {
                tracing::debug!("halted: {:?}", halt);

                halt.status()
            }
            Err(fault) => {
                tracing::error!("{}", cpu.diagnose(&fault));

                FAULT_STATUS
            }
        };

        Ok(status)
    }
}

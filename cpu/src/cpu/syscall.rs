// SPDX-License-Identifier: MPL-2.0

//! System calls.
//!
//! Programs enter the kernel with `chmk $number` from a stub procedure, so the arguments are the
//! stub's argument list at `4(ap)`, `8(ap)`, and so on. Results come back in `r0`, and a clear C
//! flag signals success.

use std::io::Write as _;

use super::{Cpu, Halt, Width};
use crate::{exc::{self, Fault}, instr::Instr, sym};

const EXIT: u32 = 1;
const WRITE: u32 = 4;
const CLOSE: u32 = 6;
const IOCTL: u32 = 54;

/// The `ioctl` request that fetches terminal modes, used by stdio to decide on buffering.
const TIOCGETP: u32 = 0x7408;

impl Cpu {
    fn arg(&self, idx: u32) -> Result<u32, Fault> {
        self.read_mem_32(self.reg.ap().wrapping_add(4 * (idx + 1)))
    }

    fn succeed(&mut self, result: u32) {
        self.reg.set(0, result);
        self.reg.flags_mut().c = false;
    }

    pub(super) fn chmk(&mut self, instr: &Instr) -> Result<Option<Halt>, Fault> {
        let [number] = self.locate_all::<1>(instr)?;
        let number = self.read(number, Width::Word)? as u32;

        match number {
            EXIT => {
                let code = self.arg(0)? as i32;
                tracing::debug!("{}({})", sym::for_syscall(number), code);

                return Ok(Some(Halt::Exit(code)));
            }
            WRITE => {
                let (fd, buf, len) = (self.arg(0)?, self.arg(1)?, self.arg(2)?);
                tracing::debug!("{}({}, {:#x}, {})", sym::for_syscall(number), fd, buf, len);
                let bytes = self.mem.slice(buf, len).map_err(|e| self.mem_fault(e))?;
                self.stdout
                    .write_all(bytes)
                    .map_err(|e| Fault::new(self.instr_addr, exc::Kind::Io(e.to_string())))?;
                self.succeed(len);
            }
            CLOSE => {
                tracing::debug!("{}({})", sym::for_syscall(number), self.arg(0)?);
                self.succeed(0);
            }
            IOCTL => {
                let (fd, request) = (self.arg(0)?, self.arg(1)?);
                tracing::debug!("{}({}, {:#x})", sym::for_syscall(number), fd, request);
                if request != TIOCGETP {
                    return Err(self.fault(exc::Kind::Syscall { number }));
                }
                // Only the standard streams are terminals.
                if fd <= 2 {
                    self.succeed(0);
                } else {
                    self.reg.set(0, u32::MAX);
                    self.reg.flags_mut().c = true;
                }
            }
            _ => return Err(self.fault(exc::Kind::Syscall { number })),
        }

        Ok(None)
    }
}

// SPDX-License-Identifier: MPL-2.0

use std::{
    io::{self, Write as _},
    path::PathBuf,
    process::ExitCode,
};

use anyhow::Context as _;
use clap::Parser;
use tracing::Level;
use vaxrun::{Config, Core};

/// Runs, or disassembles, a VAX executable.
#[derive(Parser, Debug)]
#[command(name = "vaxrun", version, about)]
struct Args {
    /// Print a listing of the text segment instead of running the program.
    #[arg(short)]
    disassemble: bool,
    /// Trace system calls and procedure calls.
    #[arg(short)]
    syscalls: bool,
    /// Trace every instruction executed.
    #[arg(short)]
    verbose: bool,
    /// The size, in bytes, of guest memory; `0x` selects hexadecimal.
    #[arg(long, default_value_t = Config::DEFAULT_MEM_SIZE, value_parser = parse_size)]
    mem_size: usize,
    /// The executable.
    aout: PathBuf,
    /// Arguments passed to the program after its own name.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

impl Args {
    fn level(&self) -> Level {
        if self.verbose {
            Level::TRACE
        } else if self.syscalls {
            Level::DEBUG
        } else {
            Level::WARN
        }
    }
}

fn parse_size(arg: &str) -> Result<usize, std::num::ParseIntError> {
    match arg.strip_prefix("0x").or_else(|| arg.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16),
        None => arg.parse(),
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    vaxrun::log::init(args.level());

    match run(&args) {
        // Statuses are reported modulo 256, as the host would.
        Ok(status) => ExitCode::from(status as u8),
        Err(e) => {
            eprintln!("vaxrun: {:#}", e);

            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> anyhow::Result<i32> {
    let path = args.aout.display();
    let core = Core::open(&args.aout).with_context(|| format!("failed to read {}", path))?;

    if args.disassemble {
        let mut out = io::BufWriter::new(io::stdout().lock());
        core.disassemble(&mut out)
            .and_then(|()| out.flush())
            .context("failed to write listing")?;

        return Ok(0);
    }

    let mut argv = vec![path.to_string()];
    argv.extend(args.args.iter().cloned());
    let config = Config { mem_size: args.mem_size };

    core.run(&argv, &config).with_context(|| format!("failed to load {}", path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_parse_in_either_radix() {
        assert_eq!(parse_size("4096"), Ok(4096));
        assert_eq!(parse_size("0x40000"), Ok(0x40000));
        assert!(parse_size("0xg").is_err());
    }

    #[test]
    fn guest_arguments_may_look_like_flags() {
        let args = Args::parse_from(["vaxrun", "-s", "a.out", "x", "-n"]);

        assert!(args.syscalls);
        assert!(!args.disassemble);
        assert_eq!(args.aout, PathBuf::from("a.out"));
        assert_eq!(args.args, ["x", "-n"]);
        assert_eq!(args.level(), Level::DEBUG);
    }

    #[test]
    fn memory_size_defaults() {
        let args = Args::parse_from(["vaxrun", "a.out"]);

        assert_eq!(args.mem_size, Config::DEFAULT_MEM_SIZE);
        assert_eq!(args.level(), Level::WARN);
    }
}

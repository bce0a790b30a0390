// SPDX-License-Identifier: MPL-2.0

//! Logging setup.

use tracing::Level;
use tracing_subscriber::{filter::LevelFilter, EnvFilter};

/// Installs the global subscriber, logging at `level` unless `RUST_LOG` says otherwise.
///
/// Logs go to stderr so that they never mix with the guest's output.
pub fn init(level: Level) {
    tracing_subscriber::fmt()
        // Set the environment variable `RUST_LOG` to one of `TRACE`, `DEBUG`, `INFO`, `WARN`, or
        // `ERROR`, or to a list of directives, to override the level chosen on the command line.
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::from_level(level).into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_level(true)
        .with_target(false)
        .without_time()
        .init();
}

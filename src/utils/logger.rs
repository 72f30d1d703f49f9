// src/utils/logger.rs

use env_logger::{Builder, Env};
use log::{Level, SetLoggerError};
use std::io::Write;

/// Terminal logger: `info` by default, `debug` when verbose.
/// `RUST_LOG` still wins when set.
pub fn init(verbose: bool) -> Result<(), SetLoggerError> {
  let default_level = if verbose { "debug" } else { "info" };
  Builder::from_env(Env::default().default_filter_or(default_level))
    .format(|buf, record| writeln!(buf, "{}  {}", icon(record.level()), record.args()))
    .try_init()
}

// Format: "🔴  checkpoint failed"
fn icon(level: Level) -> &'static str {
  match level {
    Level::Error => "🔴",
    Level::Warn => "🟠",
    Level::Info => "🔵",
    Level::Debug => "⚪",
    Level::Trace => "▫️",
  }
}

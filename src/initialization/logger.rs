//! Logger setup on top of `env_logger`.

use std::io::Write;

use colored::*;
use log::{Level, LevelFilter, Record};

use crate::config::LogFormat;
use crate::error_handling::InitializationError;

/// Initializes the process-wide logger.
///
/// `RUST_LOG` is read first so per-module directives still apply, then
/// `level` overrides the global filter and this crate's own target. Chatty
/// HTTP internals stay at `info` unless `RUST_LOG` raises them.
///
/// ```bash
/// RUST_LOG=transit_governor::governor=trace transit_governor --log-level info
/// ```
///
/// # Errors
///
/// Returns `InitializationError::LoggerError` when a logger is already set.
pub fn init_logger_with(level: LevelFilter, format: LogFormat) -> Result<(), InitializationError> {
    colored::control::set_override(matches!(format, LogFormat::Plain));

    let mut builder = env_logger::Builder::from_default_env();
    builder.filter_level(level);
    builder.filter_module("reqwest", LevelFilter::Info);
    builder.filter_module("hyper", LevelFilter::Info);
    builder.filter_module("hyper_util", LevelFilter::Info);
    builder.filter_module("rustls", LevelFilter::Warn);
    builder.filter_module("transit_governor", level);

    match format {
        LogFormat::Json => {
            builder.format(|buf, record| writeln!(buf, "{}", json_line(record)));
        }
        LogFormat::Plain => {
            builder.format(|buf, record| {
                writeln!(
                    buf,
                    "{} {} [{}] {}",
                    level_marker(record.level()),
                    record.target().cyan(),
                    colored_level(record.level()),
                    record.args()
                )
            });
        }
    }

    // try_init so a second initialization (tests) is an error, not a panic
    builder.try_init().map_err(InitializationError::from)?;
    Ok(())
}

fn json_line(record: &Record<'_>) -> String {
    format!(
        "{{\"ts\":{},\"level\":\"{}\",\"target\":\"{}\",\"msg\":{}}}",
        chrono::Utc::now().timestamp_millis(),
        record.level(),
        record.target(),
        serde_json::to_string(&record.args().to_string()).unwrap_or_else(|_| "\"\"".into())
    )
}

fn colored_level(level: Level) -> ColoredString {
    let label = level.to_string();
    match level {
        Level::Error => label.red(),
        Level::Warn => label.yellow(),
        Level::Info => label.green(),
        Level::Debug => label.blue(),
        Level::Trace => label.purple(),
    }
}

fn level_marker(level: Level) -> &'static str {
    match level {
        Level::Error => "❌",
        Level::Warn => "⚠️",
        Level::Info => "🚆",
        Level::Debug => "🔍",
        Level::Trace => "🔬",
    }
}

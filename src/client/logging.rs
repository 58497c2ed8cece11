use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Levels accepted by `--log-level`
pub const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Initialize structured logging from CLI options.
///
/// `RUST_LOG` still wins when set, so per-module filters keep working:
/// - `RUST_LOG=debug` - Debug level and above, including one line per reply
/// - `RUST_LOG=udping=debug` - Debug level for udping crate only
///
/// `json` switches to one JSON object per event.
pub fn init_logging_with_config(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_lowercase()));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(false).with_thread_ids(true))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(true)
                    .with_line_number(true)
                    .with_file(true),
            )
            .init();
    }
}

/// Check a `--log-level` value
pub fn validate_log_level(level: &str) -> Result<(), String> {
    if VALID_LOG_LEVELS.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        Err(format!(
            "log_level must be one of: {}",
            VALID_LOG_LEVELS.join(", ")
        ))
    }
}

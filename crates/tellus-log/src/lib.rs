//! Structured logging for the subdivision system.
//!
//! Span-based, filterable logging via the `tracing` ecosystem: console
//! output with timestamps and module paths, plus JSON file logging in
//! debug builds for post-mortem analysis of pass timings. Integrates with
//! the configuration system for runtime log level control.

use std::path::Path;

use tellus_config::Config;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter: `info` everywhere, `debug` for the per-pass summaries
/// emitted by the subdivision crates.
const DEFAULT_FILTER: &str = "info,tellus_subdivide=debug,tellus_pipeline=debug";

/// Initialize the tracing subscriber.
///
/// Sets up:
/// - Console output with uptime timestamps, module paths, and severity
/// - JSON file logging in debug builds (optional)
/// - Environment-based filtering (respects RUST_LOG)
/// - Integration with the config system's `log_level` setting
///
/// # Arguments
///
/// * `log_dir` - Optional directory for JSON log files (debug builds only)
/// * `debug_build` - Whether this is a debug build (enables file logging)
/// * `config` - Optional configuration to use for log level override
///
/// # Examples
///
/// ```no_run
/// use tellus_log::init_logging;
/// use tellus_config::Config;
///
/// // Basic initialization
/// init_logging(None, false, None);
///
/// // With file logging in debug mode
/// let log_dir = std::path::Path::new("./logs");
/// init_logging(Some(log_dir), true, None);
///
/// // With config override
/// let config = Config::default();
/// init_logging(None, false, Some(&config));
/// ```
pub fn init_logging(log_dir: Option<&Path>, debug_build: bool, config: Option<&Config>) {
    let filter_str = match config {
        Some(config) if !config.debug.log_level.is_empty() => config.debug.log_level.clone(),
        _ => DEFAULT_FILTER.to_string(),
    };

    // Base filter: overridable via RUST_LOG env var
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(true) // worker threads are named
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    // In debug builds, also log to a file for post-mortem analysis
    if debug_build
        && let Some(log_dir) = log_dir
        && std::fs::create_dir_all(log_dir).is_ok()
        && let Ok(log_file) = std::fs::File::create(log_dir.join("tellus.log"))
    {
        let file_layer = fmt::layer()
            .with_writer(log_file)
            .with_ansi(false)
            .with_target(true)
            .with_timer(fmt::time::uptime())
            .json();

        subscriber.with(file_layer).init();
        return;
    }

    subscriber.init();
}

/// Create an `EnvFilter` with the default filter string.
///
/// Useful for tests and for consistent default behavior outside of
/// [`init_logging`].
pub fn default_env_filter() -> EnvFilter {
    EnvFilter::new(DEFAULT_FILTER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_log_level() {
        let filter = default_env_filter();

        let filter_str = format!("{}", filter);
        assert!(filter_str.contains("info"));
        assert!(filter_str.contains("tellus_pipeline=debug"));
    }

    #[test]
    fn test_config_override_wins() {
        let mut config = Config::default();
        config.debug.log_level = "warn".to_string();
        assert_eq!(config.debug.log_level, "warn");

        let filter = EnvFilter::new(&config.debug.log_level);
        assert!(format!("{}", filter).contains("warn"));
    }

    #[test]
    fn test_env_filter_parsing() {
        let valid_filters = [
            "info",
            "debug,tellus_pipeline=trace",
            "warn,tellus_subdivide=debug",
            "error",
        ];

        for filter_str in &valid_filters {
            let result = EnvFilter::try_from(*filter_str);
            assert!(result.is_ok(), "Failed to parse filter: {}", filter_str);
        }
    }

    #[test]
    fn test_file_logger_creation() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_path = temp_dir.path();

        std::fs::create_dir_all(log_path).unwrap();
        let log_file_path = log_path.join("tellus.log");
        assert_eq!(log_file_path.file_name().unwrap(), "tellus.log");
    }
}

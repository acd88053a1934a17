use flexi_logger::{
    Cleanup, Criterion, Duplicate, FileSpec, Logger, LoggerHandle, Naming, WriteMode,
};

use crate::config::LoggingConfig;
use crate::error::MergingtonError;

const LOG_FILE_BASENAME: &str = "mergington";
const LOG_FILE_MAX_BYTES: u64 = 10 * 1024 * 1024;
const LOG_FILES_KEPT: usize = 5;

/// Builds the flexi_logger spec string. Our own crate logs at the configured
/// level; chatty dependencies stay at warn.
pub fn log_spec(config: &LoggingConfig) -> String {
    format!("warn, mergington={}", config.level)
}

/// Starts the global logger. `RUST_LOG`, when set, takes precedence over the
/// configured level. The returned handle must be kept alive for the lifetime
/// of the process or buffered output may be lost.
pub fn init(config: &LoggingConfig) -> Result<LoggerHandle, MergingtonError> {
    let logger = Logger::try_with_env_or_str(log_spec(config))?
        .format(flexi_logger::detailed_format)
        .write_mode(WriteMode::BufferAndFlush);

    let handle = match &config.directory {
        Some(dir) => logger
            .log_to_file(
                FileSpec::default()
                    .directory(dir)
                    .basename(LOG_FILE_BASENAME),
            )
            .rotate(
                Criterion::Size(LOG_FILE_MAX_BYTES),
                Naming::Timestamps,
                Cleanup::KeepLogFiles(LOG_FILES_KEPT),
            )
            .duplicate_to_stderr(Duplicate::Warn)
            .start()?,
        None => logger.log_to_stderr().start()?,
    };

    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_spec_uses_configured_level() {
        let config = LoggingConfig {
            level: "debug".to_string(),
            directory: None,
        };
        assert_eq!(log_spec(&config), "warn, mergington=debug");
    }

    #[test]
    fn test_log_spec_parses() {
        for level in ["error", "warn", "info", "debug", "trace"] {
            let config = LoggingConfig {
                level: level.to_string(),
                directory: None,
            };
            assert!(flexi_logger::LogSpecification::parse(log_spec(&config)).is_ok());
        }
    }
}

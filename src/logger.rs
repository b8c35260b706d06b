use std::sync::Arc;
use std::time::Duration;

use spdlog::sink::{RotatingFileSink, RotationPolicy, StdStream, StdStreamSink};
use spdlog::{Level, LevelFilter, Logger};

use crate::config::{Config, Log, LogLevel};

impl LogLevel {
    /// Messages at this level or more severe are logged
    fn filter(self) -> LevelFilter {
        let level = match self {
            LogLevel::Critical => Level::Critical,
            LogLevel::Error => Level::Error,
            LogLevel::Warn => Level::Warn,
            LogLevel::Info => Level::Info,
            LogLevel::Debug => Level::Debug,
            LogLevel::Trace => Level::Trace,
        };
        LevelFilter::MoreSevereEqual(level)
    }
}

fn console_sink(stream: StdStream, filter: LevelFilter) -> spdlog::Result<Arc<StdStreamSink>> {
    let sink = StdStreamSink::builder()
        .std_stream(stream)
        .level_filter(filter)
        .build()?;
    Ok(Arc::new(sink))
}

/// File sink rotated at midnight. On the console, warnings and errors go to stderr.
fn build_logger(log: &Log) -> spdlog::Result<Arc<Logger>> {
    let file_sink = Arc::new(RotatingFileSink::builder()
        .base_path(&log.location)
        .rotation_policy(RotationPolicy::Daily { hour: 0, minute: 0 })
        .max_files(60)
        .rotate_on_open(false)
        .build()?);

    let mut builder = Logger::builder();
    builder.sink(file_sink);
    if log.log_to_console {
        builder
            .sink(console_sink(StdStream::Stdout, LevelFilter::MoreVerbose(Level::Warn))?)
            .sink(console_sink(StdStream::Stderr, LevelFilter::MoreSevereEqual(Level::Warn))?);
    }

    let logger = Arc::new(builder.build()?);
    logger.set_level_filter(log.level.filter());
    logger.set_flush_level_filter(LevelFilter::MoreSevereEqual(Level::Info));
    logger.set_flush_period(Some(Duration::from_secs(2)));
    Ok(logger)
}

/// Without a `[log]` section the default console logger stays in place
pub fn configure_logger(config: &Config) -> spdlog::Result<()> {
    let Some(ref log) = config.log else {
        return Ok(());
    };

    spdlog::set_default_logger(build_logger(log)?);
    println!("Log enabled. Files will be written in {}", log.location.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn log_in(dir: &TempDir, level: LogLevel) -> Log {
        Log {
            level,
            log_to_console: false,
            location: dir.path().join("server.log"),
        }
    }

    #[test]
    fn test_level_filter() {
        let dir = TempDir::new().unwrap();
        let logger = build_logger(&log_in(&dir, LogLevel::Warn)).unwrap();

        assert!(logger.should_log(Level::Error));
        assert!(logger.should_log(Level::Warn));
        assert!(!logger.should_log(Level::Info));
    }

    #[test]
    fn test_writes_to_file() {
        let dir = TempDir::new().unwrap();
        let logger = build_logger(&log_in(&dir, LogLevel::Info)).unwrap();
        spdlog::info!(logger: logger, "blog started");
        logger.flush();

        let written: String = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| fs::read_to_string(entry.unwrap().path()).unwrap())
            .collect();
        assert!(written.contains("blog started"));
    }
}

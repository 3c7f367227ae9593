//! Logging setup for the parser and its command-line tool.
//!
//! Events are emitted with `tracing`; this module installs a
//! `tracing-subscriber` formatter that:
//! - Writes to stderr, keeping stdout free for classification output
//! - Honors `RUST_LOG` over the configured level
//! - Can be initialized more than once without panicking

use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

/// Log level configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    /// Trace level - most verbose
    Trace,
    /// Debug level, shows every classification decision
    Debug,
    /// Info level
    Info,
    /// Warning level (default), shows patterns that failed to compile
    #[default]
    Warn,
    /// Error level - least verbose
    Error,
    /// Disable logging entirely
    Off,
}

impl LogLevel {
    fn directive(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Off => "off",
        }
    }
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
            LogLevel::Off => Level::ERROR, // Will be filtered out by directive
        }
    }
}

impl From<u8> for LogLevel {
    /// Convert verbosity count to log level.
    /// 0 = Warn, 1 = Info, 2 = Debug, 3+ = Trace
    fn from(verbosity: u8) -> Self {
        match verbosity {
            0 => LogLevel::Warn,
            1 => LogLevel::Info,
            2 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }
}

/// Configuration for the log output.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// The log level to use
    pub level: LogLevel,
    /// Whether to include the source file
    pub with_file: bool,
    /// Whether to include the source line number
    pub with_line_number: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Warn,
            with_file: false,
            with_line_number: false,
        }
    }
}

impl LoggingConfig {
    /// Create a new logging configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the log level.
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Set whether to include the source file.
    pub fn with_file(mut self, enabled: bool) -> Self {
        self.with_file = enabled;
        self
    }

    /// Set whether to include the source line number.
    pub fn with_line_number(mut self, enabled: bool) -> Self {
        self.with_line_number = enabled;
        self
    }

    /// Create a configuration from a `-v` count.
    ///
    /// Trace verbosity also turns on source locations.
    pub fn from_verbosity(verbosity: u8) -> Self {
        let level = LogLevel::from(verbosity);
        let locations = level == LogLevel::Trace;
        Self::default()
            .with_level(level)
            .with_file(locations)
            .with_line_number(locations)
    }

    fn env_filter(&self) -> EnvFilter {
        if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            EnvFilter::new(self.level.directive())
        }
    }
}

/// Install the stderr subscriber.
///
/// Returns false if a global subscriber was already set, in which case the
/// existing one stays in place.
///
/// # Examples
///
/// ```no_run
/// use identity_error_parser::logging::{init_logging, LoggingConfig, LogLevel};
///
/// init_logging(LoggingConfig::new().with_level(LogLevel::Debug));
/// ```
pub fn init_logging(config: LoggingConfig) -> bool {
    let installed = fmt::Subscriber::builder()
        .with_env_filter(config.env_filter())
        .with_writer(std::io::stderr)
        .without_time()
        .with_file(config.with_file)
        .with_line_number(config.with_line_number)
        .try_init()
        .is_ok();

    if installed {
        tracing::trace!(level = ?config.level, "logging initialized");
    }
    installed
}

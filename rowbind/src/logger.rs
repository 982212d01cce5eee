//! Delivery of `log` records to a host-supplied [`Logger`].

use std::sync::{Arc, OnceLock};

/// A sink for the log messages emitted by `rowbind` and its engine.
///
/// Applications that already run a `log` or `tracing` subscriber do not
/// need this; it is for hosts that want messages delivered to their own
/// logging facility without pulling in a logging backend.
///
/// # Examples
///
/// ```rust
/// use rowbind::logger::{LogLevel, Logger};
///
/// struct StderrLogger;
///
/// impl Logger for StderrLogger {
///     fn log(&self, level: LogLevel, message: String) {
///         eprintln!("[{level:?}] {message}");
///     }
/// }
/// ```
pub trait Logger: Sync + Send {
    /// Logs a message at the specified level.
    fn log(&self, level: LogLevel, message: String);
}

/// Severity of a log message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Very detailed messages, such as codec registration and statement resets.
    Trace,
    /// Debugging information, such as converter compilation.
    Debug,
    /// Informational messages.
    Info,
    /// Potentially harmful situations.
    Warn,
    /// Errors.
    Error,
}

impl From<log::Level> for LogLevel {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => Self::Error,
            log::Level::Warn => Self::Warn,
            log::Level::Info => Self::Info,
            log::Level::Debug => Self::Debug,
            log::Level::Trace => Self::Trace,
        }
    }
}

static HOST_LOGGER: OnceLock<Arc<dyn Logger>> = OnceLock::new();

/// `log` backend that hands records to [`HOST_LOGGER`].
struct Bridge;

impl Bridge {
    /// Below `Info`, only this crate's own records are passed on.
    fn accepts(metadata: &log::Metadata<'_>) -> bool {
        metadata.level() <= log::Level::Info || metadata.target().starts_with("rowbind")
    }
}

impl log::Log for Bridge {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        Self::accepts(metadata)
    }

    fn log(&self, record: &log::Record<'_>) {
        if !Self::accepts(record.metadata()) {
            return;
        }
        match HOST_LOGGER.get() {
            Some(host) => host.log(record.level().into(), record.args().to_string()),
            None => eprintln!("rowbind: no host logger installed: {}", record.args()),
        }
    }

    fn flush(&self) {}
}

/// Installs `logger` as the destination of every `log` record in the
/// process.
///
/// Only the first call has an effect. If another `log` backend was
/// installed first, a message is printed to stderr and the call does
/// nothing.
pub fn set_logger(logger: Arc<dyn Logger>) {
    static BRIDGE: Bridge = Bridge;

    if HOST_LOGGER.set(logger).is_err() {
        eprintln!("rowbind: host logger already installed");
        return;
    }
    match log::set_logger(&BRIDGE) {
        Ok(()) => log::set_max_level(log::LevelFilter::Trace),
        Err(err) => eprintln!("rowbind: cannot install log bridge: {err}"),
    }
}

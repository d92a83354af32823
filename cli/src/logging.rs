//! Logging for the REPL.
//!
//! Log lines go to `~/.config/chatsound/chatsound.log` (or platform
//! equivalent) with 10 MB rotation. The REPL shares stdout with its prompt, so
//! echoing log lines there is opt-in with `LOG_STDOUT=1`; when the log file
//! cannot be created stdout is used regardless. `DEBUG_LOGGING=1` enables
//! debug output for the chatsound crates.

use std::path::PathBuf;

use rolling_file::{BasicRollingFileAppender, RollingConditionBasic};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

const DEBUG_DIRECTIVE: &str = "info,chatsound_core=debug,chatsound_cli=debug";
const MAX_LOG_BYTES: u64 = 10 * 1024 * 1024;

/// Switches read from the environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct LogOptions {
    debug: bool,
    stdout: bool,
}

impl LogOptions {
    fn from_env() -> Self {
        Self::from_vars(
            std::env::var("DEBUG_LOGGING").ok().as_deref(),
            std::env::var("LOG_STDOUT").ok().as_deref(),
        )
    }

    /// `DEBUG_LOGGING` counts when set at all; `LOG_STDOUT` must be truthy
    fn from_vars(debug: Option<&str>, stdout: Option<&str>) -> Self {
        Self {
            debug: debug.is_some(),
            stdout: stdout.is_some_and(is_truthy),
        }
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::new(if self.debug { DEBUG_DIRECTIVE } else { "info" })
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn log_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|config| config.join("chatsound"))
}

/// Install the global subscriber.
///
/// Hold the returned guard for the life of the program so buffered lines are
/// flushed on exit. Returns `None` when logging fell back to stdout.
pub fn init() -> Option<WorkerGuard> {
    let options = LogOptions::from_env();

    let Some(dir) = log_dir() else {
        init_stdout_only(options);
        return None;
    };
    if let Err(e) = std::fs::create_dir_all(&dir) {
        // Subscriber not installed yet
        eprintln!("Failed to create log directory {dir:?}: {e}, logging to stdout");
        init_stdout_only(options);
        return None;
    }

    let log_path = dir.join("chatsound.log");
    let appender = match BasicRollingFileAppender::new(
        &log_path,
        RollingConditionBasic::new().max_size(MAX_LOG_BYTES),
        1, // chatsound.log and chatsound.log.1
    ) {
        Ok(appender) => appender,
        Err(e) => {
            eprintln!("Failed to create log file at {log_path:?}: {e}, logging to stdout");
            init_stdout_only(options);
            return None;
        }
    };
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_span_events(FmtSpan::NONE);
    let stdout_layer = options.stdout.then(|| {
        fmt::layer()
            .with_writer(std::io::stdout)
            .with_target(true)
            .with_span_events(FmtSpan::NONE)
    });

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stdout_layer)
        .with(options.filter())
        .init();

    tracing::info!(
        log_file = ?log_path,
        debug_logging = options.debug,
        stdout = options.stdout,
        "chatsound logging initialized"
    );

    Some(guard)
}

fn init_stdout_only(options: LogOptions) {
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stdout)
                .with_target(true)
                .with_span_events(FmtSpan::NONE),
        )
        .with(options.filter())
        .init();

    tracing::info!(debug_logging = options.debug, "chatsound logging initialized (stdout only)");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stdout_echo_is_opt_in() {
        assert_eq!(LogOptions::from_vars(None, None), LogOptions::default());
        assert!(LogOptions::from_vars(None, Some("1")).stdout);
        assert!(LogOptions::from_vars(None, Some(" TRUE ")).stdout);
        assert!(!LogOptions::from_vars(None, Some("0")).stdout);
        assert!(!LogOptions::from_vars(None, Some("")).stdout);
    }

    #[test]
    fn debug_logging_only_needs_to_be_set() {
        assert!(LogOptions::from_vars(Some(""), None).debug);
        assert!(LogOptions::from_vars(Some("0"), None).debug);
        assert!(!LogOptions::from_vars(None, None).debug);
    }
}

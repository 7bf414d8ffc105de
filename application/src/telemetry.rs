//! Logging setup.
//!
//! Warnings and errors go to `stderr`, everything else goes to `stdout`.
//! The verbosity stays at [`log::Level::INFO`] until [`set_level()`] is
//! called with the configured one.

use std::{io, sync::OnceLock};

use tracing::{self as log, Subscriber};
use tracing_subscriber::{
    filter::filter_fn,
    fmt::MakeWriter,
    layer::{Layer, SubscriberExt as _},
    registry::LookupSpan,
    util::SubscriberInitExt as _,
};

/// Configured verbosity, if already known.
static LEVEL: OnceLock<log::Level> = OnceLock::new();

/// Installs the global logger.
///
/// # Panics
///
/// If a global logger is installed already.
pub fn init() {
    tracing_subscriber::registry()
        .with(output(io::stdout, false))
        .with(output(io::stderr, true))
        .init();
}

/// Sets the verbosity of the global logger.
///
/// Only the first call has any effect.
pub fn set_level(level: log::Level) {
    if LEVEL.set(level).is_err() {
        log::warn!("log level is set already, `{level}` is ignored");
    }
}

/// Builds a compact formatting [`Layer`] writing into the provided `writer`
/// either the severe events only (warnings and errors), or all the others.
fn output<S, W>(
    writer: W,
    severe: bool,
) -> impl Layer<S> + Send + Sync
where
    S: Subscriber + for<'s> LookupSpan<'s>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt::layer()
        .compact()
        .with_ansi(true)
        .with_thread_names(true)
        .with_writer(writer)
        .with_filter(filter_fn(move |meta| {
            if meta.is_span() {
                return true;
            }
            let level = *meta.level();
            let verbosity = LEVEL.get().copied().unwrap_or(log::Level::INFO);
            is_severe(level) == severe && level <= verbosity
        }))
}

/// Indicates whether the provided `level` is a warning or an error.
fn is_severe(level: log::Level) -> bool {
    level <= log::Level::WARN
}

#[cfg(test)]
mod spec {
    use tracing as log;

    use super::is_severe;

    #[test]
    fn splits_levels_by_severity() {
        assert!(is_severe(log::Level::ERROR));
        assert!(is_severe(log::Level::WARN));
        assert!(!is_severe(log::Level::INFO));
        assert!(!is_severe(log::Level::DEBUG));
        assert!(!is_severe(log::Level::TRACE));
    }
}

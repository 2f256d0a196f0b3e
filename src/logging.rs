//! Log output in NZBGet's script format
//!
//! NZBGet reads a script's stdout line by line and takes the log level from a
//! bracketed prefix: `[INFO]`, `[DETAIL]`, `[WARNING]`, `[ERROR]` or `[DEBUG]`.
//! [`NzbGetFormat`] renders `tracing` events that way, mapping `debug!` to
//! `[DETAIL]` and `trace!` to `[DEBUG]`.

use std::fmt;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

/// Filter used when `RUST_LOG` is not set
const DEFAULT_FILTER: &str = "nzb_password_detector=debug";

/// NZBGet prefix for a tracing level
pub fn level_prefix(level: Level) -> &'static str {
    match level {
        Level::ERROR => "ERROR",
        Level::WARN => "WARNING",
        Level::INFO => "INFO",
        Level::DEBUG => "DETAIL",
        Level::TRACE => "DEBUG",
    }
}

/// Event formatter producing `[LEVEL] message key=value` lines
#[derive(Debug, Clone, Copy, Default)]
pub struct NzbGetFormat;

impl<S, N> FormatEvent<S, N> for NzbGetFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        write!(writer, "[{}] ", level_prefix(*event.metadata().level()))?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Install the stdout subscriber
///
/// `RUST_LOG` overrides the default filter. Installing twice is a no-op.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(std::io::stdout)
        .event_format(NzbGetFormat)
        .try_init()
        .ok();
}

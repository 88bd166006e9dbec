//! Log sink setup.
//!
//! Events go to two places:
//!
//! - the run log in the output directory, one `LEVEL timestamp - message` line per event
//! - stderr, in the compact default format without time or target
//!
//! When the run aborts before touching the filesystem only the stderr sink is
//! installed.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Timestamp layout for run log lines, e.g. `2024-05-01 13:02:11,482`
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// Formats events as `LEVEL timestamp - message`
#[derive(Debug, Clone, Copy, Default)]
pub struct RunLogFormat;

impl<S, N> FormatEvent<S, N> for RunLogFormat
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
        let now = chrono::Local::now().format(TIMESTAMP_FORMAT);
        write!(writer, "{} {now} - ", event.metadata().level())?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

fn filter(verbose: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new("amplicon_qc=debug,warn")
    } else {
        EnvFilter::new("amplicon_qc=info,warn")
    }
}

/// Open (append) the run log file
///
/// # Errors
///
/// Returns an I/O error if the file cannot be created.
pub fn open_run_log(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

fn stderr_layer<S>(verbose: bool) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    tracing_subscriber::fmt::layer()
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .with_filter(filter(verbose))
}

/// Install the global subscriber: run log file plus stderr.
///
/// # Errors
///
/// Returns an error if the run log cannot be opened or a global subscriber
/// is already installed.
pub fn init(run_log: &Path, verbose: bool) -> anyhow::Result<()> {
    let file = open_run_log(run_log)?;

    let file_layer = tracing_subscriber::fmt::layer()
        .event_format(RunLogFormat)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .with_filter(filter(verbose));

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer(verbose))
        .try_init()?;
    Ok(())
}

/// Install a stderr-only subscriber, for runs that must not touch the output
/// directory.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_stderr(verbose: bool) -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(stderr_layer(verbose))
        .try_init()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_log_line_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.log");
        let file = open_run_log(&path).unwrap();

        let subscriber = tracing_subscriber::registry().with(
            tracing_subscriber::fmt::layer()
                .event_format(RunLogFormat)
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        );
        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!("Manifest line {} failed", 3);
        });

        let text = std::fs::read_to_string(&path).unwrap();
        let line = text.lines().next().unwrap();
        assert!(line.starts_with("WARN "), "{line}");
        assert!(line.ends_with(" - Manifest line 3 failed"), "{line}");

        // "WARN " + "YYYY-MM-DD HH:MM:SS,mmm"
        let stamp = &line[5..28];
        assert!(
            chrono::NaiveDateTime::parse_from_str(stamp, "%Y-%m-%d %H:%M:%S,%3f").is_ok(),
            "{stamp}"
        );
    }
}

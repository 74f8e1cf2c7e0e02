//! Tracing setup and structured span helpers
//!
//! The CLI calls [`init_tracing`] once. Library code only emits events; it
//! never installs a subscriber.

use tracing::{Level, span};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Initialize the global tracing subscriber (stderr).
///
/// `RUST_LOG` wins when set. Otherwise compact mode logs quorum at `info`,
/// verbose mode at `debug` with targets and span-close timings.
pub fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            if verbose {
                EnvFilter::try_new("quorum=debug,info")
            } else {
                EnvFilter::try_new("quorum=info,warn")
            }
        })
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if verbose {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_line_number(false)
                    .with_file(false)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_line_number(false)
                    .with_file(false)
                    .compact(),
            )
            .try_init()?;
    }

    Ok(())
}

/// Span covering one phase (task fan-out, join, gate)
pub fn phase_span(phase: &str, ordinal: usize) -> tracing::Span {
    span!(Level::INFO, "phase", phase = %phase, ordinal = ordinal)
}

/// Span covering one task's adapter call sequence
pub fn task_span(phase: &str, task: &str, service: &str) -> tracing::Span {
    span!(
        Level::INFO,
        "task",
        phase = %phase,
        task = %task,
        service = %service,
    )
}

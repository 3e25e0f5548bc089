use std::path::Path;

use anyhow::Context;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Install the global subscriber.
///
/// Logs go to stderr so command output on stdout stays clean. With a log
/// directory, a daily-rolling file gets the same events. The returned guards
/// must be held until exit or buffered lines are lost.
pub fn init(
    level: Level,
    log_dir: Option<&Path>,
) -> anyhow::Result<Vec<tracing_appender::non_blocking::WorkerGuard>> {
    use tracing_subscriber::fmt::format::FmtSpan;

    let mut guards = Vec::new();

    let (stderr_writer, stderr_guard) = tracing_appender::non_blocking(std::io::stderr());
    guards.push(stderr_guard);

    let stderr_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(stderr_writer)
        .with_filter(env_filter(level));

    if let Some(log_dir) = log_dir {
        std::fs::create_dir_all(log_dir)
            .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;

        let file_appender = tracing_appender::rolling::daily(log_dir, "replica.log");
        let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);
        guards.push(file_guard);

        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(file_writer)
            .with_ansi(false)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(env_filter(level));

        tracing_subscriber::registry()
            .with(stderr_layer)
            .with(file_layer)
            .try_init()
            .context("failed to install tracing subscriber")?;
    } else {
        tracing_subscriber::registry()
            .with(stderr_layer)
            .try_init()
            .context("failed to install tracing subscriber")?;
    }

    Ok(guards)
}

/// `RUST_LOG` wins over the default level.
fn env_filter(level: Level) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy()
}

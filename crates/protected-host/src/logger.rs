use std::path::Path;

use tracing::{
    Level, info,
    subscriber::{SetGlobalDefaultError, set_global_default},
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt::format::FmtSpan, layer::SubscriberExt};

const LOG_FILE: &str = "protected-host.log";

/// Logs to stdout and, if `log_dir` is set, to a file inside it.
///
/// The returned guards flush the writers when dropped.
pub fn setup_logger(
    debug: bool,
    log_dir: Option<&Path>,
) -> Result<Vec<WorkerGuard>, SetGlobalDefaultError> {
    let level = if debug { Level::DEBUG } else { Level::INFO };

    let filter = tracing_subscriber::filter::Targets::new()
        .with_default(level)
        .with_target("winit", Level::WARN);

    // stdout logger
    let (std_writer, std_guard) = tracing_appender::non_blocking(std::io::stdout());
    let std_logger = tracing_subscriber::fmt::layer()
        .with_writer(std_writer)
        .with_ansi(false)
        .with_target(false)
        .with_span_events(FmtSpan::CLOSE);

    // file logger
    let (file_logger, file_guard) = match log_dir {
        Some(log_dir) => {
            let appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
            let (file_writer, file_guard) = tracing_appender::non_blocking(appender);

            let file_logger = tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_target(false)
                .with_span_events(FmtSpan::CLOSE);

            (Some(file_logger), Some(file_guard))
        }
        None => (None, None),
    };

    // Register loggers
    let collector = tracing_subscriber::registry()
        .with(std_logger)
        .with(file_logger)
        .with(filter);

    set_global_default(collector)?;

    info!("Application Start");

    let mut guards = vec![std_guard];
    guards.extend(file_guard);
    Ok(guards)
}

use std::io;
use tracing_appender::rolling;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Stdout gets a quiet view; the daily-rolling file keeps the per-request
/// detail needed to debug a misbehaving model endpoint.
pub fn configure_logging() {
    let stdout_log = fmt::layer()
        .with_writer(io::stdout)
        .with_target(false)
        .with_filter(EnvFilter::new("warn,pipeline=info,sqlx=off"));

    let file_appender = rolling::daily("logs", "rivals.log");
    let file_log = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_filter(EnvFilter::new("info,llm_request=debug,db_query=debug"));

    tracing_subscriber::Registry::default()
        .with(stdout_log)
        .with(file_log)
        .init();
}

//! Command handlers -- one module per subcommand

pub mod config;
pub mod formats;
pub mod parse;
pub mod run;

use std::path::{Path, PathBuf};

use lognorm_core::config::LognormConfig;
use lognorm_core::types::StructuredRecord;
use lognorm_log_pipeline::{LogPipeline, PipelineReport};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::CliError;
use crate::output::RecordWriter;

/// Configuration file used when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "lognorm.toml";

/// Resolve the configuration file path.
///
/// An explicit path is always used. Otherwise `lognorm.toml` is used only if it exists.
pub fn config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_PATH);
            default.exists().then_some(default)
        }
    }
}

/// Load the effective configuration (file + env overrides + defaults).
pub async fn load_config(path: Option<&Path>) -> Result<LognormConfig, CliError> {
    match path {
        Some(path) => Ok(LognormConfig::load(path).await?),
        None => {
            let mut config = LognormConfig::default();
            config.apply_env_overrides();
            config.validate()?;
            Ok(config)
        }
    }
}

/// Drain records from a running pipeline to stdout until every stream ends.
///
/// SIGINT/SIGTERM cancels the streams between lines. A failed stdout write
/// cancels the streams as well and is reported after they stop.
pub(crate) async fn emit_records(
    pipeline: LogPipeline,
    mut records: mpsc::Receiver<StructuredRecord>,
) -> Result<PipelineReport, CliError> {
    let cancel = pipeline.cancel_token();
    let signal = tokio::spawn(cancel_on_signal(cancel.clone()));
    let waiter = tokio::spawn(pipeline.wait());

    let mut out = RecordWriter::stdout();
    let mut written = Ok(());
    while let Some(record) = records.recv().await {
        if let Err(e) = out.write_record(&record).await {
            cancel.cancel();
            written = Err(e);
            break;
        }
    }
    drop(records);
    let flushed = out.flush().await;
    signal.abort();

    let report = waiter
        .await
        .map_err(|e| CliError::Command(format!("pipeline task failed: {e}")))?;
    written?;
    flushed?;

    let total = report.total();
    info!(
        streams = report.streams.len(),
        processed = total.processed,
        emitted = total.emitted,
        skipped = total.skipped,
        enrich_failures = total.enrich_failures,
        "normalization finished"
    );

    match report.failed() {
        0 => Ok(report),
        failed => Err(CliError::StreamsFailed {
            failed,
            total: report.streams.len(),
        }),
    }
}

/// Cancel the pipeline on SIGINT or SIGTERM.
async fn cancel_on_signal(cancel: CancellationToken) {
    match wait_for_shutdown_signal().await {
        Ok(signal) => {
            info!(signal, "shutdown signal received, stopping streams");
            cancel.cancel();
        }
        Err(e) => warn!(error = %e, "signal handlers unavailable"),
    }
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("ctrl-c")
}

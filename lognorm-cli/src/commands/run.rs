//! `lognorm run` command handler

use lognorm_core::config::LognormConfig;
use lognorm_log_pipeline::{LogPipelineBuilder, PipelineConfig};
use tracing::info;

use crate::cli::RunArgs;
use crate::commands::emit_records;
use crate::error::CliError;

/// Execute the `run` command.
///
/// Streams every configured source (or the `--source` subset) concurrently
/// and writes the records to stdout.
pub async fn execute(args: RunArgs, config: &LognormConfig) -> Result<(), CliError> {
    let pipeline_config = select_sources(&args, config)?;
    info!(streams = pipeline_config.streams.len(), "running configured sources");

    let (mut pipeline, records) = LogPipelineBuilder::new()
        .config(pipeline_config)
        .build()?;
    let records = records
        .ok_or_else(|| CliError::Pipeline("pipeline did not create a record channel".to_owned()))?;
    pipeline.spawn_configured().await?;

    emit_records(pipeline, records).await?;
    Ok(())
}

fn select_sources(args: &RunArgs, config: &LognormConfig) -> Result<PipelineConfig, CliError> {
    let mut pipeline = config.pipeline.clone();

    if !args.sources.is_empty() {
        if let Some(unknown) = args
            .sources
            .iter()
            .find(|name| !pipeline.sources.iter().any(|s| &s.name == *name))
        {
            return Err(CliError::Command(format!(
                "unknown source '{unknown}' (configured: {})",
                pipeline
                    .sources
                    .iter()
                    .map(|s| s.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        }
        pipeline.sources.retain(|s| args.sources.contains(&s.name));
    }

    if pipeline.sources.is_empty() {
        return Err(CliError::Config(
            "no sources configured, add [[pipeline.sources]] entries".to_owned(),
        ));
    }

    Ok(PipelineConfig::from_core(&pipeline)?)
}

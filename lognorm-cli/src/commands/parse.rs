//! `lognorm parse` command handler
//!
//! Every input file becomes one stream with the same parser settings. Without
//! files a single stream reads stdin.

use std::path::Path;

use lognorm_core::config::{LognormConfig, SourceConfig};
use lognorm_log_pipeline::{
    LogPipelineBuilder, ParserRegistry, PipelineConfig, StreamDriver, StreamSpec,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::info;

use crate::cli::ParseArgs;
use crate::commands::emit_records;
use crate::error::CliError;
use crate::output::RecordWriter;

/// Stream name used for stdin.
const STDIN_STREAM: &str = "stdin";

/// Execute the `parse` command.
pub async fn execute(args: ParseArgs, config: &LognormConfig) -> Result<(), CliError> {
    let pipeline_config = pipeline_config(&args, config)?;

    if args.diagnostic {
        return execute_diagnostic(&pipeline_config).await;
    }

    info!(
        source_type = %args.source_type,
        streams = pipeline_config.streams.len(),
        enrich = args.enrich,
        "parsing input"
    );

    let (mut pipeline, records) = LogPipelineBuilder::new()
        .config(pipeline_config)
        .build()?;
    let records = records
        .ok_or_else(|| CliError::Pipeline("pipeline did not create a record channel".to_owned()))?;
    pipeline.spawn_configured().await?;

    emit_records(pipeline, records).await?;
    Ok(())
}

/// Build one source per input file from the command-line options.
///
/// The sources are validated with the same rules as sources from the config file.
fn pipeline_config(args: &ParseArgs, config: &LognormConfig) -> Result<PipelineConfig, CliError> {
    let template = SourceConfig {
        source_type: args.source_type.as_str().to_owned(),
        enrich: args.enrich,
        reference_year: args.reference_year,
        message_field: args.message_field.clone(),
        overwrite: !args.no_overwrite,
        ..Default::default()
    };

    let sources = if args.files.is_empty() {
        vec![SourceConfig {
            name: STDIN_STREAM.to_owned(),
            ..template
        }]
    } else {
        args.files
            .iter()
            .map(|path| SourceConfig {
                name: path.display().to_string(),
                path: Some(path.display().to_string()),
                ..template.clone()
            })
            .collect()
    };

    let mut effective = config.clone();
    effective.pipeline.sources = sources;
    effective.validate()?;

    Ok(PipelineConfig::from_core(&effective.pipeline)?)
}

/// Process the inputs one after another, echoing every line with its outcome.
async fn execute_diagnostic(config: &PipelineConfig) -> Result<(), CliError> {
    let registry = ParserRegistry::new()?;
    let mut out = RecordWriter::stdout();

    for spec in &config.streams {
        let mut driver = StreamDriver::from_spec(spec, &registry, config.max_line_length)?;
        let mut reader = open_input(spec).await?;
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let read = reader
                .read_until(b'\n', &mut buf)
                .await
                .map_err(|e| CliError::Input(format!("{}: {e}", spec.name)))?;
            if read == 0 {
                break;
            }

            let text = String::from_utf8_lossy(&buf);
            let line = text.trim();
            let record = driver.process_line(line);
            out.write_diagnostic(line, record.as_ref()).await?;
        }

        let stats = driver.stats();
        info!(
            stream = %spec.name,
            processed = stats.processed,
            emitted = stats.emitted,
            skipped = stats.skipped,
            "diagnostic pass finished"
        );
    }

    out.flush().await
}

async fn open_input(spec: &StreamSpec) -> Result<Box<dyn AsyncBufRead + Unpin + Send>, CliError> {
    match &spec.path {
        Some(path) => Ok(Box::new(BufReader::new(open_file(path).await?))),
        None => Ok(Box::new(BufReader::new(tokio::io::stdin()))),
    }
}

async fn open_file(path: &Path) -> Result<tokio::fs::File, CliError> {
    tokio::fs::File::open(path)
        .await
        .map_err(|e| CliError::Input(format!("failed to open {}: {e}", path.display())))
}

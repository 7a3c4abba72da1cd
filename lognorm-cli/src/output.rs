//! Output formatting for reports and records
//!
//! Reports (formats list, config) flow through [`OutputWriter`], which switches
//! between text and JSON. Normalized records flow through [`RecordWriter`], which
//! always writes one JSON object per line.

use std::io::Write;

use lognorm_core::types::StructuredRecord;
use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};

use crate::cli::OutputFormat;
use crate::error::CliError;

/// Marker printed before the record in diagnostic mode.
pub const DIAGNOSTIC_MARKER: &str = "⤷";

/// Abstraction for writing CLI reports in different formats.
///
/// Subcommand handlers call `writer.render(&payload)` where `payload`
/// implements both `Serialize` (for JSON) and `Render` (for text).
pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    /// Create a new output writer with the specified format.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Render a payload to stdout.
    pub fn render<T: Render + Serialize>(&self, payload: &T) -> Result<(), CliError> {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        self.render_to(payload, &mut handle)
    }

    /// Render a payload to an arbitrary writer.
    ///
    /// For `Text` format, delegates to `Render::render_text()`.
    /// For `Json` format, serialises via `serde_json`.
    pub fn render_to<T: Render + Serialize>(
        &self,
        payload: &T,
        w: &mut dyn Write,
    ) -> Result<(), CliError> {
        match self.format {
            OutputFormat::Text => {
                payload.render_text(w)?;
            }
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut *w, payload)?;
                writeln!(w)?;
            }
        }
        Ok(())
    }
}

/// Trait for human-readable text rendering.
///
/// Implemented by every CLI report alongside `serde::Serialize`.
pub trait Render {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()>;
}

/// Buffered JSON-lines writer for normalized records.
pub struct RecordWriter<W: AsyncWrite + Unpin> {
    inner: BufWriter<W>,
}

impl RecordWriter<tokio::io::Stdout> {
    /// Records go to stdout.
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

impl<W: AsyncWrite + Unpin> RecordWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner: BufWriter::new(inner),
        }
    }

    /// Write one record as a JSON line.
    pub async fn write_record(&mut self, record: &StructuredRecord) -> Result<(), CliError> {
        let line = record.to_json_line()?;
        self.inner.write_all(line.as_bytes()).await?;
        self.inner.write_all(b"\n").await?;
        Ok(())
    }

    /// Write the input line followed by `⤷ <record>`, or `⤷ null` for a skipped line.
    pub async fn write_diagnostic(
        &mut self,
        line: &str,
        record: Option<&StructuredRecord>,
    ) -> Result<(), CliError> {
        let rendered = match record {
            Some(record) => record.to_json_line()?,
            None => "null".to_owned(),
        };
        let block = format!("{line}\n{DIAGNOSTIC_MARKER} {rendered}\n");
        self.inner.write_all(block.as_bytes()).await?;
        Ok(())
    }

    /// Flush buffered output.
    pub async fn flush(&mut self) -> Result<(), CliError> {
        self.inner.flush().await?;
        Ok(())
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.inner.into_inner()
    }
}

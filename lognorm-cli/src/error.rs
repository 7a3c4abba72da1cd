//! CLI-specific error types and exit code mapping

use lognorm_core::error::LognormError;
use lognorm_log_pipeline::LogPipelineError;

/// CLI-specific error type.
///
/// Each variant carries enough context for a user-friendly message.
/// The `exit_code()` method maps errors to process exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// An input file or stdin could not be opened or read.
    #[error("input error: {0}")]
    Input(String),

    /// One or more streams ended with an error.
    #[error("{failed} of {total} streams failed")]
    StreamsFailed { failed: usize, total: usize },

    /// Pipeline construction or execution error.
    #[error("pipeline error: {0}")]
    Pipeline(String),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from lognorm-core.
    #[error("{0}")]
    Core(#[from] LognormError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                      |
    /// |------|------------------------------|
    /// | 0    | Success                      |
    /// | 1    | General / command error      |
    /// | 2    | Configuration error          |
    /// | 3    | Input not readable           |
    /// | 4    | Some streams failed          |
    /// | 10   | IO error                     |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Core(LognormError::Config(_)) => 2,
            Self::Input(_) => 3,
            Self::StreamsFailed { .. } => 4,
            Self::Io(_) => 10,
            Self::JsonSerialize(_) | Self::Command(_) | Self::Pipeline(_) | Self::Core(_) => 1,
        }
    }
}

impl From<LogPipelineError> for CliError {
    fn from(e: LogPipelineError) -> Self {
        match e {
            LogPipelineError::Config { .. } => Self::Config(e.to_string()),
            LogPipelineError::Stream { .. } => Self::Input(e.to_string()),
            other => Self::Pipeline(other.to_string()),
        }
    }
}

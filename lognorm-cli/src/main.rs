mod cli;
mod commands;
mod error;
mod logging;
mod output;

use std::process::ExitCode;

use clap::Parser;
use lognorm_core::config::GeneralConfig;

use crate::cli::{Cli, Commands};
use crate::error::CliError;
use crate::output::OutputWriter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(u8::try_from(e.exit_code()).unwrap_or(1))
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let writer = OutputWriter::new(cli.output);
    let config_path = commands::config_path(cli.config.as_deref());

    // config commands report load failures themselves, so logging starts from defaults
    if let Commands::Config(args) = cli.command {
        init_logging(&GeneralConfig::default(), cli.log_level.as_deref())?;
        return commands::config::execute(args, config_path.as_deref(), &writer).await;
    }

    let config = commands::load_config(config_path.as_deref()).await?;
    init_logging(&config.general, cli.log_level.as_deref())?;
    tracing::debug!(config = ?config_path, "configuration loaded");
    // no-op unless an embedding process installs a recorder
    lognorm_core::metrics::describe_all();

    match cli.command {
        Commands::Parse(args) => commands::parse::execute(args, &config).await,
        Commands::Run(args) => commands::run::execute(args, &config).await,
        Commands::Formats => commands::formats::execute(&writer),
        Commands::Config(_) => unreachable!(),
    }
}

fn init_logging(general: &GeneralConfig, level: Option<&str>) -> Result<(), CliError> {
    logging::init_tracing(general, level).map_err(|e| CliError::Command(e.to_string()))
}

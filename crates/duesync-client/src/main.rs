//! duesync CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use duesync_core::{TracingConfig, init_tracing};

use duesync_client::cli::{Cli, Command, ConfigAction};
use duesync_client::commands;
use duesync_client::config::ClientConfig;
use duesync_client::error::{ClientError, ClientResult};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(TracingConfig::from_flags(cli.debug, cli.log_json)) {
        eprintln!("error: failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ClientResult<()> {
    let config_path = cli.config.clone().unwrap_or_else(ClientConfig::default_path);
    let config = if cli.config.is_some() {
        ClientConfig::load_from(&config_path)
    } else {
        ClientConfig::load()
    }
    .map_err(ClientError::Config)?;

    match cli.command {
        Command::Normalize(args) => commands::normalize::run(&config, args).await,
        Command::Sync(args) => commands::sync::run(&config, args).await,
        Command::Config { action } => match action {
            ConfigAction::Dump => commands::config::dump(&config, &config_path),
            ConfigAction::Validate => commands::config::validate(&config),
            ConfigAction::Path => commands::config::path(&config_path),
        },
    }
}

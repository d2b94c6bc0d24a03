mod cli;
mod commands;
mod settings;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use http::StatusCode;
use tracing_subscriber::EnvFilter;

use kubeglance_health::HealthError;
use kubeglance_k8s::{ConnectionError, CredentialSources, KubeClient};

use crate::cli::{Cli, Command};
use crate::settings::Settings;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing for debugging
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref()))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            if let Some(status) = status_code(&e) {
                eprintln!("Status: {}", status);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let settings = Settings::load(cli.config.as_deref())?;
    let sources = CredentialSources::load(cli.kubeconfig.as_deref())
        .context("failed to load kubeconfig")?;
    let client = KubeClient::new(sources);

    match cli.command {
        Command::Contexts { json } => commands::contexts(&client, json),
        Command::Summary(args) => commands::summary(&client, &settings, args).await,
        Command::Info { context } => commands::info(&client, context.as_deref()).await,
    }
}

const DEFAULT_LOG_LEVEL: &str = "warn";

/// Log filter from `RUST_LOG` directives, `warn` when unset or invalid
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_LEVEL))
}

/// HTTP status an API layer would report for `error`
fn status_code(error: &anyhow::Error) -> Option<StatusCode> {
    if let Some(error) = error.downcast_ref::<HealthError>() {
        return Some(error.status_code());
    }
    error
        .downcast_ref::<ConnectionError>()
        .map(ConnectionError::status_code)
}

pub mod cli;
pub mod core;
pub mod providers;

use crate::core::config::AppConfig;
use crate::core::{ConversionRequest, CurrencyCode, RateSession};
use anyhow::{Context, Result};
use std::io::Write;
use tracing::{debug, info};

pub enum AppCommand {
    Convert {
        amount: Option<f64>,
        from: Option<String>,
        to: Option<String>,
    },
    Rates,
    Interactive,
}

fn parse_code(value: Option<&str>, default: &CurrencyCode) -> Result<CurrencyCode> {
    match value {
        Some(code) => code.parse().context("Failed to parse currency argument"),
        None => Ok(default.clone()),
    }
}

/// Builds the initial conversion from command arguments, filling gaps from config.
pub fn build_request(
    config: &AppConfig,
    amount: Option<f64>,
    from: Option<&str>,
    to: Option<&str>,
) -> Result<ConversionRequest> {
    Ok(ConversionRequest::new(
        amount.unwrap_or(config.amount),
        parse_code(from, &config.source_currency)?,
        parse_code(to, &config.target_currency)?,
    ))
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    run_command_with_output(command, config_path, &mut std::io::stdout()).await
}

/// Runs a command, writing everything it renders to `output`.
pub async fn run_command_with_output<W: Write>(
    command: AppCommand,
    config_path: Option<&str>,
    output: &mut W,
) -> Result<()> {
    info!("Currency converter starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let provider = providers::VatComplyProvider::new(config.providers.vatcomply_url());

    match command {
        AppCommand::Convert { amount, from, to } => {
            let request = build_request(&config, amount, from.as_deref(), to.as_deref())?;
            cli::convert::run(&provider, &request, output).await
        }
        AppCommand::Rates => cli::rates::run(&provider, output).await,
        AppCommand::Interactive => {
            let request = build_request(&config, None, None, None)?;
            let session = RateSession::new();
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            cli::interactive::run(&session, &provider, request, stdin, output).await
        }
    }
}

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use tukar::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for tukar::AppCommand {
    fn from(cmd: Commands) -> tukar::AppCommand {
        match cmd {
            Commands::Convert { amount, from, to } => {
                tukar::AppCommand::Convert { amount, from, to }
            }
            Commands::Rates => tukar::AppCommand::Rates,
            Commands::Interactive => tukar::AppCommand::Interactive,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Convert an amount between two currencies
    Convert {
        /// Amount to convert (defaults to the configured amount)
        #[arg(allow_negative_numbers = true)]
        amount: Option<f64>,
        /// Source currency code, e.g. EUR
        from: Option<String>,
        /// Target currency code, e.g. USD
        to: Option<String>,
    },
    /// List today's exchange rates
    Rates,
    /// Convert interactively, recomputing on every change
    Interactive,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => tukar::cli::setup::setup(),
        Some(cmd) => tukar::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use common::Params;
use content_orchestrator::ContentOrchestrator;
use orchestration_config::ConfigManager;
use orchestrator_core::OrchestrationContext;

/// Content orchestration runtime
#[derive(Parser, Debug)]
#[command(name = "content-orchestrator", version, about)]
struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every registered orchestrator as JSON
    List,

    /// Dispatch one call and print the outcome as JSON
    Run {
        /// Orchestrator name
        name: String,

        /// Tenant the call runs for
        #[arg(long, default_value = "cli")]
        tenant: String,

        /// Parameters as a JSON object
        #[arg(long, default_value = "{}")]
        params: String,
    },

    /// Start background orchestrators and run until Ctrl+C
    Serve,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = ConfigManager::load(cli.config.as_deref()).context("failed to load configuration")?;
    let _log_guard = logging::init_logging(&config.settings().logging)?;
    let orchestrator = ContentOrchestrator::new(config.settings().clone())?;

    let code = match cli.command {
        Command::List => {
            println!("{}", serde_json::to_string_pretty(&orchestrator.list())?);
            ExitCode::SUCCESS
        }
        Command::Run { name, tenant, params } => {
            let value = serde_json::from_str(&params).context("--params must be valid JSON")?;
            let params = Params::from_value(value)?;
            let context = OrchestrationContext::new(tenant);

            let outcome = orchestrator.orchestrate(&name, &context, &params).await;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            if outcome.succeeded() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Command::Serve => {
            orchestrator.start().await?;
            info!("Content orchestrator running, press Ctrl+C to stop");
            tokio::signal::ctrl_c().await?;
            info!("Shutdown requested");
            ExitCode::SUCCESS
        }
    };

    if orchestrator.shutdown().await > 0 {
        return Ok(ExitCode::FAILURE);
    }
    Ok(code)
}

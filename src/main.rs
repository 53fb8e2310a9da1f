use std::process;

use anyhow::Context;
use bankwatch::adapter::inbound::cli::command::{Cli, Commands};
use bankwatch::adapter::inbound::cli::output::{self, OutputConfig};
use bankwatch::adapter::inbound::cli::{check, run, status};
use bankwatch::Error;
use clap::Parser;

/// Exit code for configuration and credential problems.
const EXIT_CONFIG: i32 = 2;

async fn dispatch(cli: &Cli) -> anyhow::Result<i32> {
    match &cli.command {
        Commands::Run => {
            let status = run::execute(&cli.config)
                .await
                .with_context(|| format!("cannot start with {}", cli.config.display()))?;
            Ok(status.code())
        }
        Commands::Check => {
            check::execute(&cli.config)?;
            Ok(0)
        }
        Commands::Status(args) => {
            status::execute(&cli.config, args)?;
            Ok(0)
        }
    }
}

fn exit_code(error: &anyhow::Error) -> i32 {
    match error.downcast_ref::<Error>() {
        Some(Error::Config(_)) => EXIT_CONFIG,
        _ => 1,
    }
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    output::configure(OutputConfig::new(cli.json, cli.quiet));

    let code = match dispatch(&cli).await {
        Ok(code) => code,
        Err(e) => {
            output::error(&format!("{e:#}"));
            exit_code(&e)
        }
    };
    process::exit(code);
}

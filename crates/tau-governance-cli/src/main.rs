mod cli_args;
mod run;

use std::process::ExitCode;

use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::cli_args::Cli;
use crate::run::{run, RunOutcome};

fn init_tracing() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match run(&cli).await {
        Ok(RunOutcome::Ignored(reason)) => {
            tracing::debug!(reason = reason.as_str(), "nothing to do");
            ExitCode::SUCCESS
        }
        Ok(RunOutcome::NoGovernance) | Ok(RunOutcome::Completed(_)) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!("governance run failed: {error:#}");
            ExitCode::FAILURE
        }
    }
}

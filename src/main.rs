mod cli;
mod execute;

use std::process::ExitCode;
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;
use setup_tool::error::SetupError;
use setup_tool::util::escape_workflow_data;
use crate::cli::CLI;

fn main() -> ExitCode {
    let cli = CLI::parse();
    init_tracing(cli.verbose);
    match execute::execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_failure(&err);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "setup_tool=debug" } else { "setup_tool=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

/// Marks the run as failed, as a workflow command when running in GitHub Actions.
fn report_failure(err: &anyhow::Error) {
    if let Some(setup_err) = err.downcast_ref::<SetupError>() {
        tracing::debug!(kind = setup_err.kind(), "setup failed");
    }
    let message = format!("{:#}", err);
    if std::env::var("GITHUB_ACTIONS").is_ok_and(|v| v == "true") {
        println!("::error::{}", escape_workflow_data(&message));
    }
    else {
        eprintln!("{} {}", "error:".red().bold(), message);
    }
}

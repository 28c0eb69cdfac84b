use clap::Parser;
use std::process::ExitCode;
use task_cli::Cli;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<ExitCode> {
    // stdout carries command output; diagnostics go to stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args = Cli::parse();
    let mut stdout = std::io::stdout().lock();
    let outcome = task_cli::run(args, &mut stdout)?;
    Ok(outcome.into())
}

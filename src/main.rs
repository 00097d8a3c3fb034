use clap::Parser;
use std::process::ExitCode;

use kinetic_queue::cli::Cli;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `KQ_LOG=kinetic_queue=debug`
const LOG_ENV: &str = "KQ_LOG";

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

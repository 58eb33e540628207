//! Tasklink CLI binary.

use anyhow::Result;
use tasklink::cli::Cli;
use tracing_subscriber::EnvFilter;

/// Main entry point for the tasklink CLI.
///
/// Every command is a short sequence of file I/O, so a current_thread
/// runtime is enough.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Logs go to stderr so `--json` output on stdout stays parseable.
    // Example: RUST_LOG=tasklink=debug tasklink dep add task-a1 task-b2
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tasklink=info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    tracing::debug!("Starting tasklink CLI");

    let cli = Cli::parse_args();
    cli.execute().await?;

    tracing::debug!("Tasklink CLI completed successfully");
    Ok(())
}

//! onboardoc CLI binary entry point
//!
//! Installs logging, then hands over to the library's `run_cli()`.

use anyhow::Result;
use onboardoc_cli::run_cli;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays clean for reports
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    run_cli().await
}

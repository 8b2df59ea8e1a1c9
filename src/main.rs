use anyhow::Result;
use blog_seeder::cli::{run, Cli};
use blog_seeder::report::report_outcome;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Logs go to stderr; default level is warn.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialise tracing: {e}"))?;
    tracing::info!("CLI application startup: tracing initialised, environment loaded");

    let cli = Cli::parse();
    tracing::info!(?cli, "CLI arguments parsed, invoking run");

    let outcome = run(cli).await;
    let code = report_outcome(&outcome);
    match &outcome {
        Ok(_) => tracing::info!("CLI completed successfully"),
        Err(e) => tracing::error!(error = %e, exit_code = code, "CLI exited with error"),
    }
    std::process::exit(code);
}

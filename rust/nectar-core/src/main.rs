// Nectar CLI - Entry point
// Principle: Supply is earned on a schedule, never printed on demand

use clap::Parser;
use nectar_core::cli::config::CliConfig;
use nectar_core::cli::runner::run;
use nectar_core::cli::Cli;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_filter = if cli.verbose {
        "debug"
    } else {
        cli.log_level.as_str()
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = CliConfig::from_cli(&cli).map_err(|e| {
        error!("Configuration error: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;
    debug!(
        "State at {}, evaluating at {}",
        config.state_path.display(),
        config.now
    );

    if let Err(e) = run(cli.command, &config) {
        error!("{}", e);
        return Err(anyhow::anyhow!("{}", e));
    }

    Ok(())
}

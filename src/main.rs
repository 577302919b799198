use clap::Parser;
use lme_prices::cli::{load_config, print_config, print_status, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config(&cli.config, &cli.command)?;

    // Initialize telemetry
    let _telemetry = lme_prices::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Resolve(args) => {
            tracing::info!(commodities = config.commodities.len(), "Starting resolution");
            args.execute(&config).await?;
        }
        Commands::Status => print_status(&config).await?,
        Commands::Config => print_config(&config),
    }

    Ok(())
}

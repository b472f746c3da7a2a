use clap::Parser;
use flujo::cli::{self, Cli, Commands};
use flujo::config::{AppConfig, LoggingConfig};
use flujo::error::Result;
use flujo::App;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_from(&cli.config)?;
    init_logging(&config.logging);

    let app = App::from_config(&config)?;

    let result = match &cli.command {
        Commands::Report {
            customer_id,
            start,
            end,
            guid,
            token,
        } => {
            cli::run_report(
                &app,
                customer_id,
                *start,
                *end,
                guid.as_deref(),
                token.as_deref(),
            )
            .await
        }
        Commands::Customer { id, no_fallback } => cli::run_customer(&app, *id, *no_fallback).await,
    };

    if cli.stats {
        cli::print_breaker_stats(&app.registry)?;
    }

    if let Err(ref e) = result {
        error!("{}", e);
    }
    result
}

fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},flujo=debug", logging.level)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr);

    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

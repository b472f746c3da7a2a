use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde_json::json;

use crate::adapters::CallContext;
use crate::bootstrap::App;
use crate::error::Result;
use crate::resilience::ResilienceRegistry;

#[derive(Parser)]
#[command(name = "flujo")]
#[command(version = "0.1.0")]
#[command(about = "Customer account reports over the banking services", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config directory (default.toml, then $FLUJO_ENV.toml)
    #[arg(short, long, default_value = "config")]
    pub config: String,

    /// Print circuit breaker statistics after the command
    #[arg(long)]
    pub stats: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a customer's account and movement report
    Report {
        /// Customer ID
        #[arg(long)]
        customer_id: String,
        /// First day of the window (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,
        /// Last day of the window (YYYY-MM-DD)
        #[arg(long)]
        end: NaiveDate,
        /// Correlation id forwarded as x-guid (generated when absent)
        #[arg(long)]
        guid: Option<String>,
        /// Bearer token forwarded to the services
        #[arg(long, env = "FLUJO_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },
    /// Look up a customer, degrading to a placeholder when the service is down
    Customer {
        /// Customer ID
        #[arg(long)]
        id: i64,
        /// Fail instead of returning the placeholder customer
        #[arg(long)]
        no_fallback: bool,
    },
}

pub async fn run_report(
    app: &App,
    customer_id: &str,
    start: NaiveDate,
    end: NaiveDate,
    guid: Option<&str>,
    token: Option<&str>,
) -> Result<()> {
    let context = match guid {
        Some(guid) => CallContext::new(Some(guid), Some("CLI"), None, Some("flujo"), None, token),
        None => CallContext::generated("flujo", token),
    };

    let report = app
        .reports
        .generate_report(customer_id, start, end, &context)
        .await?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

pub async fn run_customer(app: &App, id: i64, no_fallback: bool) -> Result<()> {
    let customer = if no_fallback {
        app.customers.get_by_id(id).await?
    } else {
        app.customers.get_by_id_with_protection(id).await?
    };

    if customer.is_placeholder() {
        eprintln!("warning: customer service degraded, showing placeholder data");
    }
    println!("{}", serde_json::to_string_pretty(&customer)?);
    Ok(())
}

pub fn print_breaker_stats(registry: &ResilienceRegistry) -> Result<()> {
    let stats: Vec<_> = registry
        .snapshot()
        .into_iter()
        .map(|s| {
            json!({
                "dependency": s.name,
                "state": s.state.to_string(),
                "windowCalls": s.window_calls,
                "failureRate": s.failure_rate,
                "totalTrips": s.total_trips,
                "rejectedCalls": s.rejected_calls,
            })
        })
        .collect();

    eprintln!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

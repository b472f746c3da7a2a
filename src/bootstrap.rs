//! Wires the HTTP adapters, the resilience registry and the services from config.

use std::sync::Arc;
use tracing::info;

use crate::adapters::{HttpAccountLookup, HttpCustomerLookup, HttpMovementLookup, RemoteClient};
use crate::config::{AppConfig, ACCOUNT_SERVICE, CUSTOMER_SERVICE, MOVEMENT_SERVICE};
use crate::error::{FlujoError, Result};
use crate::resilience::ResilienceRegistry;
use crate::services::{CustomerService, MovementFetcher, ReportAggregator};

pub struct App {
    pub registry: Arc<ResilienceRegistry>,
    pub reports: ReportAggregator,
    pub customers: CustomerService,
}

impl App {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        config.validate().map_err(|errors| {
            FlujoError::Config(::config::ConfigError::Message(errors.join("; ")))
        })?;

        let registry = Arc::new(ResilienceRegistry::new(config.resilience.clone()));

        let accounts = HttpAccountLookup::new(RemoteClient::new(
            ACCOUNT_SERVICE,
            &config.services.accounts,
        )?);
        let movements = HttpMovementLookup::new(RemoteClient::new(
            MOVEMENT_SERVICE,
            &config.services.movements,
        )?);
        let customers = HttpCustomerLookup::new(RemoteClient::new(
            CUSTOMER_SERVICE,
            &config.services.customers,
        )?);

        let reports = ReportAggregator::new(
            Arc::new(accounts),
            registry.policy(ACCOUNT_SERVICE),
            MovementFetcher::new(Arc::new(movements), registry.policy(MOVEMENT_SERVICE)),
        );
        let customers = CustomerService::new(Arc::new(customers), registry.policy(CUSTOMER_SERVICE));

        info!(
            "Services wired: accounts={} movements={} customers={}",
            config.services.accounts.base_url,
            config.services.movements.base_url,
            config.services.customers.base_url
        );

        Ok(Self {
            registry,
            reports,
            customers,
        })
    }
}

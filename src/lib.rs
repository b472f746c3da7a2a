pub mod adapters;
pub mod bootstrap;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;
pub mod resilience;
pub mod services;

pub use adapters::{CallContext, RemoteClient};
pub use bootstrap::App;
pub use config::AppConfig;
pub use domain::{Account, AccountType, Customer, DateRange, Movement, MovementType, Report, Summary};
pub use error::{CallError, CallResult, ErrorKind, FlujoError, Result};
pub use ports::{AccountLookup, CustomerLookup, MovementLookup};
pub use resilience::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerStats, CircuitState, FallbackPolicy,
    RateLimiter, ResiliencePolicy, ResilienceRegistry, RetryPolicy,
};
pub use services::{CustomerService, MovementFetcher, ReportAggregator};

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Dependency name used for the account service.
pub const ACCOUNT_SERVICE: &str = "accountService";
/// Dependency name used for the movement service.
pub const MOVEMENT_SERVICE: &str = "movementService";
/// Dependency name used for the customer service.
pub const CUSTOMER_SERVICE: &str = "customerService";

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub services: ServicesConfig,
    #[serde(default)]
    pub resilience: ResilienceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServicesConfig {
    pub accounts: TargetConfig,
    pub movements: TargetConfig,
    pub customers: TargetConfig,
}

/// One upstream service reachable over HTTP
#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    /// Base URL, e.g. "http://localhost:8081"
    pub base_url: String,
    /// Time allowed to establish the TCP connection
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Time allowed for the whole response once connected
    #[serde(default = "default_response_timeout_ms")]
    pub response_timeout_ms: u64,
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_response_timeout_ms() -> u64 {
    10_000
}

impl TargetConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            connect_timeout_ms: default_connect_timeout_ms(),
            response_timeout_ms: default_response_timeout_ms(),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }
}

/// Per-dependency resilience policies
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResilienceConfig {
    /// Applied to any dependency without its own entry
    #[serde(default)]
    pub default: PolicyConfig,
    /// Overrides keyed by dependency name (e.g. "customerService").
    /// The config loader lowercases table keys, so names match case-insensitively.
    #[serde(default)]
    pub dependencies: HashMap<String, PolicyConfig>,
}

impl ResilienceConfig {
    pub fn policy_for(&self, dependency: &str) -> PolicyConfig {
        self.dependencies
            .get(dependency)
            .or_else(|| {
                self.dependencies
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(dependency))
                    .map(|(_, policy)| policy)
            })
            .cloned()
            .unwrap_or_else(|| self.default.clone())
    }
}

/// Rate limiter, circuit breaker, retry and deadline settings for one dependency
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Number of most recent attempts kept in the breaker window
    pub sliding_window_size: usize,
    /// Attempts required in the window before the failure rate is evaluated
    pub minimum_number_of_calls: usize,
    /// Failure rate (percent) at which the breaker opens
    pub failure_rate_threshold: f64,
    /// Cooldown before an open breaker admits probes
    pub wait_duration_in_open_state_ms: u64,
    /// Probe calls admitted while half-open
    pub permitted_calls_in_half_open_state: u32,
    /// Total attempts per call, including the first
    pub max_attempts: u32,
    /// Wait before the first retry
    pub retry_wait_ms: u64,
    /// Growth factor of the wait between retries
    pub retry_backoff_multiplier: f64,
    /// Calls admitted per refresh period
    pub rate_limit_for_period: u32,
    /// Length of the rate limit refresh period
    pub rate_limit_refresh_period_ms: u64,
    /// Deadline covering every attempt and every backoff of one call
    pub timeout_ms: u64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            sliding_window_size: 5,
            minimum_number_of_calls: 3,
            failure_rate_threshold: 50.0,
            wait_duration_in_open_state_ms: 10_000,
            permitted_calls_in_half_open_state: 1,
            max_attempts: 3,
            retry_wait_ms: 500,
            retry_backoff_multiplier: 2.0,
            rate_limit_for_period: 100,
            rate_limit_refresh_period_ms: 1_000,
            timeout_ms: 5_000,
        }
    }
}

impl PolicyConfig {
    pub fn wait_duration_in_open_state(&self) -> Duration {
        Duration::from_millis(self.wait_duration_in_open_state_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn rate_limit_refresh_period(&self) -> Duration {
        Duration::from_millis(self.rate_limit_refresh_period_ms)
    }

    /// Validate policy values, prefixing every message with `name`
    pub fn validate(&self, name: &str) -> Vec<String> {
        let mut errors = Vec::new();

        if self.sliding_window_size == 0 {
            errors.push(format!("{name}: sliding_window_size must be positive"));
        }
        if self.minimum_number_of_calls == 0 {
            errors.push(format!("{name}: minimum_number_of_calls must be positive"));
        }
        if self.minimum_number_of_calls > self.sliding_window_size {
            errors.push(format!(
                "{name}: minimum_number_of_calls must not exceed sliding_window_size"
            ));
        }
        if self.failure_rate_threshold <= 0.0 || self.failure_rate_threshold > 100.0 {
            errors.push(format!(
                "{name}: failure_rate_threshold must be in (0, 100]"
            ));
        }
        if self.permitted_calls_in_half_open_state == 0 {
            errors.push(format!(
                "{name}: permitted_calls_in_half_open_state must be positive"
            ));
        }
        if self.max_attempts == 0 {
            errors.push(format!("{name}: max_attempts must be at least 1"));
        }
        if self.retry_backoff_multiplier < 1.0 {
            errors.push(format!("{name}: retry_backoff_multiplier must be >= 1.0"));
        }
        if self.rate_limit_for_period == 0 {
            errors.push(format!("{name}: rate_limit_for_period must be positive"));
        }
        if self.rate_limit_refresh_period_ms == 0 {
            errors.push(format!(
                "{name}: rate_limit_refresh_period_ms must be positive"
            ));
        }
        if self.timeout_ms == 0 {
            errors.push(format!("{name}: timeout_ms must be positive"));
        }

        errors
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            .set_default("services.accounts.base_url", "http://localhost:8081")?
            .set_default("services.customers.base_url", "http://localhost:8082")?
            .set_default("services.movements.base_url", "http://localhost:8083")?
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Environment-specific overrides (e.g. config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("FLUJO_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // FLUJO__SERVICES__ACCOUNTS__BASE_URL, etc.
            .add_source(
                Environment::with_prefix("FLUJO")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Configuration pointing every service at localhost
    pub fn local() -> Self {
        Self {
            services: ServicesConfig {
                accounts: TargetConfig::new("http://localhost:8081"),
                customers: TargetConfig::new("http://localhost:8082"),
                movements: TargetConfig::new("http://localhost:8083"),
            },
            resilience: ResilienceConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        for (name, target) in [
            ("services.accounts", &self.services.accounts),
            ("services.movements", &self.services.movements),
            ("services.customers", &self.services.customers),
        ] {
            if let Err(e) = url::Url::parse(&target.base_url) {
                errors.push(format!("{name}.base_url is not a valid URL: {e}"));
            }
            if target.connect_timeout_ms == 0 || target.response_timeout_ms == 0 {
                errors.push(format!("{name}: timeouts must be positive"));
            }
        }

        errors.extend(self.resilience.default.validate("resilience.default"));
        for (name, policy) in &self.resilience.dependencies {
            errors.extend(policy.validate(&format!("resilience.dependencies.{name}")));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

use thiserror::Error;

/// Main error type for report aggregation and protected lookups
#[derive(Error, Debug)]
pub enum FlujoError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Network errors
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Caller errors
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    // Downstream failures, already classified
    #[error("{0}")]
    Remote(CallError),

    #[error("Failed to generate report for customer: {customer_id}")]
    ReportGenerationFailed {
        customer_id: String,
        #[source]
        source: Box<FlujoError>,
    },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for FlujoError
pub type Result<T> = std::result::Result<T, FlujoError>;

/// Result of a single remote call or protected operation
pub type CallResult<T> = std::result::Result<T, CallError>;

/// Flat error kind, one per entry of the public error taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidRequest,
    NotFound,
    Unavailable,
    Timeout,
    ConnectionError,
    RateLimited,
    CircuitOpen,
    ReportGenerationFailed,
    Internal,
}

impl FlujoError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FlujoError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            FlujoError::NotFound(_) => ErrorKind::NotFound,
            FlujoError::Remote(err) => err.kind(),
            FlujoError::ReportGenerationFailed { .. } => ErrorKind::ReportGenerationFailed,
            FlujoError::Config(_)
            | FlujoError::Http(_)
            | FlujoError::Json(_)
            | FlujoError::Io(_) => ErrorKind::Internal,
        }
    }
}

impl From<CallError> for FlujoError {
    fn from(err: CallError) -> Self {
        match err {
            CallError::NotFound { target, resource } => {
                FlujoError::NotFound(format!("{} not found in {}", resource, target))
            }
            other => FlujoError::Remote(other),
        }
    }
}

/// Outcome of a single outbound call, or of a policy that refused to make it
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CallError {
    #[error("{target} unavailable (status {status:?}): {message}")]
    Unavailable {
        target: String,
        status: Option<u16>,
        message: String,
    },

    #[error("{target} timed out after {elapsed_ms}ms")]
    Timeout { target: String, elapsed_ms: u64 },

    #[error("Unable to connect to {target}: {message}")]
    ConnectionError { target: String, message: String },

    #[error("{resource} not found in {target}")]
    NotFound { target: String, resource: String },

    #[error("Invalid response from {target}: {message}")]
    InvalidResponse { target: String, message: String },

    #[error("Rate limited: {dependency}")]
    RateLimited { dependency: String },

    #[error("Circuit open: {dependency}")]
    CircuitOpen { dependency: String },
}

impl CallError {
    /// Worth another attempt. A 4xx-equivalent rejection will fail the same way again.
    pub fn is_transient(&self) -> bool {
        match self {
            CallError::Timeout { .. } | CallError::ConnectionError { .. } => true,
            CallError::Unavailable { status, .. } => status.map_or(true, |s| s >= 500),
            _ => false,
        }
    }

    /// Recorded as a failure in the circuit breaker window.
    pub fn counts_as_failure(&self) -> bool {
        matches!(
            self,
            CallError::Unavailable { .. }
                | CallError::Timeout { .. }
                | CallError::ConnectionError { .. }
                | CallError::InvalidResponse { .. }
        )
    }

    /// Anything other than a domain-level absence.
    pub fn is_infrastructure(&self) -> bool {
        !matches!(self, CallError::NotFound { .. })
    }

    /// Policy rejection: the operation was never invoked.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            CallError::RateLimited { .. } | CallError::CircuitOpen { .. }
        )
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CallError::Unavailable { .. } => ErrorKind::Unavailable,
            CallError::Timeout { .. } => ErrorKind::Timeout,
            CallError::ConnectionError { .. } => ErrorKind::ConnectionError,
            CallError::NotFound { .. } => ErrorKind::NotFound,
            CallError::InvalidResponse { .. } => ErrorKind::Internal,
            CallError::RateLimited { .. } => ErrorKind::RateLimited,
            CallError::CircuitOpen { .. } => ErrorKind::CircuitOpen,
        }
    }
}

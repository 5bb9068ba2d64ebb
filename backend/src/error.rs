//! Error types for the forecasting pipeline.
//!
//! Each layer has its own error enum so callers can decide what is recoverable:
//! per-pollutant failures ([`ForecastError`]) are skipped, query failures
//! ([`QueryError`]) are surfaced to the user, service failures
//! ([`ExternalServiceError`]) are logged and the forecast is kept. Only
//! [`DataError`] and [`ConfigError`] at start-up are fatal.

use std::fmt;

/// Structured context for service errors.
///
/// Provides additional information about where and why an error occurred.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    /// The operation being performed (e.g., "narrate", "render_chart")
    pub operation: Option<String>,
    /// The entity involved (e.g., "European Region/PM10 (μg/m3)")
    pub entity: Option<String>,
    /// Additional details about the error
    pub details: Option<String>,
    /// Whether this error is retryable
    pub retryable: bool,
}

impl ErrorContext {
    /// Create a new error context with an operation name.
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: Some(operation.into()),
            ..Default::default()
        }
    }

    /// Set the entity.
    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    /// Set additional details.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Mark this error as retryable.
    pub fn retryable(mut self) -> Self {
        self.retryable = true;
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(ref op) = self.operation {
            parts.push(format!("operation={}", op));
        }
        if let Some(ref entity) = self.entity {
            parts.push(format!("entity={}", entity));
        }
        if let Some(ref details) = self.details {
            parts.push(format!("details={}", details));
        }
        if self.retryable {
            parts.push("retryable=true".to_string());
        }
        write!(f, "[{}]", parts.join(", "))
    }
}

/// Per-pollutant failures of the forecast path.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ForecastError {
    /// No usable rows for the requested region/pollutant.
    #[error("Insufficient data for {pollutant} in {region}")]
    InsufficientData { region: String, pollutant: String },

    /// The model could not be fitted or produced no in-sample overlap.
    #[error("Fit failure: {0}")]
    FitFailure(String),
}

impl ForecastError {
    pub fn insufficient(region: impl Into<String>, pollutant: impl Into<String>) -> Self {
        Self::InsufficientData {
            region: region.into(),
            pollutant: pollutant.into(),
        }
    }

    pub fn fit(message: impl Into<String>) -> Self {
        Self::FitFailure(message.into())
    }
}

/// Query failures surfaced to the user by the shell.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// More than one region matched; no default is chosen.
    #[error("Query matches several regions: {}", .candidates.join(", "))]
    Ambiguous { candidates: Vec<String> },

    /// No region matched.
    #[error("No region found in query; known regions: {}", .known.join(", "))]
    NotFound { known: Vec<String> },
}

/// Failures of the narrative and rendering collaborators. Never fatal.
#[derive(Debug, thiserror::Error)]
pub enum ExternalServiceError {
    /// Could not reach the service (DNS, TLS, refused connection).
    #[error("Connection error: {message} {context}")]
    Connection {
        message: String,
        context: ErrorContext,
    },

    /// The call did not complete within its deadline.
    #[error("Timeout error: {message} {context}")]
    Timeout {
        message: String,
        context: ErrorContext,
    },

    /// The service answered with an error status or an unusable body.
    #[error("Service error: {message} {context}")]
    Response {
        message: String,
        context: ErrorContext,
    },

    /// The service is switched off or not configured.
    #[error("Service unavailable: {message} {context}")]
    Unavailable {
        message: String,
        context: ErrorContext,
    },

    /// Writing an artifact failed.
    #[error("I/O error: {message} {context}")]
    Io {
        message: String,
        context: ErrorContext,
    },
}

impl ExternalServiceError {
    /// Create a connection error. Connection errors are retryable.
    pub fn connection(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::Connection {
            message: message.into(),
            context: context.retryable(),
        }
    }

    /// Create a timeout error. Timeouts are retryable.
    pub fn timeout(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::Timeout {
            message: message.into(),
            context: context.retryable(),
        }
    }

    /// Create a response error; `retryable` is decided by the caller from the status.
    pub fn response(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::Response {
            message: message.into(),
            context,
        }
    }

    pub fn unavailable(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::Unavailable {
            message: message.into(),
            context,
        }
    }

    pub fn io(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::Io {
            message: message.into(),
            context,
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        self.context().retryable
    }

    /// Get the error context.
    pub fn context(&self) -> &ErrorContext {
        match self {
            Self::Connection { context, .. }
            | Self::Timeout { context, .. }
            | Self::Response { context, .. }
            | Self::Unavailable { context, .. }
            | Self::Io { context, .. } => context,
        }
    }
}

/// Fatal input-table errors raised at start-up.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("Failed to open input table {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse input table: {0}")]
    Csv(#[from] csv::Error),

    #[error("Required column '{0}' not found in input table")]
    MissingColumn(String),
}

/// Configuration loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

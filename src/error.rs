use miette::Diagnostic;
use thiserror::Error;

/// Main error type for the application
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Network error: {0}")]
    #[diagnostic(
        code(smart_agenda::network),
        help("Check that the server is reachable (VPN, URL, server running)")
    )]
    Network(String),

    #[error("Authentication failed: {0}")]
    #[diagnostic(code(smart_agenda::authentication))]
    Authentication(String),

    #[error("Server returned HTTP {status}: {message}")]
    #[diagnostic(code(smart_agenda::api))]
    Api { status: u16, message: String },

    #[error("No cached data available: {0}")]
    #[diagnostic(code(smart_agenda::cache_miss))]
    CacheMiss(String),

    #[error("Cache error: {0}")]
    #[diagnostic(code(smart_agenda::cache))]
    Cache(String),

    #[error("Environment error: {0}")]
    #[diagnostic(code(smart_agenda::environment))]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(smart_agenda::config))]
    Config(String),

    #[error("Invalid input: {0}")]
    #[diagnostic(code(smart_agenda::validation))]
    Validation(String),

    #[error("Component error: {0}")]
    #[diagnostic(code(smart_agenda::component))]
    Component(String),

    #[error(transparent)]
    #[diagnostic(code(smart_agenda::io))]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(smart_agenda::serialization))]
    Serialization(String),

    #[error("Other error: {0}")]
    #[diagnostic(code(smart_agenda::other))]
    Other(String),
}

impl Error {
    /// Whether retrying the same call later could succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Network(_) => true,
            Error::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Error::Serialization(err.to_string());
        }
        if let Some(status) = err.status() {
            let status = status.as_u16();
            if status == 401 || status == 403 {
                return Error::Authentication(err.to_string());
            }
            return Error::Api {
                status,
                message: err.to_string(),
            };
        }
        Error::Network(err.to_string())
    }
}

impl From<redis::RedisError> for Error {
    fn from(err: redis::RedisError) -> Self {
        Error::Cache(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

// Implement From for TOML serialization errors
impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

// Implement From for TOML deserialization errors
impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Type alias for Result with our Error type
pub type AgendaResult<T> = Result<T, Error>;

/// Helper to create environment errors
pub fn env_error(var: &str) -> Error {
    Error::Environment(format!("Invalid environment variable: {}", var))
}

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create component errors
pub fn component_error(message: &str) -> Error {
    Error::Component(message.to_string())
}

/// Helper to create cache errors
pub fn cache_error(message: &str) -> Error {
    Error::Cache(message.to_string())
}

/// Helper to create validation errors
pub fn validation_error(message: &str) -> Error {
    Error::Validation(message.to_string())
}

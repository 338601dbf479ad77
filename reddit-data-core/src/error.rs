use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Failures of a single upstream call. Always recoverable by the orchestrator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    #[error("{backend} request timed out")]
    RequestTimeout { backend: String },

    #[error("{backend} returned HTTP {status_code}")]
    HttpStatus { backend: String, status_code: u16 },

    #[error("Invalid response from {backend}: {details}")]
    InvalidResponse { backend: String, details: String },

    #[error("Network failure talking to {backend}: {message}")]
    Network { backend: String, message: String },

    #[error("{backend} does not support this request: {reason}")]
    Unsupported { backend: String, reason: String },
}

impl BackendError {
    pub fn backend(&self) -> &str {
        match self {
            BackendError::RequestTimeout { backend }
            | BackendError::HttpStatus { backend, .. }
            | BackendError::InvalidResponse { backend, .. }
            | BackendError::Network { backend, .. }
            | BackendError::Unsupported { backend, .. } => backend,
        }
    }

    /// Maps a reqwest failure onto the backend taxonomy.
    pub fn from_reqwest(backend: &str, err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            BackendError::RequestTimeout {
                backend: backend.to_string(),
            }
        } else if let Some(status) = err.status() {
            BackendError::HttpStatus {
                backend: backend.to_string(),
                status_code: status.as_u16(),
            }
        } else if err.is_decode() {
            BackendError::InvalidResponse {
                backend: backend.to_string(),
                details: err.to_string(),
            }
        } else {
            BackendError::Network {
                backend: backend.to_string(),
                message: err.to_string(),
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Configuration validation failed: {reason}")]
    ValidationFailed { reason: String },

    #[error("Configuration parsing error: {0}")]
    Parse(#[from] toml::de::Error),
}

use crate::error::*;
use tracing::{error, warn};

pub trait ErrorExt {
    fn log_error(&self) -> &Self;
    fn log_warn(&self) -> &Self;
    fn is_retryable(&self) -> bool;
    fn user_friendly_message(&self) -> String;
    fn error_code(&self) -> String;
}

impl ErrorExt for CoreError {
    fn log_error(&self) -> &Self {
        error!("CoreError: {}", self);
        match self {
            CoreError::Backend(e) => {
                error!("Backend error details: {:?}", e);
            }
            CoreError::Config(e) => {
                error!("Configuration error details: {:?}", e);
            }
            CoreError::Network(_) => {}
        }
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("CoreError (warning): {}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        match self {
            CoreError::Backend(e) => e.is_retryable(),
            CoreError::Network(_) => true,
            CoreError::Config(_) => false,
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            CoreError::Backend(e) => e.user_friendly_message(),
            CoreError::Config(e) => e.user_friendly_message(),
            CoreError::Network(_) => {
                "Network connection error. Please check your internet connection.".to_string()
            }
        }
    }

    fn error_code(&self) -> String {
        match self {
            CoreError::Backend(_) => "BACKEND".to_string(),
            CoreError::Config(_) => "CONFIG".to_string(),
            CoreError::Network(_) => "NETWORK".to_string(),
        }
    }
}

impl ErrorExt for BackendError {
    fn log_error(&self) -> &Self {
        error!("BackendError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("BackendError (warning): {}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        match self {
            BackendError::RequestTimeout { .. } => true,
            BackendError::Network { .. } => true,
            BackendError::HttpStatus { status_code, .. } => {
                *status_code == 429 || *status_code >= 500
            }
            _ => false,
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            BackendError::RequestTimeout { backend } => {
                format!("The {} backend timed out. Please try again.", backend)
            }
            BackendError::HttpStatus {
                backend,
                status_code: 429,
            } => format!("The {} backend is rate limiting requests.", backend),
            BackendError::HttpStatus {
                backend,
                status_code,
            } => format!("The {} backend answered with HTTP {}.", backend, status_code),
            BackendError::InvalidResponse { backend, .. } => {
                format!("The {} backend returned data that could not be read.", backend)
            }
            BackendError::Network { backend, .. } => {
                format!("Could not reach the {} backend.", backend)
            }
            BackendError::Unsupported { backend, reason } => {
                format!("The {} backend cannot serve this query: {}", backend, reason)
            }
        }
    }

    fn error_code(&self) -> String {
        match self {
            BackendError::RequestTimeout { .. } => "BACKEND_TIMEOUT".to_string(),
            BackendError::HttpStatus { .. } => "BACKEND_HTTP_STATUS".to_string(),
            BackendError::InvalidResponse { .. } => "BACKEND_INVALID_RESPONSE".to_string(),
            BackendError::Network { .. } => "BACKEND_NETWORK".to_string(),
            BackendError::Unsupported { .. } => "BACKEND_UNSUPPORTED".to_string(),
        }
    }
}

impl ErrorExt for ConfigError {
    fn log_error(&self) -> &Self {
        error!("ConfigError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("ConfigError (warning): {}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        false
    }

    fn user_friendly_message(&self) -> String {
        match self {
            ConfigError::FileNotFound { path } => {
                format!("Configuration file '{}' does not exist.", path)
            }
            ConfigError::InvalidValue { field, value } => {
                format!("Configuration field '{}' has an invalid value '{}'.", field, value)
            }
            ConfigError::ValidationFailed { reason } => {
                format!("Configuration is not valid: {}", reason)
            }
            ConfigError::Parse(_) => "Configuration file is not valid TOML.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            ConfigError::FileNotFound { .. } => "CONFIG_FILE_NOT_FOUND".to_string(),
            ConfigError::InvalidValue { .. } => "CONFIG_INVALID_VALUE".to_string(),
            ConfigError::ValidationFailed { .. } => "CONFIG_VALIDATION_FAILED".to_string(),
            ConfigError::Parse(_) => "CONFIG_PARSE".to_string(),
        }
    }
}

//! SOAR Actions
//!
//! Action and function components for an incident-response platform.
//! Inbound events arrive as JSON-RPC requests over stdio or a Unix socket and are
//! routed through the [`bus::ActionBus`] to the registered components.

pub mod bus;
pub mod cli;
pub mod client;
pub mod config;
pub mod functions;
pub mod handlers;
pub mod jsonrpc;
pub mod models;
pub mod platform;
pub mod policy;
pub mod server;

/// Application-wide error types with context preservation
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Invalid event: {message}")]
    InvalidEvent { message: String },

    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("Platform error: {message}")]
    Platform { message: String, status: Option<u16> },

    #[error("HTTP error: {source}")]
    Http {
        #[from]
        source: reqwest::Error,
    },

    #[error("Timed out: {message}")]
    Timeout { message: String },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
}

impl ActionError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an invalid event error
    pub fn invalid_event(message: impl Into<String>) -> Self {
        Self::InvalidEvent {
            message: message.into(),
        }
    }

    /// Create a platform error with optional HTTP status
    pub fn platform(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::Platform {
            message: message.into(),
            status,
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    /// Get error code for JSON-RPC responses
    pub fn error_code(&self) -> i32 {
        match self {
            ActionError::Configuration { .. } => -32014,
            ActionError::InvalidEvent { .. } => -32602,
            ActionError::UnknownAction(_) => -32004,
            ActionError::UnknownFunction(_) => -32004,
            ActionError::Platform { .. } => -32010,
            ActionError::Http { .. } => -32011,
            ActionError::Timeout { .. } => -32013,
            ActionError::Internal(_) => -32603,
            ActionError::Io { .. } => -32603,
            ActionError::Serialization { .. } => -32700,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            ActionError::Configuration { message } => {
                format!("Configuration issue: {}", message)
            }
            ActionError::InvalidEvent { message } => {
                format!("Malformed event: {}", message)
            }
            ActionError::UnknownAction(name) => {
                format!("No handler registered for action: {}", name)
            }
            ActionError::UnknownFunction(name) => {
                format!("No component registered for function: {}", name)
            }
            ActionError::Platform { message, status } => {
                if let Some(code) = status {
                    format!("Platform call failed ({}): {}", code, message)
                } else {
                    format!("Platform call failed: {}", message)
                }
            }
            ActionError::Http { source } => {
                format!("Communication error: {}", source)
            }
            ActionError::Timeout { message } => {
                format!("Operation timed out: {}", message)
            }
            ActionError::Internal(message) => {
                format!("Internal error: {}", message)
            }
            ActionError::Io { source } => {
                format!("File system error: {}", source)
            }
            ActionError::Serialization { source } => {
                format!("Data format error: {}", source)
            }
        }
    }
}

/// Convenience type alias for Results
pub type ActionResult<T> = Result<T, ActionError>;

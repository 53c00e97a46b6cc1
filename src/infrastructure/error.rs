//! Infrastructure-level errors (wraps application errors)

use thiserror::Error;

use crate::application::ApplicationError;

/// Failure talking to the remote modeling service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("request to {process} failed: {message}")]
    Request { process: String, message: String },

    #[error("{process} answered with HTTP {status}")]
    Status { process: String, status: u16 },

    #[error("cannot decode {process} response: {message}")]
    Decode { process: String, message: String },
}

impl ServiceError {
    pub fn decode(process: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            process: process.into(),
            message: message.into(),
        }
    }

    /// Transport and HTTP failures, as opposed to a response we could not read.
    pub fn is_unavailable(&self) -> bool {
        !matches!(self, ServiceError::Decode { .. })
    }
}

/// Infrastructure errors wrap application errors and add I/O-level concerns.
#[derive(Error, Debug)]
pub enum InfraError {
    #[error("{0}")]
    Application(#[from] ApplicationError),

    #[error("I/O error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Service(#[from] ServiceError),

    #[error("selector failed: {0}")]
    Selector(String),

    #[error("editor command failed: {message}")]
    Editor { message: String },
}

impl InfraError {
    /// Create an I/O error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// Result type for infrastructure layer operations.
pub type InfraResult<T> = Result<T, InfraError>;

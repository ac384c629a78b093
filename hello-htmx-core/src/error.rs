// Error types for the hello-htmx HTTP core

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Route not found: {0}")]
    RouteNotFound(String),

    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Payload Too Large: {0}")]
    PayloadTooLarge(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Error::RouteNotFound(_) | Error::NotFound(_) => 404,
            Error::MethodNotAllowed(_) => 405,
            Error::Validation(_) | Error::Deserialization(_) | Error::BadRequest(_) => 400,
            Error::Forbidden(_) => 403,
            Error::PayloadTooLarge(_) => 413,
            Error::Http(_) | Error::Serialization(_) | Error::Internal(_) | Error::Io(_) => 500,
        }
    }

    /// The bare message, without the category prefix of `Display`
    pub fn detail(&self) -> String {
        match self {
            Error::Http(msg)
            | Error::RouteNotFound(msg)
            | Error::MethodNotAllowed(msg)
            | Error::Serialization(msg)
            | Error::Deserialization(msg)
            | Error::Validation(msg)
            | Error::BadRequest(msg)
            | Error::Forbidden(msg)
            | Error::NotFound(msg)
            | Error::PayloadTooLarge(msg)
            | Error::Internal(msg) => msg.clone(),
            Error::Io(err) => err.to_string(),
        }
    }

    /// Check if this is a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }

    /// Check if this is a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }
}

/// JSON body rendered for every error response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub status_code: u16,
    pub detail: String,
}

impl From<&Error> for ErrorBody {
    fn from(error: &Error) -> Self {
        // Server-side failures are not described to the client
        let detail = if error.is_server_error() {
            "Internal Server Error".to_string()
        } else {
            error.detail()
        };

        Self {
            status_code: error.status_code(),
            detail,
        }
    }
}

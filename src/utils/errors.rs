use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::vault::credentials::ValidationErrors;

/// Failure categories reported uniformly to whoever drives the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Validation,
    Unauthenticated,
    BadRequest,
    RemoteError,
    UnexpectedFormat,
    SessionExpiredOrRedirected,
    Network,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::Validation => "validation error",
            ErrorKind::Unauthenticated => "unauthenticated",
            ErrorKind::BadRequest => "bad request",
            ErrorKind::RemoteError => "remote error",
            ErrorKind::UnexpectedFormat => "unexpected format",
            ErrorKind::SessionExpiredOrRedirected => "session expired or redirected",
            ErrorKind::Network => "network error",
        };
        f.write_str(label)
    }
}

/// A classified failure from login, logoff or a proxied call.
///
/// `details` only ever holds a bounded preview of a downstream body.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
#[error("{kind}: {message}")]
pub struct GatewayFailure {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl GatewayFailure {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            http_status: None,
            details: None,
        }
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthenticated, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, message)
    }

    pub fn unexpected_format(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnexpectedFormat, message)
    }

    pub fn network(err: reqwest::Error) -> Self {
        Self::new(ErrorKind::Network, format!("Request could not be completed: {err}"))
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl From<ValidationErrors> for GatewayFailure {
    fn from(errors: ValidationErrors) -> Self {
        GatewayFailure::new(ErrorKind::Validation, errors.to_string())
    }
}

#[derive(Error, Debug)]
pub enum PvwaError {
    #[error(transparent)]
    Gateway(#[from] GatewayFailure),

    #[error("Invalid credentials: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, PvwaError>;

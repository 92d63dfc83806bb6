// src/error.rs
// =============================================================================
// Errors that end an extraction run.
//
// Only five things are fatal to a run. Everything that can go wrong *inside*
// a parsed document (a missing tag, a weird relative URL, a dead image) is
// handled by narrowing the result instead, so it never shows up here.
// =============================================================================

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a transport-level failure happened.
///
/// The caller sees the same `TransportFailure` kind for all of these; the
/// cause only sharpens the message and the logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportCause {
    Timeout,
    /// Could not connect, including DNS resolution failures
    Connect,
    /// The redirect chain was longer than allowed
    Redirect,
    Tls,
    Other,
}

impl std::fmt::Display for TransportCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            TransportCause::Timeout => "request timed out",
            TransportCause::Connect => "connection failed",
            TransportCause::Redirect => "too many redirects",
            TransportCause::Tls => "TLS error",
            TransportCause::Other => "request failed",
        };
        f.write_str(label)
    }
}

/// The closed set of failure kinds a collaborator has to handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    TransportFailure,
    RemoteHttpError,
    BodyReadFailure,
    ParseFailure,
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("invalid URL '{input}': {reason}")]
    InvalidInput { input: String, reason: String },

    #[error("could not reach {url}: {cause}: {message}")]
    TransportFailure {
        url: String,
        cause: TransportCause,
        message: String,
    },

    #[error("{url} responded with HTTP {status}")]
    RemoteHttpError { url: String, status: u16 },

    #[error("could not read response body from {url}: {message}")]
    BodyReadFailure { url: String, message: String },

    #[error("could not parse document: {message}")]
    ParseFailure { message: String },
}

impl ExtractError {
    pub fn invalid_input(input: &str, reason: impl Into<String>) -> Self {
        ExtractError::InvalidInput {
            input: input.to_string(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ExtractError::InvalidInput { .. } => ErrorKind::InvalidInput,
            ExtractError::TransportFailure { .. } => ErrorKind::TransportFailure,
            ExtractError::RemoteHttpError { .. } => ErrorKind::RemoteHttpError,
            ExtractError::BodyReadFailure { .. } => ErrorKind::BodyReadFailure,
            ExtractError::ParseFailure { .. } => ErrorKind::ParseFailure,
        }
    }

    /// The remote status code, for `RemoteHttpError` only
    pub fn status(&self) -> Option<u16> {
        match self {
            ExtractError::RemoteHttpError { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// A fatal error flattened into the shape handed to collaborators:
/// a kind they can branch on plus a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReport {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl From<&ExtractError> for FailureReport {
    fn from(error: &ExtractError) -> Self {
        FailureReport {
            kind: error.kind(),
            message: error.to_string(),
            status: error.status(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ExtractError>;

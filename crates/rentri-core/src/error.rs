// SPDX-FileCopyrightText: 2026 Rentri Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the RENTRI client toolkit.

use thiserror::Error;

/// The primary error type shared by every crate in the workspace.
///
/// Transport, status and decode failures are absorbed at the
/// `RemoteService` boundary and turned into fail-soft results; only
/// credential and task failures are expected to reach end users as errors.
#[derive(Debug, Error)]
pub enum RentriError {
    /// Configuration errors (invalid TOML, bad values, missing credential settings).
    #[error("configuration error: {0}")]
    Config(String),

    /// The credential bundle could not be read or decrypted with any passphrase encoding.
    #[error("invalid credential: {message}")]
    InvalidCredential { message: String },

    /// A token could not be signed with the loaded key.
    #[error("signing error: {0}")]
    Signing(String),

    /// Network failure, timeout or connection refusal.
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The remote service kept answering HTTP 429 after the single retry.
    #[error("rate limited by remote service (HTTP 429)")]
    RateLimited,

    /// The remote service answered with a non-success status.
    #[error("unexpected HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    /// Malformed JSON or base64 in a response.
    #[error("decode error: {0}")]
    Decode(String),

    /// Local filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A background task phase failed unexpectedly.
    #[error("task failed: {0}")]
    TaskFailed(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RentriError {
    /// Builds a [`RentriError::Transport`] wrapping the underlying cause.
    pub fn transport<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        RentriError::Transport {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Maps a non-success HTTP status to the matching variant.
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        if status == 429 {
            RentriError::RateLimited
        } else {
            RentriError::Status {
                status,
                body: body.into(),
            }
        }
    }
}

impl From<serde_json::Error> for RentriError {
    fn from(err: serde_json::Error) -> Self {
        RentriError::Decode(err.to_string())
    }
}

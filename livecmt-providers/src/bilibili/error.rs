//! Bilibili Live Client Error Types

use thiserror::Error;

/// Errors surfaced by the propagating half of the client.
///
/// Only stream URL resolution returns these to callers; the lookup
/// operations fold every failure into their own negative result.
#[derive(Debug, Error)]
pub enum BilibiliError {
    /// Transport failure, carried through unchanged.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    /// Well-formed response whose result marker is missing or wrong.
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<roxmltree::Error> for BilibiliError {
    fn from(err: roxmltree::Error) -> Self {
        BilibiliError::Parse(err.to_string())
    }
}

impl From<reqwest::header::InvalidHeaderValue> for BilibiliError {
    fn from(err: reqwest::header::InvalidHeaderValue) -> Self {
        BilibiliError::InvalidConfig(err.to_string())
    }
}

impl BilibiliError {
    /// True when the upstream explicitly reported the resource as absent.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            BilibiliError::Network(err) => err.status() == Some(reqwest::StatusCode::NOT_FOUND),
            _ => false,
        }
    }
}

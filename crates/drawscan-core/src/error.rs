// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for drawscan.

use thiserror::Error;

use crate::types::ProviderKind;

/// Top-level error type for all extraction operations.
///
/// None of these are fatal to the process: the pipeline converts every
/// variant into an empty contribution plus a logged diagnostic.
#[derive(Debug, Error)]
pub enum ScanError {
    // -- Setup --
    #[error("no recognition engine is available: {0}")]
    Configuration(String),

    // -- Input --
    #[error("document conversion failed: {0}")]
    Conversion(String),

    #[error("unsupported media type: {0}")]
    UnsupportedMedia(String),

    // -- Recognition --
    #[error("{provider} recognition failed: {message}")]
    Recognition {
        provider: ProviderKind,
        message: String,
    },

    #[error("{provider} returned an unparseable response: {message}")]
    Parse {
        provider: ProviderKind,
        message: String,
    },

    #[error("{provider} call timed out after {seconds}s")]
    Timeout { provider: ProviderKind, seconds: u64 },

    // -- Enrichment --
    #[error("tolerance enrichment skipped: {0}")]
    Enrichment(String),

    // -- Plumbing --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ScanError {
    /// Shorthand for a [`ScanError::Recognition`] raised by `provider`.
    pub fn recognition(provider: ProviderKind, message: impl Into<String>) -> Self {
        Self::Recognition {
            provider,
            message: message.into(),
        }
    }

    /// Shorthand for a [`ScanError::Parse`] raised by `provider`.
    pub fn parse(provider: ProviderKind, message: impl Into<String>) -> Self {
        Self::Parse {
            provider,
            message: message.into(),
        }
    }

    /// The provider responsible for this error, if it came from one.
    pub fn provider(&self) -> Option<ProviderKind> {
        match self {
            Self::Recognition { provider, .. }
            | Self::Parse { provider, .. }
            | Self::Timeout { provider, .. } => Some(*provider),
            _ => None,
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ScanError>;

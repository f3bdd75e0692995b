//! Error types for the v.qq.com resolver
//!
//! Most upstream irregularities (non-200 status, malformed wrapped JSON,
//! DRM-protected entries, structural mismatches) are soft outcomes and
//! surface as `Ok(None)` or empty collections from the operations that hit
//! them. The error enum covers the remaining hard failures only.

use thiserror::Error;

/// Error type for all resolver operations
#[derive(Error, Debug)]
pub enum QQVideoError {
    /// The HTTP transport itself failed (connect, timeout, decode)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Client construction failed (bad proxy URL, bad header value)
    #[error("Invalid client configuration: {0}")]
    Config(String),
}

/// Result type alias for resolver operations
pub type Result<T> = std::result::Result<T, QQVideoError>;

//! Error types for Cosmorph.
//!
//! Only resource loading and configuration can fail. The morph controller
//! consumes already-valid buffers and never returns errors; shape sampling
//! fails only when a text request cannot get its font, and the driver
//! resolves that to a fallback shape before it reaches the controller.

use thiserror::Error;

/// Errors that can occur while fetching or parsing a typeface font.
#[derive(Debug, Error)]
pub enum FontError {
    /// Failed to read the font resource.
    #[error("failed to read font '{url}': {source}")]
    Io {
        /// URL or path that was requested.
        url: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The resource is not a valid typeface JSON document.
    #[error("failed to parse typeface font: {0}")]
    Parse(#[from] serde_json::Error),
    /// The URL scheme is not handled by the configured fetcher.
    #[error("unsupported font url scheme in '{0}'")]
    UnsupportedScheme(String),
    /// The font parsed but carries no glyphs.
    #[error("typeface font has no glyphs")]
    NoGlyphs,
    /// An earlier load of this URL failed; the failure is remembered.
    #[error("font '{url}' is unavailable: {reason}")]
    Unavailable {
        /// URL or path that was requested.
        url: String,
        /// Message of the original failure.
        reason: String,
    },
    /// The load was cancelled before it started.
    #[error("font load cancelled")]
    Cancelled,
}

/// Errors that can occur when sampling a shape.
#[derive(Debug, Error)]
pub enum SampleError {
    /// Text sampling could not obtain its font.
    #[error("text sampling failed: {0}")]
    Font(#[from] FontError),
    /// The task was cancelled before producing a buffer.
    #[error("sampling task cancelled")]
    Cancelled,
    /// The worker thread could not be started.
    #[error("failed to start sampling worker: {0}")]
    Worker(#[source] std::io::Error),
}

/// Errors that can occur when parsing a color theme.
#[derive(Debug, Error, PartialEq)]
pub enum ThemeError {
    /// The string is not a `#rrggbb` hex color.
    #[error("invalid hex color '{0}', expected #rrggbb")]
    BadHex(String),
}

/// Errors that can occur when loading or validating a [`FieldConfig`](crate::FieldConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read or write the config file.
    #[error("config i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// The config file is not valid JSON for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    /// A value is outside its allowed range.
    #[error("invalid config value for `{field}`: {reason}")]
    Invalid {
        /// Name of the offending field.
        field: &'static str,
        /// Human readable constraint.
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

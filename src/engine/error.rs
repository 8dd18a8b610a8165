//! Error taxonomy of the decision engine.
//!
//! None of these are fatal. Inside a frame they are logged and turned into
//! "no action"; only configuration loading surfaces them to a caller.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    /// Detection dropped before normalization (blank text, degenerate box,
    /// low confidence).
    #[error("Malformed detection: {reason}")]
    MalformedDetection { reason: String },

    /// A price, profit or attribute bound is configured but the data is absent
    /// or out of range.
    #[error("No usable {field}: {text}")]
    ParseMiss { field: &'static str, text: String },

    #[error("Config error: {0}")]
    Config(String),
}

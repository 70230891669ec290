//! Error types for this crate.
//!
//! All fallible operations return [`Result<T>`] which uses [`PipelineError`] as the error type.

use thiserror::Error;

/// A [`Result`](std::result::Result) alias using [`PipelineError`] as the error type.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// The unified error type for all crate errors.
///
/// # Example
///
/// ```rust,no_run
/// use ja_text_pipelines::error::PipelineError;
///
/// fn handle_error(e: PipelineError) {
///     match &e {
///         PipelineError::Download(_) => {
///             // Network issue - retry later
///         }
///         PipelineError::Dictionary(_) => {
///             // Bad dictionary path - fix configuration
///         }
///         PipelineError::InvalidInput(_) => {
///             // Empty or undecodable text - ask again
///         }
///         _ => {
///             eprintln!("error: {e}");
///         }
///     }
/// }
/// ```
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum PipelineError {
    /// Network or download failure. Retry may help.
    #[error("{0}")]
    Download(String),

    /// Tokenization failure. Check input text.
    #[error("{0}")]
    Tokenization(String),

    /// Device initialization failure. Fall back to CPU.
    #[error("{0}")]
    Device(String),

    /// Morphological dictionary could not be read.
    #[error("{0}")]
    Dictionary(String),

    /// Invalid configuration value or unreadable config file.
    #[error("{0}")]
    Config(String),

    /// Input text is empty or could not be decoded.
    #[error("{0}")]
    InvalidInput(String),

    /// Internal error. Report if seen.
    #[error("{0}")]
    Unexpected(String),
}

impl From<hf_hub::api::sync::ApiError> for PipelineError {
    fn from(value: hf_hub::api::sync::ApiError) -> Self {
        PipelineError::Download(format!("HuggingFace API error: {}", value))
    }
}

impl From<candle_core::Error> for PipelineError {
    fn from(value: candle_core::Error) -> Self {
        PipelineError::Unexpected(value.to_string())
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(value: std::io::Error) -> Self {
        PipelineError::Unexpected(value.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(value: serde_json::Error) -> Self {
        PipelineError::Unexpected(value.to_string())
    }
}

impl From<toml::de::Error> for PipelineError {
    fn from(value: toml::de::Error) -> Self {
        PipelineError::Config(format!("Invalid config file: {}", value))
    }
}

impl From<vibrato::errors::VibratoError> for PipelineError {
    fn from(value: vibrato::errors::VibratoError) -> Self {
        PipelineError::Dictionary(format!("Dictionary error: {}", value))
    }
}

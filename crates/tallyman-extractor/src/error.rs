//! Error types for the Record Extractor

use thiserror::Error;

/// Errors that can occur during record extraction
///
/// All variants are hard failures of a single extraction call; the
/// extractor never retries internally. Retry and containment policy live
/// in the ingestion pipeline.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// Classification service failure (transport, envelope, empty result)
    #[error("Classifier error: {0}")]
    Provider(String),

    /// Response was not valid JSON after fence stripping
    #[error("JSON parse error: {0}")]
    Parse(String),

    /// Response JSON did not match the five-key record schema
    #[error("Schema mismatch: {0}")]
    Schema(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

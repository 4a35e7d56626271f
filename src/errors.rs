// ABOUTME: Error types for the deckforge application
// ABOUTME: Provides structured error handling for each stage of the pipeline

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeckError {
    #[error("Failed to read file: {0}")]
    FileReadError(#[from] std::io::Error),

    #[error("Failed to fetch remote resource: {0}")]
    FetchError(#[from] reqwest::Error),

    #[error("Topic must not be empty")]
    EmptyTopic,

    #[error("{message}")]
    GenerationError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Slide data does not match the expected schema: {0}")]
    SchemaError(String),

    #[error("Presentation export is unavailable: {0}")]
    ExportUnavailable(String),

    #[error("PPTX generation error: {0}")]
    PptxError(String),

    #[error("Image error: {0}")]
    ImageError(String),

    #[error("AI service error: {0}")]
    ModelError(String),

    #[error("Input validation error: {0}")]
    ValidationError(String),

    #[error("Path not found: {0}")]
    PathNotFoundError(PathBuf),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid screen transition: {0}")]
    InvalidTransition(String),

    #[error("Server error: {0}")]
    ServerError(String),
}

impl DeckError {
    /// Wrap an underlying failure behind a user-facing generation message
    pub fn generation<E>(message: &str, source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        DeckError::GenerationError {
            message: message.to_string(),
            source: Some(source.into()),
        }
    }
}

// Implement conversion from zip errors
impl From<zip::result::ZipError> for DeckError {
    fn from(err: zip::result::ZipError) -> Self {
        DeckError::PptxError(format!("ZIP operation failed: {}", err))
    }
}

impl From<serde_json::Error> for DeckError {
    fn from(err: serde_json::Error) -> Self {
        DeckError::SchemaError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DeckError>;

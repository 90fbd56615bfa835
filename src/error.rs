use thiserror::Error;

#[derive(Error, Debug)]
pub enum NarravidError {
    /// None of the boundary fallback tiers located the segment in the
    /// transcript. Carries the offending definition's text. Never recovered
    /// locally: the whole alignment call aborts with no partial result.
    #[error("No boundary found for segment: {0}")]
    BoundaryNotFound(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Segment planning failed: {0}")]
    Plan(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, NarravidError>;

pub mod whisper;

pub use whisper::WhisperClient;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One time-stamped token from the speech-to-text engine. Millisecond field
/// names follow the composition layer's wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Caption {
    pub text: String,
    pub start_ms: u64,
    pub end_ms: u64,
}

#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe an audio file into an ordered word-level caption stream.
    async fn transcribe(&self, audio: &Path) -> Result<Vec<Caption>>;
    fn name(&self) -> &'static str;
}

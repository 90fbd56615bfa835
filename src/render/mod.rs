use crate::align::Segment;
use crate::error::Result;
use crate::images::ImageSlot;
use crate::transcribe::Caption;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Everything the external video-composition stage needs to render one
/// narration: the source audio, the word-level captions, the per-speaker
/// time slices, and the illustrative image slots.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderProps {
    pub src: String,
    pub captions: Vec<Caption>,
    pub segments: Vec<Segment>,
    pub images: Vec<ImageSlot>,
}

impl RenderProps {
    pub fn new(
        src: String,
        captions: Vec<Caption>,
        segments: Vec<Segment>,
        images: Vec<ImageSlot>,
    ) -> Self {
        Self {
            src,
            captions,
            segments,
            images,
        }
    }

    /// Write the props as pretty JSON for the composition stage.
    pub fn write_props(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

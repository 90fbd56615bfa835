pub mod openrouter;

pub use openrouter::OpenRouterClient;

use crate::error::{NarravidError, Result};
use crate::transcribe::Caption;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// One logical unit of narration (a speaker turn), to be time-located
/// against the transcript. The text is expected to appear, possibly
/// imperfectly, inside the transcript, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentDef {
    pub speaker: String,
    pub text: String,
}

/// Splits a narration transcript into alternating speaker turns via an LLM.
pub struct SegmentPlanner {
    llm: OpenRouterClient,
}

impl SegmentPlanner {
    pub fn new(llm: OpenRouterClient) -> Self {
        Self { llm }
    }

    /// Produce the ordered segment definitions for a caption stream.
    pub async fn plan(&self, captions: &[Caption]) -> Result<Vec<SegmentDef>> {
        let transcript = captions
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        if transcript.trim().is_empty() {
            return Err(NarravidError::Plan(
                "Cannot plan segments for an empty transcript".to_string(),
            ));
        }

        let prompt = build_prompt(&transcript);
        debug!("Requesting segment plan from {}", self.llm.model());

        let raw = self.llm.generate(&prompt).await?;
        let defs = parse_defs(&raw)?;

        info!("Planned {} segment definitions", defs.len());
        Ok(defs)
    }
}

fn build_prompt(transcript: &str) -> String {
    format!(
        "You are a dialogue editor for short narrated videos.\n\
         Split the following narration into consecutive speaker turns,\n\
         alternating between two speakers named \"stewie\" and \"peter\".\n\
         Rules:\n\
         1. Cover the entire narration, in order, without overlap. Each turn's\n\
            text must be copied verbatim from the narration.\n\
         2. Keep turns between one and three sentences.\n\
         3. Return a JSON array with this exact schema and nothing else\n\
            (no markdown, no prose):\n\
            [{{\"speaker\": \"stewie\", \"text\": \"...\"}}, ...]\n\
         \nNARRATION:\n{}",
        transcript.trim()
    )
}

/// Parse and validate the model's reply. The model must answer with strict
/// JSON; anything else is an input-quality failure surfaced to the caller.
fn parse_defs(raw: &str) -> Result<Vec<SegmentDef>> {
    let trimmed = strip_code_fences(raw);

    let defs: Vec<SegmentDef> = serde_json::from_str(trimmed).map_err(|e| {
        let snippet = raw.chars().take(200).collect::<String>();
        NarravidError::Plan(format!(
            "Failed to parse LLM output as JSON: {e}. Raw: {snippet}"
        ))
    })?;

    if defs.is_empty() {
        return Err(NarravidError::Plan(
            "LLM returned an empty segment list".to_string(),
        ));
    }
    if let Some(bad) = defs.iter().find(|d| d.text.trim().is_empty()) {
        return Err(NarravidError::Plan(format!(
            "LLM returned a segment with empty text for speaker '{}'",
            bad.speaker
        )));
    }

    Ok(defs)
}

/// Models sometimes wrap JSON in markdown fences despite instructions.
pub(crate) fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

pub mod google;

pub use google::GoogleImageClient;

use crate::error::{NarravidError, Result};
use crate::plan::{strip_code_fences, OpenRouterClient};
use crate::transcribe::Caption;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// How many image searches run at once.
const DEFAULT_LOOKUP_CONCURRENCY: usize = 4;

/// A time-aligned image-search phrase produced by the LLM. Times are in
/// seconds; `end` may be absent when the image may persist until the next
/// cue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageCue {
    pub start: u64,
    #[serde(default)]
    pub end: Option<u64>,
    pub query: String,
}

/// A cue resolved against the image-search API. `image_url` is `None` when
/// the search came back empty; the composition layer simply skips the slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSlot {
    pub start: u64,
    pub end: Option<u64>,
    pub image_url: Option<String>,
}

/// Turns a caption stream into illustrated moments: an LLM picks
/// high-salience terms per 10-second block, then each term is resolved to an
/// image URL.
pub struct ImagePlanner {
    llm: OpenRouterClient,
    search: GoogleImageClient,
    concurrency: usize,
}

impl ImagePlanner {
    pub fn new(llm: OpenRouterClient, search: GoogleImageClient) -> Self {
        Self {
            llm,
            search,
            concurrency: DEFAULT_LOOKUP_CONCURRENCY,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// LLM pass: timestamped transcript in, search cues out.
    pub async fn search_terms(&self, captions: &[Caption]) -> Result<Vec<ImageCue>> {
        let transcript = timestamped_transcript(captions);
        if transcript.is_empty() {
            return Ok(Vec::new());
        }

        let raw = self.llm.generate(&build_cue_prompt(&transcript)).await?;
        parse_cues(&raw)
    }

    /// Resolve each cue's query against the image API, bounded-concurrently,
    /// preserving cue order.
    pub async fn resolve(&self, cues: Vec<ImageCue>) -> Result<Vec<ImageSlot>> {
        let total = cues.len();
        let slots: Vec<ImageSlot> = stream::iter(cues)
            .map(|cue| async move {
                let image_url = match self.search.first_image_url(&cue.query).await {
                    Ok(url) => url,
                    Err(e) => {
                        warn!("Image lookup failed for '{}': {}", cue.query, e);
                        None
                    }
                };
                ImageSlot {
                    start: cue.start,
                    end: cue.end,
                    image_url,
                }
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let found = slots.iter().filter(|s| s.image_url.is_some()).count();
        info!("Resolved {}/{} image cues", found, total);
        Ok(slots)
    }

    /// Full pass: cues from the LLM, then image lookup.
    pub async fn illustrate(&self, captions: &[Caption]) -> Result<Vec<ImageSlot>> {
        let cues = self.search_terms(captions).await?;
        self.resolve(cues).await
    }
}

/// "MM:SS word" lines the cue prompt expects.
fn timestamped_transcript(captions: &[Caption]) -> String {
    captions
        .iter()
        .map(|c| {
            let secs = c.start_ms / 1000;
            format!("{:02}:{:02} {}", secs / 60, secs % 60, c.text)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn build_cue_prompt(transcript: &str) -> String {
    format!(
        "You are an expert video-illustration assistant.\n\
         Given a spoken-word transcript with word-level timestamps, decide\n\
         which moments should be illustrated with a still image.\n\
         Rules:\n\
         1. Group words into 10-second blocks (0-10 s, 10-20 s, ...).\n\
         2. Pick up to two high-salience nouns or named entities (proper\n\
            nouns, places, events, mythological creatures) from each block.\n\
            Ignore fillers, verbs, pronouns. Prefer rarer terms.\n\
         3. Turn each chosen term into a concise search phrase suitable for\n\
            an image API (max 5 words).\n\
         4. Return a JSON array with this exact schema and nothing else\n\
            (no markdown):\n\
            [{{\"start\": <seconds>, \"end\": <seconds or null>, \"query\": \"...\"}}, ...]\n\
            start = beginning of the 10-second block; end = start+10 or null.\n\
         \nTRANSCRIPT:\n{}",
        transcript
    )
}

fn parse_cues(raw: &str) -> Result<Vec<ImageCue>> {
    let trimmed = strip_code_fences(raw);

    serde_json::from_str(trimmed).map_err(|e| {
        let snippet = raw.chars().take(200).collect::<String>();
        NarravidError::Api(format!(
            "Failed to parse image cues as JSON: {e}. Raw: {snippet}"
        ))
    })
}

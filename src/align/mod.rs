//! Segment-boundary alignment.
//!
//! Given a word-level transcript and an ordered list of segment definitions,
//! resolve the millisecond time range each definition occupies in the audio.
//! ASR output can drop, merge, or re-case words, so boundaries are located
//! with a tiered fallback over normalized words. The scan is strictly
//! forward: once a boundary commits, no earlier transcript position is
//! considered again.

pub mod lookup;
pub mod text;

use crate::error::{NarravidError, Result};
use crate::plan::SegmentDef;
use crate::transcribe::Caption;
use lookup::find_indices;
use serde::{Deserialize, Serialize};
use text::{first_word, last_word, normalize, second_last_word};
use tracing::debug;

/// Resolved time range for one segment definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub start_ms: u64,
    pub end_ms: u64,
}

/// Loop state threaded through the per-definition step: the next segment's
/// provisional start and the last transcript index consumed by a committed
/// boundary (`None` before the first).
#[derive(Debug, Clone, Copy)]
struct AlignState {
    cursor_ms: u64,
    last_used_index: Option<usize>,
}

/// Boundary words extracted from a definition pair.
struct BoundaryWords {
    end_word: String,
    second_last: Option<String>,
    next_first: String,
}

/// Tier 1: earliest occurrence of the end word immediately followed by an
/// occurrence of the next definition's first word.
fn tier_exact_adjacency(words: &BoundaryWords, captions: &[Caption], min: Option<usize>) -> Option<usize> {
    let end_indices = find_indices(&words.end_word, captions, min);
    let next_indices = find_indices(&words.next_first, captions, min);
    end_indices
        .into_iter()
        .find(|idx| next_indices.contains(&(idx + 1)))
}

/// Tier 2: earliest occurrence of the second-to-last word whose immediate
/// successor is the end word. Anchors the end time to the second-to-last
/// word's position, one word earlier than Tier 1 would. Downstream timing
/// depends on this; do not change the anchor without a timing review.
fn tier_second_last_then_end(words: &BoundaryWords, captions: &[Caption], min: Option<usize>) -> Option<usize> {
    let second_last = words.second_last.as_deref()?;
    find_indices(second_last, captions, min)
        .into_iter()
        .find(|idx| {
            captions
                .get(idx + 1)
                .is_some_and(|cap| normalize(&cap.text) == words.end_word)
        })
}

/// Tier 3: earliest occurrence of the second-to-last word with the next
/// definition's first word two positions later (one unmatched word between).
/// Same second-to-last anchor as Tier 2.
fn tier_second_last_skip_one(words: &BoundaryWords, captions: &[Caption], min: Option<usize>) -> Option<usize> {
    let second_last = words.second_last.as_deref()?;
    if words.next_first.is_empty() {
        return None;
    }
    find_indices(second_last, captions, min)
        .into_iter()
        .find(|idx| {
            captions
                .get(idx + 2)
                .is_some_and(|cap| normalize(&cap.text) == words.next_first)
        })
}

/// Run the tiers in order; the first hit wins.
fn resolve_boundary(words: &BoundaryWords, captions: &[Caption], min: Option<usize>) -> Option<usize> {
    let tiers: [fn(&BoundaryWords, &[Caption], Option<usize>) -> Option<usize>; 3] = [
        tier_exact_adjacency,
        tier_second_last_then_end,
        tier_second_last_skip_one,
    ];

    tiers
        .iter()
        .enumerate()
        .find_map(|(n, tier)| {
            let idx = tier(words, captions, min)?;
            debug!(
                "Tier {} matched '{}' -> '{}' at index {}",
                n + 1,
                words.end_word,
                words.next_first,
                idx
            );
            Some(idx)
        })
}

/// One pure step: resolve the current definition's end against the
/// transcript and advance the cursor for its successor.
fn align_step(
    state: AlignState,
    def: &SegmentDef,
    next_def: Option<&SegmentDef>,
    captions: &[Caption],
    video_end_ms: u64,
) -> Result<(AlignState, Segment)> {
    let Some(next_def) = next_def else {
        // Last definition spans to the end of the narration; no search.
        let segment = Segment {
            start_ms: state.cursor_ms,
            end_ms: video_end_ms,
        };
        return Ok((state, segment));
    };

    let words = BoundaryWords {
        end_word: last_word(&def.text),
        second_last: second_last_word(&def.text),
        next_first: first_word(&next_def.text),
    };

    let boundary_idx = resolve_boundary(&words, captions, state.last_used_index)
        .ok_or_else(|| NarravidError::BoundaryNotFound(def.text.clone()))?;

    let end_ms = captions[boundary_idx].end_ms;
    let segment = Segment {
        start_ms: state.cursor_ms,
        end_ms,
    };

    // The next segment starts where its first word is found past the
    // committed boundary, but never before the current segment ends.
    let candidate_start = find_indices(&words.next_first, captions, Some(boundary_idx))
        .first()
        .map(|&idx| captions[idx].start_ms)
        .unwrap_or(end_ms);

    let next_state = AlignState {
        cursor_ms: candidate_start.max(end_ms),
        last_used_index: Some(boundary_idx),
    };

    Ok((next_state, segment))
}

/// Compute one time range per segment definition, in order.
///
/// All-or-nothing: if any boundary cannot be located the whole call fails
/// with [`NarravidError::BoundaryNotFound`], since a partial result would
/// break the one-segment-per-definition contract the composition stage
/// relies on.
pub fn create_segments(captions: &[Caption], defs: &[SegmentDef]) -> Result<Vec<Segment>> {
    let video_end_ms = captions.last().map(|cap| cap.end_ms).unwrap_or(0);

    let mut segments = Vec::with_capacity(defs.len());
    let mut state = AlignState {
        cursor_ms: 0,
        last_used_index: None,
    };

    for (i, def) in defs.iter().enumerate() {
        let (next_state, segment) = align_step(state, def, defs.get(i + 1), captions, video_end_ms)?;
        segments.push(segment);
        state = next_state;
    }

    Ok(segments)
}

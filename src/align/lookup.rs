use super::text::normalize;
use crate::transcribe::Caption;

/// All transcript positions whose normalized text equals `target` and whose
/// index is strictly greater than `min_index` (`None` means before the
/// start). Ascending transcript order; the tie-break in the boundary tiers
/// always takes the first, i.e. earliest, qualifying index.
pub fn find_indices(target: &str, captions: &[Caption], min_index: Option<usize>) -> Vec<usize> {
    captions
        .iter()
        .enumerate()
        .filter(|(idx, cap)| {
            min_index.is_none_or(|min| *idx > min) && normalize(&cap.text) == target
        })
        .map(|(idx, _)| idx)
        .collect()
}

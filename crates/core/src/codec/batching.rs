//! Paging of the configured parameter list

use uplinkbridge_domain::constants::MAX_BATCH_SIZE;
use uplinkbridge_domain::{ParameterBatch, ParameterId};

/// Greedy left-to-right chunking that preserves order
///
/// `max` is clamped to `1..=15`. An empty list yields no batches.
#[must_use]
pub fn split_into_batches(ids: &[ParameterId], max: usize) -> Vec<ParameterBatch> {
    let size = max.clamp(1, MAX_BATCH_SIZE);
    ids.chunks(size)
        // chunks are never longer than the page size, so construction succeeds
        .filter_map(|chunk| ParameterBatch::new(chunk.to_vec()).ok())
        .collect()
}

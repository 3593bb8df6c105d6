use serde::{Deserialize, Serialize};

/// Tunables for [`StructuralAligner`](crate::StructuralAligner).
///
/// The thresholds are policy, not derived values; they are meant to be tuned against a
/// labeled corpus of document pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignerConfig {
    /// Words per shingle for the overlap score (default 2)
    pub shingle_size: usize,
    /// Weight of shingle Jaccard overlap (default 0.5)
    pub jaccard_weight: f64,
    /// Weight of token edit similarity (default 0.5)
    pub edit_weight: f64,
    /// Minimum score to accept a 1:1 match (default 0.5)
    pub match_threshold: f64,
    /// Scores at or above this are accepted without looking for split/merge (default 0.8)
    pub strong_match: f64,
    /// Ordinal radius searched around a projected position (default 8)
    pub window: usize,
    /// Minimum score of each part of a split/merge run (default 0.3)
    pub split_merge_part_min: f64,
    /// Minimum combined score to accept a split/merge run (default 0.6)
    pub split_merge_accept: f64,
    /// Longest split/merge run (default 4)
    pub split_merge_max_parts: usize,
}

impl Default for AlignerConfig {
    fn default() -> Self {
        Self {
            shingle_size: 2,
            jaccard_weight: 0.5,
            edit_weight: 0.5,
            match_threshold: 0.5,
            strong_match: 0.8,
            window: 8,
            split_merge_part_min: 0.3,
            split_merge_accept: 0.6,
            split_merge_max_parts: 4,
        }
    }
}

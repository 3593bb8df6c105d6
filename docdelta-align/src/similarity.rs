//! Content similarity between units.

use std::collections::HashSet;

use docdelta::token::tokenize;
use docdelta::{StructuralUnit, TokenTag};

use crate::AlignerConfig;

/// Precomputed comparison features of one unit (or a run of adjacent units).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnitFeatures {
    /// Lowercased token keys, punctuation excluded
    pub keys: Vec<String>,
    /// Word shingles over `keys`
    pub shingles: HashSet<String>,
}

impl UnitFeatures {
    pub fn of_unit(unit: &StructuralUnit, shingle_size: usize) -> Self {
        let keys = tokenize(&unit.normalized_text)
            .into_iter()
            .filter(|t| t.tag != TokenTag::Punc)
            .map(|t| t.key.to_lowercase())
            .collect();
        Self::from_keys(keys, shingle_size)
    }

    /// Features of several units read as one text.
    pub fn concat<'a>(
        parts: impl IntoIterator<Item = &'a UnitFeatures>,
        shingle_size: usize,
    ) -> Self {
        let keys = parts
            .into_iter()
            .flat_map(|f| f.keys.iter().cloned())
            .collect();
        Self::from_keys(keys, shingle_size)
    }

    fn from_keys(keys: Vec<String>, shingle_size: usize) -> Self {
        let size = shingle_size.max(1);
        let shingles = if keys.is_empty() {
            HashSet::new()
        } else if keys.len() <= size {
            std::iter::once(keys.join(" ")).collect()
        } else {
            keys.windows(size).map(|w| w.join(" ")).collect()
        };
        Self { keys, shingles }
    }
}

/// Score two feature sets in `0.0..=1.0`.
pub fn similarity(a: &UnitFeatures, b: &UnitFeatures, config: &AlignerConfig) -> f64 {
    let overlap = jaccard_set(&a.shingles, &b.shingles);
    let edit = edit_similarity(&a.keys, &b.keys);

    let total_weight = config.jaccard_weight + config.edit_weight;
    if total_weight <= 0.0 {
        return (overlap + edit) / 2.0;
    }
    ((overlap * config.jaccard_weight + edit * config.edit_weight) / total_weight).clamp(0.0, 1.0)
}

/// Jaccard similarity between two sets.
fn jaccard_set(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0; // Both empty = identical
    }
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    intersection as f64 / union as f64
}

/// `1 - levenshtein / max_len` over token sequences.
fn edit_similarity(a: &[String], b: &[String]) -> f64 {
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 1.0;
    }
    1.0 - token_edit_distance(a, b) as f64 / longest as f64
}

fn token_edit_distance(a: &[String], b: &[String]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, left) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, right) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(left != right);
            curr[j + 1] = substitution.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

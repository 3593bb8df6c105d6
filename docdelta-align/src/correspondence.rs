use std::collections::HashMap;

use docdelta::{Side, StructuralUnit, UnitId};
use serde::{Deserialize, Serialize};

use crate::AlignError;

/// The kind of relation between reference and client units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrespondenceKind {
    /// Exactly one unit on each side
    Matched,
    /// One reference unit became several adjacent client units
    Split,
    /// Several adjacent reference units became one client unit
    Merged,
    /// Client unit with no reference counterpart
    Inserted,
    /// Reference unit with no client counterpart
    Deleted,
}

/// A relation between reference and client units, by ordinal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correspondence {
    pub kind: CorrespondenceKind,
    /// Reference ordinals, ascending (empty for insertions)
    pub reference: Vec<usize>,
    /// Client ordinals, ascending (empty for deletions)
    pub client: Vec<usize>,
    /// Score that justified the correspondence (1.0 for anchors, 0.0 for unmatched)
    pub similarity: f64,
}

impl Correspondence {
    pub fn matched(reference: usize, client: usize, similarity: f64) -> Self {
        Self {
            kind: CorrespondenceKind::Matched,
            reference: vec![reference],
            client: vec![client],
            similarity,
        }
    }

    pub fn inserted(client: usize) -> Self {
        Self {
            kind: CorrespondenceKind::Inserted,
            reference: Vec::new(),
            client: vec![client],
            similarity: 0.0,
        }
    }

    pub fn deleted(reference: usize) -> Self {
        Self {
            kind: CorrespondenceKind::Deleted,
            reference: vec![reference],
            client: Vec::new(),
            similarity: 0.0,
        }
    }

    pub fn reference_units<'a>(&self, units: &'a [StructuralUnit]) -> Vec<&'a StructuralUnit> {
        self.reference.iter().filter_map(|&i| units.get(i)).collect()
    }

    pub fn client_units<'a>(&self, units: &'a [StructuralUnit]) -> Vec<&'a StructuralUnit> {
        self.client.iter().filter_map(|&i| units.get(i)).collect()
    }

    pub fn reference_ids(&self) -> Vec<UnitId> {
        self.reference
            .iter()
            .map(|&i| UnitId::new(Side::Reference, i))
            .collect()
    }

    pub fn client_ids(&self) -> Vec<UnitId> {
        self.client
            .iter()
            .map(|&i| UnitId::new(Side::Client, i))
            .collect()
    }

    fn shape_is_valid(&self) -> bool {
        let (r, c) = (self.reference.len(), self.client.len());
        match self.kind {
            CorrespondenceKind::Matched => r == 1 && c == 1,
            CorrespondenceKind::Split => r == 1 && c >= 2,
            CorrespondenceKind::Merged => r >= 2 && c == 1,
            CorrespondenceKind::Inserted => r == 0 && c == 1,
            CorrespondenceKind::Deleted => r == 1 && c == 0,
        }
    }
}

/// Statistics about an alignment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignmentStats {
    pub reference_units: usize,
    pub client_units: usize,
    /// Matches found by identical normalized text
    pub anchors: usize,
    pub matched: usize,
    pub split: usize,
    pub merged: usize,
    pub inserted: usize,
    pub deleted: usize,
    /// Pair scores computed (bounded by the window)
    pub comparisons: usize,
}

impl AlignmentStats {
    pub(crate) fn increment(&mut self, kind: CorrespondenceKind) {
        match kind {
            CorrespondenceKind::Matched => self.matched += 1,
            CorrespondenceKind::Split => self.split += 1,
            CorrespondenceKind::Merged => self.merged += 1,
            CorrespondenceKind::Inserted => self.inserted += 1,
            CorrespondenceKind::Deleted => self.deleted += 1,
        }
    }
}

/// The complete partition of both unit sequences.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Alignment {
    pub correspondences: Vec<Correspondence>,
    pub stats: AlignmentStats,
}

impl Alignment {
    /// Check that every unit on both sides appears in exactly one correspondence.
    pub fn verify_partition(&self) -> Result<(), AlignError> {
        let mut reference = vec![0usize; self.stats.reference_units];
        let mut client = vec![0usize; self.stats.client_units];

        for (index, corr) in self.correspondences.iter().enumerate() {
            if !corr.shape_is_valid() {
                return Err(AlignError::Malformed {
                    index,
                    kind: corr.kind,
                    reference: corr.reference.len(),
                    client: corr.client.len(),
                });
            }
            count(&mut reference, &corr.reference, Side::Reference)?;
            count(&mut client, &corr.client, Side::Client)?;
        }

        check_once(&reference, Side::Reference)?;
        check_once(&client, Side::Client)
    }

    /// Reference ordinal an inserted client unit is ordered after.
    ///
    /// Let `p` be the last reference ordinal partnered with the nearest preceding client unit
    /// that has a partner, and `q` the first reference ordinal partnered with the nearest
    /// following one (the reference length when there is none). The insertion goes after
    /// `max(p, q - 1)`, so it lands behind any deletions in the gap. `None` means before the
    /// first reference unit.
    pub fn insertion_anchor(&self, client_ordinal: usize) -> Option<usize> {
        self.anchor_with(&self.client_partners(), client_ordinal)
    }

    fn anchor_with(
        &self,
        partners: &HashMap<usize, &Vec<usize>>,
        client_ordinal: usize,
    ) -> Option<usize> {
        let p = (0..client_ordinal)
            .rev()
            .find_map(|c| partners.get(&c))
            .and_then(|refs| refs.iter().max().copied());
        let q = (client_ordinal + 1..self.stats.client_units)
            .find_map(|c| partners.get(&c))
            .and_then(|refs| refs.iter().min().copied())
            .unwrap_or(self.stats.reference_units);

        match (p, q.checked_sub(1)) {
            (Some(p), Some(before_q)) => Some(p.max(before_q)),
            (Some(p), None) => Some(p),
            (None, before_q) => before_q,
        }
    }

    /// Correspondences in reference-document order.
    ///
    /// Correspondences with reference units sort by their first reference ordinal; pure
    /// insertions sort right after their [`insertion_anchor`](Self::insertion_anchor), by
    /// client ordinal.
    pub fn in_reference_order(&self) -> Vec<&Correspondence> {
        let partners = self.client_partners();
        let mut ordered: Vec<(OrderKey, &Correspondence)> = self
            .correspondences
            .iter()
            .map(|corr| (self.order_key(corr, &partners), corr))
            .collect();
        ordered.sort_by(|a, b| a.0.cmp(&b.0));
        ordered.into_iter().map(|(_, corr)| corr).collect()
    }

    fn order_key(
        &self,
        corr: &Correspondence,
        partners: &HashMap<usize, &Vec<usize>>,
    ) -> OrderKey {
        let first_client = corr.client.first().copied().unwrap_or(0);
        match corr.reference.first() {
            Some(&first_ref) => (Some(first_ref), 0, first_client),
            None => (self.anchor_with(partners, first_client), 1, first_client),
        }
    }

    fn client_partners(&self) -> HashMap<usize, &Vec<usize>> {
        self.correspondences
            .iter()
            .filter(|corr| !corr.reference.is_empty())
            .flat_map(|corr| corr.client.iter().map(move |&c| (c, &corr.reference)))
            .collect()
    }
}

/// (after reference ordinal, rank, client ordinal)
type OrderKey = (Option<usize>, u8, usize);

fn count(slots: &mut [usize], ordinals: &[usize], side: Side) -> Result<(), AlignError> {
    let len = slots.len();
    for &ordinal in ordinals {
        match slots.get_mut(ordinal) {
            Some(slot) => *slot += 1,
            None => return Err(AlignError::OutOfRange { side, ordinal, len }),
        }
    }
    Ok(())
}

fn check_once(slots: &[usize], side: Side) -> Result<(), AlignError> {
    match slots.iter().position(|&n| n != 1) {
        Some(ordinal) => Err(AlignError::PartitionViolation {
            side,
            ordinal,
            occurrences: slots[ordinal],
        }),
        None => Ok(()),
    }
}

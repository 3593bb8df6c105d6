use std::ops::Range;

use docdelta::token::tokenize;
use docdelta::{StructuralUnit, Token, UnitId};
use docdelta_align::{Correspondence, CorrespondenceKind};
use serde::{Deserialize, Serialize};

use crate::highlight::{self, Mark};
use crate::hunk::{group_hunks, Hunk};
use crate::diff_tokens;

/// Kind of a detected change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Addition,
    Deletion,
    Modification,
}

impl ChangeType {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeType::Addition => "addition",
            ChangeType::Deletion => "deletion",
            ChangeType::Modification => "modification",
        }
    }
}

/// A removed or added text span, as byte offsets into the candidate's text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditSpan {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

/// Raw change before severity and routing enrichment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeCandidate {
    pub correspondence: CorrespondenceKind,
    pub reference_ids: Vec<UnitId>,
    pub client_ids: Vec<UnitId>,
    pub reference_ordinals: Vec<usize>,
    pub client_ordinals: Vec<usize>,
    /// Position of this candidate among those of its correspondence
    pub sequence: usize,
    pub change_type: ChangeType,
    /// Spans of `original_text` that were removed
    pub removed: Vec<EditSpan>,
    /// Spans of `modified_text` that were added
    pub added: Vec<EditSpan>,
    /// Reference unit bodies joined by a space (empty for additions of whole units)
    pub original_text: String,
    /// Client unit bodies joined by a space (empty for deletions of whole units)
    pub modified_text: String,
    pub highlighted_original: String,
    pub highlighted_modified: String,
}

impl ChangeCandidate {
    /// Removed span texts joined by a space.
    pub fn removed_text(&self) -> String {
        join_spans(&self.removed)
    }

    /// Added span texts joined by a space.
    pub fn added_text(&self) -> String {
        join_spans(&self.added)
    }

    /// True when the candidate removes or adds a whole unit.
    pub fn is_whole_unit(&self) -> bool {
        matches!(
            self.correspondence,
            CorrespondenceKind::Inserted | CorrespondenceKind::Deleted
        )
    }
}

fn join_spans(spans: &[EditSpan]) -> String {
    spans
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Tunables for [`ChangeExtractor`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffConfig {
    /// Changed runs separated by at most this many equal tokens form one change (default 3)
    pub merge_gap: usize,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self { merge_gap: 3 }
    }
}

/// Computes change candidates for correspondences.
#[derive(Debug, Clone, Default)]
pub struct ChangeExtractor {
    config: DiffConfig,
}

impl ChangeExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: DiffConfig) -> Self {
        Self { config }
    }

    /// Candidates for one correspondence.
    ///
    /// `reference` and `client` are the full unit sequences the correspondence's ordinals
    /// index into.
    pub fn extract(
        &self,
        corr: &Correspondence,
        reference: &[StructuralUnit],
        client: &[StructuralUnit],
    ) -> Vec<ChangeCandidate> {
        let reference_units = corr.reference_units(reference);
        let client_units = corr.client_units(client);
        let original_text = join_bodies(&reference_units);
        let modified_text = join_bodies(&client_units);

        let base = ChangeCandidate {
            correspondence: corr.kind,
            reference_ids: reference_units.iter().map(|u| u.unit_id.clone()).collect(),
            client_ids: client_units.iter().map(|u| u.unit_id.clone()).collect(),
            reference_ordinals: corr.reference.clone(),
            client_ordinals: corr.client.clone(),
            sequence: 0,
            change_type: ChangeType::Modification,
            removed: Vec::new(),
            added: Vec::new(),
            original_text: String::new(),
            modified_text: String::new(),
            highlighted_original: String::new(),
            highlighted_modified: String::new(),
        };

        match corr.kind {
            CorrespondenceKind::Inserted => vec![ChangeCandidate {
                change_type: ChangeType::Addition,
                added: vec![whole_span(&modified_text)],
                highlighted_modified: highlight::wrap_all(&modified_text, Mark::Added),
                modified_text,
                ..base
            }],
            CorrespondenceKind::Deleted => vec![ChangeCandidate {
                change_type: ChangeType::Deletion,
                removed: vec![whole_span(&original_text)],
                highlighted_original: highlight::wrap_all(&original_text, Mark::Removed),
                original_text,
                ..base
            }],
            CorrespondenceKind::Matched | CorrespondenceKind::Split | CorrespondenceKind::Merged => {
                if normalized_equal(&reference_units, &client_units) {
                    return Vec::new();
                }
                self.token_changes(base, original_text, modified_text)
            }
        }
    }

    fn token_changes(
        &self,
        base: ChangeCandidate,
        original_text: String,
        modified_text: String,
    ) -> Vec<ChangeCandidate> {
        let left = tokenize(&original_text);
        let right = tokenize(&modified_text);
        let ops = diff_tokens(&left, &right);

        group_hunks(&ops, self.config.merge_gap)
            .into_iter()
            .enumerate()
            .map(|(sequence, hunk)| {
                let removed = byte_spans(&left, &hunk.removed);
                let added = byte_spans(&right, &hunk.added);
                ChangeCandidate {
                    sequence,
                    change_type: change_type_of(&hunk),
                    highlighted_original: highlight::render(&original_text, &removed, Mark::Removed),
                    highlighted_modified: highlight::render(&modified_text, &added, Mark::Added),
                    removed: edit_spans(&original_text, &removed),
                    added: edit_spans(&modified_text, &added),
                    original_text: original_text.clone(),
                    modified_text: modified_text.clone(),
                    ..base.clone()
                }
            })
            .collect()
    }
}

fn join_bodies(units: &[&StructuralUnit]) -> String {
    units
        .iter()
        .map(|u| u.body_text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

fn normalized_equal(left: &[&StructuralUnit], right: &[&StructuralUnit]) -> bool {
    let joined = |units: &[&StructuralUnit]| {
        units
            .iter()
            .map(|u| u.normalized_text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    };
    joined(left) == joined(right)
}

fn change_type_of(hunk: &Hunk) -> ChangeType {
    match (hunk.removed.is_empty(), hunk.added.is_empty()) {
        (false, true) => ChangeType::Deletion,
        (true, false) => ChangeType::Addition,
        _ => ChangeType::Modification,
    }
}

/// Token index ranges to byte ranges.
fn byte_spans(tokens: &[Token], ranges: &[Range<usize>]) -> Vec<Range<usize>> {
    ranges
        .iter()
        .filter(|r| r.start < r.end && r.end <= tokens.len())
        .map(|r| tokens[r.start].start..tokens[r.end - 1].end)
        .collect()
}

fn edit_spans(text: &str, spans: &[Range<usize>]) -> Vec<EditSpan> {
    spans
        .iter()
        .map(|s| EditSpan {
            start: s.start,
            end: s.end,
            text: text[s.clone()].to_string(),
        })
        .collect()
}

fn whole_span(text: &str) -> EditSpan {
    EditSpan {
        start: 0,
        end: text.len(),
        text: text.to_string(),
    }
}

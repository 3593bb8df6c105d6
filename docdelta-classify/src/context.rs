use docdelta::StructuralUnit;
use docdelta_diff::ChangeCandidate;
use serde::{Deserialize, Serialize};

/// Where in the document a change sits.
///
/// Built from the reference side when the change touches reference units, otherwise from
/// the client side (pure insertions).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationContext {
    /// Labels of the units the change touches, as written minus a trailing dot
    pub labels: Vec<String>,
    /// Nearest labeled unit before the change
    pub previous_label: Option<String>,
    /// Nearest labeled unit after the change
    pub next_label: Option<String>,
    /// Text of the nearest heading at or before the change
    pub section: Option<String>,
}

impl ClassificationContext {
    pub fn for_candidate(
        candidate: &ChangeCandidate,
        reference: &[StructuralUnit],
        client: &[StructuralUnit],
    ) -> Self {
        let (units, ordinals) = if candidate.reference_ordinals.is_empty() {
            (client, &candidate.client_ordinals)
        } else {
            (reference, &candidate.reference_ordinals)
        };
        let (Some(&first), Some(&last)) = (ordinals.first(), ordinals.last()) else {
            return Self::default();
        };

        let label_of = |u: &StructuralUnit| {
            u.clause_label
                .as_ref()
                .map(|l| l.text.trim_end_matches('.').to_string())
        };

        Self {
            labels: ordinals
                .iter()
                .filter_map(|&i| units.get(i))
                .filter_map(label_of)
                .collect(),
            previous_label: units[..first.min(units.len())]
                .iter()
                .rev()
                .find_map(label_of),
            next_label: units.iter().skip(last + 1).find_map(label_of),
            section: units[..(first + 1).min(units.len())]
                .iter()
                .rev()
                .find(|u| u.is_heading)
                .map(|u| u.body_text.clone()),
        }
    }

    /// One-line description for prompts, e.g. `section "PAYMENT"; clause 3.2 (after 3.1)`.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(section) = &self.section {
            parts.push(format!("section \"{}\"", section));
        }
        if !self.labels.is_empty() {
            parts.push(format!("clause {}", self.labels.join(", ")));
        }
        match (&self.previous_label, &self.next_label) {
            (Some(prev), Some(next)) => parts.push(format!("between {} and {}", prev, next)),
            (Some(prev), None) => parts.push(format!("after {}", prev)),
            (None, Some(next)) => parts.push(format!("before {}", next)),
            (None, None) => {}
        }
        if parts.is_empty() {
            "no structural context".to_string()
        } else {
            parts.join("; ")
        }
    }
}

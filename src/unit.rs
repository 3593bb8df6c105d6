use std::fmt;

use serde::{Deserialize, Serialize};

use crate::label::ClauseLabel;

/// Which document of a comparison pair a unit belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// The reference (template) document
    Reference,
    /// The client's edited version
    Client,
}

impl Side {
    /// Single-letter prefix used in unit ids.
    pub fn prefix(self) -> char {
        match self {
            Side::Reference => 'R',
            Side::Client => 'C',
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Side::Reference => "reference",
            Side::Client => "client",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier of a unit, stable within its document.
///
/// Ids are the side prefix followed by the zero-padded ordinal (`R000003`), so
/// lexicographic order equals document order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(String);

impl UnitId {
    pub fn new(side: Side, ordinal: usize) -> Self {
        Self(format!("{}{:06}", side.prefix(), ordinal))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One addressable clause or paragraph of a document after normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuralUnit {
    pub unit_id: UnitId,
    /// Dense position among surviving units (0-based)
    pub ordinal: usize,
    /// Block text as extracted, label included, lines trimmed
    pub raw_text: String,
    /// Label and bullet stripped, whitespace collapsed
    pub body_text: String,
    /// `body_text` with dash, quote and space variants folded
    pub normalized_text: String,
    pub clause_label: Option<ClauseLabel>,
    pub document_side: Side,
    /// 1-based page number when the extractor reported page breaks
    pub page: Option<usize>,
    /// Heading-like unit (hinted by the extractor, or a short title line)
    pub is_heading: bool,
}

impl StructuralUnit {
    /// Case-insensitive key used to anchor identical clauses.
    pub fn match_key(&self) -> String {
        self.normalized_text.to_lowercase()
    }

    pub fn word_count(&self) -> usize {
        self.normalized_text.split_whitespace().count()
    }
}

/// Size figures for one normalized document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentStats {
    pub units: usize,
    pub words: usize,
    pub chars: usize,
    /// Blocks dropped for being shorter than the minimal unit length
    pub dropped_fragments: usize,
    /// Page numbers and similar running artifacts removed before splitting
    pub page_artifacts: usize,
    pub language: Language,
}

/// Dominant script of a document's letters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Ru,
    En,
    /// As many Cyrillic letters as Latin ones
    Mixed,
    /// No letters at all
    #[default]
    Unknown,
}

impl Language {
    /// Compare Cyrillic against Latin letter counts.
    pub fn detect<'a>(texts: impl IntoIterator<Item = &'a str>) -> Self {
        let (mut cyrillic, mut latin) = (0usize, 0usize);
        for c in texts.into_iter().flat_map(str::chars) {
            if c.is_ascii_alphabetic() {
                latin += 1;
            } else if matches!(c, '\u{0400}'..='\u{04FF}') && c.is_alphabetic() {
                cyrillic += 1;
            }
        }
        if cyrillic + latin == 0 {
            return Language::Unknown;
        }
        match cyrillic.cmp(&latin) {
            std::cmp::Ordering::Greater => Language::Ru,
            std::cmp::Ordering::Less => Language::En,
            std::cmp::Ordering::Equal => Language::Mixed,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Language::Ru => "ru",
            Language::En => "en",
            Language::Mixed => "mixed",
            Language::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

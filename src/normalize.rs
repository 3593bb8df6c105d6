//! Document normalization.
//!
//! [`DocumentNormalizer`] turns the extracted text of one document into dense, ordered
//! [`StructuralUnit`]s:
//!
//! 1. Lines are scanned once: running page artifacts (`12`, `Page 3 of 9`, `стр. 4`) are
//!    removed and page numbers / heading hints from the extractor are attached.
//! 2. Lines are grouped into blocks. Blank lines separate blocks; a line that opens with a
//!    clause label or is hinted as a heading starts a new block. A document without blank
//!    lines falls back to one block per line, and a single line falls back to sentences.
//! 3. Each block has its bullet and clause label split off, whitespace collapsed and
//!    punctuation variants folded. Blocks too short to carry meaning are dropped; a block that
//!    is only a label (`ARTICLE IV`) hands that label to the next block.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::label::{self, ClauseLabel, LabelKind};
use crate::token::{collapse_whitespace, fold_punctuation};
use crate::{DocumentStats, Language, NormalizeError, Side, StructuralUnit, UnitId};

static PAGE_ARTIFACT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:\d{1,4}|\d{1,4}\s*/\s*\d{1,4}|[-–—]\s*\d{1,4}\s*[-–—]|(?:page|стр\.?|страница)\s*\d{1,4}(?:\s*(?:of|из)\s*\d{1,4})?)$",
    )
    .expect("Invalid page artifact regex")
});

static SENTENCE_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]+\s+").expect("Invalid sentence regex"));

/// Positional metadata reported by a text extractor.
///
/// Offsets are byte offsets into [`ExtractedText::text`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutHints {
    /// Offsets at which a new page begins
    pub page_breaks: Vec<usize>,
    /// Offsets inside lines the extractor identified as headings
    pub headings: Vec<usize>,
}

impl LayoutHints {
    pub fn is_empty(&self) -> bool {
        self.page_breaks.is_empty() && self.headings.is_empty()
    }
}

/// Plain text of one document plus optional layout hints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedText {
    pub text: String,
    #[serde(default)]
    pub hints: LayoutHints,
}

impl ExtractedText {
    /// Text without layout hints.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            hints: LayoutHints::default(),
        }
    }

    pub fn with_hints(text: impl Into<String>, hints: LayoutHints) -> Self {
        Self {
            text: text.into(),
            hints,
        }
    }
}

/// Tunables for [`DocumentNormalizer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Minimal number of alphanumeric characters a unit body must contain
    pub min_unit_chars: usize,
    /// Drop standalone page numbers and "Page N of M" lines
    pub strip_page_artifacts: bool,
    /// Start a new unit at every line opening with a clause label
    pub split_on_labels: bool,
    /// Longest word count a unit may have to be considered a heading
    pub heading_max_words: usize,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            min_unit_chars: 3,
            strip_page_artifacts: true,
            split_on_labels: true,
            heading_max_words: 8,
        }
    }
}

/// Result of normalizing one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedDocument {
    pub side: Side,
    pub units: Vec<StructuralUnit>,
    pub stats: DocumentStats,
}

impl NormalizedDocument {
    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn get(&self, ordinal: usize) -> Option<&StructuralUnit> {
        self.units.get(ordinal)
    }
}

/// Splits extracted text into structural units.
#[derive(Debug, Clone, Default)]
pub struct DocumentNormalizer {
    config: NormalizerConfig,
}

#[derive(Clone)]
struct Line {
    text: String,
    page: Option<usize>,
    heading_hint: bool,
}

struct Block {
    lines: Vec<Line>,
}

impl Block {
    fn single(line: Line) -> Self {
        Self { lines: vec![line] }
    }

    fn page(&self) -> Option<usize> {
        self.lines.first().and_then(|l| l.page)
    }

    fn heading_hint(&self) -> bool {
        self.lines.first().map_or(false, |l| l.heading_hint)
    }

    fn raw_text(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl DocumentNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: NormalizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Normalize one document.
    ///
    /// Fails with [`NormalizeError::EmptyDocument`] when no unit survives.
    pub fn normalize(
        &self,
        side: Side,
        extracted: &ExtractedText,
    ) -> Result<NormalizedDocument, NormalizeError> {
        let mut stats = DocumentStats::default();
        let lines = self.scan_lines(extracted, &mut stats);
        let blocks = self.group_blocks(lines);

        let mut units: Vec<StructuralUnit> = Vec::with_capacity(blocks.len());
        let mut pending: Option<(ClauseLabel, String)> = None;

        for block in blocks {
            let raw_text = block.raw_text();
            let collapsed = collapse_whitespace(&raw_text);
            let (detected, body) = label::strip_decorations(&collapsed);

            if alphanumeric_count(body) < self.config.min_unit_chars {
                match detected {
                    Some(label) => {
                        if pending.is_some() {
                            stats.dropped_fragments += 1;
                        }
                        pending = Some((label, raw_text));
                    }
                    None => stats.dropped_fragments += 1,
                }
                continue;
            }

            let (clause_label, raw_text) = match (detected, pending.take()) {
                (Some(label), carried) => {
                    if carried.is_some() {
                        stats.dropped_fragments += 1;
                    }
                    (Some(label), raw_text)
                }
                (None, Some((label, label_raw))) => {
                    (Some(label), format!("{}\n{}", label_raw, raw_text))
                }
                (None, None) => (None, raw_text),
            };

            let body_text = body.to_string();
            let normalized_text = collapse_whitespace(&fold_punctuation(&body_text));
            let is_heading =
                block.heading_hint() || self.looks_like_heading(&normalized_text, &clause_label);
            let ordinal = units.len();

            units.push(StructuralUnit {
                unit_id: UnitId::new(side, ordinal),
                ordinal,
                raw_text,
                body_text,
                normalized_text,
                clause_label,
                document_side: side,
                page: block.page(),
                is_heading,
            });
        }

        if pending.is_some() {
            stats.dropped_fragments += 1;
        }

        if units.is_empty() {
            return Err(NormalizeError::EmptyDocument { side });
        }

        stats.units = units.len();
        stats.words = units.iter().map(StructuralUnit::word_count).sum();
        stats.chars = units.iter().map(|u| u.normalized_text.chars().count()).sum();
        stats.language = Language::detect(units.iter().map(|u| u.body_text.as_str()));

        Ok(NormalizedDocument { side, units, stats })
    }

    fn scan_lines(&self, extracted: &ExtractedText, stats: &mut DocumentStats) -> Vec<Line> {
        let text = extracted.text.as_str();
        let mut breaks: Vec<usize> = extracted.hints.page_breaks.clone();
        breaks.extend(text.match_indices('\u{000C}').map(|(at, _)| at));
        breaks.sort_unstable();
        breaks.dedup();
        let paged = !breaks.is_empty();

        let mut lines = Vec::new();
        let mut offset = 0;
        for raw in text.split('\n') {
            let start = offset;
            let end = start + raw.len();
            offset = end + 1;

            let cleaned: String = raw
                .chars()
                .filter(|c| !matches!(c, '\u{FEFF}' | '\u{000C}' | '\r'))
                .collect();
            let trimmed = cleaned.trim();

            if self.config.strip_page_artifacts && PAGE_ARTIFACT.is_match(trimmed) {
                stats.page_artifacts += 1;
                continue;
            }

            let page = paged.then(|| 1 + breaks.partition_point(|at| *at <= start));
            let heading_hint = extracted
                .hints
                .headings
                .iter()
                .any(|at| *at >= start && *at <= end);

            lines.push(Line {
                text: trimmed.to_string(),
                page,
                heading_hint,
            });
        }
        lines
    }

    fn group_blocks(&self, lines: Vec<Line>) -> Vec<Block> {
        let mut blocks: Vec<Block> = Vec::new();
        let mut current: Option<Block> = None;

        for line in lines {
            if line.text.is_empty() {
                blocks.extend(current.take());
                continue;
            }
            let starts_new = line.heading_hint
                || (self.config.split_on_labels && label::starts_with_label(&line.text));
            match current.as_mut() {
                Some(block) if !starts_new && !block.heading_hint() => block.lines.push(line),
                _ => {
                    blocks.extend(current.take());
                    current = Some(Block::single(line));
                }
            }
        }
        blocks.extend(current.take());

        if blocks.len() != 1 {
            return blocks;
        }

        let mut lines = blocks.remove(0).lines;
        if lines.len() > 1 {
            return lines.into_iter().map(Block::single).collect();
        }

        let line = lines.remove(0);
        split_sentences(&line.text)
            .into_iter()
            .map(|sentence| {
                Block::single(Line {
                    text: sentence.to_string(),
                    ..line.clone()
                })
            })
            .collect()
    }

    fn looks_like_heading(&self, text: &str, label: &Option<ClauseLabel>) -> bool {
        if text.split_whitespace().count() > self.config.heading_max_words {
            return false;
        }
        let letters: Vec<char> = text.chars().filter(|c| c.is_alphabetic()).collect();
        let all_caps = letters.len() >= 2 && letters.iter().all(|c| c.is_uppercase());
        let named = matches!(label, Some(l) if l.kind == LabelKind::Named);
        let unterminated = !text.ends_with(['.', ';', ':', ',']);
        all_caps || (named && unterminated)
    }
}

fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut last = 0;
    for m in SENTENCE_END.find_iter(text) {
        let sentence = text[last..m.end()].trim();
        if !sentence.is_empty() {
            sentences.push(sentence);
        }
        last = m.end();
    }
    let tail = text[last..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }
    sentences
}

fn alphanumeric_count(text: &str) -> usize {
    text.chars().filter(|c| c.is_alphanumeric()).count()
}

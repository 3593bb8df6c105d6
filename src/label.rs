//! Clause label detection.
//!
//! Recognizes the numbering that opens a clause so it can be stored apart from the
//! clause body:
//! - `3.2`, `3.2.1.`, `4.` / `4)` - numeric outlines
//! - `Section 3`, `ARTICLE IV`, `Статья 5` - named headings
//! - `(a)`, `(iv)`, `(12)` - parenthesized list items
//! - `IV.` - Roman numerals, `a)` / `B.` - bare letters
//!
//! Bullets (`•`, `-`, `*`, ...) are stripped without producing a label.
//!
//! Labels never take part in alignment. A renumbered document keeps matching by content;
//! labels only give the classifier context about where a change sits.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static BULLET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[•·▪◦‣●○■□\-–—*]\s+").expect("Invalid bullet regex"));

static NAMED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(article|section|clause|paragraph|chapter|schedule|exhibit|annex|appendix|статья|пункт|раздел|глава|приложение)\s+(\d{1,3}(?:\.\d{1,3})*|[ivxlcdm]{1,7}|[a-zа-я])(?:\.|\b)",
    )
    .expect("Invalid named label regex")
});

static NUMERIC_OUTLINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,3}(?:\.\d{1,3})+)\.?(?:\s+|$)").expect("Invalid outline regex")
});

static NUMERIC_SINGLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,3})[.)](?:\s+|$)").expect("Invalid numeric regex"));

static PARENTHESIZED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\(([a-z]{1,4}|\d{1,3}|[а-я])\)(?:\s+|$)").expect("Invalid list item regex")
});

static ROMAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([IVXLC]{1,6})[.)](?:\s+|$)").expect("Invalid roman regex"));

static LETTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^([a-zа-я])[.)](?:\s+|$)").expect("Invalid letter regex"));

/// Shape of a detected label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelKind {
    /// `3`, `3.2`, `3.2.1`
    Numeric,
    /// `Section 3`, `ARTICLE IV`
    Named,
    /// `(a)`, `(iv)`, `(12)`
    Parenthesized,
    /// `IV.`
    Roman,
    /// `a)`, `B.`
    Letter,
}

/// A clause label split off the start of a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClauseLabel {
    /// Label as written, e.g. "Section 3.2" or "(a)"
    pub text: String,
    pub kind: LabelKind,
    /// Comparable form: "3.2", "article:4", "a", "R4"
    pub canonical: String,
}

impl ClauseLabel {
    /// Estimated nesting depth (1 = top level).
    pub fn depth(&self) -> u8 {
        match self.kind {
            LabelKind::Numeric => self.canonical.split('.').count() as u8,
            LabelKind::Named => self
                .canonical
                .split_once(':')
                .map(|(_, id)| id.split('.').count() as u8)
                .unwrap_or(1),
            LabelKind::Roman => 1,
            LabelKind::Parenthesized | LabelKind::Letter => 4,
        }
    }
}

/// Returns true if the line opens with a clause label.
pub fn starts_with_label(line: &str) -> bool {
    detect_label(line.trim_start()).is_some()
}

/// Strip a leading bullet and clause label from a line.
///
/// Returns the detected label (if any) and the remaining text.
pub fn strip_decorations(line: &str) -> (Option<ClauseLabel>, &str) {
    let mut rest = line.trim_start();
    if let Some(m) = BULLET.find(rest) {
        rest = &rest[m.end()..];
    }
    match detect_label(rest) {
        Some((label, body)) => (Some(label), body),
        None => (None, rest.trim_end()),
    }
}

/// Detect a clause label at the very start of `line`.
///
/// Returns the label and the text following it, trimmed.
pub fn detect_label(line: &str) -> Option<(ClauseLabel, &str)> {
    if let Some(caps) = NAMED.captures(line) {
        let whole = caps.get(0)?;
        let keyword = canonical_keyword(&caps[1]);
        let ident = canonical_ident(&caps[2]);
        let label = ClauseLabel {
            text: whole.as_str().trim_end_matches('.').to_string(),
            kind: LabelKind::Named,
            canonical: format!("{}:{}", keyword, ident),
        };
        return Some((label, trim_separator(&line[whole.end()..])));
    }

    if let Some(caps) = NUMERIC_OUTLINE
        .captures(line)
        .or_else(|| NUMERIC_SINGLE.captures(line))
    {
        let whole = caps.get(0)?;
        let label = ClauseLabel {
            text: whole.as_str().trim().to_string(),
            kind: LabelKind::Numeric,
            canonical: canonical_numeric(&caps[1]),
        };
        return Some((label, trim_separator(&line[whole.end()..])));
    }

    if let Some(caps) = PARENTHESIZED.captures(line) {
        let whole = caps.get(0)?;
        let label = ClauseLabel {
            text: whole.as_str().trim().to_string(),
            kind: LabelKind::Parenthesized,
            canonical: caps[1].to_lowercase(),
        };
        return Some((label, trim_separator(&line[whole.end()..])));
    }

    if let Some(caps) = ROMAN.captures(line) {
        if let Some(value) = parse_roman(&caps[1]) {
            let whole = caps.get(0)?;
            let label = ClauseLabel {
                text: whole.as_str().trim().to_string(),
                kind: LabelKind::Roman,
                canonical: format!("R{}", value),
            };
            return Some((label, trim_separator(&line[whole.end()..])));
        }
    }

    if let Some(caps) = LETTER.captures(line) {
        let whole = caps.get(0)?;
        let label = ClauseLabel {
            text: whole.as_str().trim().to_string(),
            kind: LabelKind::Letter,
            canonical: caps[1].to_lowercase(),
        };
        return Some((label, trim_separator(&line[whole.end()..])));
    }

    None
}

fn trim_separator(rest: &str) -> &str {
    rest.trim_start_matches(|c: char| {
        c.is_whitespace() || matches!(c, ':' | '-' | '–' | '—' | '.' | ')')
    })
    .trim_end()
}

fn canonical_keyword(keyword: &str) -> &'static str {
    match keyword.to_lowercase().as_str() {
        "article" | "статья" => "article",
        "section" | "раздел" => "section",
        "clause" | "пункт" => "clause",
        "paragraph" => "paragraph",
        "chapter" | "глава" => "chapter",
        "schedule" => "schedule",
        "exhibit" => "exhibit",
        "annex" | "приложение" => "annex",
        _ => "appendix",
    }
}

fn canonical_ident(ident: &str) -> String {
    if ident.starts_with(|c: char| c.is_ascii_digit()) {
        return canonical_numeric(ident);
    }
    // A lone letter other than "I" is a lettered section ("Schedule C"), not a numeral.
    if ident.chars().count() > 1 || ident.eq_ignore_ascii_case("i") {
        if let Some(value) = parse_roman(ident) {
            return value.to_string();
        }
    }
    ident.to_lowercase()
}

fn canonical_numeric(digits: &str) -> String {
    digits
        .trim_end_matches('.')
        .split('.')
        .map(|part| part.parse::<u32>().map(|n| n.to_string()).unwrap_or_else(|_| part.to_string()))
        .collect::<Vec<_>>()
        .join(".")
}

/// Parse a Roman numeral (up to 3999), case-insensitive.
pub(crate) fn parse_roman(text: &str) -> Option<u32> {
    if text.is_empty() {
        return None;
    }

    fn roman_value(c: char) -> Option<u32> {
        match c {
            'I' => Some(1),
            'V' => Some(5),
            'X' => Some(10),
            'L' => Some(50),
            'C' => Some(100),
            'D' => Some(500),
            'M' => Some(1000),
            _ => None,
        }
    }

    let mut total: u32 = 0;
    let mut prev_value: u32 = 0;

    for c in text.to_uppercase().chars().rev() {
        let value = roman_value(c)?;
        if value < prev_value {
            total = total.checked_sub(value)?;
        } else {
            total = total.checked_add(value)?;
        }
        prev_value = value;
    }

    if total == 0 || total > 3999 {
        return None;
    }

    Some(total)
}

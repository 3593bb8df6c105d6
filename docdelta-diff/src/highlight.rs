//! Highlight markup.
//!
//! Removed spans are wrapped as `[-]...[/-]`, added spans as `[+]...[/+]`. Spans never nest
//! and never overlap: touching or overlapping spans are joined before rendering. Marker
//! sequences already present in document text are broken with a word joiner (U+2060) so
//! they can not be read as delimiters.

use std::ops::Range;

const WORD_JOINER: char = '\u{2060}';

/// Which delimiter pair to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    Removed,
    Added,
}

impl Mark {
    pub fn open(self) -> &'static str {
        match self {
            Mark::Removed => "[-]",
            Mark::Added => "[+]",
        }
    }

    pub fn close(self) -> &'static str {
        match self {
            Mark::Removed => "[/-]",
            Mark::Added => "[/+]",
        }
    }
}

const MARKERS: [&str; 4] = ["[-]", "[/-]", "[+]", "[/+]"];

/// Wrap byte `spans` of `text` with `mark` delimiters.
pub fn render(text: &str, spans: &[Range<usize>], mark: Mark) -> String {
    let mut out = String::with_capacity(text.len() + spans.len() * 8);
    let mut cursor = 0;

    for span in coalesce(text, spans) {
        out.push_str(&escape_markers(&text[cursor..span.start]));
        out.push_str(mark.open());
        out.push_str(&escape_markers(&text[span.clone()]));
        out.push_str(mark.close());
        cursor = span.end;
    }
    out.push_str(&escape_markers(&text[cursor..]));
    out
}

/// Wrap the whole text (whole-unit additions and deletions).
pub fn wrap_all(text: &str, mark: Mark) -> String {
    if text.is_empty() {
        return String::new();
    }
    render(text, &[0..text.len()], mark)
}

/// Break literal marker sequences in document text.
pub fn escape_markers(text: &str) -> String {
    if !text.contains('[') {
        return text.to_string();
    }
    let mut out = text.to_string();
    for marker in MARKERS {
        if out.contains(marker) {
            let mut broken = String::with_capacity(marker.len() + 3);
            broken.push('[');
            broken.push(WORD_JOINER);
            broken.push_str(&marker[1..]);
            out = out.replace(marker, &broken);
        }
    }
    out
}

/// Check that delimiters are balanced and never nested.
pub fn is_well_formed(markup: &str) -> bool {
    let mut open: Option<&str> = None;
    let mut rest = markup;

    while let Some(at) = rest.find('[') {
        rest = &rest[at..];
        match MARKERS.iter().find(|m| rest.starts_with(**m)) {
            Some(&marker) => {
                open = match (open, marker) {
                    (None, "[-]") | (None, "[+]") => Some(marker),
                    (Some("[-]"), "[/-]") | (Some("[+]"), "[/+]") => None,
                    _ => return false,
                };
                rest = &rest[marker.len()..];
            }
            None => rest = &rest[1..],
        }
    }

    open.is_none()
}

/// Sort, clamp and join spans so they are disjoint and non-empty.
fn coalesce(text: &str, spans: &[Range<usize>]) -> Vec<Range<usize>> {
    let mut sorted: Vec<Range<usize>> = spans
        .iter()
        .map(|s| s.start.min(text.len())..s.end.min(text.len()))
        .filter(|s| s.start < s.end && text.is_char_boundary(s.start) && text.is_char_boundary(s.end))
        .collect();
    sorted.sort_by_key(|s| (s.start, s.end));

    let mut joined: Vec<Range<usize>> = Vec::with_capacity(sorted.len());
    for span in sorted {
        match joined.last_mut() {
            Some(last) if span.start <= last.end => last.end = last.end.max(span.end),
            _ => joined.push(span),
        }
    }
    joined
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_spans() {
        let text = "Payment due in 30 days";
        insta::assert_snapshot!(render(text, &[15..17], Mark::Removed), @"Payment due in [-]30[/-] days");
        insta::assert_snapshot!(render(text, &[0..7, 15..22], Mark::Added), @"[+]Payment[/+] due in [+]30 days[/+]");
    }

    #[test]
    fn overlapping_spans_are_joined() {
        let out = render("abcdef", &[3..5, 1..3, 4..6], Mark::Added);
        assert_eq!(out, "a[+]bcdef[/+]");
        assert!(is_well_formed(&out));
    }

    #[test]
    fn whole_text() {
        assert_eq!(wrap_all("Gone.", Mark::Removed), "[-]Gone.[/-]");
        assert_eq!(wrap_all("", Mark::Added), "");
    }

    #[test]
    fn literal_markers_are_broken() {
        let out = render("see [-] and [/+] here", &[0..3], Mark::Removed);
        assert!(is_well_formed(&out));
        assert!(out.starts_with("[-]see[/-] [\u{2060}-]"));
        assert_eq!(out.matches("[-]").count(), 1);
    }

    #[test]
    fn well_formedness() {
        assert!(is_well_formed("plain [text]"));
        assert!(is_well_formed("[-]a[/-] b [-]c[/-]"));
        assert!(!is_well_formed("[-]a"));
        assert!(!is_well_formed("[-]a[+]b[/+][/-]"));
        assert!(!is_well_formed("[-]a[/+]"));
        assert!(!is_well_formed("a[/-]"));
    }
}

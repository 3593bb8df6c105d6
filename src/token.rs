//! Word-boundary tokenization.
//!
//! Tokens keep their original text and byte positions (for highlight rendering) alongside a
//! comparison key with cosmetic punctuation variants folded, so `“30 days”` and `"30 days"`
//! compare equal while the highlight still shows what the document says.

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

/// Token classification, mirroring the tags of the word-boundary scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TokenTag {
    /// Natural number (digits with optional `.`/`,` group separators)
    Natn,
    /// Punctuation
    Punc,
    /// Symbol (`$`, `%`, `€`, ...)
    Symb,
    /// Word
    Word,
}

/// A non-whitespace token with its byte span in the source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// The token text as written.
    pub text: String,
    /// Comparison key (punctuation-folded).
    pub key: String,
    /// Byte position where token starts (inclusive).
    pub start: usize,
    /// Byte position where token ends (exclusive).
    pub end: usize,
    pub tag: TokenTag,
}

impl Token {
    pub fn is_numeric(&self) -> bool {
        self.tag == TokenTag::Natn
    }
}

/// Split `text` at Unicode word boundaries, dropping whitespace.
pub fn tokenize(text: &str) -> Vec<Token> {
    text.split_word_bound_indices()
        .filter(|(_, piece)| !piece.chars().all(char::is_whitespace))
        .map(|(start, piece)| Token {
            text: piece.to_string(),
            key: fold_punctuation(piece),
            start,
            end: start + piece.len(),
            tag: classify(piece),
        })
        .collect()
}

fn classify(piece: &str) -> TokenTag {
    let starts_with_digit = piece.chars().next().map_or(false, |c| c.is_ascii_digit());
    if starts_with_digit
        && piece
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '\''))
    {
        TokenTag::Natn
    } else if piece.chars().any(char::is_alphanumeric) {
        TokenTag::Word
    } else if piece.chars().all(|c| c.is_ascii_punctuation() || is_unicode_punctuation(c))
        && !piece.chars().any(is_symbol)
    {
        TokenTag::Punc
    } else {
        TokenTag::Symb
    }
}

fn is_symbol(c: char) -> bool {
    matches!(
        c,
        '$' | '%' | '+' | '<' | '=' | '>' | '^' | '`' | '|' | '~' | '#' | '&' | '@'
            | '€' | '£' | '¥' | '₽' | '§' | '©' | '®' | '°' | '№'
    )
}

fn is_unicode_punctuation(c: char) -> bool {
    matches!(
        c,
        '‐' | '‑' | '‒' | '–' | '—' | '―' | '−' | '‘' | '’' | '‚' | '‛' | '“' | '”' | '„' | '‟'
            | '«' | '»' | '…' | '·'
    )
}

/// Fold dash, quote, ellipsis and space variants to a single ASCII form.
pub fn fold_punctuation(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '‐' | '‑' | '‒' | '–' | '—' | '―' | '−' => out.push('-'),
            '“' | '”' | '„' | '‟' | '«' | '»' | '″' => out.push('"'),
            '‘' | '’' | '‚' | '‛' | '′' | '`' => out.push('\''),
            '\u{00A0}' | '\u{2007}' | '\u{2009}' | '\u{202F}' | '\u{200A}' => out.push(' '),
            '\u{200B}' | '\u{FEFF}' => {}
            '…' => out.push_str("..."),
            other => out.push(other),
        }
    }
    out
}

/// Collapse whitespace runs into single spaces and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(text: &str) -> Vec<String> {
        tokenize(text).into_iter().map(|t| t.key).collect()
    }

    #[test]
    fn tokens_skip_whitespace_and_keep_spans() {
        let text = "Pay  $1,000 now.";
        let tokens = tokenize(text);
        let texts: Vec<_> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["Pay", "$", "1,000", "now", "."]);
        for token in &tokens {
            assert_eq!(&text[token.start..token.end], token.text);
        }
    }

    #[test]
    fn tags() {
        let tokens = tokenize("Fee 30% – due.");
        let tags: Vec<_> = tokens.iter().map(|t| t.tag).collect();
        assert_eq!(
            tags,
            vec![
                TokenTag::Word,
                TokenTag::Natn,
                TokenTag::Symb,
                TokenTag::Punc,
                TokenTag::Word,
                TokenTag::Punc
            ]
        );
    }

    #[test]
    fn cosmetic_variants_share_keys() {
        assert_eq!(keys("“net” – 30"), keys("\"net\" - 30"));
        assert_eq!(keys("it’s"), keys("it's"));
        assert_ne!(keys("30 days"), keys("45 days"));
    }

    #[test]
    fn fold_and_collapse() {
        assert_eq!(fold_punctuation("a\u{00A0}b…"), "a b...");
        assert_eq!(collapse_whitespace("  a \t b\n c "), "a b c");
    }
}

//! Tests for DocumentNormalizer.

use crate::{
    DocumentNormalizer, ExtractedText, Language, LayoutHints, NormalizeError, Side, StructuralUnit,
};

fn units(text: &str) -> Vec<StructuralUnit> {
    DocumentNormalizer::new()
        .normalize(Side::Reference, &ExtractedText::plain(text))
        .unwrap()
        .units
}

fn bodies(units: &[StructuralUnit]) -> Vec<&str> {
    units.iter().map(|u| u.body_text.as_str()).collect()
}

#[test]
fn blocks_keep_labels_apart_from_body() {
    let text = "ARTICLE I - DEFINITIONS\n\n1.1 \"Agreement\" means this agreement.\n\n1.2 “Supplier” means the party — named above.\n";
    let units = units(text);

    assert_eq!(units.len(), 3);
    assert_eq!(
        units.iter().map(|u| u.unit_id.as_str()).collect::<Vec<_>>(),
        vec!["R000000", "R000001", "R000002"]
    );

    let heading = &units[0];
    assert_eq!(heading.clause_label.as_ref().unwrap().canonical, "article:1");
    assert_eq!(heading.body_text, "DEFINITIONS");
    assert!(heading.is_heading);

    assert_eq!(units[1].clause_label.as_ref().unwrap().canonical, "1.1");
    assert_eq!(units[1].body_text, "\"Agreement\" means this agreement.");
    assert_eq!(units[1].raw_text, "1.1 \"Agreement\" means this agreement.");
    assert!(!units[1].is_heading);

    assert_eq!(units[2].body_text, "“Supplier” means the party — named above.");
    assert_eq!(
        units[2].normalized_text,
        "\"Supplier\" means the party - named above."
    );
    assert!(units.iter().all(|u| u.document_side == Side::Reference));
    assert!(units.iter().all(|u| u.page.is_none()));
}

#[test]
fn label_only_block_moves_onto_next_unit() {
    let units = units("ARTICLE IV\n\nThe Supplier shall indemnify the Customer.");

    assert_eq!(units.len(), 1);
    let unit = &units[0];
    assert_eq!(unit.clause_label.as_ref().unwrap().canonical, "article:4");
    assert_eq!(unit.body_text, "The Supplier shall indemnify the Customer.");
    assert_eq!(
        unit.raw_text,
        "ARTICLE IV\nThe Supplier shall indemnify the Customer."
    );
    assert!(!unit.is_heading);
}

#[test]
fn page_artifacts_are_removed() {
    let doc = DocumentNormalizer::new()
        .normalize(
            Side::Client,
            &ExtractedText::plain(
                "First clause text here.\n\n12\n\nSecond clause text.\nPage 2 of 9\n\n- 3 -\n",
            ),
        )
        .unwrap();

    assert_eq!(
        bodies(&doc.units),
        vec!["First clause text here.", "Second clause text."]
    );
    assert_eq!(doc.stats.page_artifacts, 3);
    assert_eq!(doc.units[1].unit_id.as_str(), "C000001");
}

#[test]
fn short_fragments_are_dropped_and_ordinals_stay_dense() {
    let doc = DocumentNormalizer::new()
        .normalize(
            Side::Reference,
            &ExtractedText::plain("First clause body.\n\n--\n\nSecond clause body."),
        )
        .unwrap();

    assert_eq!(doc.stats.dropped_fragments, 1);
    assert_eq!(
        doc.units.iter().map(|u| u.ordinal).collect::<Vec<_>>(),
        vec![0, 1]
    );
    assert_eq!(doc.units[1].body_text, "Second clause body.");
}

#[test]
fn single_line_splits_into_sentences() {
    let units = units("Payment is due in 30 days. Late fees apply! Disputes go to court?");
    assert_eq!(
        bodies(&units),
        vec![
            "Payment is due in 30 days.",
            "Late fees apply!",
            "Disputes go to court?"
        ]
    );
}

#[test]
fn text_without_blank_lines_splits_per_line() {
    let units = units("First line clause.\nSecond line clause.\nThird line clause.");
    assert_eq!(
        bodies(&units),
        vec!["First line clause.", "Second line clause.", "Third line clause."]
    );
}

#[test]
fn label_lines_start_new_units_inside_a_paragraph() {
    let units = units("Preamble text of the contract.\n\n1. Scope of work\ncontinues here.\n2. Price is fixed.");
    assert_eq!(
        bodies(&units),
        vec![
            "Preamble text of the contract.",
            "Scope of work continues here.",
            "Price is fixed."
        ]
    );
    assert_eq!(units[1].raw_text, "1. Scope of work\ncontinues here.");
}

#[test]
fn layout_hints_set_pages_and_headings() {
    let hinted = ExtractedText::with_hints(
        "Payment Terms\nThe Customer pays monthly.\nLate fees accrue.\n\nAlpha clause two.",
        LayoutHints {
            page_breaks: vec![60],
            headings: vec![0],
        },
    );
    let units = DocumentNormalizer::new()
        .normalize(Side::Reference, &hinted)
        .unwrap()
        .units;

    assert_eq!(
        bodies(&units),
        vec![
            "Payment Terms",
            "The Customer pays monthly. Late fees accrue.",
            "Alpha clause two."
        ]
    );
    assert!(units[0].is_heading);
    assert!(!units[1].is_heading);
    assert_eq!(units[0].page, Some(1));
    assert_eq!(units[2].page, Some(2));
}

#[test]
fn form_feed_advances_page() {
    let units = units("Alpha clause one.\n\u{000C}Beta clause two.");
    assert_eq!(bodies(&units), vec!["Alpha clause one.", "Beta clause two."]);
    assert_eq!(units[0].page, Some(1));
    assert_eq!(units[1].page, Some(2));
}

#[test]
fn stats_count_words_and_chars() {
    let doc = DocumentNormalizer::new()
        .normalize(
            Side::Reference,
            &ExtractedText::plain("1. Payment due in 30 days.\n\n2. Either party may terminate."),
        )
        .unwrap();
    assert_eq!(doc.stats.units, 2);
    assert_eq!(doc.stats.words, 9);
    assert_eq!(doc.stats.chars, 50);
}

#[test]
fn empty_document_fails() {
    let err = DocumentNormalizer::new()
        .normalize(Side::Client, &ExtractedText::plain("   \n\n 12 \n"))
        .unwrap_err();
    assert_eq!(err, NormalizeError::EmptyDocument { side: Side::Client });
    assert_eq!(err.to_string(), "client document contains no structural units");
}

#[test]
fn stats_record_the_document_language() {
    let normalizer = DocumentNormalizer::new();
    let russian = normalizer
        .normalize(
            Side::Client,
            &ExtractedText::plain("1. Арендатор оплачивает аренду в течение 30 дней.\n\n2. Lessee pays."),
        )
        .unwrap();
    assert_eq!(russian.stats.language, Language::Ru);

    let english = normalizer
        .normalize(Side::Reference, &ExtractedText::plain("Payment due in 30 days."))
        .unwrap();
    assert_eq!(english.stats.language, Language::En);
}

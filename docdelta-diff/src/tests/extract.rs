//! Tests for ChangeExtractor.

use docdelta::{DocumentNormalizer, ExtractedText, Side, StructuralUnit};
use docdelta_align::{Correspondence, CorrespondenceKind};

use crate::highlight::is_well_formed;
use crate::{ChangeCandidate, ChangeExtractor, ChangeType};

fn units(side: Side, clauses: &[&str]) -> Vec<StructuralUnit> {
    DocumentNormalizer::new()
        .normalize(side, &ExtractedText::plain(clauses.join("\n\n")))
        .unwrap()
        .units
}

/// Extract changes of a 1:1 match between two single-clause documents.
fn diff_pair(original: &str, modified: &str) -> Vec<ChangeCandidate> {
    let reference = units(Side::Reference, &[original]);
    let client = units(Side::Client, &[modified]);
    let changes = ChangeExtractor::new().extract(
        &Correspondence::matched(0, 0, 0.9),
        &reference,
        &client,
    );
    assert_well_formed(&changes);
    changes
}

fn assert_well_formed(changes: &[ChangeCandidate]) {
    for change in changes {
        assert!(is_well_formed(&change.highlighted_original), "{}", change.highlighted_original);
        assert!(is_well_formed(&change.highlighted_modified), "{}", change.highlighted_modified);
    }
}

#[test]
fn single_number_edit() {
    let changes = diff_pair("Payment due in 30 days", "Payment due in 45 days");

    assert_eq!(changes.len(), 1);
    let change = &changes[0];
    assert_eq!(change.change_type, ChangeType::Modification);
    assert_eq!(change.original_text, "Payment due in 30 days");
    assert_eq!(change.modified_text, "Payment due in 45 days");
    assert_eq!(change.removed_text(), "30");
    assert_eq!(change.added_text(), "45");
    insta::assert_snapshot!(change.highlighted_original, @"Payment due in [-]30[/-] days");
    insta::assert_snapshot!(change.highlighted_modified, @"Payment due in [+]45[/+] days");
}

#[test]
fn identical_match_yields_nothing() {
    assert!(diff_pair("Payment due in 30 days.", "Payment due in 30 days.").is_empty());
}

#[test]
fn cosmetic_punctuation_yields_nothing() {
    assert!(diff_pair(
        "The “Services” — as defined — are provided.",
        "The \"Services\" - as defined - are provided."
    )
    .is_empty());
}

#[test]
fn distant_edits_are_separate_changes() {
    let changes = diff_pair(
        "The Supplier shall deliver the goods within 10 days and the Customer shall pay within 30 days.",
        "The Supplier shall deliver the goods within 14 days and the Customer shall pay within 60 days.",
    );

    assert_eq!(changes.len(), 2);
    assert_eq!(
        changes.iter().map(|c| c.sequence).collect::<Vec<_>>(),
        vec![0, 1]
    );
    insta::assert_snapshot!(changes[0].highlighted_original, @"The Supplier shall deliver the goods within [-]10[/-] days and the Customer shall pay within 30 days.");
    insta::assert_snapshot!(changes[1].highlighted_modified, @"The Supplier shall deliver the goods within 14 days and the Customer shall pay within [+]60[/+] days.");
    assert_eq!(changes[1].original_text, changes[0].original_text);
}

#[test]
fn nearby_edits_collapse_into_one_modification() {
    let changes = diff_pair(
        "Either party may terminate on 30 days notice.",
        "Either party may terminate on 60 days written notice.",
    );

    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].change_type, ChangeType::Modification);
    insta::assert_snapshot!(changes[0].highlighted_original, @"Either party may terminate on [-]30[/-] days notice.");
    insta::assert_snapshot!(changes[0].highlighted_modified, @"Either party may terminate on [+]60[/+] days [+]written[/+] notice.");
}

#[test]
fn added_words_inside_a_clause() {
    let changes = diff_pair("Payment is due monthly.", "Payment is due monthly in advance.");

    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].change_type, ChangeType::Addition);
    assert_eq!(changes[0].highlighted_original, "Payment is due monthly.");
    insta::assert_snapshot!(changes[0].highlighted_modified, @"Payment is due monthly [+]in advance[/+].");
}

#[test]
fn whole_unit_addition_and_deletion() {
    let reference = units(Side::Reference, &["Governing law is England."]);
    let client = units(Side::Client, &["The Customer shall maintain insurance."]);
    let extractor = ChangeExtractor::new();

    let added = extractor.extract(&Correspondence::inserted(0), &reference, &client);
    assert_eq!(added.len(), 1);
    assert_eq!(added[0].change_type, ChangeType::Addition);
    assert_eq!(added[0].original_text, "");
    assert_eq!(added[0].highlighted_original, "");
    assert_eq!(
        added[0].highlighted_modified,
        "[+]The Customer shall maintain insurance.[/+]"
    );
    assert!(added[0].reference_ids.is_empty());
    assert_eq!(added[0].client_ids[0].as_str(), "C000000");
    assert!(added[0].is_whole_unit());

    let deleted = extractor.extract(&Correspondence::deleted(0), &reference, &client);
    assert_eq!(deleted[0].change_type, ChangeType::Deletion);
    assert_eq!(deleted[0].modified_text, "");
    assert_eq!(deleted[0].highlighted_original, "[-]Governing law is England.[/-]");
    assert_eq!(deleted[0].removed_text(), "Governing law is England.");
    assert_well_formed(&added);
    assert_well_formed(&deleted);
}

#[test]
fn split_clause_compares_joined_text() {
    let reference = units(
        Side::Reference,
        &["The Supplier shall deliver the goods within 10 days and shall invoice the Customer monthly."],
    );
    let client = units(
        Side::Client,
        &[
            "The Supplier shall deliver the goods within 10 days.",
            "The Supplier shall invoice the Customer monthly.",
        ],
    );
    let split = Correspondence {
        kind: CorrespondenceKind::Split,
        reference: vec![0],
        client: vec![0, 1],
        similarity: 0.84,
    };

    let changes = ChangeExtractor::new().extract(&split, &reference, &client);
    assert_well_formed(&changes);

    assert_eq!(changes.len(), 1);
    let change = &changes[0];
    assert_eq!(change.correspondence, CorrespondenceKind::Split);
    assert_eq!(
        change.client_ids.iter().map(|id| id.as_str()).collect::<Vec<_>>(),
        vec!["C000000", "C000001"]
    );
    insta::assert_snapshot!(change.highlighted_original, @"The Supplier shall deliver the goods within 10 days [-]and[/-] shall invoice the Customer monthly.");
    insta::assert_snapshot!(change.highlighted_modified, @"The Supplier shall deliver the goods within 10 days[+]. The Supplier[/+] shall invoice the Customer monthly.");
}

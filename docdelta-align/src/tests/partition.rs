//! Tests for partition verification and reference ordering.

use docdelta::Side;

use crate::{AlignError, Alignment, AlignmentStats, Correspondence, CorrespondenceKind};

fn alignment(reference_units: usize, client_units: usize, correspondences: Vec<Correspondence>) -> Alignment {
    Alignment {
        correspondences,
        stats: AlignmentStats {
            reference_units,
            client_units,
            ..Default::default()
        },
    }
}

fn split(reference: usize, client: Vec<usize>) -> Correspondence {
    Correspondence {
        kind: CorrespondenceKind::Split,
        reference: vec![reference],
        client,
        similarity: 0.7,
    }
}

#[test]
fn valid_partition() {
    let alignment = alignment(
        3,
        3,
        vec![
            Correspondence::matched(0, 0, 1.0),
            split(1, vec![1, 2]),
            Correspondence::deleted(2),
        ],
    );
    assert_eq!(alignment.verify_partition(), Ok(()));
}

#[test]
fn duplicated_unit_is_rejected() {
    let alignment = alignment(
        2,
        1,
        vec![
            Correspondence::matched(0, 0, 1.0),
            Correspondence::matched(1, 0, 0.9),
        ],
    );
    assert_eq!(
        alignment.verify_partition(),
        Err(AlignError::PartitionViolation {
            side: Side::Client,
            ordinal: 0,
            occurrences: 2,
        })
    );
}

#[test]
fn omitted_unit_is_rejected() {
    let alignment = alignment(2, 1, vec![Correspondence::matched(0, 0, 1.0)]);
    let err = alignment.verify_partition().unwrap_err();
    assert_eq!(
        err,
        AlignError::PartitionViolation {
            side: Side::Reference,
            ordinal: 1,
            occurrences: 0,
        }
    );
    assert_eq!(
        err.to_string(),
        "reference unit 1 appears in 0 correspondences (expected exactly one)"
    );
}

#[test]
fn malformed_and_out_of_range() {
    let one_part_split = alignment(1, 1, vec![split(0, vec![0])]);
    assert!(matches!(
        one_part_split.verify_partition(),
        Err(AlignError::Malformed { index: 0, .. })
    ));

    let past_end = alignment(1, 1, vec![Correspondence::matched(0, 3, 0.9)]);
    assert_eq!(
        past_end.verify_partition(),
        Err(AlignError::OutOfRange {
            side: Side::Client,
            ordinal: 3,
            len: 1,
        })
    );
}

#[test]
fn insertion_lands_after_deletions_in_the_gap() {
    // R0=C0, R1 deleted, C1 inserted, R2=C2, R3 deleted
    let alignment = alignment(
        4,
        3,
        vec![
            Correspondence::matched(0, 0, 1.0),
            Correspondence::deleted(1),
            Correspondence::inserted(1),
            Correspondence::matched(2, 2, 1.0),
            Correspondence::deleted(3),
        ],
    );

    assert_eq!(alignment.insertion_anchor(1), Some(1));
    let order: Vec<_> = alignment
        .in_reference_order()
        .into_iter()
        .map(|c| (c.kind, c.reference.clone(), c.client.clone()))
        .collect();
    assert_eq!(
        order,
        vec![
            (CorrespondenceKind::Matched, vec![0], vec![0]),
            (CorrespondenceKind::Deleted, vec![1], vec![]),
            (CorrespondenceKind::Inserted, vec![], vec![1]),
            (CorrespondenceKind::Matched, vec![2], vec![2]),
            (CorrespondenceKind::Deleted, vec![3], vec![]),
        ]
    );
}

#[test]
fn insertion_at_either_end() {
    // C0 inserted before R0=C1; C2 inserted after R0 and deleted R1
    let alignment = alignment(
        2,
        3,
        vec![
            Correspondence::inserted(0),
            Correspondence::matched(0, 1, 1.0),
            Correspondence::deleted(1),
            Correspondence::inserted(2),
        ],
    );

    assert_eq!(alignment.insertion_anchor(0), None);
    assert_eq!(alignment.insertion_anchor(2), Some(1));
    let clients: Vec<_> = alignment
        .in_reference_order()
        .into_iter()
        .map(|c| (c.reference.clone(), c.client.clone()))
        .collect();
    assert_eq!(
        clients,
        vec![
            (vec![], vec![0]),
            (vec![0], vec![1]),
            (vec![1], vec![]),
            (vec![], vec![2]),
        ]
    );
}

//! Grouping of edit operations into hunks.

use std::ops::Range;

use crate::DiffOp;

/// One reported change: runs of removed and added tokens close enough to read as a
/// single edit.
///
/// Ranges are token indices. Equal tokens between the runs are not part of any range.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hunk {
    pub removed: Vec<Range<usize>>,
    pub added: Vec<Range<usize>>,
}

impl Hunk {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty()
    }

    fn push_removed(&mut self, index: usize) {
        push_index(&mut self.removed, index);
    }

    fn push_added(&mut self, index: usize) {
        push_index(&mut self.added, index);
    }
}

fn push_index(ranges: &mut Vec<Range<usize>>, index: usize) {
    match ranges.last_mut() {
        Some(last) if last.end == index => last.end = index + 1,
        _ => ranges.push(index..index + 1),
    }
}

/// Group non-equal runs, merging runs separated by at most `merge_gap` equal tokens.
pub fn group_hunks(ops: &[DiffOp], merge_gap: usize) -> Vec<Hunk> {
    let mut hunks = Vec::new();
    let mut current = Hunk::default();
    let mut equal_run = 0;

    for op in ops {
        match *op {
            DiffOp::Equal(..) => equal_run += 1,
            DiffOp::Delete(left) => {
                close_if_far(&mut hunks, &mut current, equal_run, merge_gap);
                equal_run = 0;
                current.push_removed(left);
            }
            DiffOp::Insert(right) => {
                close_if_far(&mut hunks, &mut current, equal_run, merge_gap);
                equal_run = 0;
                current.push_added(right);
            }
        }
    }
    if !current.is_empty() {
        hunks.push(current);
    }

    hunks
}

fn close_if_far(hunks: &mut Vec<Hunk>, current: &mut Hunk, equal_run: usize, merge_gap: usize) {
    if !current.is_empty() && equal_run > merge_gap {
        hunks.push(std::mem::take(current));
    }
}

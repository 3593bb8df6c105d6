//! Longest-common-subsequence diff over token keys.
//!
//! Small middles use the full LCS table. Larger ones are split with Hirschberg's
//! divide-and-conquer, which keeps memory linear in the length of the shorter side's row
//! while finding a subsequence of the same length.

use docdelta::Token;

/// Largest middle (in table cells) diffed with the quadratic table.
const TABLE_CELLS: usize = 1 << 16;

/// Diff operation produced by the diff algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffOp {
    /// Tokens at (left_idx, right_idx) are equal.
    Equal(usize, usize),
    /// Token at right_idx was inserted.
    Insert(usize),
    /// Token at left_idx was deleted.
    Delete(usize),
}

/// Compute the edit script between two token sequences.
///
/// Common prefix and suffix are matched directly. Within every changed run deletions come
/// before insertions. Time is O(N*M) over the differing middle, memory O(N+M).
pub fn diff_tokens(left: &[Token], right: &[Token]) -> Vec<DiffOp> {
    let prefix = left
        .iter()
        .zip(right)
        .take_while(|(l, r)| l.key == r.key)
        .count();
    let suffix = left[prefix..]
        .iter()
        .rev()
        .zip(right[prefix..].iter().rev())
        .take_while(|(l, r)| l.key == r.key)
        .count();

    let left_mid: Vec<&str> = left[prefix..left.len() - suffix]
        .iter()
        .map(|t| t.key.as_str())
        .collect();
    let right_mid: Vec<&str> = right[prefix..right.len() - suffix]
        .iter()
        .map(|t| t.key.as_str())
        .collect();

    let mut ops: Vec<DiffOp> = (0..prefix).map(|i| DiffOp::Equal(i, i)).collect();
    let mut middle = Vec::with_capacity(left_mid.len() + right_mid.len());
    hirschberg(&left_mid, &right_mid, prefix, prefix, &mut middle);
    ops.extend(deletions_first(middle));
    let left_tail = left.len() - suffix;
    let right_tail = right.len() - suffix;
    ops.extend((0..suffix).map(|i| DiffOp::Equal(left_tail + i, right_tail + i)));
    ops
}

fn hirschberg(left: &[&str], right: &[&str], lo: usize, ro: usize, out: &mut Vec<DiffOp>) {
    let (n, m) = (left.len(), right.len());
    if n == 0 {
        out.extend((0..m).map(|j| DiffOp::Insert(ro + j)));
        return;
    }
    if m == 0 {
        out.extend((0..n).map(|i| DiffOp::Delete(lo + i)));
        return;
    }
    if n == 1 || n.saturating_mul(m) <= TABLE_CELLS {
        table(left, right, lo, ro, out);
        return;
    }

    let mid = n / 2;
    let forward = lcs_row(&left[..mid], right, false);
    let backward = lcs_row(&left[mid..], right, true);

    // forward[k] covers right[..k], backward[m - k] covers right[k..]
    let mut split = 0;
    let mut best = 0;
    for k in 0..=m {
        let total = forward[k] + backward[m - k];
        if total > best || k == 0 {
            best = total;
            split = k;
        }
    }

    hirschberg(&left[..mid], &right[..split], lo, ro, out);
    hirschberg(&left[mid..], &right[split..], lo + mid, ro + split, out);
}

/// Last row of the LCS table: `row[j]` is the LCS length of `a` and the first `j` of `b`,
/// both read back to front when `reversed`.
fn lcs_row(a: &[&str], b: &[&str], reversed: bool) -> Vec<u32> {
    fn at<'a>(s: &[&'a str], i: usize, reversed: bool) -> &'a str {
        if reversed {
            s[s.len() - 1 - i]
        } else {
            s[i]
        }
    }

    let m = b.len();
    let mut prev = vec![0u32; m + 1];
    let mut cur = vec![0u32; m + 1];
    for i in 0..a.len() {
        let x = at(a, i, reversed);
        for j in 0..m {
            cur[j + 1] = if x == at(b, j, reversed) {
                prev[j] + 1
            } else {
                prev[j + 1].max(cur[j])
            };
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev
}

fn table(left: &[&str], right: &[&str], lo: usize, ro: usize, out: &mut Vec<DiffOp>) {
    let n = left.len();
    let m = right.len();

    // dp[i][j] = length of LCS of left[0..i] and right[0..j]
    let width = m + 1;
    let mut dp = vec![0u32; (n + 1) * width];
    for i in 1..=n {
        for j in 1..=m {
            dp[i * width + j] = if left[i - 1] == right[j - 1] {
                dp[(i - 1) * width + j - 1] + 1
            } else {
                dp[(i - 1) * width + j].max(dp[i * width + j - 1])
            };
        }
    }

    let mut ops = Vec::with_capacity(n + m);
    let (mut i, mut j) = (n, m);
    while i > 0 || j > 0 {
        if i > 0 && j > 0 && left[i - 1] == right[j - 1] {
            ops.push(DiffOp::Equal(lo + i - 1, ro + j - 1));
            i -= 1;
            j -= 1;
        } else if j > 0 && (i == 0 || dp[i * width + j - 1] >= dp[(i - 1) * width + j]) {
            ops.push(DiffOp::Insert(ro + j - 1));
            j -= 1;
        } else {
            ops.push(DiffOp::Delete(lo + i - 1));
            i -= 1;
        }
    }

    ops.reverse();
    out.extend(ops);
}

/// Reorder each run of changes so its deletions precede its insertions.
fn deletions_first(ops: Vec<DiffOp>) -> Vec<DiffOp> {
    let mut out = Vec::with_capacity(ops.len());
    let mut inserts = Vec::new();
    for op in ops {
        match op {
            DiffOp::Insert(_) => inserts.push(op),
            DiffOp::Delete(_) => out.push(op),
            DiffOp::Equal(..) => {
                out.append(&mut inserts);
                out.push(op);
            }
        }
    }
    out.append(&mut inserts);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use docdelta::token::tokenize;

    fn ops(left: &str, right: &str) -> Vec<DiffOp> {
        diff_tokens(&tokenize(left), &tokenize(right))
    }

    #[test]
    fn identical() {
        assert_eq!(
            ops("a b c", "a b c"),
            vec![DiffOp::Equal(0, 0), DiffOp::Equal(1, 1), DiffOp::Equal(2, 2)]
        );
    }

    #[test]
    fn replacement_deletes_before_inserting() {
        assert_eq!(
            ops("due in 30 days", "due in 45 days"),
            vec![
                DiffOp::Equal(0, 0),
                DiffOp::Equal(1, 1),
                DiffOp::Delete(2),
                DiffOp::Insert(2),
                DiffOp::Equal(3, 3),
            ]
        );
    }

    #[test]
    fn pure_insert_and_delete() {
        assert_eq!(
            ops("pay now", "pay in full now"),
            vec![
                DiffOp::Equal(0, 0),
                DiffOp::Insert(1),
                DiffOp::Insert(2),
                DiffOp::Equal(1, 3),
            ]
        );
        assert_eq!(ops("a b", ""), vec![DiffOp::Delete(0), DiffOp::Delete(1)]);
    }

    #[test]
    fn folded_punctuation_is_equal() {
        assert!(ops("the “Term”", "the \"Term\"")
            .iter()
            .all(|op| matches!(op, DiffOp::Equal(..))));
    }

    fn equal_count(ops: &[DiffOp]) -> usize {
        ops.iter().filter(|op| matches!(op, DiffOp::Equal(..))).count()
    }

    #[test]
    fn long_unit_edited_at_both_ends() {
        let words: Vec<String> = (0..4_000).map(|i| format!("w{}", i % 97)).collect();
        let reference = format!("First {} last", words.join(" "));
        let client = format!("Opening {} closing", words.join(" "));

        let ops = ops(&reference, &client);

        assert_eq!(ops.len(), 4_004);
        assert_eq!(&ops[..2], &[DiffOp::Delete(0), DiffOp::Insert(0)]);
        assert_eq!(equal_count(&ops), 4_000);
        assert_eq!(&ops[4_002..], &[DiffOp::Delete(4_001), DiffOp::Insert(4_001)]);
    }

    #[test]
    fn split_diff_finds_a_longest_subsequence() {
        let left: Vec<String> = (0..400).map(|i| format!("t{}", (i * 7) % 23)).collect();
        let right: Vec<String> = (0..380).map(|i| format!("t{}", (i * 5) % 19)).collect();
        let left: Vec<&str> = left.iter().map(String::as_str).collect();
        let right: Vec<&str> = right.iter().map(String::as_str).collect();
        assert!(left.len() * right.len() > TABLE_CELLS);

        let mut split = Vec::new();
        hirschberg(&left, &right, 0, 0, &mut split);
        let mut full = Vec::new();
        table(&left, &right, 0, 0, &mut full);

        assert_eq!(equal_count(&split), equal_count(&full));
        for op in &split {
            if let DiffOp::Equal(l, r) = op {
                assert_eq!(left[*l], right[*r]);
            }
        }
        let deleted = split.iter().filter(|op| matches!(op, DiffOp::Delete(_))).count();
        let inserted = split.iter().filter(|op| matches!(op, DiffOp::Insert(_))).count();
        assert_eq!(deleted + equal_count(&split), left.len());
        assert_eq!(inserted + equal_count(&split), right.len());
    }

    #[test]
    fn changed_runs_delete_before_inserting() {
        let ops = deletions_first(vec![
            DiffOp::Insert(0),
            DiffOp::Delete(0),
            DiffOp::Equal(1, 1),
            DiffOp::Insert(2),
        ]);
        assert_eq!(
            ops,
            vec![
                DiffOp::Delete(0),
                DiffOp::Insert(0),
                DiffOp::Equal(1, 1),
                DiffOp::Insert(2),
            ]
        );
    }
}

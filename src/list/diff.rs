//! Sequence diffing under a caller-supplied equivalence
//!
//! Diffs are computed from a longest common subsequence, so every element the
//! two sequences share in order is left untouched. The remaining removals and
//! insertions are paired into moves where an equivalent item appears on both
//! sides.
//!
//! # Batch semantics
//!
//! A diff is a batch, not a script:
//! - Removal indices (`Remove::index`, `Move::from`) point into the OLD sequence
//!   and are applied in descending order.
//! - Insertion indices (`Insert::index`, `Move::to`) point into the NEW sequence
//!   and are applied in ascending order after all removals.
//!
//! [`apply_diff`] replays a batch with exactly these rules.

use super::Equivalence;

/// One operation of a list diff
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffOp<T> {
    /// `item` appears at `index` of the new sequence
    Insert { index: usize, item: T },
    /// `item` at `index` of the old sequence is gone
    Remove { index: usize, item: T },
    /// `item` moved from old index `from` to new index `to`
    Move { from: usize, to: usize, item: T },
}

impl<T> DiffOp<T> {
    /// The item this operation concerns
    #[must_use]
    pub fn item(&self) -> &T {
        match self {
            Self::Insert { item, .. } | Self::Remove { item, .. } | Self::Move { item, .. } => {
                item
            }
        }
    }
}

/// Compute the batch of operations transforming `old` into `new`
///
/// Returns an empty vec when both sequences are element-wise equivalent.
/// Operations are ordered removals (descending), moves, then insertions
/// (ascending).
pub fn compute_diff<T: Clone>(old: &[T], new: &[T], eq: &dyn Equivalence<T>) -> Vec<DiffOp<T>> {
    let n = old.len();
    let m = new.len();

    // lcs[i][j] = length of the LCS of old[i..] and new[j..]
    let mut lcs = vec![vec![0u32; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            lcs[i][j] = if eq.equivalent(&old[i], &new[j]) {
                lcs[i + 1][j + 1] + 1
            } else {
                lcs[i + 1][j].max(lcs[i][j + 1])
            };
        }
    }

    let mut removed = Vec::new();
    let mut inserted = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if eq.equivalent(&old[i], &new[j]) && lcs[i][j] == lcs[i + 1][j + 1] + 1 {
            i += 1;
            j += 1;
        } else if lcs[i + 1][j] >= lcs[i][j + 1] {
            removed.push(i);
            i += 1;
        } else {
            inserted.push(j);
            j += 1;
        }
    }
    removed.extend(i..n);
    inserted.extend(j..m);

    let mut moves = Vec::new();
    let mut paired_inserts = vec![false; inserted.len()];
    removed.retain(|&from| {
        let candidate = inserted
            .iter()
            .enumerate()
            .find(|(slot, to)| !paired_inserts[*slot] && eq.equivalent(&old[from], &new[**to]));
        match candidate {
            Some((slot, &to)) => {
                paired_inserts[slot] = true;
                moves.push((from, to));
                false
            }
            None => true,
        }
    });
    moves.sort_by_key(|&(_, to)| to);

    let mut ops = Vec::with_capacity(removed.len() + moves.len() + inserted.len());
    ops.extend(removed.iter().rev().map(|&index| DiffOp::Remove {
        index,
        item: old[index].clone(),
    }));
    ops.extend(moves.into_iter().map(|(from, to)| DiffOp::Move {
        from,
        to,
        item: new[to].clone(),
    }));
    ops.extend(
        inserted
            .iter()
            .zip(paired_inserts)
            .filter(|(_, paired)| !paired)
            .map(|(&index, _)| DiffOp::Insert {
                index,
                item: new[index].clone(),
            }),
    );
    ops
}

/// Replay a diff batch against `old`, producing the new sequence
///
/// Ops must come from [`compute_diff`] over the same `old` sequence.
#[must_use]
pub fn apply_diff<T: Clone>(old: &[T], ops: &[DiffOp<T>]) -> Vec<T> {
    let mut removals: Vec<usize> = ops
        .iter()
        .filter_map(|op| match op {
            DiffOp::Remove { index, .. } => Some(*index),
            DiffOp::Move { from, .. } => Some(*from),
            DiffOp::Insert { .. } => None,
        })
        .collect();
    removals.sort_unstable_by(|a, b| b.cmp(a));

    let mut insertions: Vec<(usize, &T)> = ops
        .iter()
        .filter_map(|op| match op {
            DiffOp::Insert { index, item } => Some((*index, item)),
            DiffOp::Move { to, item, .. } => Some((*to, item)),
            DiffOp::Remove { .. } => None,
        })
        .collect();
    insertions.sort_unstable_by_key(|(index, _)| *index);

    let mut result = old.to_vec();
    for index in removals {
        result.remove(index);
    }
    for (index, item) in insertions {
        result.insert(index, item.clone());
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::list::ValueEquality;

    fn diff(old: &[&'static str], new: &[&'static str]) -> Vec<DiffOp<&'static str>> {
        compute_diff(old, new, &ValueEquality)
    }

    #[test]
    fn test_identical_sequences_produce_empty_diff() {
        assert!(diff(&["a", "b", "c"], &["a", "b", "c"]).is_empty());
        assert!(diff(&[], &[]).is_empty());
    }

    #[test]
    fn test_remove_and_insert_leave_common_items_untouched() {
        let ops = diff(&["a", "b", "c"], &["a", "c", "d"]);

        assert_eq!(
            ops,
            vec![
                DiffOp::Remove { index: 1, item: "b" },
                DiffOp::Insert { index: 2, item: "d" },
            ]
        );
        assert!(ops.iter().all(|op| *op.item() != "a" && *op.item() != "c"));
    }

    #[test]
    fn test_reordering_reports_move() {
        let ops = diff(&["a", "b", "c"], &["c", "a", "b"]);
        assert_eq!(ops, vec![DiffOp::Move { from: 2, to: 0, item: "c" }]);
    }

    #[test]
    fn test_append_to_empty() {
        let ops = diff(&[], &["x", "y"]);
        assert_eq!(
            ops,
            vec![
                DiffOp::Insert { index: 0, item: "x" },
                DiffOp::Insert { index: 1, item: "y" },
            ]
        );
    }

    #[test]
    fn test_clear_removes_in_descending_order() {
        let ops = diff(&["x", "y", "z"], &[]);
        assert_eq!(
            ops,
            vec![
                DiffOp::Remove { index: 2, item: "z" },
                DiffOp::Remove { index: 1, item: "y" },
                DiffOp::Remove { index: 0, item: "x" },
            ]
        );
    }

    #[test]
    fn test_apply_diff_reproduces_target() {
        let cases: [(&[&str], &[&str]); 5] = [
            (&["a", "b", "c"], &["a", "c", "d"]),
            (&["a", "b", "c"], &["c", "b", "a"]),
            (&["a", "b", "c", "d"], &["e", "d", "a", "f"]),
            (&["a", "a", "b"], &["b", "a"]),
            (&[], &["a"]),
        ];

        for (old, new) in cases {
            let ops = diff(old, new);
            assert_eq!(apply_diff(old, &ops), new.to_vec(), "old={old:?} new={new:?}");
        }
    }

    #[test]
    fn test_custom_equivalence_ignores_case() {
        let eq = |a: &String, b: &String| a.eq_ignore_ascii_case(b);
        let old = vec!["Rust".to_string(), "Go".to_string()];
        let new = vec!["rust".to_string(), "GO".to_string()];

        assert!(compute_diff(&old, &new, &eq).is_empty());
    }
}

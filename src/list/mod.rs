//! Diffable chip list store
//!
//! [`DiffableList`] owns the ordered chip sequence. The only way to change it
//! is [`DiffableList::sync`], which swaps in a whole new sequence and returns
//! the diff between the two. Because `sync` takes `&mut self`, observers can
//! never see a half-applied replacement and the store cannot be re-entered
//! while a sync is in progress.

pub mod diff;

use std::fmt;
use std::sync::Arc;

pub use diff::{DiffOp, apply_diff, compute_diff};

/// Identity predicate used for diffing and suggestion filtering
///
/// Implementations must be reflexive and symmetric. Violations are not
/// detected and yield unspecified diffs.
pub trait Equivalence<T>: Send + Sync {
    /// Whether `a` and `b` denote the same chip
    fn equivalent(&self, a: &T, b: &T) -> bool;
}

/// Default equivalence: `PartialEq`
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueEquality;

impl<T: PartialEq> Equivalence<T> for ValueEquality {
    fn equivalent(&self, a: &T, b: &T) -> bool {
        a == b
    }
}

impl<T, F> Equivalence<T> for F
where
    F: Fn(&T, &T) -> bool + Send + Sync,
{
    fn equivalent(&self, a: &T, b: &T) -> bool {
        self(a, b)
    }
}

/// Ordered chip store with atomic replace-and-diff
pub struct DiffableList<T> {
    items: Vec<T>,
    equivalence: Arc<dyn Equivalence<T>>,
}

impl<T> DiffableList<T> {
    /// Create an empty list using `equivalence` to match elements
    #[must_use]
    pub fn new(equivalence: Arc<dyn Equivalence<T>>) -> Self {
        Self {
            items: Vec::new(),
            equivalence,
        }
    }

    /// Current items in order
    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether an item equivalent to `item` is stored
    #[must_use]
    pub fn contains(&self, item: &T) -> bool {
        self.position(item).is_some()
    }

    /// Index of the first item equivalent to `item`
    #[must_use]
    pub fn position(&self, item: &T) -> Option<usize> {
        self.items
            .iter()
            .position(|stored| self.equivalence.equivalent(stored, item))
    }

    /// The equivalence this list matches with
    #[must_use]
    pub fn equivalence(&self) -> &Arc<dyn Equivalence<T>> {
        &self.equivalence
    }
}

impl<T: Clone> DiffableList<T> {
    /// Replace the contents with `contents`, returning the diff old → new
    ///
    /// An empty diff means the new contents are equivalent element-wise; the
    /// stored items are still swapped so callers observe their exact values.
    pub fn sync(&mut self, contents: Vec<T>) -> Vec<DiffOp<T>> {
        let ops = compute_diff(&self.items, &contents, self.equivalence.as_ref());
        self.items = contents;
        ops
    }

    /// Owned copy of the current items
    #[must_use]
    pub fn snapshot(&self) -> Vec<T> {
        self.items.clone()
    }
}

impl<T: fmt::Debug> fmt::Debug for DiffableList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiffableList")
            .field("items", &self.items)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list() -> DiffableList<&'static str> {
        DiffableList::new(Arc::new(ValueEquality))
    }

    #[test]
    fn test_sync_returns_diff_and_replaces_items() {
        let mut list = list();
        let first = list.sync(vec!["a", "b", "c"]);
        assert_eq!(first.len(), 3);

        let second = list.sync(vec!["a", "c", "d"]);
        assert_eq!(
            second,
            vec![
                DiffOp::Remove { index: 1, item: "b" },
                DiffOp::Insert { index: 2, item: "d" },
            ]
        );
        assert_eq!(list.items(), &["a", "c", "d"]);
    }

    #[test]
    fn test_sync_identical_contents_is_empty() {
        let mut list = list();
        list.sync(vec!["a", "b"]);
        assert!(list.sync(vec!["a", "b"]).is_empty());
    }

    #[test]
    fn test_sync_keeps_new_values_under_loose_equivalence() {
        let eq: Arc<dyn Equivalence<(u32, String)>> =
            Arc::new(|a: &(u32, String), b: &(u32, String)| a.0 == b.0);
        let mut list = DiffableList::new(eq);
        list.sync(vec![(1, "old".to_string())]);

        assert!(list.sync(vec![(1, "new".to_string())]).is_empty());
        assert_eq!(list.items(), &[(1, "new".to_string())]);
    }

    #[test]
    fn test_position_uses_equivalence() {
        let eq: Arc<dyn Equivalence<String>> =
            Arc::new(|a: &String, b: &String| a.eq_ignore_ascii_case(b));
        let mut list = DiffableList::new(eq);
        list.sync(vec!["Rust".to_string(), "Go".to_string()]);

        assert_eq!(list.position(&"go".to_string()), Some(1));
        assert!(list.contains(&"RUST".to_string()));
        assert!(!list.contains(&"zig".to_string()));
    }

    #[test]
    fn test_read_accessors_without_clone() {
        #[derive(Debug, PartialEq)]
        struct Handle(u32);

        let list: DiffableList<Handle> = DiffableList::new(Arc::new(ValueEquality));

        assert!(list.is_empty());
        assert_eq!(list.len(), 0);
        assert!(!list.contains(&Handle(1)));
        assert!(format!("{list:?}").contains("DiffableList"));
    }
}

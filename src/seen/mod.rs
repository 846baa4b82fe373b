// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Trie of define tuples already produced while enumerating one case.
//!
//! Different (row, permutation) pairs can resolve to the same values, e.g.
//! when an override replaces the only define a case's rows differ in.
//! Running those again would duplicate results, so the engine records each
//! tuple here and skips repeats.
//!
//! # Implementation Notes
//!
//! Nodes live in one `Vec` and refer to their children by index. Each node
//! keeps a short list of `(key, child)` edges searched linearly; tuples
//! rarely fan out far at any one slot.

/// One trie node: edges to children keyed by a define value.
#[derive(Debug, Clone, Default)]
struct Node {
    branches: Vec<(i64, usize)>,
}

/// Arena-indexed n-ary trie over define-value tuples.
#[derive(Debug, Clone)]
pub struct SeenTrie {
    /// All nodes; index 0 is the root.
    nodes: Vec<Node>,
    /// Number of distinct tuples inserted.
    tuples: usize,
}

impl SeenTrie {
    /// Empty trie.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::default()],
            tuples: 0,
        }
    }

    /// Insert a tuple, returning true if it was already present.
    ///
    /// An empty tuple is always present.
    pub fn insert<I>(&mut self, tuple: I) -> bool
    where
        I: IntoIterator<Item = i64>,
    {
        let mut node = 0;
        let mut was_seen = true;

        for key in tuple {
            let existing = self.nodes[node]
                .branches
                .iter()
                .find(|&&(k, _)| k == key)
                .map(|&(_, child)| child);

            node = match existing {
                Some(child) => child,
                None => {
                    was_seen = false;
                    let child = self.nodes.len();
                    self.nodes.push(Node::default());
                    self.nodes[node].branches.push((key, child));
                    child
                }
            };
        }

        if !was_seen {
            self.tuples += 1;
        }
        was_seen
    }

    /// Number of distinct non-empty tuples inserted.
    pub fn len(&self) -> usize {
        self.tuples
    }

    /// True if nothing has been inserted.
    pub fn is_empty(&self) -> bool {
        self.tuples == 0
    }
}

impl Default for SeenTrie {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_new_and_repeat() {
        let mut seen = SeenTrie::new();
        assert!(!seen.insert([1, 2, 3]));
        assert!(seen.insert([1, 2, 3]));
        assert_eq!(seen.len(), 1);
    }

    #[test]
    fn test_shared_prefix() {
        let mut seen = SeenTrie::new();
        assert!(!seen.insert([1, 2, 3]));
        assert!(!seen.insert([1, 2, 4]));
        assert!(!seen.insert([0, 2, 3]));
        assert!(seen.insert([1, 2, 4]));
        assert_eq!(seen.len(), 3);
        // root, then 1->2->{3,4}, then 0->2->3
        assert_eq!(seen.nodes.len(), 1 + 4 + 3);
    }

    #[test]
    fn test_empty_tuple_always_seen() {
        let mut seen = SeenTrie::new();
        assert!(seen.is_empty());
        assert!(seen.insert([]));
        assert!(seen.is_empty());
    }

    #[test]
    fn test_negative_keys() {
        let mut seen = SeenTrie::new();
        assert!(!seen.insert([-1, i64::MIN]));
        assert!(!seen.insert([-1, i64::MAX]));
        assert!(seen.insert([-1, i64::MIN]));
    }
}

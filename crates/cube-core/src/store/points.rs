//! # Sparse Point Store
//!
//! A trie of `BTreeMap`s keyed by `ValueId`, one level per axis in schema
//! order. The last level maps the final axis id straight to a value.
//!
//! Enumeration walks the trie with an explicit stack of per-level map cursors
//! rather than recursion, so the sequence is lazy and can be dropped at any
//! point.

use crate::{CubeError, CubeValue, ValueId};
use std::collections::BTreeMap;
use std::collections::btree_map::{self, Entry};

/// A child in the point trie: another level, or the value at a full key.
#[derive(Debug, Clone)]
enum PointNode<V> {
    Branch(BTreeMap<ValueId, PointNode<V>>),
    Leaf(V),
}

/// Trie of cube points keyed by interned ids.
#[derive(Debug, Clone)]
pub struct PointStore<V> {
    /// Number of axes; every key has exactly this many ids.
    depth: usize,

    /// First axis level.
    root: BTreeMap<ValueId, PointNode<V>>,

    /// Number of distinct full keys stored.
    len: usize,
}

impl<V: CubeValue> PointStore<V> {
    /// Create an empty store over `depth` axes.
    ///
    /// Returns `CubeError::Schema` if `depth` is zero.
    pub fn new(depth: usize) -> Result<Self, CubeError> {
        if depth == 0 {
            return Err(CubeError::Schema(
                "At least 1 axis must be specified".to_string(),
            ));
        }
        Ok(Self {
            depth,
            root: BTreeMap::new(),
            len: 0,
        })
    }

    /// Number of axes per key.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Number of stored points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the store holds no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Add a value at a full key.
    ///
    /// Stores a clone of `value` and returns `true` if the key is new;
    /// otherwise merges `value` into the existing one with `try_add` and
    /// returns `false`.
    pub fn add_item(&mut self, ids: &[ValueId], value: &V) -> Result<bool, CubeError> {
        if ids.len() != self.depth {
            return Err(CubeError::KeyCount {
                expected: self.depth,
                actual: ids.len(),
            });
        }
        let Some((last, path)) = ids.split_last() else {
            return Err(CubeError::InvalidState(
                "Tried to add to a zero axed store".to_string(),
            ));
        };

        let mut level = &mut self.root;
        for id in path {
            let child = level
                .entry(*id)
                .or_insert_with(|| PointNode::Branch(BTreeMap::new()));
            level = match child {
                PointNode::Branch(children) => children,
                PointNode::Leaf(_) => {
                    return Err(CubeError::InvalidState(
                        "Leaf found at an intermediate level".to_string(),
                    ));
                }
            };
        }

        match level.entry(*last) {
            Entry::Vacant(slot) => {
                slot.insert(PointNode::Leaf(value.clone()));
                self.len = self.len.saturating_add(1);
                Ok(true)
            }
            Entry::Occupied(mut slot) => match slot.get_mut() {
                PointNode::Leaf(existing) => {
                    existing.try_add(value)?;
                    tracing::trace!("Merged value at key {:?}", ids);
                    Ok(false)
                }
                PointNode::Branch(_) => Err(CubeError::InvalidState(
                    "Branch found at the leaf level".to_string(),
                )),
            },
        }
    }

    /// Look up the value at a full key without mutating anything.
    #[must_use]
    pub fn try_get_value(&self, ids: &[ValueId]) -> Option<&V> {
        if ids.len() != self.depth {
            return None;
        }
        let (last, path) = ids.split_last()?;

        let mut level = &self.root;
        for id in path {
            match level.get(id)? {
                PointNode::Branch(children) => level = children,
                PointNode::Leaf(_) => return None,
            }
        }

        match level.get(last)? {
            PointNode::Leaf(value) => Some(value),
            PointNode::Branch(_) => None,
        }
    }

    /// Enumerate every stored point exactly once.
    ///
    /// Order is ascending id at each level, which is first-seen order of the
    /// keys on that axis; it is stable for an unmodified store.
    pub fn iter(&self) -> Points<'_, V> {
        Points {
            depth: self.depth,
            cursors: vec![self.root.iter()],
            keys: Vec::with_capacity(self.depth),
        }
    }
}

// =============================================================================
// CURSOR
// =============================================================================

/// Lazy depth-first walk over a `PointStore`.
///
/// `cursors[i]` iterates the map at level `i` and `keys[i]` is the id it last
/// yielded. The deepest cursor is advanced first; an exhausted cursor is
/// popped and the walk resumes one level up.
pub struct Points<'a, V> {
    depth: usize,
    cursors: Vec<btree_map::Iter<'a, ValueId, PointNode<V>>>,
    keys: Vec<ValueId>,
}

impl<V> Points<'_, V> {
    fn abort(&mut self, level: usize) {
        tracing::error!(
            "Inconsistent point trie at level {} of {}, key prefix {:?}",
            level,
            self.depth,
            self.keys
        );
        self.cursors.clear();
    }
}

impl<'a, V> Iterator for Points<'a, V> {
    type Item = (Vec<ValueId>, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let level = self.cursors.len().checked_sub(1)?;
            let Some((id, node)) = self.cursors.last_mut().and_then(Iterator::next) else {
                self.cursors.pop();
                self.keys.truncate(level);
                continue;
            };

            self.keys.truncate(level);
            self.keys.push(*id);

            let is_last = level + 1 == self.depth;
            match node {
                PointNode::Branch(children) if !is_last => self.cursors.push(children.iter()),
                PointNode::Leaf(value) if is_last => return Some((self.keys.clone(), value)),
                _ => {
                    self.abort(level);
                    return None;
                }
            }
        }
    }
}

impl<V> std::iter::FusedIterator for Points<'_, V> {}

// =============================================================================
// TESTS
// =============================================================================

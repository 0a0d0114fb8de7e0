//! # Sparse Error Store
//!
//! Same trie shape as the point store, but every level has two branches:
//! - `specified`: one child per concrete id given for that axis
//! - `unspecified`: a single wildcard child for "no key on this axis"
//!
//! At the last axis both branches hold message lists instead of nodes. An
//! error recorded against a partial key therefore costs one path, no matter
//! how many concrete values the omitted axes take.

use crate::{CubeError, ValueId};
use std::collections::BTreeMap;
use std::collections::btree_map;

/// Child of an error-trie branch.
#[derive(Debug, Clone)]
enum ErrorChild {
    Node(ErrorNode),
    Messages(Vec<String>),
}

impl ErrorChild {
    fn empty(is_last: bool) -> Self {
        if is_last {
            Self::Messages(Vec::new())
        } else {
            Self::Node(ErrorNode::default())
        }
    }
}

/// One axis level of the error trie.
#[derive(Debug, Clone, Default)]
struct ErrorNode {
    unspecified: Option<Box<ErrorChild>>,
    specified: BTreeMap<ValueId, ErrorChild>,
}

/// Per-axis constraint applied during filtered enumeration.
///
/// The wildcard branch matches every constraint: an error recorded without a
/// key on an axis applies to whatever value the caller asks about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisFilter {
    /// Visit the wildcard and every concrete id.
    Any,
    /// Visit the wildcard and this id only.
    Exact(ValueId),
    /// Visit the wildcard only; no concrete id can match.
    Unmatchable,
}

/// Trie of error messages keyed by partial id tuples.
#[derive(Debug, Clone)]
pub struct ErrorStore {
    /// Axis names in schema order.
    axis_names: Vec<String>,

    root: ErrorNode,

    /// Number of messages recorded.
    len: usize,
}

impl ErrorStore {
    /// Create an empty store over the given axes.
    ///
    /// Returns `CubeError::Schema` if there are no axes.
    pub fn new(axis_names: Vec<String>) -> Result<Self, CubeError> {
        if axis_names.is_empty() {
            return Err(CubeError::Schema(
                "At least 1 axis must be specified".to_string(),
            ));
        }
        Ok(Self {
            axis_names,
            root: ErrorNode::default(),
            len: 0,
        })
    }

    /// Number of recorded messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no message has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Record `message` against a partial key.
    ///
    /// Axes absent from `keys` take the wildcard branch. Messages on the same
    /// partial key accumulate in insertion order.
    pub fn add_item(
        &mut self,
        keys: &BTreeMap<String, ValueId>,
        message: String,
    ) -> Result<(), CubeError> {
        if let Some(name) = keys
            .keys()
            .find(|name| !self.axis_names.iter().any(|axis| axis == *name))
        {
            return Err(CubeError::Schema(format!(
                "Error keys contained a value for axis '{}' not defined within the set",
                name
            )));
        }

        let last = self.axis_names.len() - 1;
        let mut node = &mut self.root;
        for (idx, name) in self.axis_names.iter().enumerate() {
            let is_last = idx == last;
            let child = match keys.get(name) {
                Some(id) => node
                    .specified
                    .entry(*id)
                    .or_insert_with(|| ErrorChild::empty(is_last)),
                None => node
                    .unspecified
                    .get_or_insert_with(|| Box::new(ErrorChild::empty(is_last)))
                    .as_mut(),
            };

            match child {
                ErrorChild::Messages(messages) if is_last => {
                    messages.push(message);
                    self.len = self.len.saturating_add(1);
                    return Ok(());
                }
                ErrorChild::Node(next) if !is_last => node = next,
                _ => {
                    return Err(CubeError::InvalidState(format!(
                        "Unexpected node kind at axis '{}'",
                        name
                    )));
                }
            }
        }

        Err(CubeError::InvalidState(
            "Tried to add to a zero axed store".to_string(),
        ))
    }

    /// Enumerate every recorded message with its partial key.
    pub fn iter(&self) -> ErrorEntries<'_> {
        self.walk(vec![AxisFilter::Any; self.axis_names.len()])
    }

    /// Enumerate the messages that could apply to `filter`.
    ///
    /// Axes absent from `filter` are unconstrained. For a constrained axis the
    /// wildcard branch is always visited and the concrete branch only where the
    /// id matches. Returns `CubeError::Schema` if `filter` names an axis
    /// outside the schema.
    pub fn iter_matching(
        &self,
        filter: &BTreeMap<String, AxisFilter>,
    ) -> Result<ErrorEntries<'_>, CubeError> {
        let filters: Vec<AxisFilter> = self
            .axis_names
            .iter()
            .map(|name| filter.get(name).copied().unwrap_or(AxisFilter::Any))
            .collect();

        let mapped = self
            .axis_names
            .iter()
            .filter(|name| filter.contains_key(*name))
            .count();
        if mapped != filter.len() {
            return Err(CubeError::Schema(
                "Filter key specified which isn't a valid axis".to_string(),
            ));
        }

        Ok(self.walk(filters))
    }

    fn walk(&self, filters: Vec<AxisFilter>) -> ErrorEntries<'_> {
        let first = filters.first().copied().unwrap_or(AxisFilter::Any);
        let root = BranchCursor::new(&self.root, first);
        ErrorEntries {
            cursors: vec![root],
            keys: Vec::with_capacity(filters.len()),
            messages: None,
            filters,
        }
    }
}

// =============================================================================
// CURSORS
// =============================================================================

/// Iterates the concrete branch of one node under an `AxisFilter`.
enum Specified<'a> {
    All(btree_map::Iter<'a, ValueId, ErrorChild>),
    Exact(Option<(ValueId, &'a ErrorChild)>),
    Nothing,
}

/// Yields a node's wildcard child first, then its matching concrete children.
struct BranchCursor<'a> {
    wildcard: Option<&'a ErrorChild>,
    specified: Specified<'a>,
}

impl<'a> BranchCursor<'a> {
    fn new(node: &'a ErrorNode, filter: AxisFilter) -> Self {
        let specified = match filter {
            AxisFilter::Any => Specified::All(node.specified.iter()),
            AxisFilter::Exact(id) => Specified::Exact(node.specified.get(&id).map(|c| (id, c))),
            AxisFilter::Unmatchable => Specified::Nothing,
        };
        Self {
            wildcard: node.unspecified.as_deref(),
            specified,
        }
    }
}

impl<'a> Iterator for BranchCursor<'a> {
    type Item = (Option<ValueId>, &'a ErrorChild);

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(child) = self.wildcard.take() {
            return Some((None, child));
        }
        match &mut self.specified {
            Specified::All(iter) => iter.next().map(|(id, child)| (Some(*id), child)),
            Specified::Exact(entry) => entry.take().map(|(id, child)| (Some(id), child)),
            Specified::Nothing => None,
        }
    }
}

/// Lazy depth-first walk over an `ErrorStore`, yielding one item per message.
///
/// A level with nothing matching the filter is simply exhausted and the walk
/// backtracks; this is normal under filtering, not an inconsistency.
pub struct ErrorEntries<'a> {
    filters: Vec<AxisFilter>,
    cursors: Vec<BranchCursor<'a>>,
    keys: Vec<Option<ValueId>>,
    messages: Option<std::slice::Iter<'a, String>>,
}

impl<'a> Iterator for ErrorEntries<'a> {
    type Item = (Vec<Option<ValueId>>, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(message) = self.messages.as_mut().and_then(Iterator::next) {
                return Some((self.keys.clone(), message.as_str()));
            }
            self.messages = None;

            let level = self.cursors.len().checked_sub(1)?;
            let Some((key, child)) = self.cursors.last_mut().and_then(Iterator::next) else {
                self.cursors.pop();
                self.keys.truncate(level);
                continue;
            };

            self.keys.truncate(level);
            self.keys.push(key);

            let next_level = level + 1;
            match (child, self.filters.get(next_level)) {
                (ErrorChild::Node(node), Some(filter)) => {
                    self.cursors.push(BranchCursor::new(node, *filter));
                }
                (ErrorChild::Messages(messages), None) => {
                    self.messages = Some(messages.iter());
                }
                _ => {
                    tracing::error!(
                        "Inconsistent error trie at level {} of {}, key prefix {:?}",
                        level,
                        self.filters.len(),
                        self.keys
                    );
                    self.cursors.clear();
                    return None;
                }
            }
        }
    }
}

impl std::iter::FusedIterator for ErrorEntries<'_> {}

// =============================================================================
// TESTS
// =============================================================================

//! # Cube
//!
//! The façade binding one `AxisSet`, one `Interner`, one `PointStore` and one
//! `ErrorStore`. It validates raw keys against the schema, interns them, and
//! translates ids back to values on the way out.
//!
//! ## Sharing
//!
//! Writes take `&mut self`; reads take `&self` and never intern, so any number
//! of readers may share a cube once no writer holds it. There is no internal
//! locking.

use crate::interner::Interner;
use crate::store::{AxisFilter, ErrorStore, PointStore};
use crate::{AxisSet, AxisValue, CubeError, CubeValue, ValueId};
use std::collections::BTreeMap;

/// Keys addressed by axis name.
pub type NamedKeys = BTreeMap<String, AxisValue>;

/// Sparse multidimensional aggregation store.
#[derive(Debug, Clone)]
pub struct Cube<V> {
    axes: AxisSet,
    interner: Interner,
    points: PointStore<V>,
    errors: ErrorStore,

    /// Kind of the first stored value; later values must match it.
    value_kind: Option<&'static str>,
}

impl<V: CubeValue> Cube<V> {
    /// Create an empty cube over a schema.
    ///
    /// Returns `CubeError::Schema` if the schema has no axes.
    pub fn new(axes: AxisSet) -> Result<Self, CubeError> {
        if axes.is_empty() {
            return Err(CubeError::Schema(
                "At least one axis must be specified".to_string(),
            ));
        }

        let points = PointStore::new(axes.len())?;
        let errors = ErrorStore::new(axes.names().map(str::to_string).collect())?;
        tracing::debug!("Created cube over {} axes", axes.len());

        Ok(Self {
            axes,
            interner: Interner::new(),
            points,
            errors,
            value_kind: None,
        })
    }

    /// The cube's schema.
    #[must_use]
    pub fn axis_set(&self) -> &AxisSet {
        &self.axes
    }

    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the cube holds no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Kind of the values held, once the first one is stored.
    #[must_use]
    pub fn value_kind(&self) -> Option<&'static str> {
        self.value_kind
    }

    // =========================================================================
    // WRITES
    // =========================================================================

    /// Add a value at a positional key.
    ///
    /// Returns `true` if the key was new, `false` if `value` was merged into
    /// an existing point.
    ///
    /// # Errors
    /// - `KeyCount` if `keys` does not have one entry per axis
    /// - `TypeMismatch` if a key does not match its axis type, or `value` is
    ///   of a different kind than the values already stored
    pub fn add_item(&mut self, keys: &[AxisValue], value: &V) -> Result<bool, CubeError> {
        if keys.len() != self.axes.len() {
            return Err(CubeError::KeyCount {
                expected: self.axes.len(),
                actual: keys.len(),
            });
        }

        for (idx, (axis, key)) in self.axes.iter().zip(keys).enumerate() {
            if !axis.data_type().accepts(key) {
                return Err(CubeError::TypeMismatch(format!(
                    "The supplied value '{}' for axis '{}' (#{}) is not valid for data type '{}'",
                    key,
                    axis.name(),
                    idx,
                    axis.data_type()
                )));
            }
        }

        let kind = value.kind();
        if let Some(expected) = self.value_kind
            && expected != kind
        {
            return Err(CubeError::TypeMismatch(format!(
                "Cube holds '{}' values, got a '{}' value",
                expected, kind
            )));
        }

        let ids = keys
            .iter()
            .map(|key| self.interner.get_id(key))
            .collect::<Result<Vec<ValueId>, _>>()?;

        let created = self.points.add_item(&ids, value)?;
        self.value_kind = Some(kind);
        Ok(created)
    }

    /// Add a value at a key given by axis name.
    ///
    /// Every axis must have an entry; names outside the schema are ignored.
    ///
    /// # Errors
    /// - `MissingKey` if an axis has no entry
    /// - as for `add_item` otherwise
    pub fn add_item_named(&mut self, keys: &NamedKeys, value: &V) -> Result<bool, CubeError> {
        let positional = self
            .axes
            .iter()
            .enumerate()
            .map(|(index, axis)| {
                keys.get(axis.name())
                    .cloned()
                    .ok_or_else(|| CubeError::MissingKey {
                        axis: axis.name().to_string(),
                        index,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        self.add_item(&positional, value)
    }

    /// Record an error message against a partial key.
    ///
    /// Axes absent from `keys` are treated as "any value".
    ///
    /// # Errors
    /// - `UnknownAxis` if `keys` names an axis outside the schema
    /// - `TypeMismatch` if a key does not match its axis type
    pub fn add_error(&mut self, keys: &NamedKeys, message: impl Into<String>) -> Result<(), CubeError> {
        for (name, key) in keys {
            let axis = self.axes.by_name(name)?;
            if !axis.data_type().accepts(key) {
                return Err(CubeError::TypeMismatch(format!(
                    "The supplied value '{}' for axis '{}' is not valid for data type '{}'",
                    key,
                    axis.name(),
                    axis.data_type()
                )));
            }
        }

        let mut ids = BTreeMap::new();
        for (name, key) in keys {
            ids.insert(name.clone(), self.interner.get_id(key)?);
        }

        self.errors.add_item(&ids, message.into())?;
        tracing::debug!("Recorded error on {} of {} axes", ids.len(), self.axes.len());
        Ok(())
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// Look up the value at a positional key.
    ///
    /// Never interns: a key value the cube has not seen means no match.
    pub fn try_get_value(&self, keys: &[AxisValue]) -> Result<Option<&V>, CubeError> {
        if keys.len() != self.axes.len() {
            return Err(CubeError::KeyCount {
                expected: self.axes.len(),
                actual: keys.len(),
            });
        }

        let mut ids = Vec::with_capacity(keys.len());
        for key in keys {
            match self.interner.try_get_id(key) {
                Some(id) => ids.push(id),
                None => return Ok(None),
            }
        }

        Ok(self.points.try_get_value(&ids))
    }

    /// Enumerate every point.
    pub fn iter(&self) -> impl Iterator<Item = CubePoint<'_, V>> + '_ {
        self.points.iter().map(|(ids, value)| CubePoint {
            interner: &self.interner,
            ids,
            value,
        })
    }

    /// The cube's errors.
    #[must_use]
    pub fn error_set(&self) -> ErrorSet<'_> {
        ErrorSet {
            axes: &self.axes,
            interner: &self.interner,
            store: &self.errors,
        }
    }
}

// =============================================================================
// CUBE POINT
// =============================================================================

/// One point yielded by `Cube::iter`.
#[derive(Debug, Clone)]
pub struct CubePoint<'a, V> {
    interner: &'a Interner,
    ids: Vec<ValueId>,
    value: &'a V,
}

impl<'a, V> CubePoint<'a, V> {
    /// The key on axis `index`, resolved back to its value.
    pub fn axis_value(&self, index: usize) -> Result<&'a AxisValue, CubeError> {
        let id = self.ids.get(index).ok_or(CubeError::OutOfRange {
            what: "axis index",
            index: index as u64,
            limit: self.ids.len() as u64,
        })?;
        self.interner.get_object(*id)
    }

    /// All keys of this point in schema order.
    pub fn axis_values(&self) -> Result<Vec<&'a AxisValue>, CubeError> {
        self.ids
            .iter()
            .map(|id| self.interner.get_object(*id))
            .collect()
    }

    /// The interned key.
    #[must_use]
    pub fn ids(&self) -> &[ValueId] {
        &self.ids
    }

    /// The stored value.
    #[must_use]
    pub fn value(&self) -> &'a V {
        self.value
    }
}

// =============================================================================
// ERROR SET
// =============================================================================

/// Read view over a cube's errors.
#[derive(Debug, Clone, Copy)]
pub struct ErrorSet<'a> {
    axes: &'a AxisSet,
    interner: &'a Interner,
    store: &'a ErrorStore,
}

impl<'a> ErrorSet<'a> {
    /// Number of recorded messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Whether no message has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Enumerate every error.
    pub fn iter(&self) -> impl Iterator<Item = ErrorEntry<'a>> + use<'a> {
        let axes = self.axes;
        let interner = self.interner;
        self.store.iter().map(move |(keys, message)| ErrorEntry {
            axes,
            interner,
            keys,
            message,
        })
    }

    /// Enumerate the errors that could apply to a partial key.
    ///
    /// An error matches when, on every axis in `filter`, it either has no key
    /// or has exactly the filter's key. A filter value the cube has never
    /// seen can only match errors with no key on that axis. An empty filter
    /// yields every error.
    pub fn matching(
        &self,
        filter: &NamedKeys,
    ) -> Result<impl Iterator<Item = ErrorEntry<'a>> + use<'a>, CubeError> {
        let mut ids = BTreeMap::new();
        for (name, key) in filter {
            self.axes.by_name(name)?;
            let axis_filter = self
                .interner
                .try_get_id(key)
                .map_or(AxisFilter::Unmatchable, AxisFilter::Exact);
            ids.insert(name.clone(), axis_filter);
        }

        let axes = self.axes;
        let interner = self.interner;
        let entries = self.store.iter_matching(&ids)?;
        Ok(entries.map(move |(keys, message)| ErrorEntry {
            axes,
            interner,
            keys,
            message,
        }))
    }
}

/// One recorded error message and the partial key it was recorded against.
#[derive(Debug, Clone)]
pub struct ErrorEntry<'a> {
    axes: &'a AxisSet,
    interner: &'a Interner,
    keys: Vec<Option<ValueId>>,
    message: &'a str,
}

impl<'a> ErrorEntry<'a> {
    /// The error message.
    #[must_use]
    pub fn message(&self) -> &'a str {
        self.message
    }

    /// Names of the axes this error has a concrete key on, in schema order.
    #[must_use]
    pub fn error_axes(&self) -> Vec<&'a str> {
        self.axes
            .names()
            .zip(&self.keys)
            .filter(|(_, key)| key.is_some())
            .map(|(name, _)| name)
            .collect()
    }

    /// The key this error has on an axis.
    ///
    /// Returns `CubeError::UnknownAxis` if the axis is not in the schema or
    /// the error has no key on it.
    pub fn error_key(&self, axis_name: &str) -> Result<&'a AxisValue, CubeError> {
        let id = self
            .axes
            .index_of(axis_name)
            .and_then(|idx| self.keys.get(idx).copied().flatten())
            .ok_or_else(|| {
                CubeError::UnknownAxis(format!("No error key found for axis '{}'", axis_name))
            })?;
        self.interner.get_object(id)
    }

    /// The interned partial key in schema order.
    #[must_use]
    pub fn ids(&self) -> &[Option<ValueId>] {
        &self.keys
    }
}

// =============================================================================
// TESTS
// =============================================================================

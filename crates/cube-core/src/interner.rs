//! # Value Interner
//!
//! Bidirectional mapping between axis values and dense `ValueId`s.
//!
//! - Ids are issued monotonically from `FIRST_VALUE_ID` on first sight
//! - An id is never reused or renumbered for the lifetime of the interner
//! - `Null` always maps to `ValueId::NULL` and is never stored
//!
//! The reverse table is a plain `Vec` indexed by id. Slot 0 holds `Null`, so
//! reverse lookup is a single bounds-checked index.

use crate::primitives::{INITIAL_INTERNER_CAPACITY, MAX_VALUE_ID};
use crate::{AxisValue, CubeError, ValueId};
use std::collections::HashMap;

/// Interns axis values for one cube.
///
/// `try_get_id` and `get_object` take `&self` and never mutate, so any number
/// of readers may share an interner while no writer holds it.
#[derive(Debug, Clone)]
pub struct Interner {
    /// Forward map: value -> id
    ids: HashMap<AxisValue, ValueId>,

    /// Reverse table: id -> value, `values[0]` is `Null`
    values: Vec<AxisValue>,
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

impl Interner {
    /// Create an empty interner.
    #[must_use]
    pub fn new() -> Self {
        let mut values = Vec::with_capacity(INITIAL_INTERNER_CAPACITY);
        values.push(AxisValue::Null);
        Self {
            ids: HashMap::with_capacity(INITIAL_INTERNER_CAPACITY),
            values,
        }
    }

    /// Look up the id of a value without inserting it.
    #[must_use]
    pub fn try_get_id(&self, value: &AxisValue) -> Option<ValueId> {
        if value.is_null() {
            return Some(ValueId::NULL);
        }
        self.ids.get(value).copied()
    }

    /// Look up the id of a value, assigning the next id on first sight.
    ///
    /// Returns `CubeError::OutOfRange` once `MAX_VALUE_ID` ids are in use.
    pub fn get_id(&mut self, value: &AxisValue) -> Result<ValueId, CubeError> {
        if let Some(id) = self.try_get_id(value) {
            return Ok(id);
        }

        let next = u32::try_from(self.values.len()).map_err(|_| CubeError::OutOfRange {
            what: "value id",
            index: self.values.len() as u64,
            limit: u64::from(MAX_VALUE_ID),
        })?;

        let id = ValueId(next);
        self.values.push(value.clone());
        self.ids.insert(value.clone(), id);
        Ok(id)
    }

    /// Resolve an id back to its value.
    ///
    /// Returns `CubeError::OutOfRange` if `id` was never issued.
    pub fn get_object(&self, id: ValueId) -> Result<&AxisValue, CubeError> {
        self.values
            .get(id.0 as usize)
            .ok_or(CubeError::OutOfRange {
                what: "value id",
                index: u64::from(id.0),
                limit: self.values.len() as u64,
            })
    }

    /// Number of distinct non-null values interned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether no non-null value has been interned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// The id the next new value will receive.
    #[must_use]
    pub fn next_id(&self) -> ValueId {
        ValueId(self.values.len() as u32)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_start_at_one_and_are_dense() {
        let mut interner = Interner::new();
        let a = interner.get_id(&AxisValue::from("a")).expect("intern");
        let b = interner.get_id(&AxisValue::from("b")).expect("intern");
        let c = interner.get_id(&AxisValue::Int(7)).expect("intern");

        assert_eq!(a, ValueId(1));
        assert_eq!(b, ValueId(2));
        assert_eq!(c, ValueId(3));
        assert_eq!(interner.next_id(), ValueId(4));
    }

    #[test]
    fn repeated_value_keeps_its_id() {
        let mut interner = Interner::new();
        let first = interner.get_id(&AxisValue::from("x")).expect("intern");
        let second = interner.get_id(&AxisValue::from("x")).expect("intern");

        assert_eq!(first, second);
        assert_eq!(interner.len(), 1);
    }

    #[test]
    fn null_maps_to_reserved_id() {
        let mut interner = Interner::new();
        assert_eq!(
            interner.get_id(&AxisValue::Null).expect("intern"),
            ValueId::NULL
        );
        assert_eq!(interner.try_get_id(&AxisValue::Null), Some(ValueId::NULL));
        assert!(interner.get_object(ValueId::NULL).expect("resolve").is_null());
        assert!(interner.is_empty());
    }

    #[test]
    fn try_get_id_does_not_insert() {
        let interner = Interner::new();
        assert_eq!(interner.try_get_id(&AxisValue::from("missing")), None);
        assert_eq!(interner.len(), 0);
        assert_eq!(interner.next_id(), ValueId(1));
    }

    #[test]
    fn unissued_id_is_out_of_range() {
        let mut interner = Interner::new();
        interner.get_id(&AxisValue::from("only")).expect("intern");

        assert!(matches!(
            interner.get_object(ValueId(2)),
            Err(CubeError::OutOfRange { index: 2, .. })
        ));
    }

    #[test]
    fn round_trip_across_block_boundaries() {
        let mut interner = Interner::new();
        let count = INITIAL_INTERNER_CAPACITY * 3 + 17;

        let ids: Vec<_> = (0..count)
            .map(|i| interner.get_id(&AxisValue::Int(i as i64)).expect("intern"))
            .collect();

        for (i, id) in ids.iter().enumerate() {
            assert_eq!(
                interner.get_object(*id).expect("resolve"),
                &AxisValue::Int(i as i64)
            );
        }
    }
}

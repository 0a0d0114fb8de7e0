//! # Axes and Axis Sets
//!
//! An `Axis` is a named, typed dimension; an `AxisSet` is the ordered,
//! name-unique schema of a cube.
//!
//! Schemas are plain data and can be loaded from a TOML document:
//!
//! ```toml
//! [[axis]]
//! name = "Category"
//! type = "text"
//! nullable = true
//!
//! [[axis]]
//! name = "Date"
//! type = "date"
//! allow_totals = false
//! ```

use crate::{CubeError, DataType, KeyKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// AXIS
// =============================================================================

/// A named, typed dimension of a cube.
///
/// Equality is structural over name, type and `allow_totals`; two cubes
/// share an axis only if all three agree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "AxisDef", into = "AxisDef")]
pub struct Axis {
    name: String,
    data_type: DataType,
    allow_totals: bool,
}

impl Axis {
    /// Create an axis.
    ///
    /// Returns `CubeError::Schema` if `name` is empty.
    pub fn new(
        name: impl Into<String>,
        data_type: DataType,
        allow_totals: bool,
    ) -> Result<Self, CubeError> {
        let name = name.into();
        if name.is_empty() {
            return Err(CubeError::Schema("Axis name must not be empty".to_string()));
        }
        Ok(Self {
            name,
            data_type,
            allow_totals,
        })
    }

    /// The axis name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared key type.
    #[must_use]
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Whether the axis may be totalled.
    #[must_use]
    pub fn allow_totals(&self) -> bool {
        self.allow_totals
    }
}

fn default_allow_totals() -> bool {
    true
}

/// Serialized form of an axis.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct AxisDef {
    name: String,
    #[serde(rename = "type")]
    kind: KeyKind,
    #[serde(default)]
    nullable: bool,
    #[serde(default = "default_allow_totals")]
    allow_totals: bool,
}

impl TryFrom<AxisDef> for Axis {
    type Error = CubeError;

    fn try_from(def: AxisDef) -> Result<Self, Self::Error> {
        let data_type = if def.nullable {
            DataType::nullable(def.kind)
        } else {
            DataType::of(def.kind)
        };
        Self::new(def.name, data_type, def.allow_totals)
    }
}

impl From<Axis> for AxisDef {
    fn from(axis: Axis) -> Self {
        Self {
            kind: axis.data_type.kind(),
            nullable: axis.data_type.is_nullable(),
            name: axis.name,
            allow_totals: axis.allow_totals,
        }
    }
}

// =============================================================================
// AXIS SET
// =============================================================================

/// Ordered, name-unique collection of axes.
///
/// Indexable by position and by name in O(1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SchemaDocument", into = "SchemaDocument")]
pub struct AxisSet {
    axes: Vec<Axis>,
    by_name: HashMap<String, usize>,
}

impl AxisSet {
    /// Build an axis set from an ordered list of axes.
    ///
    /// Returns `CubeError::Schema` if two axes share a name. An empty list is
    /// accepted here; a cube rejects it.
    pub fn new(axes: impl IntoIterator<Item = Axis>) -> Result<Self, CubeError> {
        let axes: Vec<Axis> = axes.into_iter().collect();
        let mut by_name = HashMap::with_capacity(axes.len());
        for (idx, axis) in axes.iter().enumerate() {
            if by_name.insert(axis.name.clone(), idx).is_some() {
                return Err(CubeError::Schema(format!(
                    "Duplicate axes with name '{}' found",
                    axis.name
                )));
            }
        }
        Ok(Self { axes, by_name })
    }

    /// Parse a schema from a TOML document with one `[[axis]]` table per axis.
    pub fn from_toml_str(document: &str) -> Result<Self, CubeError> {
        let doc: SchemaDocument =
            toml::from_str(document).map_err(|e| CubeError::Config(e.to_string()))?;
        Self::new(doc.axes)
    }

    /// Render the schema as a TOML document accepted by `from_toml_str`.
    pub fn to_toml_string(&self) -> Result<String, CubeError> {
        toml::to_string(&SchemaDocument::from(self.clone()))
            .map_err(|e| CubeError::Config(e.to_string()))
    }

    /// Number of axes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.axes.len()
    }

    /// Whether the set has no axes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.axes.is_empty()
    }

    /// The axis at a position.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Axis> {
        self.axes.get(index)
    }

    /// The axis with a name.
    pub fn by_name(&self, name: &str) -> Result<&Axis, CubeError> {
        self.index_of(name)
            .and_then(|idx| self.axes.get(idx))
            .ok_or_else(|| CubeError::UnknownAxis(format!("No axis by name '{}' found", name)))
    }

    /// Position of the axis with a name.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Whether a structurally equal axis is part of this set.
    #[must_use]
    pub fn contains(&self, axis: &Axis) -> bool {
        self.index_of(&axis.name)
            .and_then(|idx| self.axes.get(idx))
            .is_some_and(|own| own == axis)
    }

    /// Axes in schema order.
    pub fn iter(&self) -> impl Iterator<Item = &Axis> {
        self.axes.iter()
    }

    /// Axis names in schema order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.axes.iter().map(Axis::name)
    }
}

impl<'a> IntoIterator for &'a AxisSet {
    type Item = &'a Axis;
    type IntoIter = std::slice::Iter<'a, Axis>;

    fn into_iter(self) -> Self::IntoIter {
        self.axes.iter()
    }
}

/// Serialized form of an axis set.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SchemaDocument {
    #[serde(rename = "axis", default)]
    axes: Vec<Axis>,
}

impl TryFrom<SchemaDocument> for AxisSet {
    type Error = CubeError;

    fn try_from(doc: SchemaDocument) -> Result<Self, Self::Error> {
        Self::new(doc.axes)
    }
}

impl From<AxisSet> for SchemaDocument {
    fn from(set: AxisSet) -> Self {
        Self { axes: set.axes }
    }
}

// =============================================================================
// TESTS
// =============================================================================

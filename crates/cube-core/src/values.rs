//! # Value Kinds
//!
//! Reference implementations of `CubeValue`:
//! - `ValueDouble` and `ValueFloat` wrap a number and add by summation
//! - `AnyValue` lets one cube type carry either at runtime, failing on a
//!   mixed-kind merge
//! - `AnyCube` is a typed handle over cubes of either kind, used to combine a
//!   heterogeneous list without knowing its value kind up front

use crate::combine::{can_combine_cubes, combine_cubes};
use crate::{AxisSet, Cube, CubeError, CubeValue};
use serde::{Deserialize, Serialize};

const DOUBLE: &str = "double";
const FLOAT: &str = "float";

// =============================================================================
// NUMERIC KINDS
// =============================================================================

/// A 64-bit float value.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ValueDouble(pub f64);

impl CubeValue for ValueDouble {
    fn kind(&self) -> &'static str {
        DOUBLE
    }

    fn try_add(&mut self, other: &Self) -> Result<(), CubeError> {
        self.0 += other.0;
        Ok(())
    }
}

impl From<f64> for ValueDouble {
    fn from(v: f64) -> Self {
        Self(v)
    }
}

/// A 32-bit float value.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ValueFloat(pub f32);

impl CubeValue for ValueFloat {
    fn kind(&self) -> &'static str {
        FLOAT
    }

    fn try_add(&mut self, other: &Self) -> Result<(), CubeError> {
        self.0 += other.0;
        Ok(())
    }
}

impl From<f32> for ValueFloat {
    fn from(v: f32) -> Self {
        Self(v)
    }
}

/// Either numeric kind, chosen at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AnyValue {
    Double(ValueDouble),
    Float(ValueFloat),
}

impl CubeValue for AnyValue {
    fn kind(&self) -> &'static str {
        match self {
            Self::Double(v) => v.kind(),
            Self::Float(v) => v.kind(),
        }
    }

    fn try_add(&mut self, other: &Self) -> Result<(), CubeError> {
        match (self, other) {
            (Self::Double(a), Self::Double(b)) => a.try_add(b),
            (Self::Float(a), Self::Float(b)) => a.try_add(b),
            (a, b) => Err(CubeError::TypeMismatch(format!(
                "Unable to add a '{}' value to a '{}' value",
                b.kind(),
                a.kind()
            ))),
        }
    }
}

// =============================================================================
// TYPED CUBE HANDLE
// =============================================================================

/// A cube of one of the supported value kinds.
#[derive(Debug, Clone)]
pub enum AnyCube {
    Double(Cube<ValueDouble>),
    Float(Cube<ValueFloat>),
}

impl From<Cube<ValueDouble>> for AnyCube {
    fn from(cube: Cube<ValueDouble>) -> Self {
        Self::Double(cube)
    }
}

impl From<Cube<ValueFloat>> for AnyCube {
    fn from(cube: Cube<ValueFloat>) -> Self {
        Self::Float(cube)
    }
}

impl AnyCube {
    /// Name of the value kind this cube holds.
    #[must_use]
    pub fn value_kind(&self) -> &'static str {
        match self {
            Self::Double(_) => DOUBLE,
            Self::Float(_) => FLOAT,
        }
    }

    /// The cube's schema.
    #[must_use]
    pub fn axis_set(&self) -> &AxisSet {
        match self {
            Self::Double(cube) => cube.axis_set(),
            Self::Float(cube) => cube.axis_set(),
        }
    }

    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Double(cube) => cube.len(),
            Self::Float(cube) => cube.len(),
        }
    }

    /// Whether the cube holds no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn as_double(&self) -> Option<&Cube<ValueDouble>> {
        match self {
            Self::Double(cube) => Some(cube),
            Self::Float(_) => None,
        }
    }

    #[must_use]
    pub fn as_float(&self) -> Option<&Cube<ValueFloat>> {
        match self {
            Self::Float(cube) => Some(cube),
            Self::Double(_) => None,
        }
    }

    /// The value kind shared by every cube, `None` if the list is empty or
    /// mixes kinds.
    #[must_use]
    pub fn common_kind(cubes: &[AnyCube]) -> Option<&'static str> {
        let (first, rest) = cubes.split_first()?;
        let kind = first.value_kind();
        rest.iter().all(|cube| cube.value_kind() == kind).then_some(kind)
    }

    /// Combine a list of cubes if they can be combined.
    ///
    /// Returns `Ok(None)` when the list is empty, mixes value kinds, or has
    /// no common axis. Errors from the combination itself, such as an
    /// `axis_names` entry that is not common, are returned as `Err`.
    pub fn try_combine(
        cubes: &[AnyCube],
        axis_names: Option<&[&str]>,
    ) -> Result<Option<AnyCube>, CubeError> {
        match Self::common_kind(cubes) {
            Some(DOUBLE) => {
                let typed = cubes.iter().filter_map(AnyCube::as_double).collect();
                Ok(combine_typed(typed, axis_names)?.map(AnyCube::Double))
            }
            Some(FLOAT) => {
                let typed = cubes.iter().filter_map(AnyCube::as_float).collect();
                Ok(combine_typed(typed, axis_names)?.map(AnyCube::Float))
            }
            _ => {
                tracing::debug!("Not combining {} cubes without a common value kind", cubes.len());
                Ok(None)
            }
        }
    }
}

fn combine_typed<V: CubeValue>(
    cubes: Vec<&Cube<V>>,
    axis_names: Option<&[&str]>,
) -> Result<Option<Cube<V>>, CubeError> {
    if !can_combine_cubes(cubes.iter().copied()) {
        tracing::debug!("Not combining {} cubes without a common axis", cubes.len());
        return Ok(None);
    }
    combine_cubes(cubes, axis_names).map(Some)
}

// =============================================================================
// TESTS
// =============================================================================

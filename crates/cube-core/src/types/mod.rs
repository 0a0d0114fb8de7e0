//! # Core Type Definitions
//!
//! This module contains the shared vocabulary of the cube engine:
//! - Interned identifiers (`ValueId`)
//! - Axis key typing (`KeyKind`, `DataType`, `AxisValue`)
//! - The mergeable value contract (`CubeValue`)
//! - Error types (`CubeError`)
//!
//! ## Key Equality
//!
//! `AxisValue` is the dynamic, hashable form of every key an axis can hold.
//! Floats compare by bit pattern (with `-0.0` folded onto `0.0` and every NaN
//! folded onto one NaN) so that they can take part in interning.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use thiserror::Error;

use crate::primitives::NULL_ID;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Dense identifier assigned by an `Interner` to a distinct axis value.
///
/// `ValueId(0)` is reserved for `AxisValue::Null`; real values start at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ValueId(pub u32);

impl ValueId {
    /// The reserved identifier for the absent (`Null`) value.
    pub const NULL: Self = Self(NULL_ID);

    /// Get the raw identifier.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Whether this is the reserved null identifier.
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == NULL_ID
    }
}

// =============================================================================
// AXIS TYPING
// =============================================================================

/// The kinds of key an axis can be declared over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyKind {
    Bool,
    Int,
    Float,
    Text,
    Date,
    DateTime,
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Text => "text",
            Self::Date => "date",
            Self::DateTime => "datetime",
        };
        f.write_str(name)
    }
}

/// Declared type of an axis: a key kind plus whether `Null` is admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DataType {
    kind: KeyKind,
    nullable: bool,
}

impl DataType {
    /// A data type that rejects `Null`.
    #[must_use]
    pub const fn of(kind: KeyKind) -> Self {
        Self {
            kind,
            nullable: false,
        }
    }

    /// A data type that admits `Null` in addition to values of `kind`.
    #[must_use]
    pub const fn nullable(kind: KeyKind) -> Self {
        Self {
            kind,
            nullable: true,
        }
    }

    /// The key kind.
    #[must_use]
    pub const fn kind(self) -> KeyKind {
        self.kind
    }

    /// Whether `Null` is a valid key for this type.
    #[must_use]
    pub const fn is_nullable(self) -> bool {
        self.nullable
    }

    /// Check whether a key value is an instance of this type.
    #[must_use]
    pub fn accepts(self, value: &AxisValue) -> bool {
        match value.kind() {
            None => self.nullable,
            Some(kind) => kind == self.kind,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nullable {
            write!(f, "{}?", self.kind)
        } else {
            write!(f, "{}", self.kind)
        }
    }
}

// =============================================================================
// AXIS VALUES
// =============================================================================

/// A single key on one axis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AxisValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
}

impl AxisValue {
    /// The kind of this value, `None` for `Null`.
    #[must_use]
    pub const fn kind(&self) -> Option<KeyKind> {
        match self {
            Self::Null => None,
            Self::Bool(_) => Some(KeyKind::Bool),
            Self::Int(_) => Some(KeyKind::Int),
            Self::Float(_) => Some(KeyKind::Float),
            Self::Text(_) => Some(KeyKind::Text),
            Self::Date(_) => Some(KeyKind::Date),
            Self::DateTime(_) => Some(KeyKind::DateTime),
        }
    }

    /// Whether this is the absent value.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Borrow the text of a `Text` value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Canonical bit pattern used for float equality and hashing.
    fn float_bits(v: f64) -> u64 {
        if v == 0.0 {
            0
        } else if v.is_nan() {
            f64::NAN.to_bits()
        } else {
            v.to_bits()
        }
    }
}

impl PartialEq for AxisValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => Self::float_bits(*a) == Self::float_bits(*b),
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Date(a), Self::Date(b)) => a == b,
            (Self::DateTime(a), Self::DateTime(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for AxisValue {}

impl Hash for AxisValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Null => {}
            Self::Bool(b) => b.hash(state),
            Self::Int(i) => i.hash(state),
            Self::Float(f) => Self::float_bits(*f).hash(state),
            Self::Text(s) => s.hash(state),
            Self::Date(d) => d.hash(state),
            Self::DateTime(dt) => dt.hash(state),
        }
    }
}

impl fmt::Display for AxisValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
            Self::Date(d) => write!(f, "{d}"),
            Self::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
        }
    }
}

impl From<bool> for AxisValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for AxisValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for AxisValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for AxisValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for AxisValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for AxisValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<NaiveDate> for AxisValue {
    fn from(v: NaiveDate) -> Self {
        Self::Date(v)
    }
}

impl From<DateTime<Utc>> for AxisValue {
    fn from(v: DateTime<Utc>) -> Self {
        Self::DateTime(v)
    }
}

impl<T: Into<AxisValue>> From<Option<T>> for AxisValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

// =============================================================================
// MERGEABLE VALUE CONTRACT
// =============================================================================

/// A value that can be stored at a cube point.
///
/// Two values landing on the same full key are merged with `try_add` rather
/// than one replacing the other. `Clone` is the copy taken when a key is seen
/// for the first time, so the stored value never aliases the caller's.
pub trait CubeValue: Clone {
    /// Name of the concrete kind of this value. A cube only ever holds values
    /// of a single kind.
    fn kind(&self) -> &'static str;

    /// Add `other` into `self`.
    ///
    /// Returns `CubeError::TypeMismatch` if `other` is of a different kind;
    /// `self` is left untouched in that case.
    fn try_add(&mut self, other: &Self) -> Result<(), CubeError>;
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the cube engine.
///
/// - No silent failures
/// - Use `Result<T, CubeError>` for fallible operations
/// - Writes validate before they mutate, so an `Err` leaves the cube unchanged
#[derive(Debug, Error)]
pub enum CubeError {
    /// An axis definition or axis list is invalid (duplicate, empty, missing).
    #[error("Schema error: {0}")]
    Schema(String),

    /// A positional key tuple has the wrong arity.
    #[error("Expected {expected} keys, got {actual}")]
    KeyCount { expected: usize, actual: usize },

    /// A named key map omits a mandatory axis.
    #[error("No key specified for mandatory axis '{axis}' (#{index})")]
    MissingKey { axis: String, index: usize },

    /// A key does not match its axis type, or two values differ in kind.
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    /// An operation referenced an axis name that is not in the schema.
    #[error("Unknown axis: {0}")]
    UnknownAxis(String),

    /// An index or identifier was outside the issued range.
    #[error("{what} {index} out of range (limit {limit})")]
    OutOfRange {
        what: &'static str,
        index: u64,
        limit: u64,
    },

    /// Cubes to be combined share no axis.
    #[error("Incompatible schemas: {0}")]
    IncompatibleSchema(String),

    /// An internal tree invariant was violated.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A schema document could not be parsed or rendered.
    #[error("Configuration error: {0}")]
    Config(String),
}

// =============================================================================
// TESTS
// =============================================================================

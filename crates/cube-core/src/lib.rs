//! # cube-core
//!
//! An in-memory, sparse, multidimensional aggregation store.
//!
//! Data points are addressed by a tuple of named, typed axis keys and carry a
//! mergeable value. Adding a second value at an existing key merges it with
//! the value's addition operator instead of replacing it. Alongside the
//! points, a parallel structure records error messages against *partial*
//! keys, so one message can cover every value on an axis.
//!
//! ## Layout
//!
//! - `axis`: the ordered, name-unique schema (`Axis`, `AxisSet`)
//! - `interner`: axis values ⇄ dense `ValueId`s
//! - `store`: the id-keyed tries for points and errors, and their cursors
//! - `cube`: the façade tying one of each together
//! - `combine`: joining several cubes over their common axes
//! - `values`: reference value kinds
//!
//! ## Architectural Constraints
//!
//! - Is in-memory only: no persistence, no wire format
//! - Is single-writer: every mutation takes `&mut self`, there is no internal
//!   locking
//! - Is deterministic: enumeration order depends on insertion order only
//! - Has NO async, NO network dependencies (pure Rust)

// =============================================================================
// MODULES
// =============================================================================

pub mod axis;
pub mod combine;
pub mod cube;
pub mod interner;
pub mod primitives;
pub mod store;
pub mod types;
pub mod values;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{AxisValue, CubeError, CubeValue, DataType, KeyKind, ValueId};

// =============================================================================
// RE-EXPORTS: Cube Engine
// =============================================================================

pub use axis::{Axis, AxisSet};
pub use combine::{can_combine_cubes, combine_cubes, common_axes};
pub use cube::{Cube, CubePoint, ErrorEntry, ErrorSet, NamedKeys};
pub use interner::Interner;
pub use store::{AxisFilter, ErrorEntries, ErrorStore, PointStore, Points};

// =============================================================================
// RE-EXPORTS: Value Kinds
// =============================================================================

pub use values::{AnyCube, AnyValue, ValueDouble, ValueFloat};

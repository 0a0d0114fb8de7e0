//! # Sparse Stores
//!
//! The two interned-id tries behind a cube:
//! - `points`: full keys to mergeable values
//! - `errors`: partial keys (with wildcard branches) to message lists

mod errors;
mod points;

pub use errors::{AxisFilter, ErrorEntries, ErrorStore};
pub use points::{PointStore, Points};

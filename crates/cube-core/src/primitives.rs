//! # Engine Constants
//!
//! Fixed values shared by the interner, the stores and the cube façade.

/// Identifier reserved for the absent value.
///
/// `Null` keys intern to this id without touching the interner's maps, so a
/// nullable axis never grows the value table.
pub const NULL_ID: u32 = 0;

/// First identifier handed out to a real value.
pub const FIRST_VALUE_ID: u32 = 1;

/// Largest identifier an interner can issue.
pub const MAX_VALUE_ID: u32 = u32::MAX;

/// Initial capacity of an interner's reverse table.
///
/// Growth beyond this is amortized by `Vec` doubling.
pub const INITIAL_INTERNER_CAPACITY: usize = 1024;

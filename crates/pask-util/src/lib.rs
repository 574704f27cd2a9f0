//! pask-util - Foundation types shared by every interpreter phase.
//!
//! The util crate holds the pieces that more than one phase needs:
//! source spans, the error-code catalogue, and the hash-map flavour used
//! for ordered name tables.

pub mod error;
pub mod span;

pub use error::ErrorCode;
pub use span::Span;

use std::hash::BuildHasherDefault;

use indexmap::IndexMap;
use rustc_hash::FxHasher;

/// An insertion-ordered map keyed with the fast FxHasher.
///
/// Scope entries and frame members must iterate in declaration order (the
/// order is observable in trace dumps), so a plain `HashMap` is not enough.
pub type FxIndexMap<K, V> = IndexMap<K, V, BuildHasherDefault<FxHasher>>;

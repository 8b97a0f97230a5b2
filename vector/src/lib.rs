//! This crate provides a persistent vector (also known as a "bitmapped vector
//! trie"): an immutable sequence where appending, replacing an element,
//! removing the last element and concatenating all return a new vector in
//! `O(log n)`, sharing most of their tree with the original.
//!
//! [`Vector`] stores its elements in leaves of `N` values, below interior
//! nodes of `N` children, with all leaves at the same depth. Only the nodes
//! along the rightmost path may be partially filled, which is what lets an
//! index be split into per-level child indices with plain bit arithmetic (see
//! [`geometry`]).
//!
//! Nodes are never written to once a vector can see them. Updates copy the
//! path from the root to the affected leaf and share everything else, and
//! nodes are reference counted with [`Arc`](std::sync::Arc), so any number of
//! threads can read a vector (or derive new vectors from it) without locking.
//!
//! Misuse (indexing out of bounds, popping from an empty vector) panics; the
//! non-panicking accessors return `Option`.

pub mod geometry;
mod inspect;
pub mod iter;
mod node;
pub mod vector;

/// [`Vector`] takes a "branching factor" parameter, which must be a
/// reasonably-sized power of two. We use this trait to enforce that.
pub trait ValidBranchingConstant {}
pub struct Const<const N: usize> {}

impl ValidBranchingConstant for Const<2> {}
impl ValidBranchingConstant for Const<4> {}
impl ValidBranchingConstant for Const<8> {}
impl ValidBranchingConstant for Const<16> {}
impl ValidBranchingConstant for Const<32> {}
impl ValidBranchingConstant for Const<64> {}
impl ValidBranchingConstant for Const<128> {}

pub use inspect::TreeStats;
pub use iter::{IntoIter, Iter, Leaves};
pub use vector::Vector;

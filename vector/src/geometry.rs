//! Index arithmetic for a tree with branching factor `N`.
//!
//! A vector of length `len` is stored in a tree whose leaves all sit at the
//! same depth. The root of a non-empty tree is at "shift" `s`: at a node with
//! shift `s`, the global index `idx` belongs to child `(idx >> s) & (N - 1)`.
//! Leaves have shift zero, and each level up adds `log2(N)` to the shift.
//!
//! These functions assume that `N` is a power of two; [`Vector`](crate::Vector)
//! enforces that through [`ValidBranchingConstant`](crate::ValidBranchingConstant).

/// The number of index bits consumed by one level of the tree.
pub const fn bits<const N: usize>() -> u32 {
    N.trailing_zeros()
}

/// The number of levels (leaves included) of the tree holding `len` elements.
///
/// An empty tree has depth zero, a single leaf has depth one, and so on.
pub fn depth<const N: usize>(len: usize) -> u32 {
    debug_assert!(N.is_power_of_two() && N > 1);
    match len {
        0 => 0,
        len if len <= N => 1,
        // `len - 1` is the largest index we need to address; every `bits` bits
        // of it above the leaf level need another level of interior nodes.
        len => (len - 1).ilog2() / bits::<N>() + 1,
    }
}

/// The shift of the root of the tree holding `len` elements, or `None` for
/// the empty tree (which has no root).
pub fn shift<const N: usize>(len: usize) -> Option<u32> {
    depth::<N>(len).checked_sub(1).map(|d| d * bits::<N>())
}

/// The number of elements that fit under a node with the given shift.
///
/// Saturates at `usize::MAX` for trees that couldn't fill up anyway.
pub fn max_capacity<const N: usize>(shift: u32) -> usize {
    1usize
        .checked_shl(shift)
        .and_then(|per_child| per_child.checked_mul(N))
        .unwrap_or(usize::MAX)
}

/// `idx` is the global index into the root node, and we are some
/// possibly-intermediate node at `shift`. Which of our children does the
/// global index belong to?
#[inline]
pub fn child_index<const N: usize>(idx: usize, shift: u32) -> usize {
    (idx >> shift) & (N - 1)
}

/// The position of `idx` inside its leaf.
#[inline]
pub fn leaf_offset<const N: usize>(idx: usize) -> usize {
    idx & (N - 1)
}

/// The number of leaves in a tree holding `len` elements.
pub fn leaf_count<const N: usize>(len: usize) -> usize {
    len.div_ceil(N)
}

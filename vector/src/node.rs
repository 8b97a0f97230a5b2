use std::sync::Arc;

use imbl_sized_chunks::Chunk;

use crate::geometry;

// In principle we could decouple the size of the interior nodes from the size of the leaves.
// This might make sense when `T` is large, because the interior nodes are always pointer-sized.
pub(crate) type Interior<T, const N: usize> = Chunk<Arc<Node<T, N>>, N>;

/// A node of the tree.
///
/// Nodes are never modified once they are reachable from a [`Vector`](crate::Vector):
/// every update builds new nodes along the path to the updated leaf and shares
/// everything else. A chunk only stores its occupied prefix, so unused trailing
/// slots (null children, unwritten values) simply don't exist.
///
/// All children of an interior node have the same kind, because all leaves sit
/// at the same depth.
#[derive(Debug, Clone)]
pub(crate) enum Node<T, const N: usize> {
    Leaf { data: Chunk<T, N> },
    Interior { children: Interior<T, N> },
}

impl<T, const N: usize> Node<T, N> {
    pub(crate) fn leaf(data: Chunk<T, N>) -> Arc<Self> {
        debug_assert!(!data.is_empty(), "empty leaf");
        Arc::new(Node::Leaf { data })
    }

    pub(crate) fn interior(children: Interior<T, N>) -> Arc<Self> {
        debug_assert!(!children.is_empty(), "empty interior node");
        Arc::new(Node::Interior { children })
    }

    /// Builds a spine of single-child interior nodes on top of `leaf`, so that
    /// the top of the spine sits at `shift`.
    ///
    /// This is how a leaf gets attached below previously unused capacity: none
    /// of the nodes on the way down exist yet.
    pub(crate) fn new_path(shift: u32, leaf: Arc<Self>) -> Arc<Self> {
        debug_assert!(matches!(*leaf, Node::Leaf { .. }));
        let mut node = leaf;
        for _ in 0..shift / geometry::bits::<N>() {
            node = Node::interior(Chunk::unit(node));
        }
        node
    }

    /// An inefficient but correct (and simple) method for computing the length
    /// of this subtree. We cache the length in the top-level vector, so this is
    /// only used for sanity-checks.
    pub(crate) fn len(&self) -> usize {
        match self {
            Node::Leaf { data } => data.len(),
            Node::Interior { children } => children.iter().map(|c| c.len()).sum(),
        }
    }

    /// If this node is at `shift`, find the leaf that holds the given index.
    pub(crate) fn find_leaf(&self, mut shift: u32, idx: usize) -> Option<&Chunk<T, N>> {
        let mut node = self;
        loop {
            match node {
                Node::Leaf { data } => {
                    debug_assert_eq!(shift, 0);
                    return Some(data);
                }
                Node::Interior { children } => {
                    node = children
                        .get(geometry::child_index::<N>(idx, shift))?
                        .as_ref();
                    shift -= geometry::bits::<N>();
                }
            }
        }
    }

    /// If this node is at `shift`, try to get the element at the given index.
    pub(crate) fn get(&self, shift: u32, idx: usize) -> Option<&T> {
        self.find_leaf(shift, idx)
            .and_then(|data| data.get(geometry::leaf_offset::<N>(idx)))
    }

    /// Grafts `leaf` onto this subtree, so that its first element ends up at the
    /// global index `idx`.
    ///
    /// `idx` must be the current length of the tree, a multiple of `N`, and
    /// this node (which sits at `shift > 0`) must have room for another leaf
    /// below it. The nodes along the rightmost path are copied; every other
    /// child is shared.
    pub(crate) fn append_leaf(&self, shift: u32, idx: usize, leaf: Arc<Self>) -> Arc<Self> {
        let Node::Interior { children } = self else {
            unreachable!("grafting a leaf below a leaf");
        };
        let bits = geometry::bits::<N>();
        let slot = geometry::child_index::<N>(idx, shift);
        debug_assert!(slot + 1 >= children.len());

        let mut children = children.clone();
        if shift == bits {
            debug_assert_eq!(slot, children.len());
            children.push_back(leaf);
        } else if slot < children.len() {
            children[slot] = children[slot].append_leaf(shift - bits, idx, leaf);
        } else {
            children.push_back(Node::new_path(shift - bits, leaf));
        }
        Node::interior(children)
    }
}

impl<T: Clone, const N: usize> Node<T, N> {
    /// Copies the path from this node (at `shift`) down to the leaf holding
    /// `idx`, and replaces that leaf by `f(leaf)`. Siblings along the way are
    /// shared, not copied.
    ///
    /// The index is allowed to point to the unoccupied slot just past the end
    /// of the last leaf (so that `f` can append to it), but it must point into
    /// an existing leaf.
    pub(crate) fn update_leaf(
        &self,
        shift: u32,
        idx: usize,
        f: impl FnOnce(&Chunk<T, N>) -> Chunk<T, N>,
    ) -> Arc<Self> {
        match self {
            Node::Leaf { data } => {
                debug_assert_eq!(shift, 0);
                Node::leaf(f(data))
            }
            Node::Interior { children } => {
                let slot = geometry::child_index::<N>(idx, shift);
                let mut children = children.clone();
                children[slot] = children[slot].update_leaf(shift - geometry::bits::<N>(), idx, f);
                Node::interior(children)
            }
        }
    }

    /// Returns a copy of this subtree (at `shift`) with the element at `idx`
    /// replaced, or appended if `idx` is just past the end of the last leaf.
    pub(crate) fn assoc(&self, shift: u32, idx: usize, elt: T) -> Arc<Self> {
        self.update_leaf(shift, idx, |data| {
            let mut data = data.clone();
            let offset = geometry::leaf_offset::<N>(idx);
            debug_assert!(offset <= data.len());
            if offset < data.len() {
                data[offset] = elt;
            } else {
                data.push_back(elt);
            }
            data
        })
    }

    /// Returns a subtree at the same `shift` holding the first `len` elements
    /// of this one.
    ///
    /// `len` must be non-zero and no bigger than the length of this subtree.
    /// Children that are entirely kept are shared.
    pub(crate) fn truncated(&self, shift: u32, len: usize) -> Arc<Self> {
        debug_assert!(len > 0);
        match self {
            Node::Leaf { data } => {
                debug_assert_eq!(shift, 0);
                Node::leaf(data.iter().take(len).cloned().collect())
            }
            Node::Interior { children } => {
                // If `len` is small enough, we may just want to drop some children
                // and their entire subtrees.
                let num_full_children = len >> shift;
                let extra = len & ((1 << shift) - 1);
                let mut kept: Interior<T, N> =
                    children.iter().take(num_full_children).cloned().collect();
                if extra > 0 {
                    kept.push_back(
                        children[num_full_children].truncated(shift - geometry::bits::<N>(), extra),
                    );
                }
                Node::interior(kept)
            }
        }
    }
}

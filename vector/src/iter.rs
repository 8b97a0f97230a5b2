use std::{iter::FusedIterator, sync::Arc};

use imbl_sized_chunks::Chunk;

use crate::{geometry, node::Node};

type ChunkIter<T, const N: usize> = imbl_sized_chunks::sized_chunk::Iter<T, N>;
type InteriorChunkIter<T, const N: usize> = ChunkIter<Arc<Node<T, N>>, N>;

/// An iterator over the leaves of a [`Vector`](crate::Vector), from left to
/// right, yielding the occupied part of each leaf as a slice.
///
/// Every leaf but the last holds exactly `N` elements.
#[derive(Debug)]
pub struct Leaves<'a, T, const N: usize> {
    // One iterator per level, over the siblings we haven't visited yet. The
    // root level is a one-element slice.
    stack: Vec<std::slice::Iter<'a, Arc<Node<T, N>>>>,
}

impl<T, const N: usize> Clone for Leaves<'_, T, N> {
    fn clone(&self) -> Self {
        Leaves {
            stack: self.stack.clone(),
        }
    }
}

impl<'a, T, const N: usize> Leaves<'a, T, N> {
    pub(crate) fn new(root: Option<&'a Arc<Node<T, N>>>, depth: u32) -> Self {
        let mut stack = Vec::with_capacity(depth as usize);
        if let Some(root) = root {
            stack.push(std::slice::from_ref(root).iter());
        }
        Leaves { stack }
    }

    /// Positions the iterator just after the leaf holding `idx`, and returns
    /// that leaf starting at `idx`.
    pub(crate) fn starting_at(
        root: &'a Arc<Node<T, N>>,
        mut shift: u32,
        idx: usize,
    ) -> (Self, &'a [T]) {
        let mut stack = Vec::with_capacity((shift / geometry::bits::<N>()) as usize);
        let mut node: &'a Node<T, N> = root;

        while let Node::Interior { children } = node {
            let bucket_idx = geometry::child_index::<N>(idx, shift);
            let mut node_iter = children[bucket_idx..].iter();

            // expect: callers check that `idx` is strictly less than the length,
            // so this interior iterator should be non-empty also.
            node = node_iter.next().expect("empty interior node").as_ref();
            stack.push(node_iter);

            shift = shift.checked_sub(geometry::bits::<N>()).expect("invalid shift");
        }

        let Node::Leaf { data } = node else {
            unreachable!();
        };
        let data: &'a [T] = data;
        (Leaves { stack }, &data[geometry::leaf_offset::<N>(idx)..])
    }

    /// The next leaf node, as a shareable handle.
    pub(crate) fn next_node(&mut self) -> Option<&'a Arc<Node<T, N>>> {
        loop {
            let next = match self.stack.last_mut()?.next() {
                Some(next) => next,
                None => {
                    self.stack.pop();
                    continue;
                }
            };
            match next.as_ref() {
                Node::Leaf { .. } => return Some(next),
                Node::Interior { children } => self.stack.push(children.iter()),
            }
        }
    }
}

impl<'a, T, const N: usize> Iterator for Leaves<'a, T, N> {
    type Item = &'a [T];

    fn next(&mut self) -> Option<Self::Item> {
        let Node::Leaf { data } = self.next_node()?.as_ref() else {
            unreachable!();
        };
        Some(&data[..])
    }
}

impl<T, const N: usize> FusedIterator for Leaves<'_, T, N> {}

/// An iterator over references to the elements of a [`Vector`](crate::Vector).
///
/// Walks the tree a leaf at a time, so a full traversal is `O(n)` rather than
/// `O(n log n)`.
#[derive(Debug)]
pub struct Iter<'a, T, const N: usize> {
    leaves: Leaves<'a, T, N>,
    leaf: std::slice::Iter<'a, T>,
    remaining: usize,
}

impl<T, const N: usize> Clone for Iter<'_, T, N> {
    fn clone(&self) -> Self {
        Iter {
            leaves: self.leaves.clone(),
            leaf: self.leaf.clone(),
            remaining: self.remaining,
        }
    }
}

impl<'a, T, const N: usize> Iter<'a, T, N> {
    pub(crate) fn new(leaves: Leaves<'a, T, N>, leaf: &'a [T], remaining: usize) -> Self {
        Iter {
            leaves,
            leaf: leaf.iter(),
            remaining,
        }
    }
}

impl<'a, T, const N: usize> Iterator for Iter<'a, T, N> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(ret) = self.leaf.next() {
                self.remaining -= 1;
                return Some(ret);
            }
            self.leaf = self.leaves.next()?.iter();
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T, const N: usize> ExactSizeIterator for Iter<'_, T, N> {}

impl<T, const N: usize> FusedIterator for Iter<'_, T, N> {}

/// An owning iterator over the elements of a [`Vector`](crate::Vector).
///
/// Nodes that nobody else holds are taken apart and their elements moved out;
/// nodes shared with other vectors are cloned on the way down.
pub struct IntoIter<T, const N: usize> {
    stack: Vec<InteriorChunkIter<T, N>>,
    leaf: ChunkIter<T, N>,
    remaining: usize,
}

impl<T, const N: usize> IntoIter<T, N> {
    pub(crate) fn new(root: Option<Arc<Node<T, N>>>, len: usize) -> Self {
        let mut stack = Vec::new();
        if let Some(root) = root {
            stack.push(Chunk::unit(root).into_iter());
        }
        IntoIter {
            stack,
            leaf: Chunk::new().into_iter(),
            remaining: len,
        }
    }
}

impl<T: Clone, const N: usize> Iterator for IntoIter<T, N> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(ret) = self.leaf.next() {
                self.remaining -= 1;
                return Some(ret);
            }

            let next = match self.stack.last_mut()?.next() {
                Some(next) => next,
                None => {
                    self.stack.pop();
                    continue;
                }
            };
            match Arc::unwrap_or_clone(next) {
                Node::Leaf { data } => {
                    debug_assert!(!data.is_empty());
                    self.leaf = data.into_iter();
                }
                Node::Interior { children } => self.stack.push(children.into_iter()),
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T: Clone, const N: usize> ExactSizeIterator for IntoIter<T, N> {}

impl<T: Clone, const N: usize> FusedIterator for IntoIter<T, N> {}

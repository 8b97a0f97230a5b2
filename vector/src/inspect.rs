//! Sanity checks and introspection for the tree behind a [`Vector`].
//!
//! None of this is needed to use a vector. It exists so that tests (and
//! curious humans) can look at how much structure is shared between vectors.

use std::{collections::HashSet, fmt, sync::Arc};

use crate::{geometry, node::Node, Const, ValidBranchingConstant, Vector};

/// Node counts for the tree behind one vector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TreeStats {
    pub leaves: usize,
    pub interiors: usize,
    pub depth: u32,
}

fn count_nodes<T, const N: usize>(node: &Node<T, N>, stats: &mut TreeStats) {
    match node {
        Node::Leaf { .. } => stats.leaves += 1,
        Node::Interior { children } => {
            stats.interiors += 1;
            for child in children.iter() {
                count_nodes(child, stats);
            }
        }
    }
}

/// Checks the shape of the subtree at `shift`. Only nodes on the rightmost
/// path of the whole tree may be partially filled.
fn check_node<T, const N: usize>(node: &Node<T, N>, shift: u32, right_most: bool) {
    match node {
        Node::Leaf { data } => {
            assert_eq!(shift, 0, "leaf above the bottom level");
            assert!(!data.is_empty(), "empty leaf");
            assert!(right_most || data.is_full(), "partial leaf before the end");
        }
        Node::Interior { children } => {
            assert!(shift > 0, "interior node at the leaf level");
            assert!(right_most || children.is_full(), "partial interior node before the end");
            let Some((tail, others)) = children.split_last() else {
                panic!("empty interior node");
            };
            let child_shift = shift - geometry::bits::<N>();
            for child in others {
                check_node(child, child_shift, false);
            }
            check_node(tail, child_shift, right_most);
        }
    }
}

fn log_node<T: fmt::Debug, const N: usize>(
    node: &Arc<Node<T, N>>,
    slot: usize,
    indent: usize,
) {
    let rc = Arc::strong_count(node);
    match node.as_ref() {
        Node::Leaf { data } => {
            log::trace!("{:indent$}#{slot} <leaf> rc: {rc} {:?}", "", &data[..]);
        }
        Node::Interior { children } => {
            log::trace!("{:indent$}#{slot} <interior> rc: {rc}", "");
            for (i, child) in children.iter().enumerate() {
                log_node(child, i, indent + 2);
            }
        }
    }
}

impl<T, const N: usize> Vector<T, N>
where
    Const<N>: ValidBranchingConstant,
{
    /// Panics unless the tree has the shape that our length calls for: all
    /// leaves at the same depth, every node full except along the rightmost
    /// path, and an interior root with at least two children.
    pub fn check_invariants(&self) {
        assert_eq!(
            self.shift(),
            geometry::shift::<N>(self.length),
            "cached shift doesn't match the length"
        );
        let Some(root) = &self.root else {
            return;
        };
        assert_eq!(root.len(), self.length);
        if let Node::Interior { children } = root.as_ref() {
            assert!(children.len() > 1, "interior root with a single child");
        }
        check_node(root, self.shift, true);
    }

    /// Counts the nodes reachable from this vector.
    pub fn stats(&self) -> TreeStats {
        let mut stats = TreeStats {
            depth: self.depth(),
            ..TreeStats::default()
        };
        if let Some(root) = &self.root {
            count_nodes(root, &mut stats);
        }
        stats
    }

    /// Counts the distinct nodes of this vector that aren't reachable from
    /// `ancestor`, i.e. the nodes that were allocated to derive `self` from it.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use steady_vector::Vector;
    /// let a = Vector::<_, 32>::from_iter(0..2000);
    /// // Replacing an element copies one node per level.
    /// assert_eq!(a.assoc(1234, 0).fresh_nodes(&a), a.depth() as usize);
    /// assert_eq!(a.clone().fresh_nodes(&a), 0);
    /// ```
    pub fn fresh_nodes(&self, ancestor: &Self) -> usize {
        let mut known = HashSet::new();
        let mut stack: Vec<&Arc<Node<T, N>>> = ancestor.root.iter().collect();
        while let Some(node) = stack.pop() {
            if known.insert(Arc::as_ptr(node)) {
                if let Node::Interior { children } = node.as_ref() {
                    stack.extend(children.iter());
                }
            }
        }

        let mut fresh = 0;
        let mut stack: Vec<&Arc<Node<T, N>>> = self.root.iter().collect();
        while let Some(node) = stack.pop() {
            // Everything below a known node is known too.
            if !known.insert(Arc::as_ptr(node)) {
                continue;
            }
            fresh += 1;
            if let Node::Interior { children } = node.as_ref() {
                stack.extend(children.iter());
            }
        }
        fresh
    }
}

impl<T: fmt::Debug, const N: usize> Vector<T, N>
where
    Const<N>: ValidBranchingConstant,
{
    /// Dumps the tree at `trace` level: one line per node, with its slot in
    /// its parent and its reference count.
    pub fn log_tree(&self) {
        if !log::log_enabled!(log::Level::Trace) {
            return;
        }

        let stats = self.stats();
        log::trace!(
            "vector (length: {}, depth: {}) leaves: {}, interiors: {}",
            self.length,
            stats.depth,
            stats.leaves,
            stats.interiors
        );
        if let Some(root) = &self.root {
            log_node(root, 0, 0);
        }
    }
}

use std::{
    fmt,
    hash::{Hash, Hasher},
    iter::Peekable,
    ops::{Add, Index},
    sync::Arc,
};

use imbl_sized_chunks::Chunk;

use crate::{
    geometry,
    iter::{IntoIter, Iter, Leaves},
    node::Node,
    Const, ValidBranchingConstant,
};

/// A persistent vector.
///
/// Every "modifying" operation ([`push_back`](Self::push_back),
/// [`assoc`](Self::assoc), [`pop_back`](Self::pop_back), [`concat`](Self::concat),
/// ...) leaves `self` alone and returns a new vector that shares most of its
/// tree with the original. Cloning is `O(1)`.
///
/// This is implemented internally as a tree, and the parameter `N` controls its
/// branching factor. It must be a power of 2 between `2` and `128`; values
/// between `8` and `64` are pretty reasonable.
///
/// Nodes are reference counted with [`Arc`], so vectors (and vectors derived
/// from a common ancestor) can be read and updated from several threads at
/// once.
pub struct Vector<T, const N: usize = 32>
where
    Const<N>: ValidBranchingConstant,
{
    pub(crate) root: Option<Arc<Node<T, N>>>,
    pub(crate) length: usize,
    // Cached `geometry::shift(length)`. Meaningless when `root` is `None`.
    pub(crate) shift: u32,
}

#[cold]
#[inline(never)]
#[track_caller]
fn out_of_bounds(idx: usize, len: usize) -> ! {
    panic!("index {idx} out of bounds for a vector of length {len}")
}

impl<T, const N: usize> Vector<T, N>
where
    Const<N>: ValidBranchingConstant,
{
    /// Creates an empty vector. This doesn't allocate.
    pub fn new() -> Self {
        Self {
            root: None,
            length: 0,
            shift: 0,
        }
    }

    fn from_parts(root: Arc<Node<T, N>>, length: usize, shift: u32) -> Self {
        debug_assert_eq!(geometry::shift::<N>(length), Some(shift));
        Self {
            root: Some(root),
            length,
            shift,
        }
    }

    /// The number of elements in this vector.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use steady_vector::Vector;
    /// let vec = Vector::<_, 32>::from_iter([0, 1, 2, 3, 4, 5]);
    /// assert_eq!(vec.len(), 6);
    /// ```
    pub fn len(&self) -> usize {
        self.length
    }

    /// Returns `true` if the length is zero.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// The number of levels in the tree, counting the leaves. Zero for an empty vector.
    pub fn depth(&self) -> u32 {
        geometry::depth::<N>(self.length)
    }

    /// The shift of the root node, or `None` if we're empty.
    ///
    /// This is the number of bits that an index is shifted right by to find
    /// the root's child that holds it.
    pub fn shift(&self) -> Option<u32> {
        self.root.as_ref().map(|_| self.shift)
    }

    /// Returns `true` if both vectors have the very same root node, meaning
    /// that one is an unmodified clone of the other.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use steady_vector::Vector;
    /// let a = Vector::<_, 32>::from_iter([1, 2, 3]);
    /// let b = a.clone();
    /// assert!(a.ptr_eq(&b));
    /// assert!(!a.ptr_eq(&b.push_back(4)));
    /// ```
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.root, &other.root) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Gets an element at a given index, or `None` if `idx` is out-of-bounds.
    ///
    /// Runs in time complexity `O(log n)`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use steady_vector::Vector;
    /// let vec = Vector::<_, 32>::from_iter([0, 1, 2, 3, 4, 5]);
    /// assert_eq!(vec.get(2), Some(&2));
    /// assert_eq!(vec.get(6), None);
    /// ```
    pub fn get(&self, idx: usize) -> Option<&T> {
        if idx >= self.length {
            return None;
        }
        self.root.as_ref().and_then(|r| r.get(self.shift, idx))
    }

    pub fn first(&self) -> Option<&T> {
        self.get(0)
    }

    pub fn last(&self) -> Option<&T> {
        self.length.checked_sub(1).and_then(|idx| self.get(idx))
    }

    /// The number of leaves in the tree.
    pub fn leaf_count(&self) -> usize {
        geometry::leaf_count::<N>(self.length)
    }

    /// The occupied part of the `block`th leaf: elements
    /// `block * N .. min((block + 1) * N, len)`.
    ///
    /// Panics if `block >= self.leaf_count()`.
    #[track_caller]
    pub fn leaf(&self, block: usize) -> &[T] {
        let leaf = self
            .root
            .as_ref()
            .filter(|_| block < self.leaf_count())
            .and_then(|root| root.find_leaf(self.shift, block * N));
        match leaf {
            Some(data) => &data[..],
            None => panic!(
                "leaf {block} out of bounds for a vector with {} leaves",
                self.leaf_count()
            ),
        }
    }

    /// Returns an iterator over the leaves of the tree, as slices.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use steady_vector::Vector;
    /// let vec = Vector::<_, 4>::from_iter(0..10);
    /// let leaves: Vec<&[i32]> = vec.leaves().collect();
    /// assert_eq!(leaves, [&[0, 1, 2, 3][..], &[4, 5, 6, 7], &[8, 9]]);
    /// ```
    pub fn leaves(&self) -> Leaves<'_, T, N> {
        Leaves::new(self.root.as_ref(), self.depth())
    }

    /// Returns an iterator over references to the elements.
    pub fn iter(&self) -> Iter<'_, T, N> {
        self.into_iter()
    }

    /// Returns an iterator over the elements from index `idx` onwards.
    ///
    /// Finding the starting point takes `O(log n)`.
    ///
    /// Panics if `idx > self.len()`.
    #[track_caller]
    pub fn iter_starting_at(&self, idx: usize) -> Iter<'_, T, N> {
        if idx == self.length {
            return Iter::new(Leaves::new(None, 0), &[], 0);
        }
        let root = match &self.root {
            Some(root) if idx < self.length => root,
            _ => out_of_bounds(idx, self.length),
        };

        let (leaves, leaf) = Leaves::starting_at(root, self.shift, idx);
        Iter::new(leaves, leaf, self.length - idx)
    }

    /// Attaches a leaf holding `leaf_len` elements after the end of this
    /// vector, whose length must be a multiple of `N`.
    ///
    /// The leaf itself isn't copied, so this also works for leaves taken from
    /// another vector.
    fn push_leaf(&self, leaf: Arc<Node<T, N>>, leaf_len: usize) -> Self {
        debug_assert_eq!(geometry::leaf_offset::<N>(self.length), 0);
        let length = self.length + leaf_len;

        let Some(root) = &self.root else {
            return Self::from_parts(leaf, length, 0);
        };

        if length <= geometry::max_capacity::<N>(self.shift) {
            // There's still room below the current root.
            let root = root.append_leaf(self.shift, self.length, leaf);
            Self::from_parts(root, length, self.shift)
        } else {
            // The root is full, so we need a new root with the old root as its
            // first child, and a fresh path down to the new leaf as its second.
            let mut children = Chunk::new();
            children.push_back(Arc::clone(root));
            children.push_back(Node::new_path(self.shift, leaf));
            Self::from_parts(
                Node::interior(children),
                length,
                self.shift + geometry::bits::<N>(),
            )
        }
    }
}

impl<T: Clone, const N: usize> Vector<T, N>
where
    Const<N>: ValidBranchingConstant,
{
    /// Returns a copy of this vector with the element at `idx` replaced by `elt`.
    ///
    /// Only the nodes on the path to `idx` are copied, so this runs in time
    /// complexity `O(log n)`.
    ///
    /// Panics if `idx` is out of bounds.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use steady_vector::Vector;
    /// let a = Vector::<_, 32>::from_iter([10, 20, 30]);
    /// let b = a.assoc(0, 999);
    /// assert_eq!(a.to_vec(), vec![10, 20, 30]);
    /// assert_eq!(b.to_vec(), vec![999, 20, 30]);
    /// ```
    #[track_caller]
    pub fn assoc(&self, idx: usize, elt: T) -> Self {
        let root = match &self.root {
            Some(root) if idx < self.length => root,
            _ => out_of_bounds(idx, self.length),
        };
        Self::from_parts(root.assoc(self.shift, idx, elt), self.length, self.shift)
    }

    /// Returns a copy of this vector with `elt` added to the end.
    ///
    /// Runs in time complexity `O(log n)`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use steady_vector::Vector;
    /// let a = Vector::<_, 32>::from_iter([0, 1, 2]);
    /// let b = a.push_back(3);
    /// assert_eq!(a.len(), 3);
    /// assert_eq!(b.to_vec(), vec![0, 1, 2, 3]);
    /// ```
    pub fn push_back(&self, elt: T) -> Self {
        match &self.root {
            // There's room in the last leaf.
            Some(root) if geometry::leaf_offset::<N>(self.length) != 0 => {
                let root = root.assoc(self.shift, self.length, elt);
                Self::from_parts(root, self.length + 1, self.shift)
            }
            _ => self.push_leaf(Node::leaf(Chunk::unit(elt)), 1),
        }
    }

    /// Returns a copy of this vector without its last element.
    ///
    /// Runs in time complexity `O(log n)`.
    ///
    /// Panics if the vector is empty.
    #[track_caller]
    pub fn pop_back(&self) -> Self {
        assert!(!self.is_empty(), "pop_back on an empty vector");
        self.truncated(self.length - 1)
    }

    /// Returns a vector holding the first `len` elements of this one, or a
    /// clone of this one if it's no longer than `len`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use steady_vector::Vector;
    /// let vec = Vector::<_, 4>::from_iter(0..10);
    /// assert_eq!(vec.truncated(5).to_vec(), vec![0, 1, 2, 3, 4]);
    /// assert_eq!(vec.truncated(20).len(), 10);
    /// ```
    pub fn truncated(&self, len: usize) -> Self {
        if len >= self.length {
            return self.clone();
        }
        let Some(shift) = geometry::shift::<N>(len) else {
            return Self::new();
        };

        // If the result needs a shorter tree, its root is the leftmost node at
        // the right height.
        // unwrap: if we were empty, we would have returned at the `len >= self.length` check.
        let mut root = self.root.as_ref().unwrap();
        for _ in 0..(self.shift - shift) / geometry::bits::<N>() {
            let Node::Interior { children } = root.as_ref() else {
                unreachable!();
            };
            root = children.first().expect("empty interior node");
        }

        if len == geometry::max_capacity::<N>(shift) {
            // We descended into a subtree that is full, and exactly what we want.
            Self::from_parts(Arc::clone(root), len, shift)
        } else {
            Self::from_parts(root.truncated(shift, len), len, shift)
        }
    }

    /// Returns a copy of this vector with all of `values` appended.
    ///
    /// Instead of pushing elements one at a time, this tops up the last leaf
    /// with a single path copy and then builds whole leaves and grafts each of
    /// them in one step.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use steady_vector::Vector;
    /// let a = Vector::<_, 4>::from_iter([0, 1]);
    /// let b = a.append_batch(2..10);
    /// assert_eq!(b.to_vec(), (0..10).collect::<Vec<_>>());
    /// assert_eq!(a.len(), 2);
    /// ```
    pub fn append_batch<I: IntoIterator<Item = T>>(&self, values: I) -> Self {
        // Make the iterator peekable, because we need to check if there's an
        // element remaining before we touch the tree to make room for it.
        let mut values = values.into_iter().peekable();
        let mut ret = self.clone();

        let offset = geometry::leaf_offset::<N>(ret.length);
        if offset != 0 && values.peek().is_some() {
            // unwrap: a non-zero offset means we aren't empty.
            let root = ret.root.as_ref().unwrap();
            let mut added = 0;
            let root = root.update_leaf(ret.shift, ret.length, |data| {
                let mut data = data.clone();
                data.extend((&mut values).take(N - offset));
                added = data.len() - offset;
                data
            });
            ret = Self::from_parts(root, ret.length + added, ret.shift);
        }

        ret.push_leaves(&mut values);
        ret
    }

    /// Appends `values` to this vector, which must be leaf-aligned, one full leaf at a time.
    fn push_leaves<I: Iterator<Item = T>>(&mut self, values: &mut Peekable<I>) {
        while values.peek().is_some() {
            let data: Chunk<T, N> = values.by_ref().take(N).collect();
            let len = data.len();
            *self = self.push_leaf(Node::leaf(data), len);
        }
    }

    /// Returns the concatenation of `self` and `other`.
    ///
    /// If `self` ends on a leaf boundary, the leaves of `other` are shared
    /// rather than copied.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use steady_vector::Vector;
    /// let a = Vector::<_, 32>::from_iter([1, 2, 3]);
    /// let c = Vector::<_, 32>::from_iter([4, 5]);
    /// assert_eq!(a.concat(&c).to_vec(), vec![1, 2, 3, 4, 5]);
    /// assert_eq!(a.len(), 3);
    /// assert_eq!(c.len(), 2);
    /// ```
    pub fn concat(&self, other: &Self) -> Self {
        if other.is_empty() {
            return self.clone();
        }
        if self.is_empty() {
            return other.clone();
        }
        if geometry::leaf_offset::<N>(self.length) != 0 {
            return self.append_batch(other.iter().cloned());
        }

        let mut ret = self.clone();
        let mut leaves = other.leaves();
        while let Some(leaf) = leaves.next_node() {
            ret = ret.push_leaf(Arc::clone(leaf), leaf.len());
        }
        ret
    }

    /// Copies the elements into a `Vec`, a leaf at a time.
    pub fn to_vec(&self) -> Vec<T> {
        let mut ret = Vec::with_capacity(self.length);
        for leaf in self.leaves() {
            ret.extend_from_slice(leaf);
        }
        ret
    }

    /// Adds an element to the end, replacing `self` by [`Self::push_back`]'s result.
    pub fn push(&mut self, elt: T) {
        *self = self.push_back(elt);
    }

    /// Removes and returns the element at the end of this vector, or `None` if
    /// we're empty.
    ///
    /// Other vectors sharing structure with this one are unaffected.
    pub fn pop(&mut self) -> Option<T> {
        let ret = self.last()?.clone();
        *self = self.pop_back();
        Some(ret)
    }

    /// Replaces the element at `idx`, replacing `self` by [`Self::assoc`]'s result.
    ///
    /// Panics if `idx` is out of bounds.
    #[track_caller]
    pub fn set(&mut self, idx: usize, elt: T) {
        *self = self.assoc(idx, elt);
    }
}

impl<T, const N: usize> Clone for Vector<T, N>
where
    Const<N>: ValidBranchingConstant,
{
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            length: self.length,
            shift: self.shift,
        }
    }
}

impl<T, const N: usize> Default for Vector<T, N>
where
    Const<N>: ValidBranchingConstant,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug, const N: usize> fmt::Debug for Vector<T, N>
where
    Const<N>: ValidBranchingConstant,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq, const N: usize> PartialEq for Vector<T, N>
where
    Const<N>: ValidBranchingConstant,
{
    fn eq(&self, other: &Self) -> bool {
        if self.length != other.length {
            return false;
        }
        if self.ptr_eq(other) {
            return true;
        }
        // Equal lengths mean equal tree shapes, so the leaves line up. Leaves
        // that are shared between the two trees don't need to be compared.
        self.leaves()
            .zip(other.leaves())
            .all(|(a, b)| std::ptr::eq(a, b) || a == b)
    }
}

impl<T: Eq, const N: usize> Eq for Vector<T, N> where Const<N>: ValidBranchingConstant {}

impl<T: Hash, const N: usize> Hash for Vector<T, N>
where
    Const<N>: ValidBranchingConstant,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.length.hash(state);
        for elt in self {
            elt.hash(state);
        }
    }
}

impl<T, const N: usize> Index<usize> for Vector<T, N>
where
    Const<N>: ValidBranchingConstant,
{
    type Output = T;

    #[track_caller]
    fn index(&self, index: usize) -> &Self::Output {
        match self.get(index) {
            Some(elt) => elt,
            None => out_of_bounds(index, self.length),
        }
    }
}

impl<'a, T, const N: usize> IntoIterator for &'a Vector<T, N>
where
    Const<N>: ValidBranchingConstant,
{
    type Item = &'a T;
    type IntoIter = Iter<'a, T, N>;

    fn into_iter(self) -> Self::IntoIter {
        Iter::new(self.leaves(), &[], self.length)
    }
}

impl<T: Clone, const N: usize> IntoIterator for Vector<T, N>
where
    Const<N>: ValidBranchingConstant,
{
    type Item = T;
    type IntoIter = IntoIter<T, N>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self.root, self.length)
    }
}

impl<T: Clone, const N: usize> Extend<T> for Vector<T, N>
where
    Const<N>: ValidBranchingConstant,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        *self = self.append_batch(iter);
    }
}

impl<T: Clone, const N: usize> FromIterator<T> for Vector<T, N>
where
    Const<N>: ValidBranchingConstant,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut ret = Vector::new();
        ret.push_leaves(&mut iter.into_iter().peekable());
        ret
    }
}

impl<T: Clone, const N: usize> From<Vec<T>> for Vector<T, N>
where
    Const<N>: ValidBranchingConstant,
{
    fn from(vec: Vec<T>) -> Self {
        vec.into_iter().collect()
    }
}

impl<T: Clone, const N: usize> From<&[T]> for Vector<T, N>
where
    Const<N>: ValidBranchingConstant,
{
    fn from(slice: &[T]) -> Self {
        slice.iter().cloned().collect()
    }
}

impl<T: Clone, const N: usize, const M: usize> From<[T; M]> for Vector<T, N>
where
    Const<N>: ValidBranchingConstant,
{
    fn from(array: [T; M]) -> Self {
        array.into_iter().collect()
    }
}

impl<T: Clone, const N: usize> Add<&Vector<T, N>> for &Vector<T, N>
where
    Const<N>: ValidBranchingConstant,
{
    type Output = Vector<T, N>;

    fn add(self, rhs: &Vector<T, N>) -> Self::Output {
        self.concat(rhs)
    }
}

impl<T: Clone, const N: usize> Add for Vector<T, N>
where
    Const<N>: ValidBranchingConstant,
{
    type Output = Vector<T, N>;

    fn add(self, rhs: Vector<T, N>) -> Self::Output {
        self.concat(&rhs)
    }
}

impl<T: serde::Serialize, const N: usize> serde::Serialize for Vector<T, N>
where
    Const<N>: ValidBranchingConstant,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeSeq;

        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for elt in self.iter() {
            seq.serialize_element(elt)?;
        }
        seq.end()
    }
}

impl<'de, T: Clone + serde::Deserialize<'de>, const N: usize> serde::Deserialize<'de>
    for Vector<T, N>
where
    Const<N>: ValidBranchingConstant,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let vec = <Vec<T> as serde::Deserialize>::deserialize(deserializer)?;
        Ok(vec.into_iter().collect())
    }
}

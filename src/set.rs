extern crate alloc;

use alloc::boxed::Box;
use core::{borrow::Borrow, marker::PhantomPinned, ptr::NonNull};

use cordyceps::Linked;

use crate::{AvlTree, Links, TreeNode};

/// An ordered set based on an [AVL tree] with order-statistic ranks.
///
/// Membership, insertion, removal and rank queries all complete in
/// _O(log n)_ time. Ranks are 1-based: the minimum key has rank 1 and the
/// maximum key has rank `len()`.
///
/// [AVL tree]: https://en.wikipedia.org/wiki/AVL_tree
pub struct AvlSet<K: Ord> {
    tree: AvlTree<SetNode<K>>,
}

struct SetNode<K> {
    links: Links<SetNode<K>>,
    key: K,
    _unpin: PhantomPinned,
}

unsafe impl<K> Linked<Links<SetNode<K>>> for SetNode<K> {
    type Handle = Box<Self>;

    fn into_ptr(r: Self::Handle) -> NonNull<Self> {
        Box::leak(r).into()
    }

    unsafe fn from_ptr(ptr: NonNull<Self>) -> Self::Handle {
        unsafe { Box::from_raw(ptr.as_ptr()) }
    }

    unsafe fn links(ptr: NonNull<Self>) -> NonNull<Links<SetNode<K>>> {
        let ptr = ptr.as_ptr();
        NonNull::new(core::ptr::addr_of_mut!((*ptr).links)).unwrap()
    }
}

impl<K: Ord> TreeNode<Links<SetNode<K>>> for SetNode<K> {
    type Key = K;

    fn key(&self) -> &Self::Key {
        &self.key
    }
}

impl<K: Ord> AvlSet<K> {
    /// Creates a new, empty `AvlSet`.
    pub const fn new() -> Self {
        Self {
            tree: AvlTree::new(),
        }
    }

    /// Returns `true` if the set contains no elements.
    pub const fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Returns the number of elements in the set.
    pub const fn len(&self) -> usize {
        self.tree.len()
    }

    /// Returns `true` if the set contains `key`.
    #[inline]
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        self.tree.contains_key(key)
    }

    /// Returns a reference to the element equal to `key`, if any.
    #[inline]
    pub fn get<Q>(&self, key: &Q) -> Option<&K>
    where
        K: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        self.tree.get(key).map(|node| &node.key)
    }

    /// Adds `key` to the set.
    ///
    /// Returns `true` if the key was not already present.
    #[inline]
    pub fn insert(&mut self, key: K) -> bool {
        self.tree
            .insert(Box::new(SetNode {
                links: Links::new(),
                key,
                _unpin: PhantomPinned,
            }))
            .is_none()
    }

    /// Removes `key` from the set.
    ///
    /// Returns `true` if the key was present.
    #[inline]
    pub fn remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        self.tree.remove(key).is_some()
    }

    /// Returns a reference to the `rank`-th smallest element.
    ///
    /// Ranks are 1-based; out-of-range ranks return `None`.
    #[inline]
    pub fn get_by_rank(&self, rank: usize) -> Option<&K> {
        self.tree.get_by_rank(rank).map(|node| &node.key)
    }

    /// Returns the 1-based sorted position of `key`, or `None` if the set
    /// does not contain it.
    #[inline]
    pub fn rank_of<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        self.tree.rank_of(key)
    }

    /// Returns the minimum element of the set.
    #[inline]
    pub fn first(&self) -> Option<&K> {
        self.tree.first().map(|node| &node.key)
    }

    /// Returns the maximum element of the set.
    #[inline]
    pub fn last(&self) -> Option<&K> {
        self.tree.last().map(|node| &node.key)
    }

    /// Removes and returns the minimum element of the set.
    #[inline]
    pub fn pop_first(&mut self) -> Option<K> {
        self.tree.pop_first().map(|node| {
            let SetNode { key, .. } = *node;
            key
        })
    }

    /// Removes and returns the maximum element of the set.
    #[inline]
    pub fn pop_last(&mut self) -> Option<K> {
        self.tree.pop_last().map(|node| {
            let SetNode { key, .. } = *node;
            key
        })
    }

    /// Returns an iterator visiting the set's elements in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &K> + '_ {
        self.tree.iter().map(|node| &node.key)
    }

    /// Clears the set, removing all elements.
    #[inline]
    pub fn clear(&mut self) {
        self.tree.clear();
    }
}

impl<K: Ord> Default for AvlSet<K> {
    fn default() -> Self {
        Self::new()
    }
}

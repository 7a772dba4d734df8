//! An intrusive AVL tree augmented with order-statistic ranks.
//#![no_std]

// Conventions used in comments:
// - The rank of a node `x`, denoted `rank(x)`, is 1 + the number of nodes in
//   `x`'s left subtree, i.e. `x`'s 1-based position in its own subtree's
//   sorted order.
// - The balance factor of `x` is sign(height(right(x)) - height(left(x))),
//   stored as one of Left/Even/Right.
//
// The fundamental invariants of the tree are:
// 1. An in-order traversal yields keys in strictly increasing order; keys
//    are unique.
// 2. For every node, |height(left) - height(right)| <= 1, and the stored
//    balance factor equals the sign of the actual height difference.
// 3. For every node, rank == size(left subtree) + 1.
//
// Corollaries:
// 4. The height of an n-node tree is at most ~1.44 * log2(n + 2), so every
//    descent is O(log n).
// 5. A node's 1-based position in the whole tree equals its rank plus the
//    sum of the ranks of every ancestor whose right subtree contains it;
//    this is what lets rank queries avoid a full traversal.
//
// Mutating descents speculatively edit ranks on the way down (the left
// subtree of every node a descent moves left from grows on insert and
// shrinks on delete). The descent logs each node it leaves in a trail; if
// it ends without a structural change (duplicate insert, absent delete)
// the trail rewinds those edits, and otherwise the same trail drives the
// bottom-up balance-factor propagation.

use core::{
    cell::UnsafeCell, cmp::Ordering, fmt, marker::PhantomPinned, mem, ops::Not, ptr::NonNull,
};
use std::borrow::Borrow;

use cordyceps::Linked;

mod balance;
mod debug;
mod iter;
pub mod set;
mod trail;

#[cfg(any(test, feature = "model"))]
pub mod model;

#[cfg(test)]
mod tests;

use balance::{grown, shrunk, Adjust, Balance};
use trail::Trail;

pub use iter::Iter;
pub use set::AvlSet;

pub trait TreeNode<L>: Linked<L> {
    type Key: Ord;

    fn key(&self) -> &Self::Key;
}

/// An intrusive AVL tree with order-statistic bookkeeping.
///
/// Besides key lookup, the tree answers rank queries in _O(log n)_:
/// [`get_by_rank`](AvlTree::get_by_rank) finds the k-th smallest key and
/// [`rank_of`](AvlTree::rank_of) recovers a key's 1-based sorted position.
pub struct AvlTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    root: Link<T>,
    len: usize,
}

pub struct Links<T: ?Sized> {
    inner: UnsafeCell<LinksInner<T>>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Dir {
    Left = 0,
    Right = 1,
}

impl Not for Dir {
    type Output = Dir;

    fn not(self) -> Self::Output {
        match self {
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }
}

#[repr(C)]
struct LinksInner<T: ?Sized> {
    parent: Link<T>,
    children: [Link<T>; 2],
    rank: usize,
    balance: Balance,
    _unpin: PhantomPinned,
}

type Link<T> = Option<NonNull<T>>;

impl<T> AvlTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    /// Returns a new empty tree.
    pub const fn new() -> AvlTree<T> {
        AvlTree { root: None, len: 0 }
    }

    /// Returns `true` if the tree contains no elements.
    pub const fn is_empty(&self) -> bool {
        let empty = self.len() == 0;

        if cfg!(debug_assertions) {
            // Can't use assert_eq!() in const fn.
            assert!(empty == self.root.is_none());
        }

        empty
    }

    /// Returns the number of elements in the tree.
    pub const fn len(&self) -> usize {
        self.len
    }

    #[doc(hidden)]
    pub fn assert_invariants(&self) {
        let size = match self.root {
            Some(root) => {
                assert!(unsafe { T::links(root).as_ref().parent() }.is_none());
                unsafe { self.assert_invariants_at(root).1 }
            }
            None => 0,
        };

        assert_eq!(self.len(), size);

        // In-order traversal must yield keys in strictly increasing order.
        let mut iter = self.iter();
        if let Some(first) = iter.next() {
            let mut prev = first.key();
            for node in iter {
                assert!(prev < node.key(), "in-order keys out of order");
                prev = node.key();
            }
        }
    }

    // Returns the height and size of the subtree rooted at `node`.
    #[allow(clippy::only_used_in_recursion)]
    unsafe fn assert_invariants_at(&self, node: NonNull<T>) -> (usize, usize) {
        unsafe {
            let links = T::links(node).as_ref();

            let (left_height, left_size) = links
                .left()
                .map(|child| {
                    let parent = T::links(child)
                        .as_ref()
                        .parent()
                        .expect("left child parent pointer not set");
                    assert_eq!(node, parent);

                    self.assert_invariants_at(child)
                })
                .unwrap_or((0, 0));

            let (right_height, right_size) = links
                .right()
                .map(|child| {
                    let parent = T::links(child)
                        .as_ref()
                        .parent()
                        .expect("right child parent pointer not set");
                    assert_eq!(node, parent);

                    self.assert_invariants_at(child)
                })
                .unwrap_or((0, 0));

            // Ensure the subtree heights differ by at most one.
            assert!(left_height.abs_diff(right_height) <= 1);

            // Ensure the stored balance factor matches the height difference.
            let factor = match right_height.cmp(&left_height) {
                Ordering::Less => Balance::Left,
                Ordering::Equal => Balance::Even,
                Ordering::Greater => Balance::Right,
            };
            assert_eq!(links.balance(), factor);

            // Ensure the rank counts the left subtree.
            assert_eq!(links.rank(), left_size + 1);

            (
                1 + left_height.max(right_height),
                1 + left_size + right_size,
            )
        }
    }

    /// Returns a reference to the node corresponding to `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<&T>
    where
        T::Key: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        let ptr = self.get_raw(key)?;
        unsafe { Some(ptr.as_ref()) }
    }

    /// Returns `true` if the tree contains a node with the given key.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        T::Key: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        self.get_raw(key).is_some()
    }

    pub(crate) fn get_raw<Q>(&self, key: &Q) -> Link<T>
    where
        T::Key: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        let mut opt_cur = self.root;

        loop {
            let cur = opt_cur?;

            unsafe {
                match key.cmp(cur.as_ref().key().borrow()) {
                    Ordering::Less => opt_cur = T::links(cur).as_ref().left(),
                    Ordering::Equal => return Some(cur),
                    Ordering::Greater => opt_cur = T::links(cur).as_ref().right(),
                }
            }
        }
    }

    /// Returns a reference to the node holding the `rank`-th smallest key.
    ///
    /// Ranks are 1-based: `get_by_rank(1)` is the minimum element and
    /// `get_by_rank(self.len())` the maximum. Out-of-range ranks return
    /// `None`. This operation completes in _O(log n)_ time.
    pub fn get_by_rank(&self, rank: usize) -> Option<&T> {
        let ptr = self.get_by_rank_raw(rank)?;
        unsafe { Some(ptr.as_ref()) }
    }

    fn get_by_rank_raw(&self, mut rank: usize) -> Link<T> {
        if rank == 0 || rank > self.len {
            return None;
        }

        let mut opt_cur = self.root;

        // Each node's rank is its position within its own subtree, so a
        // right turn re-bases the sought rank past the prefix it skips.
        while let Some(cur) = opt_cur {
            let cur_rank = unsafe { T::links(cur).as_ref().rank() };

            match rank.cmp(&cur_rank) {
                Ordering::Equal => return Some(cur),
                Ordering::Less => opt_cur = unsafe { T::links(cur).as_ref().left() },
                Ordering::Greater => {
                    rank -= cur_rank;
                    opt_cur = unsafe { T::links(cur).as_ref().right() };
                }
            }
        }

        None
    }

    /// Returns the 1-based sorted position of `key`, or `None` if the tree
    /// does not contain it.
    ///
    /// This is the inverse of [`get_by_rank`](AvlTree::get_by_rank) and
    /// completes in _O(log n)_ time.
    pub fn rank_of<Q>(&self, key: &Q) -> Option<usize>
    where
        T::Key: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        let mut acc = 0;
        let mut opt_cur = self.root;

        while let Some(cur) = opt_cur {
            unsafe {
                let links = T::links(cur).as_ref();

                match key.cmp(cur.as_ref().key().borrow()) {
                    Ordering::Equal => return Some(acc + links.rank()),
                    Ordering::Less => opt_cur = links.left(),
                    Ordering::Greater => {
                        acc += links.rank();
                        opt_cur = links.right();
                    }
                }
            }
        }

        None
    }

    /// Returns the minimum element of the tree.
    pub fn first(&self) -> Option<&T> {
        let root = self.root?;
        let (first, _) = unsafe { self.leftmost(root) };
        unsafe { Some(first.as_ref()) }
    }

    /// Returns the maximum element of the tree.
    pub fn last(&self) -> Option<&T> {
        let mut cur = self.root?;

        unsafe {
            while let Some(right) = T::links(cur).as_ref().right() {
                cur = right;
            }

            Some(cur.as_ref())
        }
    }

    /// Returns an iterator visiting the tree's elements in sorted order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self)
    }

    /// Inserts an item into the tree.
    ///
    /// If the tree already contains the item's key, the tree is left
    /// untouched and the rejected item is handed back.
    ///
    /// This operation completes in _O(log n)_ time.
    pub fn insert(&mut self, item: T::Handle) -> Option<T::Handle> {
        let ptr = T::into_ptr(item);

        unsafe {
            let links = T::links(ptr).as_mut();
            links.set_parent(None);
            links.set_left(None);
            links.set_right(None);
            links.set_rank(1);
            links.set_balance(Balance::Even);
        }

        let Some(root) = self.root else {
            self.root = Some(ptr);
            self.len += 1;
            return None;
        };

        let mut trail = Trail::new();
        let mut cur = root;

        // Descend toward the key's slot. Moving left grows the current
        // node's left subtree, so its rank is bumped on the way down and
        // logged for rollback.
        loop {
            let ordering = unsafe { ptr.as_ref().key().cmp(cur.as_ref().key()) };

            match ordering {
                Ordering::Equal => {
                    // Duplicate key: rewind the speculative rank edits and
                    // hand the item back untouched.
                    unsafe { trail.revert_grown() };
                    return Some(unsafe { T::from_ptr(ptr) });
                }

                Ordering::Less => unsafe {
                    let links = T::links(cur).as_mut();
                    links.set_rank(links.rank() + 1);
                    trail.record(cur, Dir::Left);

                    match links.left() {
                        Some(left) => cur = left,
                        None => {
                            links.set_left(Some(ptr));
                            T::links(ptr).as_mut().set_parent(Some(cur));
                            break;
                        }
                    }
                },

                Ordering::Greater => unsafe {
                    let links = T::links(cur).as_mut();
                    trail.record(cur, Dir::Right);

                    match links.right() {
                        Some(right) => cur = right,
                        None => {
                            links.set_right(Some(ptr));
                            T::links(ptr).as_mut().set_parent(Some(cur));
                            break;
                        }
                    }
                },
            }
        }

        self.len += 1;
        unsafe { self.rebalance_grown(&trail) };

        None
    }

    /// Removes the node corresponding to `key` from the tree.
    ///
    /// Returns `None`, with the tree left exactly as it was, if no node
    /// matches.
    ///
    /// This operation completes in _O(log n)_ time.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<T::Handle>
    where
        T::Key: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        let mut trail = Trail::new();
        let mut opt_cur = self.root;

        let found = loop {
            let Some(cur) = opt_cur else {
                // Key absent: restore the ranks decremented on the way down.
                unsafe { trail.revert_shrunk() };
                return None;
            };

            match key.cmp(unsafe { cur.as_ref().key().borrow() }) {
                Ordering::Equal => break cur,

                Ordering::Less => unsafe {
                    let links = T::links(cur).as_mut();
                    links.set_rank(links.rank() - 1);
                    trail.record(cur, Dir::Left);
                    opt_cur = links.left();
                },

                Ordering::Greater => unsafe {
                    trail.record(cur, Dir::Right);
                    opt_cur = T::links(cur).as_ref().right();
                },
            }
        };

        Some(unsafe { self.remove_found(found, trail) })
    }

    /// Removes and returns the minimum element of the tree.
    pub fn pop_first(&mut self) -> Option<T::Handle> {
        let mut trail = Trail::new();
        let mut cur = self.root?;

        unsafe {
            while let Some(left) = T::links(cur).as_ref().left() {
                let links = T::links(cur).as_mut();
                links.set_rank(links.rank() - 1);
                trail.record(cur, Dir::Left);
                cur = left;
            }

            Some(self.remove_found(cur, trail))
        }
    }

    /// Removes and returns the maximum element of the tree.
    pub fn pop_last(&mut self) -> Option<T::Handle> {
        let mut trail = Trail::new();
        let mut cur = self.root?;

        unsafe {
            while let Some(right) = T::links(cur).as_ref().right() {
                trail.record(cur, Dir::Right);
                cur = right;
            }

            Some(self.remove_found(cur, trail))
        }
    }

    // Unlinks `node` from the tree and rebalances upward from the splice
    // point.
    //
    // `trail` must hold the descent that located `node`, with ranks already
    // decremented along its left turns.
    unsafe fn remove_found(&mut self, node: NonNull<T>, mut trail: Trail<T>) -> T::Handle {
        unsafe {
            let parent = T::links(node).as_ref().parent();
            let left = T::links(node).as_ref().left();
            let right = T::links(node).as_ref().right();

            match right {
                None => {
                    // Splice the left child (or nothing) into the node's
                    // place.
                    self.replace_child_or_set_root(parent, node, left);
                    self.maybe_set_parent(left, parent);
                }

                Some(right) => {
                    // The replacement is the in-order successor: the
                    // leftmost node of the right subtree, which is `right`
                    // itself when `right` has no left child.
                    let (succ, succ_parent) = self.leftmost(right);

                    // Once in the node's place, the successor's right
                    // subtree is the one that shrank.
                    trail.record(succ, Dir::Right);

                    if let Some(succ_parent) = succ_parent {
                        // Every node from `right` down to the successor's
                        // parent loses the successor from its left subtree.
                        let mut spine = right;
                        loop {
                            let links = T::links(spine).as_mut();
                            links.set_rank(links.rank() - 1);
                            trail.record(spine, Dir::Left);

                            match links.left() {
                                Some(next) if next != succ => spine = next,
                                _ => break,
                            }
                        }

                        // Splice the successor out of the spine, attaching
                        // its right subtree in its place...
                        let succ_right = T::links(succ).as_ref().right();
                        T::links(succ_parent).as_mut().set_left(succ_right);
                        self.maybe_set_parent(succ_right, Some(succ_parent));

                        // ...and hand it the node's right subtree.
                        T::links(succ).as_mut().set_right(Some(right));
                        T::links(right).as_mut().set_parent(Some(succ));
                    }

                    // The successor assumes the node's place, rank and lean.
                    self.replace_child_or_set_root(parent, node, Some(succ));
                    T::links(succ).as_mut().set_parent(parent);
                    T::links(succ).as_mut().set_left(left);
                    self.maybe_set_parent(left, Some(succ));
                    T::links(succ)
                        .as_mut()
                        .set_rank(T::links(node).as_ref().rank());
                    T::links(succ)
                        .as_mut()
                        .set_balance(T::links(node).as_ref().balance());
                }
            }

            self.len -= 1;
            self.rebalance_shrunk(&trail);

            T::from_ptr(node)
        }
    }

    // Walks the trail from the insertion point toward the root, adjusting
    // balance factors for a subtree that grew by one.
    //
    // The walk ends at the rebalance anchor: the deepest ancestor that was
    // not Even before the insert (or the root). Everything below the anchor
    // was Even and now leans toward the side the descent took; the anchor
    // either absorbs the height change or is corrected with a rotation,
    // after which no ancestor above it changes.
    unsafe fn rebalance_grown(&mut self, trail: &Trail<T>) {
        for &(node, dir) in trail.steps() {
            let factor = unsafe { T::links(node).as_ref().balance() };

            match grown(factor, dir) {
                Adjust::Propagate(new) => unsafe {
                    T::links(node).as_mut().set_balance(new);
                },
                Adjust::Settle(new) => {
                    unsafe { T::links(node).as_mut().set_balance(new) };
                    break;
                }
                Adjust::Rebalance { heavy } => {
                    unsafe { self.rebalance_heavy(node, heavy) };
                    break;
                }
            }
        }
    }

    // Walks the trail from the splice point toward the root, adjusting
    // balance factors for a subtree that shrank by one.
    //
    // Each recorded direction is the side that lost height. Propagation
    // continues exactly as long as the corrected subtree's overall height
    // shrank; it stops at the first node that absorbs the change (or past
    // a height-preserving rotation), or at the root.
    unsafe fn rebalance_shrunk(&mut self, trail: &Trail<T>) {
        for &(node, dir) in trail.steps() {
            let factor = unsafe { T::links(node).as_ref().balance() };

            match shrunk(factor, dir) {
                Adjust::Propagate(new) => unsafe {
                    T::links(node).as_mut().set_balance(new);
                },
                Adjust::Settle(new) => {
                    unsafe { T::links(node).as_mut().set_balance(new) };
                    break;
                }
                Adjust::Rebalance { heavy } => {
                    if !unsafe { self.rebalance_heavy(node, heavy) } {
                        break;
                    }
                }
            }
        }
    }

    // Corrects a node that has gone two levels deep on its `heavy` side.
    //
    // Returns `true` if the correction shrank the subtree now rooted where
    // `node` stood, in which case a deletion must keep propagating upward.
    unsafe fn rebalance_heavy(&mut self, node: NonNull<T>, heavy: Dir) -> bool {
        let pivot = unsafe { T::links(node).as_ref().child(heavy) }
            .expect("a node cannot lean toward an empty subtree");
        let pivot_factor = unsafe { T::links(pivot).as_ref().balance() };

        if pivot_factor == Balance::lean(!heavy) {
            // Zig-zag: the grandchild between `node` and `pivot` rises to
            // the top. Its prior lean tells which of the two keeps the
            // shorter side.
            let riser = unsafe { T::links(pivot).as_ref().child(!heavy) }
                .expect("a node cannot lean toward an empty subtree");
            let riser_factor = unsafe { T::links(riser).as_ref().balance() };

            self.rotate(pivot, heavy);
            self.rotate(node, !heavy);

            unsafe {
                T::links(node)
                    .as_mut()
                    .set_balance(if riser_factor == Balance::lean(heavy) {
                        Balance::lean(!heavy)
                    } else {
                        Balance::Even
                    });
                T::links(pivot)
                    .as_mut()
                    .set_balance(if riser_factor == Balance::lean(!heavy) {
                        Balance::lean(heavy)
                    } else {
                        Balance::Even
                    });
                T::links(riser).as_mut().set_balance(Balance::Even);
            }

            true
        } else {
            self.rotate(node, !heavy);

            unsafe {
                if pivot_factor == Balance::Even {
                    // Deletion only: the pivot carried equal-height
                    // subtrees, so the rotation leaves the overall height
                    // unchanged.
                    T::links(node).as_mut().set_balance(Balance::lean(heavy));
                    T::links(pivot).as_mut().set_balance(Balance::lean(!heavy));
                    false
                } else {
                    T::links(node).as_mut().set_balance(Balance::Even);
                    T::links(pivot).as_mut().set_balance(Balance::Even);
                    true
                }
            }
        }
    }

    // Rotates `center` in `dir`, raising its child on the opposite side
    // into its place.
    //
    // Balance factors are untouched; the caller adjusts them per its case
    // table. Ranks are fixed here so the rank invariant survives any
    // rotation sequence.
    fn rotate(&mut self, center: NonNull<T>, dir: Dir) {
        unsafe {
            // Nothing to rotate without a child opposite the direction of
            // rotation.
            let Some(pivot) = T::links(center).as_ref().child(!dir) else {
                return;
            };

            // `beta` crosses from the pivot to the center.
            let beta = T::links(pivot).as_ref().child(dir);

            T::links(center).as_mut().set_child(!dir, beta);
            self.maybe_set_parent(beta, Some(center));

            T::links(pivot).as_mut().set_child(dir, Some(center));
            let parent = T::links(center).as_mut().set_parent(Some(pivot));
            T::links(pivot).as_mut().set_parent(parent);

            self.replace_child_or_set_root(parent, center, Some(pivot));

            // A left rotation hands the pivot ownership of the center and
            // the center's whole left subtree; a right rotation takes the
            // pivot's left subtree away from the center.
            let center_rank = T::links(center).as_ref().rank();
            match dir {
                Dir::Left => {
                    let links = T::links(pivot).as_mut();
                    let pivot_rank = links.rank();
                    links.set_rank(pivot_rank + center_rank);
                }
                Dir::Right => {
                    let pivot_rank = T::links(pivot).as_ref().rank();
                    T::links(center).as_mut().set_rank(center_rank - pivot_rank);
                }
            }
        }
    }

    /// Clears the tree, dropping all elements.
    pub fn clear(&mut self) {
        let mut opt_cur = self.root;

        while let Some(cur) = opt_cur {
            unsafe {
                // Descend to the minimum node.
                let (cur, parent) = self.leftmost(cur);
                let parent = parent.or_else(|| T::links(cur).as_ref().parent());

                let right = T::links(cur).as_ref().right();

                // Elevate the node's right child (which may be None).
                self.replace_child_or_set_root(parent, cur, right);
                self.maybe_set_parent(right, parent);

                // Drop the node.
                drop(T::from_ptr(cur));
                self.len -= 1;

                // If the node had no right child, climb to the parent. If
                // the node had no parent, the tree is empty.
                opt_cur = right.or(parent);
            }
        }

        debug_assert!(self.root.is_none());
        debug_assert_eq!(self.len(), 0);
    }

    // Support methods ========================================================

    // Returns the minimum node in the subtree.
    //
    // If the subtree root is not the minimum, also returns the minimum
    // node's parent.
    #[inline]
    unsafe fn leftmost(&self, root: NonNull<T>) -> (NonNull<T>, Option<NonNull<T>>) {
        let mut parent = None;
        let mut cur = root;

        while let Some(left) = unsafe { T::links(cur).as_ref().left() } {
            parent = Some(cur);
            cur = left;
        }

        (cur, parent)
    }

    // Returns the in-order successor of `node`, or `None` if `node` is the
    // maximum.
    pub(crate) unsafe fn successor_raw(&self, node: NonNull<T>) -> Link<T> {
        unsafe {
            if let Some(right) = T::links(node).as_ref().right() {
                let (succ, _) = self.leftmost(right);
                return Some(succ);
            }

            let mut cur = node;
            while let Some(parent) = T::links(cur).as_ref().parent() {
                match self.which_child(parent, Some(cur)) {
                    Dir::Left => return Some(parent),
                    Dir::Right => cur = parent,
                }
            }

            None
        }
    }

    unsafe fn maybe_set_parent(&mut self, opt_node: Link<T>, parent: Link<T>) {
        let Some(node) = opt_node else {
            return;
        };

        unsafe { T::links(node).as_mut().set_parent(parent) };
    }

    #[inline]
    unsafe fn replace_child_or_set_root(
        &mut self,
        parent: Link<T>,
        old_child: NonNull<T>,
        new_child: Link<T>,
    ) {
        match parent {
            Some(parent) => unsafe { self.replace_child(parent, old_child, new_child) },
            None => self.root = new_child,
        }
    }

    // Replaces the child pointer of `parent` pointing at `old_child` with
    // `new_child`.
    //
    // `new_child`'s parent pointer is not updated.
    //
    // # Safety
    //
    // The caller must ensure that the following conditions hold:
    // - `old_child` is a child node of `parent`.
    // - `new_child` is not a child node of `parent`.
    unsafe fn replace_child(
        &mut self,
        parent: NonNull<T>,
        old_child: NonNull<T>,
        new_child: Link<T>,
    ) {
        unsafe {
            let which = self.which_child(parent, Some(old_child));
            debug_assert_eq!(T::links(parent).as_ref().child(which), Some(old_child));

            if let Some(new_child) = new_child {
                debug_assert_ne!(
                    T::links(parent).as_ref().child(!which),
                    Some(new_child),
                    "`new_child` must not already be a child of `parent`"
                );
            }

            T::links(parent).as_mut().set_child(which, new_child);
        }
    }

    pub(crate) unsafe fn which_child(&self, parent: NonNull<T>, child: Link<T>) -> Dir {
        if unsafe { T::links(parent).as_ref().left() } == child {
            Dir::Left
        } else {
            Dir::Right
        }
    }
}

impl<T> Drop for AvlTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T: ?Sized> Links<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: UnsafeCell::new(LinksInner {
                parent: None,
                children: [None; 2],
                rank: 1,
                balance: Balance::Even,
                _unpin: PhantomPinned,
            }),
        }
    }

    /// Returns the node's rank: one more than the number of nodes in its
    /// left subtree.
    #[inline]
    pub fn rank(&self) -> usize {
        unsafe { (*self.inner.get()).rank }
    }

    #[inline]
    pub(crate) fn balance(&self) -> Balance {
        unsafe { (*self.inner.get()).balance }
    }

    #[inline]
    fn parent(&self) -> Link<T> {
        unsafe { (*self.inner.get()).parent }
    }

    #[inline]
    fn child(&self, dir: Dir) -> Link<T> {
        unsafe { (*self.inner.get()).children[dir as usize] }
    }

    #[inline]
    fn left(&self) -> Link<T> {
        self.child(Dir::Left)
    }

    #[inline]
    fn right(&self) -> Link<T> {
        self.child(Dir::Right)
    }

    #[inline]
    fn set_parent(&mut self, parent: Link<T>) -> Link<T> {
        mem::replace(&mut self.inner.get_mut().parent, parent)
    }

    #[inline]
    fn set_child(&mut self, dir: Dir, child: Link<T>) -> Link<T> {
        mem::replace(&mut self.inner.get_mut().children[dir as usize], child)
    }

    #[inline]
    fn set_left(&mut self, left: Link<T>) -> Link<T> {
        self.set_child(Dir::Left, left)
    }

    #[inline]
    fn set_right(&mut self, right: Link<T>) -> Link<T> {
        self.set_child(Dir::Right, right)
    }

    #[inline]
    fn set_rank(&mut self, rank: usize) {
        self.inner.get_mut().rank = rank;
    }

    #[inline]
    fn set_balance(&mut self, balance: Balance) {
        self.inner.get_mut().balance = balance;
    }
}

impl<T: ?Sized> Default for Links<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> fmt::Debug for Links<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Links")
            .field("rank", &self.rank())
            .field("balance", &self.balance())
            .finish_non_exhaustive()
    }
}

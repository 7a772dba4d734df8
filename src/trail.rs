use core::ptr::NonNull;

use crate::{Dir, Links, TreeNode};

/// A log of the nodes a mutating descent stepped off of, and the direction
/// it took from each.
///
/// Rank edits made on the way down are speculative until the descent finds
/// (or rules out) its target; the trail is what makes them revertible when
/// an insert hits a duplicate or a delete misses. After a structural
/// change, the same records, walked newest-first, drive the bottom-up
/// balance-factor propagation. A trail lives on the call stack of a single
/// insert or delete and is never persisted.
pub(crate) struct Trail<T: ?Sized> {
    steps: Vec<(NonNull<T>, Dir)>,
}

impl<T> Trail<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    pub(crate) fn new() -> Trail<T> {
        Trail { steps: Vec::new() }
    }

    pub(crate) fn record(&mut self, node: NonNull<T>, dir: Dir) {
        self.steps.push((node, dir));
    }

    /// Visits the recorded steps newest-first.
    pub(crate) fn steps(&self) -> impl Iterator<Item = &(NonNull<T>, Dir)> + '_ {
        self.steps.iter().rev()
    }

    /// Undoes the rank increments of a descent that failed to insert.
    pub(crate) unsafe fn revert_grown(&self) {
        unsafe { self.revert(|rank| rank - 1) }
    }

    /// Undoes the rank decrements of a descent that failed to delete.
    pub(crate) unsafe fn revert_shrunk(&self) {
        unsafe { self.revert(|rank| rank + 1) }
    }

    unsafe fn revert(&self, undo: impl Fn(usize) -> usize) {
        // Only left turns touched a rank on the way down.
        for &(node, dir) in self.steps() {
            if dir == Dir::Left {
                unsafe {
                    let links = T::links(node).as_mut();
                    links.set_rank(undo(links.rank()));
                }
            }
        }
    }
}

use core::{pin::Pin, ptr::NonNull};

use crate::{AvlTree, Dir, Links, TreeNode};

/// A view into a single entry in an [`AvlTree`], which may be either vacant or occupied.
pub enum Entry<'tree, T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    Vacant(VacantEntry<'tree, T>),
    Occupied(OccupiedEntry<'tree, T>),
}

// Where a new node has to be linked.
pub(crate) enum InsertAs<T: ?Sized> {
    Root,
    Child { parent: NonNull<T>, dir: Dir },
}

// The outcome of searching the tree for a key.
pub(crate) enum Slot<T: ?Sized> {
    Occupied(NonNull<T>),
    Vacant(InsertAs<T>),
}

/// A view into a vacant entry in an [`AvlTree`].
pub struct VacantEntry<'tree, T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    pub(crate) tree: &'tree mut AvlTree<T>,
    pub(crate) insert_as: InsertAs<T>,
}

impl<'tree, T> VacantEntry<'tree, T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    /// Inserts `item` at the key associated with this entry and rebalances the tree.
    ///
    /// # Safety
    ///
    /// The caller must ensure that the key returned by `item.key()` is equal to the key used to
    /// retrieve this entry.
    pub unsafe fn insert(self, item: T::Handle) -> Pin<&'tree mut T> {
        let mut ptr = T::into_ptr(item);

        unsafe {
            self.tree.link_at(self.insert_as, ptr);
            Pin::new_unchecked(ptr.as_mut())
        }
    }
}

/// A view into an occupied entry in an [`AvlTree`].
pub struct OccupiedEntry<'tree, T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    pub(crate) tree: &'tree mut AvlTree<T>,
    pub(crate) node: NonNull<T>,
}

impl<'tree, T> OccupiedEntry<'tree, T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    /// Returns a reference to the item in the entry.
    pub fn get(&self) -> Pin<&T> {
        // SAFETY: `self.tree` is mutably borrowed for `'tree`
        unsafe { Pin::new_unchecked(self.node.as_ref()) }
    }

    /// Returns a pinned mutable reference to the item in the entry.
    ///
    /// # Safety
    ///
    /// The caller must ensure that the key of the mutably borrowed item is not modified in a way
    /// that changes the result of comparisons with other keys in the tree.
    pub unsafe fn get_mut(&mut self) -> Pin<&mut T> {
        // SAFETY: `self.tree` is mutably borrowed for `'tree`, and `self.node` is guaranteed pinned
        // by contract with `Linked`.
        unsafe { Pin::new_unchecked(self.node.as_mut()) }
    }

    /// Converts the entry into a pinned mutable reference to its item.
    ///
    /// # Safety
    ///
    /// See [`OccupiedEntry::get_mut`].
    pub unsafe fn into_mut(mut self) -> Pin<&'tree mut T> {
        unsafe { Pin::new_unchecked(self.node.as_mut()) }
    }

    /// Puts `item` in the place of the item in the entry, returning the previous item.
    ///
    /// The new item inherits the position of the previous one; the tree is not restructured.
    ///
    /// # Safety
    ///
    /// The caller must ensure that `item`'s key is equivalent to the key of the existing item.
    pub unsafe fn insert(&mut self, item: T::Handle) -> T::Handle {
        let new_ptr = T::into_ptr(item);
        let old_ptr = self.node;

        // Point this entry at the new item.
        self.node = new_ptr;

        unsafe { self.tree.replace_at(old_ptr, new_ptr) }
    }

    /// Removes and returns the item pointed to by this entry.
    pub fn remove(self) -> T::Handle {
        unsafe { self.tree.remove_at(self.node) }
    }
}

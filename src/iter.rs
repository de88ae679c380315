use core::iter::FusedIterator;

use crate::{AvlTree, Link, Links, TreeNode};

/// An iterator over the elements of an [`AvlTree`], in key order.
///
/// Created by [`AvlTree::iter`].
pub struct Iter<'tree, T: TreeNode<Links<T>> + ?Sized> {
    tree: &'tree AvlTree<T>,

    front: Link<T>,
    back: Link<T>,

    len: usize,
}

impl<'tree, T: TreeNode<Links<T>> + ?Sized> Iter<'tree, T> {
    pub(crate) fn new(tree: &'tree AvlTree<T>) -> Self {
        Iter {
            tree,

            front: tree.first_raw(),
            back: tree.last_raw(),

            len: tree.len(),
        }
    }
}

impl<'tree, T: TreeNode<Links<T>> + ?Sized> Iterator for Iter<'tree, T> {
    type Item = &'tree T;

    fn next(&mut self) -> Option<Self::Item> {
        // The front and back cursors meet once every element has been yielded from either end.
        if self.len == 0 {
            return None;
        }

        let cur = self.front?;
        self.front = unsafe { self.tree.successor_raw(cur) };
        self.len -= 1;

        Some(unsafe { cur.as_ref() })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<'tree, T: TreeNode<Links<T>> + ?Sized> DoubleEndedIterator for Iter<'tree, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }

        let cur = self.back?;
        self.back = unsafe { self.tree.predecessor_raw(cur) };
        self.len -= 1;

        Some(unsafe { cur.as_ref() })
    }
}

impl<'tree, T: TreeNode<Links<T>> + ?Sized> ExactSizeIterator for Iter<'tree, T> {}

impl<'tree, T: TreeNode<Links<T>> + ?Sized> FusedIterator for Iter<'tree, T> {}

impl<'tree, T: TreeNode<Links<T>> + ?Sized> Clone for Iter<'tree, T> {
    fn clone(&self) -> Self {
        Iter {
            tree: self.tree,
            front: self.front,
            back: self.back,
            len: self.len,
        }
    }
}

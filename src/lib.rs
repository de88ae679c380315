//! An intrusive AVL tree.
#![cfg_attr(not(any(test, feature = "std")), no_std)]

// Conventions used in comments:
// - The height of a subtree `x` is denoted `h(x)`; an empty subtree has height 0.
// - The balance factor of a node `x` is denoted `b(x)` and is `h(left(x)) - h(right(x))`. A node is
//   left-heavy if `b(x) > 0` and right-heavy if `b(x) < 0`.
//
// The invariants of an AVL tree are:
// 1. Keys are in symmetric order.
// 2. `b(x) ∈ {-1, 0, 1}` for every node `x`.
//
// During rebalancing a single node may transiently reach `b(x) = ±2`. Balance factors are stored
// relative to a node's position in the tree, not to the item occupying it: any operation that
// moves items between positions must carry the balance factors along with the links.

#[cfg(feature = "alloc")]
extern crate alloc;

use core::{
    borrow::Borrow, cell::UnsafeCell, cmp::Ordering, fmt, marker::PhantomPinned, mem, ops::Not,
    pin::Pin,
    ptr::{self, NonNull},
};

use cordyceps::Linked;

mod balance;
#[cfg(feature = "alloc")]
mod debug;
mod entry;
mod error;
mod iter;
#[cfg(feature = "alloc")]
pub mod map;
#[cfg(any(all(test, feature = "std"), feature = "model"))]
pub mod model;
#[cfg(all(test, feature = "std"))]
mod tests;

use entry::{InsertAs, Slot};

pub use entry::{Entry, OccupiedEntry, VacantEntry};
pub use error::KeyNotFound;
pub use iter::Iter;
#[cfg(feature = "alloc")]
pub use map::AvlMap;

/// A node that can be linked into an [`AvlTree`], exposing the key it is ordered by.
pub trait TreeNode<L>: Linked<L> {
    type Key: Ord + fmt::Debug;

    fn key(&self) -> &Self::Key;
}

/// An intrusive AVL tree.
///
/// Items are kept in key order. Lookup, insertion and removal complete in _O(log(n))_ time.
pub struct AvlTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    root: Link<T>,
    len: usize,
}

/// Links to other nodes in an [`AvlTree`], together with the balance factor of the node's
/// position.
pub struct Links<T: ?Sized> {
    inner: UnsafeCell<LinksInner<T>>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Dir {
    Left = 0,
    Right = 1,
}

impl Dir {
    // The change in the parent's balance factor when the subtree on this side grows by one level.
    #[inline]
    fn weight(self) -> i8 {
        match self {
            Dir::Left => 1,
            Dir::Right => -1,
        }
    }
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
    balance: i8,
    _unpin: PhantomPinned,
}

type Link<T> = Option<NonNull<T>>;

// Node identity is the address alone; pointer metadata is ignored.
#[inline]
fn same_node<T: ?Sized>(a: NonNull<T>, b: NonNull<T>) -> bool {
    ptr::addr_eq(a.as_ptr(), b.as_ptr())
}

#[inline]
fn same_link<T: ?Sized>(a: Link<T>, b: Link<T>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => same_node(a, b),
        (None, None) => true,
        _ => false,
    }
}

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

    /// Returns the height of the tree, i.e. the number of nodes on its longest root-to-leaf path.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut opt_cur = self.root;

        // Every balance factor points at the taller subtree.
        while let Some(cur) = opt_cur {
            height += 1;

            let links = unsafe { self.links(cur) };
            opt_cur = if links.balance() >= 0 {
                links.left()
            } else {
                links.right()
            };
        }

        height
    }

    /// Returns an iterator over the elements of the tree in key order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self)
    }

    #[doc(hidden)]
    pub fn assert_invariants(&self) {
        let Some(root) = self.root else {
            assert_eq!(self.len, 0, "empty tree has nonzero length");
            return;
        };

        unsafe {
            assert_eq!(self.links(root).parent(), None, "root has a parent");

            let (_, count) = self.assert_invariants_at(root, None, None);
            assert_eq!(count, self.len, "length does not match number of linked nodes");
        }
    }

    // Checks the subtree rooted at `node`, whose keys must lie strictly between `lower` and
    // `upper`. Returns the height of the subtree and the number of nodes in it.
    unsafe fn assert_invariants_at(
        &self,
        node: NonNull<T>,
        lower: Option<&T::Key>,
        upper: Option<&T::Key>,
    ) -> (usize, usize) {
        unsafe {
            let key = node.as_ref().key();

            if let Some(lower) = lower {
                assert!(lower < key, "{key:?} is out of order (must be above {lower:?})");
            }

            if let Some(upper) = upper {
                assert!(key < upper, "{key:?} is out of order (must be below {upper:?})");
            }

            let mut heights = [0; 2];
            let mut count = 1;

            for dir in [Dir::Left, Dir::Right] {
                if let Some(child) = self.links(node).child(dir) {
                    // Ensure child's parent link points to this node.
                    let parent = self
                        .links(child)
                        .parent()
                        .expect("child parent pointer not set");
                    assert!(same_node(node, parent), "child parent pointer is stale");

                    let (lower, upper) = match dir {
                        Dir::Left => (lower, Some(key)),
                        Dir::Right => (Some(key), upper),
                    };

                    let (height, child_count) = self.assert_invariants_at(child, lower, upper);
                    heights[dir as usize] = height;
                    count += child_count;
                }
            }

            // Ensure the stored balance factor is exact and within bounds.
            let balance = self.links(node).balance();
            let actual = heights[Dir::Left as usize] as isize - heights[Dir::Right as usize] as isize;
            assert_eq!(balance as isize, actual, "stale balance factor at {key:?}");
            assert!(
                (-1..=1).contains(&balance),
                "{key:?} is unbalanced (balance factor {balance})"
            );

            (1 + heights[0].max(heights[1]), count)
        }
    }

    /// Returns a reference to the node corresponding to `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<Pin<&T>>
    where
        T::Key: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        let ptr = self.get_raw(key)?;
        unsafe { Some(Pin::new_unchecked(ptr.as_ref())) }
    }

    /// Returns a pinned mutable reference to the node corresponding to `key`.
    ///
    /// # Safety
    ///
    /// The caller must ensure that the key of the returned node is not modified in a way that
    /// changes the result of comparisons with the keys of other nodes in the tree.
    pub unsafe fn get_mut<Q>(&mut self, key: &Q) -> Option<Pin<&mut T>>
    where
        T::Key: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        let mut ptr = self.get_raw(key)?;
        unsafe { Some(Pin::new_unchecked(ptr.as_mut())) }
    }

    /// Returns a reference to the node corresponding to `key`, or [`KeyNotFound`] if there is no
    /// such node.
    pub fn lookup<Q>(&self, key: &Q) -> Result<Pin<&T>, KeyNotFound>
    where
        T::Key: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        self.get(key).ok_or(KeyNotFound)
    }

    /// Returns `true` if the tree contains a node corresponding to `key`.
    #[inline]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        T::Key: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        self.get_raw(key).is_some()
    }

    fn get_raw<Q>(&self, key: &Q) -> Link<T>
    where
        T::Key: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        match self.find_slot(key) {
            Slot::Occupied(node) => Some(node),
            Slot::Vacant(_) => None,
        }
    }

    // Descends the tree looking for `key`, returning either the node holding it or the vacant slot
    // where a node holding it would be linked.
    fn find_slot<Q>(&self, key: &Q) -> Slot<T>
    where
        T::Key: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        let Some(mut cur) = self.root else {
            return Slot::Vacant(InsertAs::Root);
        };

        loop {
            let dir = match key.cmp(unsafe { cur.as_ref() }.key().borrow()) {
                Ordering::Less => Dir::Left,
                Ordering::Equal => return Slot::Occupied(cur),
                Ordering::Greater => Dir::Right,
            };

            match unsafe { self.links(cur).child(dir) } {
                Some(child) => cur = child,
                None => return Slot::Vacant(InsertAs::Child { parent: cur, dir }),
            }
        }
    }

    /// Returns the minimum element of the tree.
    pub fn first(&self) -> Option<Pin<&T>> {
        let first = self.first_raw()?;
        unsafe { Some(Pin::new_unchecked(first.as_ref())) }
    }

    /// Returns the maximum element of the tree.
    pub fn last(&self) -> Option<Pin<&T>> {
        let last = self.last_raw()?;
        unsafe { Some(Pin::new_unchecked(last.as_ref())) }
    }

    fn first_raw(&self) -> Link<T> {
        self.root
            .map(|root| unsafe { self.extreme_in_subtree(root, Dir::Left) })
    }

    fn last_raw(&self) -> Link<T> {
        self.root
            .map(|root| unsafe { self.extreme_in_subtree(root, Dir::Right) })
    }

    // Returns the node furthest in direction `dir` in the subtree rooted at `root`.
    #[inline]
    unsafe fn extreme_in_subtree(&self, root: NonNull<T>, dir: Dir) -> NonNull<T> {
        let mut cur = root;

        while let Some(child) = unsafe { self.links(cur).child(dir) } {
            cur = child;
        }

        cur
    }

    /// Returns the element preceding `node` in key order.
    pub(crate) unsafe fn predecessor_raw(&self, node: NonNull<T>) -> Link<T> {
        unsafe { self.neighbor_raw(node, Dir::Left) }
    }

    /// Returns the element following `node` in key order.
    pub(crate) unsafe fn successor_raw(&self, node: NonNull<T>) -> Link<T> {
        unsafe { self.neighbor_raw(node, Dir::Right) }
    }

    unsafe fn neighbor_raw(&self, node: NonNull<T>, dir: Dir) -> Link<T> {
        unsafe {
            if let Some(child) = self.links(node).child(dir) {
                return Some(self.extreme_in_subtree(child, !dir));
            }

            // Ascend until arriving at a parent from its `!dir` side.
            let mut cur = node;
            loop {
                let parent = self.links(cur).parent()?;

                if self.which_child(parent, cur) == !dir {
                    return Some(parent);
                }

                cur = parent;
            }
        }
    }

    unsafe fn maybe_set_parent(&mut self, opt_node: Link<T>, parent: Link<T>) {
        let Some(node) = opt_node else {
            return;
        };

        unsafe { self.links_mut(node).set_parent(parent) };
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

    // Replaces the child pointer of `parent` pointing at `old_child` with `new_child`.
    //
    // `new_child`'s parent pointer is not updated.
    //
    // # Safety
    //
    // The caller must ensure that `old_child` is a child node of `parent`.
    #[inline]
    unsafe fn replace_child(
        &mut self,
        parent: NonNull<T>,
        old_child: NonNull<T>,
        new_child: Link<T>,
    ) {
        unsafe {
            let dir = self.which_child(parent, old_child);
            debug_assert!(
                same_link(self.links(parent).child(dir), Some(old_child)),
                "`old_child` must be a child of `parent`"
            );

            self.links_mut(parent).set_child(dir, new_child);
        }
    }

    /// Inserts an item into the tree.
    ///
    /// If the tree already contains an item with an equal key, `item` takes its place and the
    /// previous item is returned. The shape of the tree is left unchanged in that case.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn insert(&mut self, item: T::Handle) -> Option<T::Handle> {
        let ptr = T::into_ptr(item);
        let slot = self.find_slot(unsafe { ptr.as_ref() }.key());

        unsafe {
            match slot {
                Slot::Occupied(old) => Some(self.replace_at(old, ptr)),
                Slot::Vacant(insert_as) => {
                    self.link_at(insert_as, ptr);
                    None
                }
            }
        }
    }

    /// Returns a view into the slot of the tree corresponding to `key`.
    pub fn entry<Q>(&mut self, key: &Q) -> Entry<'_, T>
    where
        T::Key: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        match self.find_slot(key) {
            Slot::Occupied(node) => Entry::Occupied(OccupiedEntry { tree: self, node }),
            Slot::Vacant(insert_as) => Entry::Vacant(VacantEntry {
                tree: self,
                insert_as,
            }),
        }
    }

    // Links the unlinked node `ptr` into the vacant slot `insert_as`, then restores balance.
    unsafe fn link_at(&mut self, insert_as: InsertAs<T>, ptr: NonNull<T>) {
        unsafe {
            let links = self.links_mut(ptr);
            links.clear();

            match insert_as {
                InsertAs::Root => {
                    debug_assert!(self.root.is_none(), "tree must be empty to insert a root");
                    self.root = Some(ptr);
                }

                InsertAs::Child { parent, dir } => {
                    links.set_parent(Some(parent));
                    let prev = self.links_mut(parent).set_child(dir, Some(ptr));
                    debug_assert!(prev.is_none(), "insertion slot must be vacant");

                    self.rebalance_inserted(ptr);
                }
            }
        }

        self.len += 1;
    }

    // Puts the unlinked node `new` in the position of the linked node `old`, inheriting its links
    // and balance factor. `old` is unlinked and returned.
    unsafe fn replace_at(&mut self, old: NonNull<T>, new: NonNull<T>) -> T::Handle {
        unsafe {
            let old_links = self.links(old);
            let parent = old_links.parent();
            let left = old_links.left();
            let right = old_links.right();
            let balance = old_links.balance();

            self.replace_child_or_set_root(parent, old, Some(new));
            self.maybe_set_parent(left, Some(new));
            self.maybe_set_parent(right, Some(new));

            let new_links = self.links_mut(new);
            new_links.set_parent(parent);
            new_links.set_left(left);
            new_links.set_right(right);
            new_links.set_balance(balance);

            self.links_mut(old).clear();

            T::from_ptr(old)
        }
    }

    // Performs a bottom-up rebalance of the tree after the insertion of the leaf `node`.
    //
    // On each iteration, the subtree rooted at `child` has grown by one level.
    fn rebalance_inserted(&mut self, node: NonNull<T>) {
        let mut child = node;

        unsafe {
            while let Some(parent) = self.links(child).parent() {
                let dir = self.which_child(parent, child);

                match self.adjust_balance(parent, dir.weight()) {
                    // The shorter side caught up, so the height of `parent` is unchanged.
                    0 => return,

                    // `parent` has grown as well.
                    1 | -1 => child = parent,

                    // Rotating restores the height `parent` had before the insertion.
                    _ => {
                        self.rebalance(parent);
                        return;
                    }
                }
            }
        }
    }

    /// Removes the item corresponding to `key` from the tree and returns it.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<T::Handle>
    where
        T::Key: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        let node = self.get_raw(key)?;
        Some(unsafe { self.remove_at(node) })
    }

    /// Removes and returns the minimum element of the tree.
    pub fn pop_first(&mut self) -> Option<T::Handle> {
        let first = self.first_raw()?;
        Some(unsafe { self.remove_at(first) })
    }

    /// Removes and returns the maximum element of the tree.
    pub fn pop_last(&mut self) -> Option<T::Handle> {
        let last = self.last_raw()?;
        Some(unsafe { self.remove_at(last) })
    }

    /// Removes an arbitrary node from the tree.
    ///
    /// # Safety
    ///
    /// It is the caller's responsibility to ensure that `node` is an element of `self`, and not any
    /// other tree.
    pub unsafe fn remove_at(&mut self, node: NonNull<T>) -> T::Handle {
        unsafe {
            // A node with two children first trades places with its predecessor, the maximum of its
            // left subtree, which has no right child. Either way `node` then has at most one child
            // and can be spliced out.
            if let (Some(left), Some(_)) = (self.links(node).left(), self.links(node).right()) {
                let predecessor = self.extreme_in_subtree(left, Dir::Right);

                tracing::trace!(
                    key = ?node.as_ref().key(),
                    predecessor = ?predecessor.as_ref().key(),
                    "swapping removed node with its predecessor"
                );

                self.swap_positions(node, predecessor);
            }

            let links = self.links(node);
            let parent = links.parent();
            debug_assert!(links.left().is_none() || links.right().is_none());
            let child = links.left().or(links.right());

            let side = parent.map(|p| self.which_child(p, node));
            self.replace_child_or_set_root(parent, node, child);
            self.maybe_set_parent(child, parent);

            self.links_mut(node).clear();
            self.len -= 1;

            if let (Some(parent), Some(side)) = (parent, side) {
                self.rebalance_removed(parent, side);
            }

            T::from_ptr(node)
        }
    }

    // Performs a bottom-up rebalance of the tree after a node was spliced out of the `dir` subtree
    // of `parent`.
    //
    // On each iteration, the `dir` subtree of `node` has shrunk by one level.
    fn rebalance_removed(&mut self, parent: NonNull<T>, dir: Dir) {
        let mut node = parent;
        let mut dir = dir;

        unsafe {
            loop {
                let top = match self.adjust_balance(node, -dir.weight()) {
                    // `node` was balanced before, so its height is unchanged.
                    1 | -1 => return,

                    // `node` lost its taller side and has shrunk.
                    0 => node,

                    _ => {
                        let top = self.rebalance(node);

                        // If the sibling subtree was balanced, the rotation leaves the new subtree
                        // root leaning and the height unchanged. Otherwise the subtree has shrunk.
                        if self.balance(top) != 0 {
                            return;
                        }

                        top
                    }
                };

                let Some(parent) = self.links(top).parent() else {
                    return;
                };

                dir = self.which_child(parent, top);
                node = parent;
            }
        }
    }

    // Exchanges the positions of the linked nodes `a` and `b` in the tree, including their balance
    // factors, which describe the positions rather than the items.
    //
    // The nodes may be adjacent.
    unsafe fn swap_positions(&mut self, a: NonNull<T>, b: NonNull<T>) {
        if same_node(a, b) {
            return;
        }

        unsafe {
            let a_parent = self.links(a).parent();
            let b_parent = self.links(b).parent();
            let a_side = a_parent.map(|p| self.which_child(p, a));
            let b_side = b_parent.map(|p| self.which_child(p, b));

            mem::swap(
                self.links_mut(a).inner.get_mut(),
                self.links_mut(b).inner.get_mut(),
            );

            // If the nodes were adjacent, each now points at itself where it should point at the
            // other.
            let flip = move |link: Link<T>| match link {
                Some(n) if same_node(n, a) => Some(b),
                Some(n) if same_node(n, b) => Some(a),
                other => other,
            };

            for node in [a, b] {
                let links = self.links_mut(node);
                links.set_parent(flip(links.parent()));

                for dir in [Dir::Left, Dir::Right] {
                    links.set_child(dir, flip(links.child(dir)));
                }
            }

            // Point the outside parents at the swapped nodes.
            if !same_link(a_parent, Some(b)) {
                match (a_parent, a_side) {
                    (Some(p), Some(side)) => {
                        self.links_mut(p).set_child(side, Some(b));
                    }
                    _ => self.root = Some(b),
                }
            }

            if !same_link(b_parent, Some(a)) {
                match (b_parent, b_side) {
                    (Some(p), Some(side)) => {
                        self.links_mut(p).set_child(side, Some(a));
                    }
                    _ => self.root = Some(a),
                }
            }

            // Point the children at their new parents.
            for node in [a, b] {
                for dir in [Dir::Left, Dir::Right] {
                    let child = self.links(node).child(dir);
                    self.maybe_set_parent(child, Some(node));
                }
            }
        }
    }

    /// Clears the tree, removing all elements.
    pub fn clear(&mut self) {
        let mut opt_cur = self.root.take();

        // Dismantle the tree bottom-up: descend until reaching a node whose subtrees are gone, drop
        // it, and climb back to its parent.
        while let Some(cur) = opt_cur {
            unsafe {
                let links = self.links_mut(cur);

                if let Some(left) = links.set_left(None) {
                    opt_cur = Some(left);
                    continue;
                }

                if let Some(right) = links.set_right(None) {
                    opt_cur = Some(right);
                    continue;
                }

                opt_cur = links.set_parent(None);

                drop(T::from_ptr(cur));
                self.len -= 1;
            }
        }

        debug_assert!(self.root.is_none());
        debug_assert_eq!(self.len(), 0);
    }

    // Support methods ========================================================

    #[inline]
    unsafe fn links<'a>(&self, node: NonNull<T>) -> &'a Links<T> {
        unsafe { T::links(node).as_ref() }
    }

    #[inline]
    unsafe fn links_mut<'a>(&mut self, node: NonNull<T>) -> &'a mut Links<T> {
        unsafe { T::links(node).as_mut() }
    }

    /// Returns the balance factor of the pointed-to node.
    #[inline]
    unsafe fn balance(&self, node: NonNull<T>) -> i8 {
        unsafe { self.links(node).balance() }
    }

    #[inline]
    unsafe fn set_balance(&mut self, node: NonNull<T>, balance: i8) {
        unsafe { self.links_mut(node).set_balance(balance) }
    }

    /// Adds `delta` to the balance factor of the pointed-to node, returning the new value.
    #[inline]
    unsafe fn adjust_balance(&mut self, node: NonNull<T>, delta: i8) -> i8 {
        unsafe {
            let links = self.links_mut(node);
            let balance = links.balance().checked_add(delta).unwrap();
            links.set_balance(balance);
            balance
        }
    }

    unsafe fn which_child(&self, parent: NonNull<T>, child: NonNull<T>) -> Dir {
        if same_link(unsafe { self.links(parent).left() }, Some(child)) {
            Dir::Left
        } else {
            Dir::Right
        }
    }
}

impl<T> Default for AvlTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    fn default() -> Self {
        Self::new()
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

impl<'tree, T> IntoIterator for &'tree AvlTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    type Item = &'tree T;
    type IntoIter = Iter<'tree, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: ?Sized> Links<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: UnsafeCell::new(LinksInner {
                parent: None,
                children: [None; 2],
                balance: 0,
                _unpin: PhantomPinned,
            }),
        }
    }

    #[inline]
    fn clear(&mut self) {
        let inner = self.inner.get_mut();
        inner.parent = None;
        inner.children = [None; 2];
        inner.balance = 0;
    }

    #[inline]
    fn balance(&self) -> i8 {
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
    fn set_balance(&mut self, balance: i8) {
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
            .field("parent", &self.parent())
            .field("left", &self.left())
            .field("right", &self.right())
            .field("balance", &self.balance())
            .finish()
    }
}

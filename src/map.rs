//! An owning ordered map built on [`AvlTree`].

use alloc::boxed::Box;
use core::{
    borrow::Borrow, fmt, iter::FusedIterator, marker::PhantomPinned, mem, ops::Index, ptr::NonNull,
};

use cordyceps::Linked;

use crate::{AvlTree, Entry, KeyNotFound, Links, TreeNode};

/// An ordered map based on an [AVL tree].
///
/// [AVL tree]: https://en.wikipedia.org/wiki/AVL_tree
pub struct AvlMap<K: Ord + fmt::Debug, V> {
    tree: AvlTree<MapNode<K, V>>,
}

struct MapNode<K, V> {
    links: Links<MapNode<K, V>>,
    key: K,
    value: V,
    _unpin: PhantomPinned,
}

impl<K, V> MapNode<K, V> {
    fn new(key: K, value: V) -> Box<Self> {
        Box::new(MapNode {
            links: Links::new(),
            key,
            value,
            _unpin: PhantomPinned,
        })
    }
}

unsafe impl<K, V> Linked<Links<MapNode<K, V>>> for MapNode<K, V> {
    type Handle = Box<Self>;

    fn into_ptr(r: Self::Handle) -> NonNull<Self> {
        Box::leak(r).into()
    }

    unsafe fn from_ptr(ptr: NonNull<Self>) -> Self::Handle {
        unsafe { Box::from_raw(ptr.as_ptr()) }
    }

    unsafe fn links(ptr: NonNull<Self>) -> NonNull<Links<MapNode<K, V>>> {
        let ptr = ptr.as_ptr();
        unsafe { NonNull::new_unchecked(core::ptr::addr_of_mut!((*ptr).links)) }
    }
}

impl<K: Ord + fmt::Debug, V> TreeNode<Links<MapNode<K, V>>> for MapNode<K, V> {
    type Key = K;

    fn key(&self) -> &Self::Key {
        &self.key
    }
}

// SAFETY: The map exclusively owns its nodes; the links are never shared outside of it.
unsafe impl<K: Ord + fmt::Debug + Send, V: Send> Send for AvlMap<K, V> {}
unsafe impl<K: Ord + fmt::Debug + Sync, V: Sync> Sync for AvlMap<K, V> {}

impl<K: Ord + fmt::Debug, V> AvlMap<K, V> {
    /// Creates a new, empty `AvlMap`.
    pub const fn new() -> Self {
        Self {
            tree: AvlTree::new(),
        }
    }

    /// Returns `true` if the map contains no elements.
    pub const fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Returns the number of elements in the map.
    pub const fn len(&self) -> usize {
        self.tree.len()
    }

    /// Returns the height of the underlying tree.
    pub fn height(&self) -> usize {
        self.tree.height()
    }

    /// Returns `true` if the map contains a value associated with `key`.
    #[inline]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.contains_key(key)
    }

    /// Returns a reference to the value associated with `key`.
    #[inline]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.get(key).map(|node| &node.get_ref().value)
    }

    /// Returns a mutable reference to the value associated with `key`.
    #[inline]
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        // SAFETY: The key is not handed out mutably, and pinning is not structural for
        // `node.value`.
        unsafe {
            self.tree
                .get_mut(key)
                .map(|node| &mut node.get_unchecked_mut().value)
        }
    }

    /// Returns a reference to the value associated with `key`.
    ///
    /// # Errors
    ///
    /// Returns [`KeyNotFound`] if the map contains no value for `key`.
    #[inline]
    pub fn lookup<Q>(&self, key: &Q) -> Result<&V, KeyNotFound>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get(key).ok_or(KeyNotFound)
    }

    /// Inserts a key-value pair into the map.
    ///
    /// If the map already contains `key`, its value is overwritten in place and the previous value
    /// is returned. The key itself is not updated.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.tree.entry(&key) {
            Entry::Occupied(mut entry) => {
                // SAFETY: Only the value is modified, and pinning is not structural for it.
                let node = unsafe { entry.get_mut().get_unchecked_mut() };
                Some(mem::replace(&mut node.value, value))
            }

            Entry::Vacant(entry) => {
                // SAFETY: The entry was retrieved with `key`.
                unsafe { entry.insert(MapNode::new(key, value)) };
                None
            }
        }
    }

    /// Removes the value associated with `key` from the map.
    #[inline]
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.remove(key).map(|node| node.value)
    }

    /// Returns the first key-value pair in the map.
    ///
    /// The returned key is the minimum key in the map.
    #[inline]
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.tree.first().map(|node| {
            let node = node.get_ref();
            (&node.key, &node.value)
        })
    }

    /// Removes and returns the first key-value pair in the map.
    ///
    /// The returned key is the minimum key in the map.
    #[inline]
    pub fn pop_first(&mut self) -> Option<(K, V)> {
        self.tree.pop_first().map(|node| {
            let MapNode { key, value, .. } = *node;
            (key, value)
        })
    }

    /// Returns the last key-value pair in the map.
    ///
    /// The returned key is the maximum key in the map.
    #[inline]
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.tree.last().map(|node| {
            let node = node.get_ref();
            (&node.key, &node.value)
        })
    }

    /// Removes and returns the last key-value pair in the map.
    ///
    /// The returned key is the maximum key in the map.
    #[inline]
    pub fn pop_last(&mut self) -> Option<(K, V)> {
        self.tree.pop_last().map(|node| {
            let MapNode { key, value, .. } = *node;
            (key, value)
        })
    }

    /// Clears the map, removing all elements.
    #[inline]
    pub fn clear(&mut self) {
        self.tree.clear();
    }

    /// Returns an iterator over the entries of the map, sorted by key.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.tree.iter(),
        }
    }

    /// Returns an iterator over the keys of the map, in sorted order.
    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &K> + ExactSizeIterator + '_ {
        self.iter().map(|(key, _)| key)
    }

    /// Returns an iterator over the values of the map, in order by key.
    pub fn values(&self) -> impl DoubleEndedIterator<Item = &V> + ExactSizeIterator + '_ {
        self.iter().map(|(_, value)| value)
    }

    /// Writes the shape of the underlying tree to `w` in the Graphviz dot format.
    pub fn dotgraph<W>(&self, name: &str, w: W) -> fmt::Result
    where
        W: fmt::Write,
        K: fmt::Display,
    {
        self.tree.dotgraph(name, w)
    }

    #[doc(hidden)]
    pub fn assert_invariants(&self) {
        self.tree.assert_invariants();
    }
}

impl<K: Ord + fmt::Debug, V> Default for AvlMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + fmt::Debug, V: fmt::Debug> fmt::Debug for AvlMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, Q, V> Index<&Q> for AvlMap<K, V>
where
    K: Borrow<Q> + Ord + fmt::Debug,
    Q: Ord + ?Sized,
{
    type Output = V;

    /// Returns a reference to the value associated with `key`.
    ///
    /// # Panics
    ///
    /// Panics if the key is not present in the map.
    fn index(&self, key: &Q) -> &V {
        self.get(key).expect("no entry found for key")
    }
}

impl<K: Ord + fmt::Debug, V> FromIterator<(K, V)> for AvlMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = AvlMap::new();
        map.extend(iter);
        map
    }
}

impl<K: Ord + fmt::Debug, V> Extend<(K, V)> for AvlMap<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<'a, K: Ord + fmt::Debug, V> IntoIterator for &'a AvlMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An iterator over the entries of an [`AvlMap`], sorted by key.
///
/// Created by [`AvlMap::iter`].
pub struct Iter<'a, K: Ord + fmt::Debug, V> {
    inner: crate::Iter<'a, MapNode<K, V>>,
}

impl<'a, K: Ord + fmt::Debug, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|node| (&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, K: Ord + fmt::Debug, V> DoubleEndedIterator for Iter<'a, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|node| (&node.key, &node.value))
    }
}

impl<'a, K: Ord + fmt::Debug, V> ExactSizeIterator for Iter<'a, K, V> {}

impl<'a, K: Ord + fmt::Debug, V> FusedIterator for Iter<'a, K, V> {}

impl<'a, K: Ord + fmt::Debug, V> Clone for Iter<'a, K, V> {
    fn clone(&self) -> Self {
        Iter {
            inner: self.inner.clone(),
        }
    }
}

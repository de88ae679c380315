extern crate std;

use std::{ops::Range, prelude::v1::*, ptr::NonNull, rc::Rc};

use proptest::prelude::*;

use crate::model::{self, TestNode};

use super::*;

fn permutations(n: u32) -> Vec<Vec<u32>> {
    fn permute(prefix: &mut Vec<u32>, rest: &mut Vec<u32>, out: &mut Vec<Vec<u32>>) {
        if rest.is_empty() {
            out.push(prefix.clone());
            return;
        }

        for i in 0..rest.len() {
            let key = rest.remove(i);
            prefix.push(key);
            permute(prefix, rest, out);
            prefix.pop();
            rest.insert(i, key);
        }
    }

    let mut out = Vec::new();
    permute(&mut Vec::new(), &mut (0..n).collect(), &mut out);
    out
}

fn tree_of(keys: &[u32]) -> AvlTree<TestNode> {
    let mut tree: AvlTree<TestNode> = AvlTree::new();

    for &key in keys {
        assert!(tree.insert(TestNode::new(key)).is_none());
        tree.assert_invariants();
    }

    tree
}

fn keys(tree: &AvlTree<TestNode>) -> Vec<u32> {
    tree.iter().map(|node| node.key).collect()
}

fn root_key(tree: &AvlTree<TestNode>) -> Option<u32> {
    tree.root.map(|root| unsafe { root.as_ref().key })
}

// Returns the keys of the children of the node holding `key`, and its balance factor.
fn describe(tree: &AvlTree<TestNode>, key: u32) -> (Option<u32>, Option<u32>, i8) {
    let node = tree.get_raw(&key).expect("item not found");

    unsafe {
        let links = tree.links(node);
        (
            links.left().map(|n| n.as_ref().key),
            links.right().map(|n| n.as_ref().key),
            links.balance(),
        )
    }
}

// Returns the keys of a Fibonacci tree of the given height, in breadth-first order. Every internal
// node of a Fibonacci tree is left-heavy, so inserting the keys in this order builds it without any
// rotations.
fn fibonacci_tree(height: usize) -> Vec<u32> {
    fn build(height: usize, depth: usize, next: &mut u32, levels: &mut Vec<Vec<u32>>) {
        if height == 0 {
            return;
        }

        if levels.len() <= depth {
            levels.push(Vec::new());
        }

        build(height - 1, depth + 1, next, levels);
        levels[depth].push(*next);
        *next += 1;

        if height >= 2 {
            build(height - 2, depth + 1, next, levels);
        }
    }

    let mut levels = Vec::new();
    build(height, 0, &mut 0, &mut levels);
    levels.concat()
}

fn insert_find_all(keys: &[u32]) {
    let tree = tree_of(keys);

    for key in keys {
        let node = tree.get_raw(key).expect("item not found");
        assert_eq!(unsafe { node.as_ref().key() }, key);
    }

    assert_eq!(tree.len(), keys.len());
}

#[test]
fn zero_elems_find() {
    insert_find_all(&[]);
}

#[test]
fn single_elem_find() {
    insert_find_all(&[0]);
}

#[test]
fn all_orders_find() {
    for n in 2..=6 {
        for keys in permutations(n) {
            insert_find_all(&keys);
        }
    }
}

fn insert_remove_all(keys: &[u32], removals: &[u32]) {
    let mut tree = tree_of(keys);

    for key in removals {
        let node = tree.remove(key).expect("item not found");
        assert_eq!(node.key, *key);
        assert!(!tree.contains_key(key));
        tree.assert_invariants();
    }

    assert!(tree.is_empty());
    assert_eq!(tree.height(), 0);
}

#[test]
fn remove_one() {
    insert_remove_all(&[0], &[0]);
}

#[test]
fn remove_all_orders() {
    for n in 2..=5 {
        let orders = permutations(n);

        for keys in &orders {
            for removals in &orders {
                insert_remove_all(keys, removals);
            }
        }
    }
}

#[test]
fn remove_six_elements() {
    for keys in permutations(6) {
        let reversed: Vec<u32> = keys.iter().rev().copied().collect();

        insert_remove_all(&keys, &keys);
        insert_remove_all(&keys, &reversed);
    }
}

#[test]
fn remove_absent_key() {
    let mut tree = tree_of(&[1, 2, 3]);

    assert!(tree.remove(&4).is_none());
    assert!(tree.remove(&0).is_none());
    assert_eq!(keys(&tree), [1, 2, 3]);
    tree.assert_invariants();

    let mut empty: AvlTree<TestNode> = AvlTree::new();
    assert!(empty.remove(&1).is_none());
    assert!(empty.pop_first().is_none());
    assert!(empty.pop_last().is_none());
}

#[test]
fn ascending_inserts_build_perfect_tree() {
    let tree = tree_of(&[1, 2, 3, 4, 5, 6, 7]);

    assert_eq!(tree.height(), 3);
    assert_eq!(root_key(&tree), Some(4));
    assert_eq!(describe(&tree, 4), (Some(2), Some(6), 0));
    assert_eq!(describe(&tree, 2), (Some(1), Some(3), 0));
    assert_eq!(describe(&tree, 6), (Some(5), Some(7), 0));
}

#[test]
fn left_left_insert_rotates_right() {
    let tree = tree_of(&[3, 2, 1]);

    assert_eq!(root_key(&tree), Some(2));
    assert_eq!(describe(&tree, 2), (Some(1), Some(3), 0));
    assert_eq!(describe(&tree, 1), (None, None, 0));
    assert_eq!(describe(&tree, 3), (None, None, 0));
}

#[test]
fn left_right_insert_rotates_twice() {
    let tree = tree_of(&[1, 3, 2]);

    assert_eq!(root_key(&tree), Some(2));
    assert_eq!(describe(&tree, 2), (Some(1), Some(3), 0));
    assert_eq!(describe(&tree, 1), (None, None, 0));
    assert_eq!(describe(&tree, 3), (None, None, 0));
}

#[test]
fn right_cases_mirror_left_cases() {
    for keys in [[1, 2, 3], [3, 1, 2]] {
        let tree = tree_of(&keys);

        assert_eq!(root_key(&tree), Some(2));
        assert_eq!(describe(&tree, 2), (Some(1), Some(3), 0));
    }
}

#[test]
fn double_rotation_keeps_grandchild_subtrees() {
    // Inserting 6 makes 8 doubly left-heavy with a right-heavy left child: 5 is raised above both.
    let tree = tree_of(&[8, 3, 9, 1, 5, 6]);

    assert_eq!(root_key(&tree), Some(5));
    assert_eq!(describe(&tree, 5), (Some(3), Some(8), 0));
    assert_eq!(describe(&tree, 3), (Some(1), None, 1));
    assert_eq!(describe(&tree, 8), (Some(6), Some(9), 0));
}

#[test]
fn remove_leaf_from_perfect_tree() {
    let mut tree = tree_of(&[1, 2, 3, 4, 5, 6, 7]);

    assert_eq!(tree.remove(&1).map(|node| node.key), Some(1));
    tree.assert_invariants();

    assert_eq!(keys(&tree), [2, 3, 4, 5, 6, 7]);
    assert_eq!(root_key(&tree), Some(4));
    assert_eq!(tree.height(), 3);
    assert_eq!(describe(&tree, 2), (None, Some(3), -1));
    assert_eq!(describe(&tree, 4), (Some(2), Some(6), 0));
}

#[test]
fn removal_rotation_stops_when_height_is_kept() {
    let mut tree = tree_of(&[1, 2, 3, 4, 5, 6, 7]);

    for key in [1, 3, 2] {
        tree.remove(&key);
        tree.assert_invariants();
    }

    // Removing 2 left 4 doubly right-heavy over a balanced child.
    assert_eq!(root_key(&tree), Some(6));
    assert_eq!(describe(&tree, 6), (Some(4), Some(7), 1));
    assert_eq!(describe(&tree, 4), (None, Some(5), -1));
    assert_eq!(tree.height(), 3);
}

#[test]
fn removal_rotations_propagate_to_root() {
    let keys = fibonacci_tree(6);
    let mut tree = tree_of(&keys);
    assert_eq!(tree.len(), 20);
    assert_eq!(tree.height(), 6);

    // Removing the maximum shortens the right spine, which unbalances every node on it.
    let max = *keys.iter().max().unwrap();
    tree.remove(&max);
    tree.assert_invariants();

    assert_eq!(tree.height(), 5);
    assert_eq!(tree.len(), 19);
}

#[test]
fn two_child_removal_swaps_positions() {
    let mut tree = tree_of(&[1, 2, 3, 4, 5, 6, 7]);
    let predecessor = tree.get_raw(&3).unwrap();

    let removed = tree.remove(&4).expect("item not found");
    tree.assert_invariants();

    // The predecessor node itself now occupies the root, and the removed node is unlinked.
    assert_eq!(removed.key, 4);
    assert_eq!(removed.links.parent(), None);
    assert_eq!(removed.links.left(), None);
    assert_eq!(removed.links.right(), None);

    assert_eq!(tree.root, Some(predecessor));
    assert_eq!(describe(&tree, 3), (Some(2), Some(6), 0));
    assert_eq!(describe(&tree, 2), (Some(1), None, 1));
}

#[test]
fn swap_positions_carries_balance() {
    let mut tree = tree_of(&[4, 2, 6, 1, 3, 5, 7, 8]);
    let four = tree.get_raw(&4).unwrap();
    let three = tree.get_raw(&3).unwrap();
    let two = tree.get_raw(&2).unwrap();
    let one = tree.get_raw(&1).unwrap();

    unsafe {
        // Distant nodes: the root and a leaf.
        tree.swap_positions(four, three);
        assert_eq!(tree.root, Some(three));
        assert_eq!(tree.links(three).parent(), None);
        assert_eq!(tree.links(three).balance(), -1);
        assert_eq!(tree.links(four).parent(), Some(two));
        assert_eq!(tree.links(four).balance(), 0);
        assert_eq!(tree.links(two).right(), Some(four));
        assert_eq!(tree.links(two).parent(), Some(three));

        tree.swap_positions(three, four);
        tree.assert_invariants();

        // Adjacent nodes: a parent and its child.
        tree.swap_positions(two, one);
        assert_eq!(tree.links(four).left(), Some(one));
        assert_eq!(tree.links(one).left(), Some(two));
        assert_eq!(tree.links(two).parent(), Some(one));
        assert_eq!(tree.links(two).left(), None);
        assert_eq!(tree.links(three).parent(), Some(one));

        tree.swap_positions(one, two);
        tree.assert_invariants();

        // Siblings: both children of the same parent.
        tree.swap_positions(one, three);
        assert_eq!(tree.links(two).left(), Some(three));
        assert_eq!(tree.links(two).right(), Some(one));
        assert_eq!(tree.links(one).parent(), Some(two));
        assert_eq!(tree.links(three).parent(), Some(two));

        tree.swap_positions(three, one);
        tree.assert_invariants();
    }

    assert_eq!(keys(&tree), [1, 2, 3, 4, 5, 6, 7, 8]);
}

#[test]
fn node_identity_ignores_metadata() {
    let items = [1u8, 2, 3];
    let short = NonNull::from(&items[..2]);
    let long = NonNull::from(&items[..]);

    assert!(same_node(short, long));
    assert!(same_link(Some(short), Some(long)));
    assert!(!same_node(NonNull::from(&items[1..]), long));
    assert!(!same_link(None, Some(long)));
    assert!(same_link::<[u8]>(None, None));
}

#[test]
fn insert_replaces_equal_key() {
    let mut tree: AvlTree<TestNode> = AvlTree::new();
    for key in 1..=7 {
        tree.insert(TestNode::with_value(key, 1));
    }

    let before: Vec<_> = (1..=7).map(|key| describe(&tree, key)).collect();

    let old = tree.insert(TestNode::with_value(4, 2)).expect("no item replaced");
    tree.assert_invariants();

    assert_eq!((old.key, old.value), (4, 1));
    assert_eq!(old.links.parent(), None);
    assert_eq!(tree.get(&4).map(|node| node.value), Some(2));
    assert_eq!(tree.len(), 7);

    // The shape is unchanged.
    let after: Vec<_> = (1..=7).map(|key| describe(&tree, key)).collect();
    assert_eq!(before, after);
}

#[test]
fn lookup_reports_missing_key() {
    let tree = tree_of(&[1, 2, 3]);

    assert_eq!(tree.lookup(&2).map(|node| node.key), Ok(2));
    assert_eq!(tree.lookup(&4).map(|node| node.key), Err(KeyNotFound));
}

#[test]
fn entry_api() {
    let mut tree = tree_of(&[1, 3]);

    match tree.entry(&2) {
        Entry::Vacant(entry) => {
            let node = unsafe { entry.insert(TestNode::with_value(2, 20)) };
            assert_eq!(node.value, 20);
        }
        Entry::Occupied(_) => panic!("2 is not in the tree"),
    }
    tree.assert_invariants();

    match tree.entry(&2) {
        Entry::Occupied(mut entry) => {
            assert_eq!(entry.get().value, 20);

            let old = unsafe { entry.insert(TestNode::with_value(2, 21)) };
            assert_eq!(old.value, 20);
            assert_eq!(entry.get().value, 21);
        }
        Entry::Vacant(_) => panic!("2 is in the tree"),
    }
    tree.assert_invariants();

    match tree.entry(&3) {
        Entry::Occupied(entry) => assert_eq!(entry.remove().key, 3),
        Entry::Vacant(_) => panic!("3 is in the tree"),
    }
    tree.assert_invariants();

    assert_eq!(keys(&tree), [1, 2]);
    assert_eq!(tree.get(&2).map(|node| node.value), Some(21));
}

#[test]
fn first_last_and_pop() {
    let mut tree = tree_of(&[5, 3, 8, 1, 4]);

    assert_eq!(tree.first().map(|node| node.key), Some(1));
    assert_eq!(tree.last().map(|node| node.key), Some(8));

    assert_eq!(tree.pop_first().map(|node| node.key), Some(1));
    tree.assert_invariants();
    assert_eq!(tree.pop_last().map(|node| node.key), Some(8));
    tree.assert_invariants();

    assert_eq!(keys(&tree), [3, 4, 5]);
}

#[test]
fn iter_both_ends() {
    let tree = tree_of(&[4, 2, 6, 1, 3, 5, 7]);

    let rev: Vec<u32> = tree.iter().rev().map(|node| node.key).collect();
    assert_eq!(rev, [7, 6, 5, 4, 3, 2, 1]);

    let mut iter = tree.iter();
    assert_eq!(iter.len(), 7);
    assert_eq!(iter.next().map(|node| node.key), Some(1));
    assert_eq!(iter.next_back().map(|node| node.key), Some(7));
    assert_eq!(iter.next().map(|node| node.key), Some(2));
    assert_eq!(iter.next_back().map(|node| node.key), Some(6));
    assert_eq!(iter.len(), 3);

    let rest: Vec<u32> = iter.map(|node| node.key).collect();
    assert_eq!(rest, [3, 4, 5]);

    // Iteration can be restarted and yields the same sequence.
    assert_eq!(keys(&tree), (1..=7).collect::<Vec<_>>());
    assert_eq!((&tree).into_iter().count(), 7);
}

#[test]
fn clear_empties_tree() {
    let mut tree = tree_of(&fibonacci_tree(5));
    assert_eq!(tree.len(), 12);

    tree.clear();
    tree.assert_invariants();
    assert!(tree.is_empty());
    assert!(tree.iter().next().is_none());

    // The tree is usable after clearing.
    tree.insert(TestNode::new(1));
    tree.assert_invariants();
    assert_eq!(keys(&tree), [1]);
}

#[test]
fn dotgraph_labels_balance() {
    let tree = tree_of(&[2, 1, 3, 4]);
    let mut out = String::new();
    tree.dotgraph("test", &mut out).unwrap();

    assert!(out.starts_with("digraph \"graph-test\""));
    assert!(out.contains("\"graphtest-2\" [label=\"2:-1\"]"));
    assert!(out.contains("\"graphtest-3\" [label=\"3:-1\"]"));
    assert!(out.contains("\"graphtest-4\" [label=\"4:0\"]"));
    assert!(out.contains("\"graphtest-2\" -> \"graphtest-1\";"));
    assert!(out.contains("\"graphtest-3\" -> \"graphtest-4\";"));

    let mut empty = String::new();
    AvlTree::<TestNode>::new().dotgraph("empty", &mut empty).unwrap();
    assert_eq!(empty, "digraph \"graph-empty\" {}");
}

#[test]
fn map_overwrite_keeps_one_entry() {
    let mut map = AvlMap::new();

    assert_eq!(map.insert(7, "first"), None);
    assert_eq!(map.insert(7, "second"), Some("first"));
    map.assert_invariants();

    assert_eq!(map.len(), 1);
    assert_eq!(map.get(&7), Some(&"second"));
    assert_eq!(map.iter().collect::<Vec<_>>(), [(&7, &"second")]);
}

#[test]
fn map_remove_leaves_others() {
    let mut map: AvlMap<u32, u32> = (0..32).map(|key| (key, key * 10)).collect();

    assert_eq!(map.remove(&13), Some(130));
    assert_eq!(map.remove(&13), None);
    map.assert_invariants();

    assert!(!map.contains_key(&13));
    assert_eq!(map.len(), 31);
    for key in (0..32).filter(|&key| key != 13) {
        assert_eq!(map.get(&key), Some(&(key * 10)));
    }
}

#[test]
fn map_lookup_and_index() {
    let mut map = AvlMap::new();
    map.insert(String::from("b"), 2);
    map.insert(String::from("a"), 1);

    assert_eq!(map.lookup("a"), Ok(&1));
    assert_eq!(map.lookup("z"), Err(KeyNotFound));
    assert_eq!(map["b"], 2);

    *map.get_mut("b").unwrap() += 40;
    assert_eq!(map["b"], 42);
    assert!(map.get_mut("z").is_none());
}

#[test]
#[should_panic(expected = "no entry found for key")]
fn map_index_missing_key_panics() {
    let map: AvlMap<u32, u32> = AvlMap::new();
    let _ = map[&1];
}

#[test]
fn map_ordered_views() {
    let mut map: AvlMap<u32, char> = [(3, 'c'), (1, 'a'), (2, 'b')].into_iter().collect();
    map.extend([(5, 'e'), (4, 'd')]);
    map.assert_invariants();

    assert_eq!(map.keys().copied().collect::<Vec<_>>(), [1, 2, 3, 4, 5]);
    assert_eq!(map.values().rev().copied().collect::<String>(), "edcba");
    assert_eq!(map.first_key_value(), Some((&1, &'a')));
    assert_eq!(map.last_key_value(), Some((&5, &'e')));
    assert_eq!(
        format!("{map:?}"),
        "{1: 'a', 2: 'b', 3: 'c', 4: 'd', 5: 'e'}"
    );

    assert_eq!(map.pop_first(), Some((1, 'a')));
    assert_eq!(map.pop_last(), Some((5, 'e')));
    assert_eq!((&map).into_iter().count(), 3);
    map.assert_invariants();
}

#[test]
fn map_releases_values() {
    let value = Rc::new(());

    let mut map = AvlMap::new();
    for key in 0..10 {
        map.insert(key, Rc::clone(&value));
    }
    assert_eq!(Rc::strong_count(&value), 11);

    // Overwritten and removed values are handed back to the caller.
    drop(map.insert(0, Rc::clone(&value)));
    drop(map.remove(&1));
    assert_eq!(Rc::strong_count(&value), 10);

    map.clear();
    assert_eq!(Rc::strong_count(&value), 1);
    assert!(map.is_empty());

    for key in 0..10 {
        map.insert(key, Rc::clone(&value));
    }
    drop(map);
    assert_eq!(Rc::strong_count(&value), 1);
}

#[test]
fn map_height_is_logarithmic() {
    let map: AvlMap<u32, ()> = (0..1023).map(|key| (key, ())).collect();

    // A perfectly balanced tree of 1023 nodes has height 10; AVL trees are at most ~1.44 times
    // taller.
    assert!(map.height() >= 10);
    assert!(map.height() <= 14);
}

#[cfg(miri)]
const FUZZ_RANGE: Range<usize> = 0..10;

#[cfg(not(miri))]
const FUZZ_RANGE: Range<usize> = 0..1000;

#[cfg(miri)]
const MAX_KEYS: usize = 20;

#[cfg(not(miri))]
const MAX_KEYS: usize = 300;

fn shuffled_round_trip() -> impl Strategy<Value = (Vec<u32>, Vec<u32>)> {
    (1..MAX_KEYS).prop_flat_map(|n| {
        let keys: Vec<u32> = (1..=n as u32).collect();
        (Just(keys.clone()).prop_shuffle(), Just(keys).prop_shuffle())
    })
}

proptest::proptest! {
    #![proptest_config(ProptestConfig {
        max_shrink_iters: 65536,
        .. ProptestConfig::default()
    })]

    #[test]
    fn btree_equivalence(ops in proptest::collection::vec(model::op_strategy(), FUZZ_RANGE)) {
        model::run_btree_equivalence(ops);
    }

    #[test]
    fn insert_then_remove_permutations((inserts, removals) in shuffled_round_trip()) {
        let mut tree: AvlTree<TestNode> = AvlTree::new();

        for &key in &inserts {
            tree.insert(TestNode::new(key));
            tree.assert_invariants();
        }

        let mut sorted = inserts.clone();
        sorted.sort_unstable();
        prop_assert_eq!(keys(&tree), sorted);

        for key in &removals {
            prop_assert_eq!(tree.remove(key).map(|node| node.key), Some(*key));
            tree.assert_invariants();
        }

        prop_assert!(tree.is_empty());
        prop_assert_eq!(tree.height(), 0);
    }
}

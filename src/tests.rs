extern crate std;

use std::{ops::Range, prelude::v1::*};

use proptest::prelude::*;

use crate::model::{self, TestNode};

use super::*;

fn insert_find_all(keys: &[u32]) {
    let mut tree: AvlTree<TestNode> = AvlTree::new();

    for &key in keys {
        tree.insert(Box::new(TestNode {
            links: Links::new(),
            key,
        }));
        tree.assert_invariants();
    }

    for key in keys {
        let node = tree.get(key).expect("item not found");
        assert_eq!(node.key(), key);
    }
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
fn two_elems_find() {
    insert_find_all(&[0, 1]);
    insert_find_all(&[1, 0]);
}

#[test]
fn three_elems_find() {
    insert_find_all(&[0, 1, 2]);
    insert_find_all(&[0, 2, 1]);
    insert_find_all(&[1, 0, 2]);
    insert_find_all(&[1, 2, 0]);
    insert_find_all(&[2, 0, 1]);
    insert_find_all(&[2, 1, 0]);
}

#[test]
fn four_elems_find() {
    insert_find_all(&[0, 1, 2, 3]);
    insert_find_all(&[0, 1, 3, 2]);
    insert_find_all(&[0, 2, 1, 3]);
    insert_find_all(&[0, 2, 3, 1]);
    insert_find_all(&[0, 3, 1, 2]);
    insert_find_all(&[0, 3, 2, 1]);

    insert_find_all(&[1, 0, 2, 3]);
    insert_find_all(&[1, 0, 3, 2]);
    insert_find_all(&[1, 2, 0, 3]);
    insert_find_all(&[1, 2, 3, 0]);
    insert_find_all(&[1, 3, 0, 2]);
    insert_find_all(&[1, 3, 2, 0]);

    insert_find_all(&[2, 0, 1, 3]);
    insert_find_all(&[2, 0, 3, 1]);
    insert_find_all(&[2, 1, 0, 3]);
    insert_find_all(&[2, 1, 3, 0]);
    insert_find_all(&[2, 3, 0, 1]);
    insert_find_all(&[2, 3, 1, 0]);

    insert_find_all(&[3, 0, 1, 2]);
    insert_find_all(&[3, 0, 2, 1]);
    insert_find_all(&[3, 1, 0, 2]);
    insert_find_all(&[3, 1, 2, 0]);
    insert_find_all(&[3, 2, 0, 1]);
    insert_find_all(&[3, 2, 1, 0]);
}

fn insert_remove_all(keys: &[u32]) {
    let mut tree: AvlTree<TestNode> = AvlTree::new();

    for &key in keys {
        tree.insert(TestNode::new(key));
        tree.assert_invariants();
    }

    for key in keys {
        let node = tree.remove(key).expect("item not found");
        assert_eq!(node.key, *key);
        tree.assert_invariants();
    }

    assert!(tree.is_empty());

    for &key in keys {
        tree.insert(TestNode::new(key));
        tree.assert_invariants();
    }

    for key in keys.iter().rev() {
        tree.remove(key).expect("item not found");
        tree.assert_invariants();
    }
}

#[test]
fn remove_one() {
    insert_remove_all(&[0]);
}

#[test]
fn remove_two() {
    insert_remove_all(&[0, 1]);
    insert_remove_all(&[1, 0]);
}

#[test]
fn remove_three() {
    insert_remove_all(&[0, 1, 2]);
    insert_remove_all(&[0, 2, 1]);
    insert_remove_all(&[1, 0, 2]);
    insert_remove_all(&[1, 2, 0]);
    insert_remove_all(&[2, 0, 1]);
    insert_remove_all(&[2, 1, 0]);
}

#[test]
fn remove_four() {
    insert_remove_all(&[0, 1, 2, 3]);
    insert_remove_all(&[0, 1, 3, 2]);
    insert_remove_all(&[0, 2, 1, 3]);
    insert_remove_all(&[0, 2, 3, 1]);
    insert_remove_all(&[0, 3, 1, 2]);
    insert_remove_all(&[0, 3, 2, 1]);

    insert_remove_all(&[1, 0, 2, 3]);
    insert_remove_all(&[1, 0, 3, 2]);
    insert_remove_all(&[1, 2, 0, 3]);
    insert_remove_all(&[1, 2, 3, 0]);
    insert_remove_all(&[1, 3, 0, 2]);
    insert_remove_all(&[1, 3, 2, 0]);

    insert_remove_all(&[2, 0, 1, 3]);
    insert_remove_all(&[2, 0, 3, 1]);
    insert_remove_all(&[2, 1, 0, 3]);
    insert_remove_all(&[2, 1, 3, 0]);
    insert_remove_all(&[2, 3, 0, 1]);
    insert_remove_all(&[2, 3, 1, 0]);

    insert_remove_all(&[3, 0, 1, 2]);
    insert_remove_all(&[3, 0, 2, 1]);
    insert_remove_all(&[3, 1, 0, 2]);
    insert_remove_all(&[3, 1, 2, 0]);
    insert_remove_all(&[3, 2, 0, 1]);
    insert_remove_all(&[3, 2, 1, 0]);
}

fn build(keys: &[u32]) -> AvlTree<TestNode> {
    let mut tree = AvlTree::new();

    for &key in keys {
        assert!(tree.insert(TestNode::new(key)).is_none());
        tree.assert_invariants();
    }

    tree
}

// Key + rank pairs in traversal order pin down the whole augmentation.
fn snapshot(tree: &AvlTree<TestNode>) -> Vec<(u32, usize)> {
    tree.iter().map(|node| (node.key, node.links.rank())).collect()
}

#[test]
fn rank_queries_match_sorted_order() {
    let tree = build(&[5, 6, 1, 0, 15]);

    let inorder: Vec<u32> = tree.iter().map(|node| node.key).collect();
    assert_eq!(inorder, [0, 1, 5, 6, 15]);

    assert_eq!(tree.get_by_rank(3).map(|node| node.key), Some(5));

    for (idx, &key) in [0u32, 1, 5, 6, 15].iter().enumerate() {
        assert_eq!(tree.get_by_rank(idx + 1).map(|node| node.key), Some(key));
        assert_eq!(tree.rank_of(&key), Some(idx + 1));
    }

    assert!(tree.get_by_rank(0).is_none());
    assert!(tree.get_by_rank(6).is_none());
    assert!(tree.rank_of(&20).is_none());
}

#[test]
fn growth_past_rotation_keeps_invariants() {
    // The sixth insert forces the first rotation; the root is allowed to
    // change as long as order, ranks and balance hold.
    let tree = build(&[5, 6, 1, 0, 15, 48]);

    let inorder: Vec<u32> = tree.iter().map(|node| node.key).collect();
    assert_eq!(inorder, [0, 1, 5, 6, 15, 48]);

    for (idx, &key) in inorder.iter().enumerate() {
        assert_eq!(tree.rank_of(&key), Some(idx + 1));
    }
}

#[test]
fn double_rotation_sequences() {
    build(&[5, 6, 1, 0, 15, 527, 144, 159, 98, 395]);
    build(&[5, 6, 1, 0, 15, 48, 31, 25, 41, 49, 36, 43, 42]);
}

#[test]
fn duplicate_insert_is_a_no_op() {
    let mut tree = build(&[5, 6, 1, 0, 15]);
    let before = snapshot(&tree);

    let rejected = tree.insert(TestNode::new(5));

    assert_eq!(rejected.map(|node| node.key), Some(5));
    assert_eq!(tree.len(), 5);
    assert_eq!(snapshot(&tree), before);
    tree.assert_invariants();
}

#[test]
fn remove_absent_is_a_no_op() {
    let mut tree = build(&[5, 6, 1, 0, 15]);
    let before = snapshot(&tree);

    // Misses that terminate on either side of a leaf.
    assert!(tree.remove(&2).is_none());
    assert!(tree.remove(&99).is_none());
    assert!(tree.remove(&7).is_none());

    assert_eq!(tree.len(), 5);
    assert_eq!(snapshot(&tree), before);
    tree.assert_invariants();
}

#[test]
fn remove_only_node_empties_tree() {
    let mut tree = build(&[7]);

    let node = tree.remove(&7).expect("item not found");
    assert_eq!(node.key, 7);

    assert!(tree.is_empty());
    assert_eq!(tree.len(), 0);
    assert!(tree.first().is_none());
}

#[test]
fn remove_exercises_every_splice_case() {
    // 50's successor (60) is buried in the right subtree's left spine; 30
    // is unary after 20 goes; 80 is a leaf.
    let mut tree = build(&[50, 30, 70, 20, 40, 60, 80, 65]);

    for key in [80, 20, 30, 50, 70, 60, 65, 40] {
        let node = tree.remove(&key).expect("item not found");
        assert_eq!(node.key, key);
        tree.assert_invariants();
    }

    assert!(tree.is_empty());
}

#[test]
fn pop_ends() {
    let mut tree = build(&[5, 6, 1, 0, 15]);

    assert_eq!(tree.first().map(|node| node.key), Some(0));
    assert_eq!(tree.last().map(|node| node.key), Some(15));

    assert_eq!(tree.pop_first().map(|node| node.key), Some(0));
    tree.assert_invariants();
    assert_eq!(tree.pop_last().map(|node| node.key), Some(15));
    tree.assert_invariants();

    assert_eq!(tree.pop_first().map(|node| node.key), Some(1));
    assert_eq!(tree.pop_first().map(|node| node.key), Some(5));
    assert_eq!(tree.pop_first().map(|node| node.key), Some(6));
    assert!(tree.pop_first().is_none());
    assert!(tree.pop_last().is_none());
}

#[test]
fn clear_empties_tree() {
    let mut tree = build(&[5, 6, 1, 0, 15, 48]);

    tree.clear();

    assert!(tree.is_empty());
    assert!(tree.get(&5).is_none());

    // The tree is reusable afterwards.
    tree.insert(TestNode::new(3));
    tree.assert_invariants();
    assert_eq!(tree.len(), 1);
}

#[test]
fn random_churn_holds_invariants() {
    // A fixed-seed shuffle keeps this reproducible without a rand dep.
    fn shuffle(keys: &mut [u32], mut state: u64) {
        for i in (1..keys.len()).rev() {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            let j = ((state >> 33) as usize) % (i + 1);
            keys.swap(i, j);
        }
    }

    let mut keys: Vec<u32> = (0..1000).collect();
    shuffle(&mut keys, 0x5eed);

    let mut tree: AvlTree<TestNode> = AvlTree::new();

    for &key in &keys {
        assert!(tree.insert(TestNode::new(key)).is_none());
        tree.assert_invariants();
    }

    assert_eq!(tree.len(), 1000);

    for rank in 1..=tree.len() {
        let key = tree.get_by_rank(rank).map(|node| node.key).unwrap();
        assert_eq!(key, (rank - 1) as u32);
        assert_eq!(tree.rank_of(&key), Some(rank));
    }

    shuffle(&mut keys, 0xfeed);

    for &key in &keys {
        let node = tree.remove(&key).expect("item not found");
        assert_eq!(node.key, key);
        tree.assert_invariants();
    }

    assert!(tree.is_empty());
}

#[test]
fn set_round_trip() {
    let mut set: AvlSet<i32> = AvlSet::new();

    assert!(set.is_empty());
    assert!(set.insert(2));
    assert!(set.insert(-3));
    assert!(set.insert(7));
    assert!(!set.insert(2));

    assert_eq!(set.len(), 3);
    assert!(set.contains(&-3));
    assert_eq!(set.get(&7), Some(&7));
    assert_eq!(set.get(&8), None);

    assert_eq!(set.get_by_rank(1), Some(&-3));
    assert_eq!(set.get_by_rank(3), Some(&7));
    assert_eq!(set.rank_of(&2), Some(2));
    assert_eq!(set.rank_of(&100), None);

    assert_eq!(set.first(), Some(&-3));
    assert_eq!(set.last(), Some(&7));

    let collected: Vec<i32> = set.iter().copied().collect();
    assert_eq!(collected, [-3, 2, 7]);

    assert!(set.remove(&2));
    assert!(!set.remove(&2));
    assert_eq!(set.pop_first(), Some(-3));
    assert_eq!(set.pop_last(), Some(7));
    assert!(set.pop_first().is_none());

    set.insert(1);
    set.clear();
    assert!(set.is_empty());
}

#[test]
fn dotgraph_renders() {
    let tree = build(&[2, 1, 3]);

    let mut out = String::new();
    tree.dotgraph("t", &mut out).unwrap();

    assert!(out.starts_with("digraph"));
    assert!(out.contains("\"grapht-2\" [label=\"2:2:0\"]"));
    assert!(out.contains("\"grapht-2\" -> \"grapht-1\""));
}

#[cfg(miri)]
const FUZZ_RANGE: Range<usize> = 0..10;

#[cfg(not(miri))]
const FUZZ_RANGE: Range<usize> = 0..1000;

proptest::proptest! {
    #![proptest_config(ProptestConfig {
        max_shrink_iters: 65536,
        .. ProptestConfig::default()
    })]

    #[test]
    fn btree_equivalence(ops in proptest::collection::vec(model::op_strategy(), FUZZ_RANGE)) {
        model::run_btree_equivalence(ops);
    }
}

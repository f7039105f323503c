//! Property tests for tree construction and hidden-node splicing.

use proptest::prelude::*;
use proptest::sample::Index;
use std::collections::HashSet;
use taxonomy_tree::{splice, TaxId, TaxTree, TreeBuilder};

/// Builds a random tree: node `i + 2` hangs under one of the nodes created
/// before it; node 1 is the root.
fn build_tree(parents: &[Index]) -> TaxTree {
    let mut builder = TreeBuilder::new();
    builder.add_edge(1, "root", 1).unwrap();
    for (i, choice) in parents.iter().enumerate() {
        let id = i as TaxId + 2;
        let parent = choice.index(i + 1) as TaxId + 1;
        builder.add_edge(id, format!("node {id}"), parent).unwrap();
    }
    builder.build().unwrap()
}

fn preorder_ids(tree: &TaxTree) -> Vec<TaxId> {
    tree.preorder(tree.root())
        .map(|node| tree.node(node).id())
        .collect()
}

fn arb_tree_and_hidden() -> impl Strategy<Value = (Vec<Index>, HashSet<TaxId>)> {
    (1usize..150).prop_flat_map(|extra| {
        (
            prop::collection::vec(any::<Index>(), extra),
            prop::collection::vec(any::<bool>(), extra + 1),
        )
    })
    .prop_map(|(parents, flags)| {
        let hidden = flags
            .iter()
            .enumerate()
            .filter(|(_, &flag)| flag)
            .map(|(i, _)| i as TaxId + 1)
            .collect();
        (parents, hidden)
    })
}

proptest! {
    #[test]
    fn prop_splice_keeps_visible_preorder((parents, hidden) in arb_tree_and_hidden()) {
        let tree = build_tree(&parents);
        let spliced = splice(&tree, &hidden);

        let expected: Vec<TaxId> = preorder_ids(&tree)
            .into_iter()
            .filter(|&id| id == 1 || !hidden.contains(&id))
            .collect();
        prop_assert_eq!(preorder_ids(&spliced), expected);
    }

    #[test]
    fn prop_splice_paths_skip_hidden_ancestors((parents, hidden) in arb_tree_and_hidden()) {
        let tree = build_tree(&parents);
        let spliced = splice(&tree, &hidden);

        for (_, node) in spliced.nodes() {
            let expected: Vec<TaxId> = tree
                .path_to(node.id())
                .unwrap()
                .into_iter()
                .filter(|&id| id == 1 || !hidden.contains(&id))
                .collect();
            prop_assert_eq!(spliced.path_to(node.id()).unwrap(), expected);
        }
    }

    #[test]
    fn prop_spliced_leaves_have_no_children_collection((parents, hidden) in arb_tree_and_hidden()) {
        let tree = build_tree(&parents);
        let spliced = splice(&tree, &hidden);

        for (_, node) in spliced.nodes() {
            prop_assert_eq!(node.is_leaf(), node.child_count() == 0);
        }
    }

    #[test]
    fn prop_splice_is_idempotent((parents, hidden) in arb_tree_and_hidden()) {
        let tree = build_tree(&parents);
        let once = splice(&tree, &hidden);
        prop_assert_eq!(splice(&once, &hidden), once.clone());
        prop_assert_eq!(splice(&once, &HashSet::new()), once);
    }
}

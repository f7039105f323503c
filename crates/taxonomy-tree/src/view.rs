//! Plain nested `{id, title, children}` representation handed to serializers.

use crate::tree::{NodeRef, TaxTree};
use crate::TaxId;

/// Nested, owned view of a (sub)tree.
///
/// Indexing metadata is not part of the view. The hidden flag is only
/// present when requested through [`TreeView::with_flags`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TreeView {
    /// Node id.
    pub id: TaxId,
    /// Display label.
    pub title: String,
    /// Hidden flag, only set on request.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub hidden: Option<bool>,
    /// Children in order, `None` for leaves.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub children: Option<Vec<TreeView>>,
}

impl TreeView {
    /// Builds the view of the whole tree.
    pub fn new(tree: &TaxTree) -> Self {
        Self::build(tree, tree.root(), false)
    }

    /// Builds the view of the whole tree including hidden flags.
    pub fn with_flags(tree: &TaxTree) -> Self {
        Self::build(tree, tree.root(), true)
    }

    /// Builds the view of the subtree rooted at `id`.
    pub fn subtree(tree: &TaxTree, id: TaxId) -> Option<Self> {
        tree.get(id).map(|start| Self::build(tree, start, false))
    }

    /// Number of nodes in the view.
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(view) = stack.pop() {
            count += 1;
            if let Some(children) = &view.children {
                stack.extend(children.iter());
            }
        }
        count
    }

    // Children are assembled before their parent by walking the pre-order
    // sequence backwards, so no recursion is needed.
    fn build(tree: &TaxTree, start: NodeRef, flags: bool) -> Self {
        let order: Vec<NodeRef> = tree.preorder(start).collect();
        let mut built: Vec<Option<TreeView>> = vec![None; tree.node_count()];

        for &current in order.iter().rev() {
            let node = tree.node(current);
            let children = if node.is_leaf() {
                None
            } else {
                Some(
                    node.children()
                        .iter()
                        .filter_map(|child| built[child.index()].take())
                        .collect(),
                )
            };
            built[current.index()] = Some(TreeView {
                id: node.id(),
                title: node.title().to_string(),
                hidden: flags.then_some(node.is_hidden()),
                children,
            });
        }

        built[start.index()].take().unwrap_or_else(|| TreeView {
            id: tree.node(start).id(),
            title: tree.node(start).title().to_string(),
            hidden: None,
            children: None,
        })
    }
}

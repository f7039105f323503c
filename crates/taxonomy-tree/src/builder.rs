//! Node store: assembles a [`TaxTree`] from parent/child edge tuples.
//!
//! Edges are attached in the order they are presented, which fixes the
//! sibling order for every later stage. Nodes may be declared up front
//! (id and title only) so that edges can reference parents in any order.
//!
//! # Example
//!
//! ```rust
//! use taxonomy_tree::TreeBuilder;
//!
//! let mut builder = TreeBuilder::new();
//! builder.add_edge(1, "root", 1).unwrap();
//! builder.add_edge(2, "Bacteria", 1).unwrap();
//! builder.add_edge(562, "Escherichia coli", 2).unwrap();
//!
//! let tree = builder.build().unwrap();
//! assert_eq!(tree.node_count(), 3);
//! assert_eq!(tree.path_to(562), Some(vec![1, 2, 562]));
//! ```

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::error::{TreeError, TreeResult};
use crate::tree::{TaxTree, TreeAssembler};
use crate::{Edge, TaxId};

/// A node as it is being collected, before the tree is laid out.
#[derive(Debug)]
struct Slot {
    id: TaxId,
    title: String,
    hidden: bool,
    parent: Option<TaxId>,
    children: Vec<usize>,
}

/// Incrementally collects nodes and edges and builds a [`TaxTree`].
#[derive(Debug, Default)]
pub struct TreeBuilder {
    slots: Vec<Slot>,
    ids: HashMap<TaxId, usize>,
    root_candidates: Vec<TaxId>,
    explicit_root: Option<TaxId>,
    edge_count: usize,
}

impl TreeBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder with room for `capacity` nodes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            ids: HashMap::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Number of distinct nodes seen so far.
    pub fn node_count(&self) -> usize {
        self.slots.len()
    }

    /// Registers a node without attaching it anywhere.
    ///
    /// Declaring an existing id updates its title.
    pub fn declare(&mut self, id: TaxId, title: impl Into<String>) {
        let title = title.into();
        match self.ids.get(&id) {
            Some(&slot) => self.slots[slot].title = title,
            None => {
                self.insert_slot(id, title);
            }
        }
    }

    /// Attaches `child_id` under `parent_id`, creating the child if needed.
    ///
    /// A self-referencing edge (`child_id == parent_id`) registers a root
    /// candidate instead. A non-empty `title` overrides the stored title.
    ///
    /// # Errors
    ///
    /// - [`TreeError::MissingParent`] if the parent was never created.
    /// - [`TreeError::DuplicateParent`] if the child already has a
    ///   different parent, or is itself a root candidate.
    pub fn add_edge(
        &mut self,
        child_id: TaxId,
        title: impl Into<String>,
        parent_id: TaxId,
    ) -> TreeResult<()> {
        let title = title.into();
        self.edge_count += 1;

        if child_id == parent_id {
            let slot = self.lookup_or_insert(child_id, title);
            if let Some(existing) = self.slots[slot].parent {
                return Err(TreeError::DuplicateParent {
                    id: child_id,
                    existing_parent: existing,
                    new_parent: parent_id,
                });
            }
            if !self.root_candidates.contains(&child_id) {
                self.root_candidates.push(child_id);
            }
            return Ok(());
        }

        let parent_slot = *self.ids.get(&parent_id).ok_or(TreeError::MissingParent {
            child_id,
            parent_id,
        })?;

        if self.root_candidates.contains(&child_id) {
            return Err(TreeError::DuplicateParent {
                id: child_id,
                existing_parent: child_id,
                new_parent: parent_id,
            });
        }

        let child_slot = self.lookup_or_insert(child_id, title);
        match self.slots[child_slot].parent {
            Some(existing) if existing == parent_id => {
                debug!(child_id, parent_id, "taxonomy.build.repeated_edge");
                return Ok(());
            }
            Some(existing) => {
                return Err(TreeError::DuplicateParent {
                    id: child_id,
                    existing_parent: existing,
                    new_parent: parent_id,
                });
            }
            None => {}
        }

        self.slots[child_slot].parent = Some(parent_id);
        self.slots[parent_slot].children.push(child_slot);
        Ok(())
    }

    /// Applies one upstream edge tuple, including its hidden flag.
    pub fn add(&mut self, edge: &Edge) -> TreeResult<()> {
        self.add_edge(edge.id, edge.title.as_str(), edge.parent_id)?;
        if edge.hidden {
            self.mark_hidden(edge.id)?;
        }
        Ok(())
    }

    /// Applies every edge of an iterator, stopping at the first error.
    pub fn extend<'e, I>(&mut self, edges: I) -> TreeResult<()>
    where
        I: IntoIterator<Item = &'e Edge>,
    {
        for edge in edges {
            self.add(edge)?;
        }
        Ok(())
    }

    /// Sets the hidden flag on a node.
    ///
    /// # Errors
    ///
    /// [`TreeError::UnknownNode`] if the id was never created.
    pub fn mark_hidden(&mut self, id: TaxId) -> TreeResult<()> {
        let slot = *self.ids.get(&id).ok_or(TreeError::UnknownNode(id))?;
        self.slots[slot].hidden = true;
        Ok(())
    }

    /// Names the root explicitly, overriding self-referencing edges.
    pub fn set_root(&mut self, id: TaxId) {
        self.explicit_root = Some(id);
    }

    /// Lays the collected nodes out as a [`TaxTree`].
    ///
    /// Nodes that are not reachable from the root are dropped with a
    /// warning.
    ///
    /// # Errors
    ///
    /// - [`TreeError::UnknownNode`] if an explicit root was never created.
    /// - [`TreeError::RootAmbiguity`] if there is no explicit root and not
    ///   exactly one self-referencing node.
    pub fn build(self) -> TreeResult<TaxTree> {
        let root_id = self.resolve_root()?;
        let root_slot = *self.ids.get(&root_id).ok_or(TreeError::UnknownNode(root_id))?;

        let mut asm = TreeAssembler::with_capacity(self.slots.len());
        // An explicit root may sit on a parent cycle; each slot is laid out once.
        let mut placed = vec![false; self.slots.len()];
        let mut stack = vec![(root_slot, None)];
        while let Some((slot, parent)) = stack.pop() {
            if std::mem::replace(&mut placed[slot], true) {
                continue;
            }
            let entry = &self.slots[slot];
            let node = asm.push(entry.id, &entry.title, entry.hidden, parent);
            stack.extend(entry.children.iter().rev().map(|&child| (child, Some(node))));
        }
        let tree = asm.finish();

        let unattached = self.slots.len() - tree.node_count();
        if unattached > 0 {
            warn!(
                unattached,
                root_id, "taxonomy.build.unattached_nodes_dropped"
            );
        }
        info!(
            nodes = tree.node_count(),
            edges = self.edge_count,
            hidden = tree.hidden_ids().len(),
            root_id,
            "taxonomy.build.complete"
        );
        Ok(tree)
    }

    fn resolve_root(&self) -> TreeResult<TaxId> {
        if let Some(root) = self.explicit_root {
            return Ok(root);
        }
        match self.root_candidates.as_slice() {
            [root] => Ok(*root),
            candidates => Err(TreeError::RootAmbiguity {
                candidates: candidates.to_vec(),
            }),
        }
    }

    fn lookup_or_insert(&mut self, id: TaxId, title: String) -> usize {
        match self.ids.get(&id) {
            Some(&slot) => {
                if !title.is_empty() {
                    self.slots[slot].title = title;
                }
                slot
            }
            None => self.insert_slot(id, title),
        }
    }

    fn insert_slot(&mut self, id: TaxId, title: String) -> usize {
        let slot = self.slots.len();
        self.slots.push(Slot {
            id,
            title,
            hidden: false,
            parent: None,
            children: Vec::new(),
        });
        self.ids.insert(id, slot);
        slot
    }
}

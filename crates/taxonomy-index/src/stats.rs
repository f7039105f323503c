//! Statistics about an index build.

/// Statistics about a nested-set index build.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexStats {
    /// Number of indexed nodes.
    pub node_count: usize,
    /// Number of leaves.
    pub leaf_count: usize,
    /// Deepest layer (root = 0).
    pub max_layer: u32,
    /// Layer with the most nodes.
    pub widest_layer: u32,
    /// Number of nodes on the widest layer.
    pub widest_layer_size: u32,
    /// Nodes removed by splicing before indexing.
    pub hidden_removed: usize,
    /// Time taken to index in milliseconds.
    pub build_time_ms: u64,
}

impl IndexStats {
    /// Average number of children per inner node.
    pub fn avg_branching(&self) -> f64 {
        let inner = self.node_count - self.leaf_count;
        if inner == 0 {
            0.0
        } else {
            (self.node_count - 1) as f64 / inner as f64
        }
    }
}

impl std::fmt::Display for IndexStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Nested-Set Index Statistics:")?;
        writeln!(f, "  Nodes:           {}", self.node_count)?;
        writeln!(f, "  Leaves:          {}", self.leaf_count)?;
        writeln!(f, "  Max layer:       {}", self.max_layer)?;
        writeln!(
            f,
            "  Widest layer:    {} ({} nodes)",
            self.widest_layer, self.widest_layer_size
        )?;
        writeln!(f, "  Avg branching:   {:.2}", self.avg_branching())?;
        writeln!(f, "  Hidden removed:  {}", self.hidden_removed)?;
        writeln!(f, "  Build time:      {}ms", self.build_time_ms)?;
        Ok(())
    }
}

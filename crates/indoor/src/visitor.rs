//! Visitors for walking the leaves of a loaded level.
//!
//! Visitors keep the traversal order separate from what is done with the
//! triangles, such as drawing them or counting them.

use crate::Triangle;

/// Receives the triangles of each empty leaf during traversal.
pub trait LeafVisitor {
    /// Called once per empty leaf that has triangles, in traversal order.
    fn visit(&mut self, triangles: &[Triangle]);
}

/// Collects every visited triangle in order.
#[derive(Debug, Default)]
pub struct CollectingVisitor {
    collected: Vec<Triangle>,
    leaves: usize,
}

impl CollectingVisitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_triangles(self) -> Vec<Triangle> {
        self.collected
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.collected
    }

    /// Number of leaves visited.
    pub fn leaves(&self) -> usize {
        self.leaves
    }
}

impl LeafVisitor for CollectingVisitor {
    fn visit(&mut self, triangles: &[Triangle]) {
        self.collected.extend_from_slice(triangles);
        self.leaves += 1;
    }
}

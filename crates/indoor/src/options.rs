//! Compilation settings.

use nalgebra::Point3;

use crate::polygon::MAX_INPUT_VERTICES;
use crate::rectangle::DEFAULT_PLANE_EXTENT;

/// Settings for [`World::compile_with`](crate::World::compile_with).
#[derive(Debug, Clone, PartialEq)]
pub struct CompileOptions {
    /// Half-size of the quads laid on partition and hull planes.
    pub plane_extent: f64,
    /// Largest vertex count accepted on an input polygon.
    pub max_vertices: usize,
    /// Probe points checked for leaks once the tree is built.
    pub entities: Vec<Point3<f64>>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            plane_extent: DEFAULT_PLANE_EXTENT,
            max_vertices: MAX_INPUT_VERTICES,
            entities: vec![Point3::origin()],
        }
    }
}

impl CompileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_plane_extent(mut self, extent: f64) -> Self {
        self.plane_extent = extent;
        self
    }

    pub fn with_max_vertices(mut self, max: usize) -> Self {
        self.max_vertices = max;
        self
    }

    /// Replaces the probe points. An empty list skips the entity check.
    pub fn with_entities<I>(mut self, entities: I) -> Self
    where
        I: IntoIterator<Item = Point3<f64>>,
    {
        self.entities = entities.into_iter().collect();
        self
    }
}

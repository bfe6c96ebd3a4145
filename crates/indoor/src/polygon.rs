//! Convex polygon representation.

use nalgebra::{Point3, Vector3};
use smallvec::SmallVec;

use crate::{Classification, Plane, Rectangle};

/// Maximum number of vertices accepted on an input polygon.
pub const MAX_INPUT_VERTICES: usize = 8;

/// Inline vertex storage. Clipping may push a polygon past the inline
/// capacity, in which case it spills to the heap.
pub type Vertices = SmallVec<[Point3<f64>; MAX_INPUT_VERTICES]>;

/// A convex polygon in 3D space, defined by an ordered ring of vertices.
///
/// Vertices should be coplanar and in counter-clockwise winding order
/// when viewed from the front (the direction the normal points).
/// Neither property is checked.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polygon {
    vertices: Vertices,
}

impl Polygon {
    /// Creates a new polygon from a list of vertices.
    pub fn new<I>(vertices: I) -> Self
    where
        I: IntoIterator<Item = Point3<f64>>,
    {
        Self {
            vertices: vertices.into_iter().collect(),
        }
    }

    /// Convenience constructor from plain coordinate triples.
    pub fn from_coords(coords: &[[f64; 3]]) -> Self {
        Self::new(coords.iter().map(|&[x, y, z]| Point3::new(x, y, z)))
    }

    /// Returns the vertices of the polygon.
    #[inline]
    pub fn vertices(&self) -> &[Point3<f64>] {
        &self.vertices
    }

    /// Returns the number of vertices.
    #[inline]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Returns true if the polygon has no vertices.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Computes the (unnormalized) normal vector of the polygon.
    ///
    /// Uses Newell's method over the whole ring, so collinear leading
    /// vertices left behind by clipping do not matter. The direction follows
    /// the right-hand rule based on vertex winding, and the length is twice
    /// the polygon's area.
    pub fn normal(&self) -> Vector3<f64> {
        let n = self.vertices.len();
        let mut normal = Vector3::zeros();
        for i in 0..n {
            let current = self.vertices[i];
            let next = self.vertices[(i + 1) % n];
            normal.x += (current.y - next.y) * (current.z + next.z);
            normal.y += (current.z - next.z) * (current.x + next.x);
            normal.z += (current.x - next.x) * (current.y + next.y);
        }
        normal
    }

    /// Computes the unit normal vector of the polygon.
    ///
    /// Returns `None` if the polygon is degenerate (zero area).
    pub fn unit_normal(&self) -> Option<Vector3<f64>> {
        let n = self.normal();
        let len = n.norm();
        if len > f64::EPSILON {
            Some(n / len)
        } else {
            None
        }
    }

    /// Area of the polygon.
    pub fn area(&self) -> f64 {
        self.normal().norm() * 0.5
    }

    /// Returns the plane that this polygon lies on, or `None` if it is degenerate.
    pub fn plane(&self) -> Option<Plane> {
        let normal = self.unit_normal()?;
        Some(Plane::from_point_and_normal(self.vertices[0], normal))
    }

    /// Computes the centroid (vertex average) of the polygon.
    pub fn centroid(&self) -> Point3<f64> {
        let sum: Vector3<f64> = self.vertices.iter().map(|p| p.coords).sum();
        Point3::from(sum / self.vertices.len() as f64)
    }

    /// Classifies this polygon relative to a plane.
    ///
    /// The first vertex with a non-zero (snapped) distance decides between
    /// `Front` and `Back`; any later vertex on the opposite side makes the
    /// polygon `Spanning`. A polygon lying entirely in the plane reports
    /// `Front`; use [`Polygon::lies_in`] to detect that case.
    pub fn side(&self, plane: &Plane) -> Classification {
        let mut first = 0.0;

        for vertex in &self.vertices {
            let dist = plane.snapped_distance(*vertex);

            if first == 0.0 {
                first = dist;
            } else if dist * first < 0.0 {
                return Classification::Spanning;
            }
        }

        if first < 0.0 {
            Classification::Back
        } else {
            Classification::Front
        }
    }

    /// Returns true if every vertex lies within tolerance of the plane.
    pub fn lies_in(&self, plane: &Plane) -> bool {
        self.vertices
            .iter()
            .all(|v| plane.snapped_distance(*v) == 0.0)
    }

    /// Fan-triangulates the polygon from its first vertex.
    pub fn fan(&self) -> impl Iterator<Item = [Point3<f64>; 3]> + '_ {
        let first = self.vertices.first().copied();
        self.vertices
            .windows(2)
            .skip(1)
            .filter_map(move |edge| first.map(|a| [a, edge[0], edge[1]]))
    }

    /// Number of triangles produced by [`Polygon::fan`].
    #[inline]
    pub fn fan_len(&self) -> usize {
        self.vertices.len().saturating_sub(2)
    }
}

impl From<Rectangle> for Polygon {
    fn from(rectangle: Rectangle) -> Self {
        Self::new(rectangle.vertices())
    }
}

impl From<&Rectangle> for Polygon {
    fn from(rectangle: &Rectangle) -> Self {
        Self::new(rectangle.vertices())
    }
}

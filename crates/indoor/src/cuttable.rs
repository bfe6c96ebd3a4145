//! Polygon cutting and coverage operations.

use nalgebra::Point3;

use crate::{Classification, Plane, Polygon};

/// Pieces smaller than this are treated as numeric slivers and dropped.
pub const AREA_EPSILON: f64 = 1e-6;

/// Trait for geometry that can be cut by a plane.
pub trait Cuttable {
    /// Cuts the geometry by a plane.
    ///
    /// Returns `(front, back)`. Vertices within tolerance of the plane are
    /// shared by both halves, so a polygon lying in the plane comes back
    /// whole on both sides. A half with fewer than three vertices is `None`.
    fn cut(&self, plane: &Plane) -> (Option<Polygon>, Option<Polygon>);
}

impl Cuttable for Polygon {
    fn cut(&self, plane: &Plane) -> (Option<Polygon>, Option<Polygon>) {
        split_polygon(self, plane)
    }
}

/// Splits a polygon into front and back parts.
///
/// Uses a variant of the Sutherland-Hodgman algorithm:
/// walks the polygon edges and builds two vertex lists,
/// adding intersection points when edges cross the plane.
fn split_polygon(polygon: &Polygon, plane: &Plane) -> (Option<Polygon>, Option<Polygon>) {
    let vertices = polygon.vertices();
    let n = vertices.len();

    let mut front_verts: Vec<Point3<f64>> = Vec::with_capacity(n + 1);
    let mut back_verts: Vec<Point3<f64>> = Vec::with_capacity(n + 1);

    // Classify all vertices upfront
    let sides: Vec<f64> = vertices.iter().map(|v| plane.snapped_distance(*v)).collect();

    for i in 0..n {
        let current = vertices[i];
        let current_side = sides[i];
        let next_idx = (i + 1) % n;
        let next = vertices[next_idx];
        let next_side = sides[next_idx];

        if current_side >= 0.0 {
            front_verts.push(current);
        }
        if current_side <= 0.0 {
            back_verts.push(current);
        }

        // Only edges with ends strictly on opposite sides cross
        if current_side * next_side < 0.0 {
            if let Some(intersection) = plane.intersect_segment(current, next) {
                front_verts.push(intersection);
                back_verts.push(intersection);
            }
        }
    }

    let front = (front_verts.len() >= 3).then(|| Polygon::new(front_verts));
    let back = (back_verts.len() >= 3).then(|| Polygon::new(back_verts));

    (front, back)
}

impl Polygon {
    /// Returns the convex pieces of `self` not covered by `cutter`.
    ///
    /// Both polygons must be coplanar and convex. The polygon is peeled
    /// against each outward edge plane of the cutter: whatever lies in front
    /// of an edge plane is outside the cutter and survives, the rest moves on
    /// to the next edge. What remains after the last edge is covered.
    pub fn subtract(&self, cutter: &Polygon) -> Vec<Polygon> {
        let Some(normal) = cutter.unit_normal() else {
            return vec![self.clone()];
        };

        let ring = cutter.vertices();
        let mut uncovered = Vec::new();
        let mut remaining = self.clone();

        for i in 0..ring.len() {
            let start = ring[i];
            let end = ring[(i + 1) % ring.len()];
            let outward = (end - start).cross(&normal);
            let Some(edge_plane) = Plane::try_new(outward, outward.dot(&start.coords)) else {
                continue;
            };

            match remaining.side(&edge_plane) {
                Classification::Back => {}
                Classification::Front | Classification::Coplanar => {
                    uncovered.push(remaining);
                    return keep_significant(uncovered);
                }
                Classification::Spanning => {
                    let (outside, inside) = remaining.cut(&edge_plane);
                    if let Some(outside) = outside {
                        uncovered.push(outside);
                    }
                    match inside {
                        Some(inside) => remaining = inside,
                        None => return keep_significant(uncovered),
                    }
                }
            }
        }

        keep_significant(uncovered)
    }

    /// Subtracts every cutter in turn, returning what is left uncovered.
    pub fn subtract_all<'a, I>(&self, cutters: I) -> Vec<Polygon>
    where
        I: IntoIterator<Item = &'a Polygon>,
    {
        let mut pieces = vec![self.clone()];
        for cutter in cutters {
            pieces = pieces.iter().flat_map(|piece| piece.subtract(cutter)).collect();
            if pieces.is_empty() {
                break;
            }
        }
        pieces
    }
}

fn keep_significant(pieces: Vec<Polygon>) -> Vec<Polygon> {
    pieces
        .into_iter()
        .filter(|piece| piece.area() > AREA_EPSILON)
        .collect()
}

//! Rectangle (quad) representation.

use nalgebra::{Point3, Vector3};

use crate::Plane;

/// Half-size of the quad laid on a plane by [`Rectangle::on_plane`] unless
/// configured otherwise. Effectively infinite relative to level extents.
pub const DEFAULT_PLANE_EXTENT: f64 = 1_000_000.0;

/// A rectangle (quad) in 3D space, defined by a corner and two edge vectors.
///
/// The four vertices are:
/// - `origin`
/// - `origin + u`
/// - `origin + u + v`
/// - `origin + v`
#[derive(Debug, Clone, PartialEq)]
pub struct Rectangle {
    origin: Point3<f64>,
    u: Vector3<f64>,
    v: Vector3<f64>,
}

impl Rectangle {
    /// Creates a rectangle from three consecutive corners `a -> b -> c`.
    /// The fourth corner is implied.
    pub fn from_corners(a: Point3<f64>, b: Point3<f64>, c: Point3<f64>) -> Self {
        Self {
            origin: a,
            u: b - a,
            v: c - b,
        }
    }

    /// Lays a square of half-size `extent` on `plane`, centred on the
    /// plane's point closest to the origin and wound so its normal matches
    /// the plane's.
    ///
    /// The in-plane axes are derived from the normal's dominant axis: `up`
    /// starts as +Z for X- or Y-major normals and +X for Z-major ones, is
    /// made perpendicular to the normal, and `right = up × normal`.
    pub fn on_plane(plane: &Plane, extent: f64) -> Self {
        let normal = plane.normal();
        let (x, y, z) = (normal.x.abs(), normal.y.abs(), normal.z.abs());

        let mut up = if z > x && z > y {
            Vector3::x()
        } else {
            Vector3::z()
        };

        up -= normal * up.dot(&normal);
        up.normalize_mut();

        let right = up.cross(&normal);

        let up = up * extent;
        let right = right * extent;
        let centre = plane.closest_to_origin();

        // centre+right+up, centre-right+up, centre-right-up, centre+right-up
        Self {
            origin: centre + right + up,
            u: right * -2.0,
            v: up * -2.0,
        }
    }

    /// Returns the four vertices of the rectangle.
    ///
    /// Order: origin, origin+u, origin+u+v, origin+v.
    pub fn vertices(&self) -> [Point3<f64>; 4] {
        [
            self.origin,
            self.origin + self.u,
            self.origin + self.u + self.v,
            self.origin + self.v,
        ]
    }
}

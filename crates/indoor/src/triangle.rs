//! Output triangle, the unit of the compiled triangle soups.

use nalgebra::Point3;

/// A single-precision triangle as stored in a compiled level file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    vertices: [Point3<f32>; 3],
}

impl Triangle {
    /// Creates a new triangle from three points.
    ///
    /// The winding order determines the normal direction via the right-hand rule:
    /// normal = (b - a) × (c - a)
    pub fn new(a: Point3<f32>, b: Point3<f32>, c: Point3<f32>) -> Self {
        Self {
            vertices: [a, b, c],
        }
    }

    /// Narrows a double-precision fan triangle to file precision.
    pub fn from_fan([a, b, c]: [Point3<f64>; 3]) -> Self {
        Self::new(a.cast(), b.cast(), c.cast())
    }

    /// Rebuilds a triangle from its nine stored coordinates.
    pub fn from_floats(f: [f32; 9]) -> Self {
        Self::new(
            Point3::new(f[0], f[1], f[2]),
            Point3::new(f[3], f[4], f[5]),
            Point3::new(f[6], f[7], f[8]),
        )
    }

    /// Returns the three vertices of the triangle.
    #[inline]
    pub fn vertices(&self) -> &[Point3<f32>; 3] {
        &self.vertices
    }

    /// The nine coordinates in file order: three vertices of `x, y, z`.
    pub fn to_floats(&self) -> [f32; 9] {
        let [a, b, c] = &self.vertices;
        [a.x, a.y, a.z, b.x, b.y, b.z, c.x, c.y, c.z]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floats_round_trip() {
        let tri = Triangle::new(
            Point3::new(1.0, 2.0, 3.0),
            Point3::new(4.0, 5.0, 6.0),
            Point3::new(7.0, 8.0, 9.0),
        );
        assert_eq!(tri.to_floats(), [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
        assert_eq!(Triangle::from_floats(tri.to_floats()), tri);
    }

    #[test]
    fn from_fan_keeps_winding() {
        let tri = Triangle::from_fan([
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ]);
        assert_eq!(
            tri.vertices(),
            &[
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0)
            ]
        );
    }
}

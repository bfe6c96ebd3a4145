//! Plane representation and classification.

use nalgebra::{Point3, Vector3};

/// Tolerance for plane classification.
/// Points within this distance of a plane are considered to lie on it.
pub const PLANE_EPSILON: f64 = 1e-5;

/// Which side of a plane a point lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneSide {
    /// Point is in front of the plane (positive side of normal)
    Front,
    /// Point is behind the plane (negative side of normal)
    Back,
    /// Point lies on the plane (within epsilon tolerance)
    OnPlane,
}

/// Classification of geometry (polygon, portal, whole plane) relative to a plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Entirely in front of the plane
    Front,
    /// Entirely behind the plane
    Back,
    /// Lies in the plane ("in")
    Coplanar,
    /// Crosses the plane ("across")
    Spanning,
}

/// A plane in 3D space, represented as `normal · point = distance`.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    normal: Vector3<f64>,
    distance: f64,
}

impl Plane {
    /// Creates a new plane from a normal vector and signed distance.
    /// The normal will be normalized automatically.
    ///
    /// # Panics
    /// Panics if the normal vector has zero length.
    pub fn new(normal: Vector3<f64>, distance: f64) -> Self {
        let norm = normal.norm();
        assert!(norm > f64::EPSILON, "Plane normal cannot be zero");
        Self {
            normal: normal / norm,
            distance: distance / norm,
        }
    }

    /// Same as [`Plane::new`], but returns `None` for a zero normal.
    pub fn try_new(normal: Vector3<f64>, distance: f64) -> Option<Self> {
        let norm = normal.norm();
        (norm > f64::EPSILON).then(|| Self {
            normal: normal / norm,
            distance: distance / norm,
        })
    }

    /// Creates a plane from a point on the plane and a normal vector.
    ///
    /// # Panics
    /// Panics if the normal vector has zero length.
    pub fn from_point_and_normal(point: Point3<f64>, normal: Vector3<f64>) -> Self {
        let norm = normal.norm();
        assert!(norm > f64::EPSILON, "Plane normal cannot be zero");
        let unit_normal = normal / norm;
        let distance = unit_normal.dot(&point.coords);
        Self {
            normal: unit_normal,
            distance,
        }
    }

    /// Returns the unit normal vector of the plane.
    #[inline]
    pub fn normal(&self) -> Vector3<f64> {
        self.normal
    }

    /// Returns the signed distance from the origin to the plane along the normal.
    #[inline]
    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// The point of the plane closest to the origin.
    #[inline]
    pub fn closest_to_origin(&self) -> Point3<f64> {
        Point3::from(self.normal * self.distance)
    }

    /// Computes the signed distance from a point to the plane.
    /// - Positive: point is in front (same side as normal)
    /// - Negative: point is behind (opposite side from normal)
    #[inline]
    pub fn point_distance(&self, point: Point3<f64>) -> f64 {
        self.normal.dot(&point.coords) - self.distance
    }

    /// Signed distance with values inside `±PLANE_EPSILON` snapped to exactly zero.
    #[inline]
    pub fn snapped_distance(&self, point: Point3<f64>) -> f64 {
        let dist = self.point_distance(point);
        if dist > -PLANE_EPSILON && dist < PLANE_EPSILON {
            0.0
        } else {
            dist
        }
    }

    /// Classifies which side of the plane a point lies on.
    pub fn classify_point(&self, point: Point3<f64>) -> PlaneSide {
        let dist = self.point_distance(point);
        if dist > PLANE_EPSILON {
            PlaneSide::Front
        } else if dist < -PLANE_EPSILON {
            PlaneSide::Back
        } else {
            PlaneSide::OnPlane
        }
    }

    /// Classifies a whole plane against this one.
    ///
    /// Non-parallel planes always cross, so they report `Spanning`. Parallel
    /// planes (either orientation) report where `other` lies: `Front`, `Back`,
    /// or `Coplanar` when the two coincide.
    pub fn classify_plane(&self, other: &Plane) -> Classification {
        let cosine = self.normal.dot(&other.normal);
        if cosine.abs() < 1.0 - PLANE_EPSILON {
            return Classification::Spanning;
        }

        match self.classify_point(other.closest_to_origin()) {
            PlaneSide::Front => Classification::Front,
            PlaneSide::Back => Classification::Back,
            PlaneSide::OnPlane => Classification::Coplanar,
        }
    }

    /// Computes the intersection of a line segment with the plane.
    ///
    /// Returns `None` if the segment is parallel to the plane or doesn't intersect.
    pub fn intersect_segment(&self, start: Point3<f64>, end: Point3<f64>) -> Option<Point3<f64>> {
        let direction = end - start;
        let denom = self.normal.dot(&direction);

        // Segment is parallel to plane
        if denom.abs() < f64::EPSILON {
            return None;
        }

        let t = (self.distance - self.normal.dot(&start.coords)) / denom;

        if !(0.0..=1.0).contains(&t) {
            return None;
        }

        Some(start + direction * t)
    }
}

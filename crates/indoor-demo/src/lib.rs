//! Sample levels for the indoor compiler.

use indoor::{Polygon, Rectangle};
use nalgebra::{Point3, Vector3};

/// Index of the `+Z` face in [`box_faces`] output.
pub const CEILING: usize = 4;

/// The built-in sample levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scene {
    /// A sealed cube room.
    ClosedRoom,
    /// The cube room without its ceiling; it leaks.
    OpenBox,
    /// A sealed room with a square pillar standing off-centre.
    Pillar,
}

impl Scene {
    pub fn polygons(self) -> Vec<Polygon> {
        let origin = Point3::origin();
        match self {
            Scene::ClosedRoom => box_faces(origin, 2.0, true),
            Scene::OpenBox => {
                let mut faces = box_faces(origin, 2.0, true);
                faces.remove(CEILING);
                faces
            }
            Scene::Pillar => {
                let mut faces = box_faces(origin, 2.0, true);
                faces.extend(box_faces(Point3::new(1.0, 0.0, 0.0), 0.5, false));
                faces
            }
        }
    }

    /// A point every sample expects to be walkable.
    pub fn spawn(self) -> Point3<f64> {
        match self {
            Scene::ClosedRoom | Scene::OpenBox => Point3::origin(),
            Scene::Pillar => Point3::new(-1.0, 0.0, 0.0),
        }
    }
}

/// Generates the 6 faces of an axis-aligned cube of half-size `half`.
///
/// Outward faces wind counter-clockwise seen from outside the cube; inward
/// faces, for rooms, wind the other way so their normals point at the
/// centre. Faces come in the order `-Z`, `-X`, `+X`, `-Y`, `+Z`, `+Y`.
pub fn box_faces(center: Point3<f64>, half: f64, inward: bool) -> Vec<Polygon> {
    let corners = [
        center + Vector3::new(-half, -half, -half), // 0: left-bottom-back
        center + Vector3::new(half, -half, -half),  // 1: right-bottom-back
        center + Vector3::new(half, half, -half),   // 2: right-top-back
        center + Vector3::new(-half, half, -half),  // 3: left-top-back
        center + Vector3::new(-half, -half, half),  // 4: left-bottom-front
        center + Vector3::new(half, -half, half),   // 5: right-bottom-front
        center + Vector3::new(half, half, half),    // 6: right-top-front
        center + Vector3::new(-half, half, half),   // 7: left-top-front
    ];

    let faces: [[usize; 4]; 6] = [
        [1, 0, 3, 2], // -Z
        [0, 4, 7, 3], // -X
        [5, 1, 2, 6], // +X
        [0, 1, 5, 4], // -Y
        [4, 5, 6, 7], // +Z
        [7, 6, 2, 3], // +Y
    ];

    faces
        .iter()
        .map(|&[a, b, c, d]| {
            let [a, b, c] = if inward { [d, c, b] } else { [a, b, c] };
            Rectangle::from_corners(corners[a], corners[b], corners[c]).into()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoor::{Contents, World};

    #[test]
    fn inward_faces_point_at_the_centre() {
        for polygon in box_faces(Point3::origin(), 1.0, true) {
            let to_centre = Point3::origin() - polygon.centroid();
            assert!(polygon.normal().dot(&to_centre) > 0.0);
        }
        for polygon in box_faces(Point3::origin(), 1.0, false) {
            let to_centre = Point3::origin() - polygon.centroid();
            assert!(polygon.normal().dot(&to_centre) < 0.0);
        }
    }

    #[test]
    fn ceiling_is_the_top_face() {
        let faces = box_faces(Point3::origin(), 1.0, true);
        assert!(faces[CEILING].vertices().iter().all(|v| v.z == 1.0));
    }

    #[test]
    fn closed_room_does_not_leak() {
        let world = World::compile(&Scene::ClosedRoom.polygons()).unwrap();
        assert!(!world.has_leak());
        assert_eq!(world.contents_at(Scene::ClosedRoom.spawn()), Some(Contents::Empty));
    }

    #[test]
    fn open_box_leaks() {
        let world = World::compile(&Scene::OpenBox.polygons()).unwrap();
        assert!(world.has_leak());
        assert!(world.leaked_leaves() >= 1);
    }

    #[test]
    fn pillar_keeps_its_faces() {
        let world = World::compile(&Scene::Pillar.polygons()).unwrap();
        assert!(!world.has_leak());
        assert_eq!(world.contents_at(Scene::Pillar.spawn()), Some(Contents::Empty));
        assert_eq!(world.contents_at(Point3::new(1.0, 0.0, 0.0)), Some(Contents::Solid));
        assert_eq!(world.triangle_count(), 12);
    }
}

//! Portal graph checks and the outside flood fill.

use std::mem;

use log::debug;
use nalgebra::Point3;
use rustc_hash::FxHashSet;

use crate::error::{Invariant, Result};
use crate::keys::CellId;
use crate::status::Status;
use crate::PLANE_EPSILON;

use super::cell::{CellKind, Contents};
use super::world::World;

/// Where a probe point ended up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityReport {
    pub position: Point3<f64>,
    pub leaf: CellId,
    pub contents: Contents,
}

impl EntityReport {
    /// The point is reachable from outside the level.
    #[inline]
    pub fn is_leak(&self) -> bool {
        self.contents == Contents::Outside
    }

    /// The point is inside matter.
    #[inline]
    pub fn is_embedded(&self) -> bool {
        self.contents == Contents::Solid
    }
}

impl World {
    /// Checks that every portal of every leaf names that leaf and leads to
    /// another leaf. Stale portals are reclaimed on the way.
    pub(crate) fn verify_portals(&mut self) -> Result<()> {
        let leaves: Vec<CellId> = self.leaves().map(|(id, _)| id).collect();
        let mut checked = 0;

        for id in leaves {
            let mut maps = mem::take(&mut self.cells[id].maps);

            for map in &mut maps {
                map.reclaim_stale(&mut self.portals);

                for &key in map.portals() {
                    let other = self.portals[key]
                        .other(id)
                        .ok_or(Invariant::MislinkedPortal)?;
                    let far = self.cells.get(other).ok_or(Invariant::MislinkedPortal)?;
                    if !far.is_leaf() {
                        return Err(Invariant::PortalToInternalCell.into());
                    }
                    checked += 1;
                }
            }

            self.cells[id].maps = maps;
        }

        debug!("{checked} leaf portal ends verified");
        Ok(())
    }

    /// Floods from the outside cell through the portal graph.
    ///
    /// Every leaf reached becomes an outside leaf and loses its polygons.
    /// Walked portals are released so the flood never crosses them twice.
    /// Returns the number of leaves reached.
    pub(crate) fn fill_outside(&mut self) -> Result<usize> {
        let mut visited = FxHashSet::default();
        let mut stack = vec![self.outside];
        let mut leaked = 0;

        visited.insert(self.outside);

        while let Some(id) = stack.pop() {
            let mut maps = mem::take(&mut self.cells[id].maps);

            for map in &mut maps {
                map.clear_polygons(&mut self.polygons);

                let mut kept = Vec::with_capacity(map.portals.len());
                for key in mem::take(&mut map.portals) {
                    if !self.portals.is_valid(key) {
                        self.portals.release(key);
                        continue;
                    }

                    let other = self.portals[key]
                        .other(id)
                        .ok_or(Invariant::MislinkedPortal)?;
                    if !visited.insert(other) {
                        kept.push(key);
                        continue;
                    }

                    let far = self.cells.get_mut(other).ok_or(Invariant::MislinkedPortal)?;
                    far.kind = CellKind::Leaf(Contents::Outside);
                    leaked += 1;
                    stack.push(other);
                    self.portals.release(key);
                }
                map.portals = kept;
            }

            self.cells[id].maps = maps;
        }

        if leaked > 0 {
            debug!("outside reached {leaked} leaves");
        }
        Ok(leaked)
    }

    /// The cell containing `point`.
    ///
    /// Points on a partition plane go to the front child. Descent stops at
    /// the first cell that is not internal.
    pub fn locate(&self, point: Point3<f64>) -> CellId {
        let mut id = self.root;

        while let Some(CellKind::Internal {
            partition,
            front,
            back,
        }) = self.cells.get(id).map(|cell| &cell.kind)
        {
            id = if partition.point_distance(point) < -PLANE_EPSILON {
                *back
            } else {
                *front
            };
        }

        id
    }

    /// Locates every probe point and warns about the ones that leak or sit
    /// in solid space.
    pub(crate) fn check_entities(&self, entities: &[Point3<f64>], status: &mut Status<'_>) -> Vec<EntityReport> {
        let mut reports = Vec::with_capacity(entities.len());

        for &position in entities {
            let leaf = self.locate(position);
            let Some(contents) = self.cells.get(leaf).and_then(|cell| cell.contents()) else {
                continue;
            };

            let report = EntityReport {
                position,
                leaf,
                contents,
            };
            if report.is_leak() {
                status.warn("LEAK LEAK LEAK");
            } else if report.is_embedded() {
                status.warn("warning: entity embedded in solid");
            }
            reports.push(report);
        }

        reports
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bsp::cell::Cell;
    use crate::bsp::map_plane::MapPlane;
    use crate::options::CompileOptions;
    use crate::{Plane, Polygon, Portal};
    use nalgebra::Vector3;

    /// Inward faces of the cube `-h..h`, minus the faces in `skip`. Index 5
    /// is the ceiling.
    fn make_room(h: f64, skip: &[usize]) -> Vec<Polygon> {
        let faces = [
            [[-h, -h, -h], [-h, h, -h], [-h, h, h], [-h, -h, h]],
            [[h, -h, -h], [h, -h, h], [h, h, h], [h, h, -h]],
            [[-h, -h, -h], [-h, -h, h], [h, -h, h], [h, -h, -h]],
            [[-h, h, -h], [h, h, -h], [h, h, h], [-h, h, h]],
            [[-h, -h, -h], [h, -h, -h], [h, h, -h], [-h, h, -h]],
            [[-h, -h, h], [-h, h, h], [h, h, h], [h, -h, h]],
        ];
        faces
            .iter()
            .enumerate()
            .filter(|(i, _)| !skip.contains(i))
            .map(|(_, f)| Polygon::from_coords(f))
            .collect()
    }

    fn make_floor_quad() -> Polygon {
        Polygon::from_coords(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]])
    }

    #[test]
    fn open_room_leaks() {
        let mut seen = Vec::new();
        let mut sink = |m: &str| seen.push(m.to_owned());
        let world =
            World::compile_with(&make_room(1.0, &[5]), &CompileOptions::default(), Some(&mut sink)).unwrap();

        assert_eq!(world.leaked_leaves(), 1);
        assert_eq!(world.contents_at(Point3::origin()), Some(Contents::Outside));
        assert!(world.has_leak());
        assert!(seen.iter().any(|m| m == "LEAK LEAK LEAK"));

        // Outside leaves keep no surfaces.
        assert_eq!(world.triangle_count(), 0);
    }

    #[test]
    fn closed_room_does_not_leak() {
        let world = World::compile(&make_room(1.0, &[])).unwrap();

        assert_eq!(world.leaked_leaves(), 0);
        assert_eq!(world.entity_reports().len(), 1);
        assert!(!world.entity_reports()[0].is_leak());
        assert!(!world.entity_reports()[0].is_embedded());
    }

    #[test]
    fn point_beyond_the_hull_lands_in_the_only_leaf() {
        let options = CompileOptions::default().with_entities([Point3::origin(), Point3::new(5.0, 0.0, 0.0)]);
        let world = World::compile_with(&make_room(1.0, &[]), &options, None).unwrap();

        // The only leaf covers all space, so the far probe lands in it too.
        let reports = world.entity_reports();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].leaf, reports[1].leaf);
    }

    #[test]
    fn locate_stops_at_unresolved_root() {
        let world = World::new();
        assert_eq!(world.locate(Point3::new(1.0, 2.0, 3.0)), world.root());
    }

    #[test]
    fn locate_sends_points_on_the_plane_front() {
        let mut world = World::new();
        let front = world.cells.insert(Cell::leaf(Contents::Empty));
        let back = world.cells.insert(Cell::leaf(Contents::Solid));
        let root = world.root;
        world.cells[root].kind = CellKind::Internal {
            partition: Plane::new(Vector3::z(), 0.0),
            front,
            back,
        };

        assert_eq!(world.locate(Point3::new(0.0, 0.0, 0.0)), front);
        assert_eq!(world.locate(Point3::new(0.0, 0.0, -PLANE_EPSILON / 2.0)), front);
        assert_eq!(world.locate(Point3::new(0.0, 0.0, -1.0)), back);
        assert_eq!(world.contents_at(Point3::new(0.0, 0.0, -1.0)), Some(Contents::Solid));
    }

    #[test]
    fn verify_rejects_portal_not_naming_its_leaf() {
        let mut world = World::new();
        let root = world.root;
        let outside = world.outside;
        world.cells[root].kind = CellKind::Leaf(Contents::Empty);

        let key = world.portals.alloc(Portal::new(make_floor_quad(), outside, outside));
        let mut map = MapPlane::new(Plane::new(Vector3::z(), 0.0));
        map.portals.push(key);
        world.cells[root].maps.push(map);

        let err = world.verify_portals().unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn verify_rejects_portal_to_internal_cell() {
        let mut world = World::new();
        let root = world.root;
        let front = world.cells.insert(Cell::leaf(Contents::Empty));
        let back = world.cells.insert(Cell::leaf(Contents::Solid));
        world.cells[root].kind = CellKind::Internal {
            partition: Plane::new(Vector3::z(), 0.0),
            front,
            back,
        };

        let key = world.portals.alloc(Portal::new(make_floor_quad(), front, root));
        let mut map = MapPlane::new(Plane::new(Vector3::z(), 0.0));
        map.portals.push(key);
        world.cells[front].maps.push(map);

        assert!(matches!(
            world.verify_portals(),
            Err(crate::Error::Invariant(Invariant::PortalToInternalCell))
        ));
    }

    #[test]
    fn verify_reclaims_stale_portals() {
        let mut world = World::new();
        let root = world.root;
        let outside = world.outside;
        world.cells[root].kind = CellKind::Leaf(Contents::Empty);

        let key = world.portals.alloc(Portal::new(make_floor_quad(), root, outside));
        world.portals.release(key);
        let mut map = MapPlane::new(Plane::new(Vector3::z(), 0.0));
        map.portals.push(key);
        world.cells[root].maps.push(map);

        world.verify_portals().unwrap();
        assert!(world.cells[root].maps()[0].portals().is_empty());
        assert!(world.portals.is_empty());
    }
}

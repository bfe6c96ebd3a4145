//! Hull faces: finding them, stripping them and building the root portals.
//!
//! A boundary is a map plane with the whole level on one side of it. Its
//! polygons are taken out of the tree before partitioning; they come back
//! as the "seal" that decides where the root cell touches the outside.

use log::debug;

use crate::cuttable::Cuttable;
use crate::error::{Invariant, Result};
use crate::keys::CellId;
use crate::pool::{PolygonPool, PortalPool};
use crate::{Classification, Polygon, Portal, Rectangle};

use super::map_plane::{attach_portals, HullSide, MapPlane};

/// Tags every map plane that bounds the level and returns their indices.
///
/// A map plane is a boundary when every parallel plane and every polygon of
/// every crossing plane lies strictly on one side of it, and always the same
/// side. The tag is that side; a map plane with nothing to compare against
/// is a boundary without a side. Tags of other map planes are cleared.
pub fn mark_boundary_planes(maps: &mut [MapPlane], polygons: &PolygonPool) -> Result<Vec<usize>> {
    let mut boundaries = Vec::new();

    for index in (0..maps.len()).rev() {
        let (is_boundary, side) = hull_side(maps, index, polygons)?;
        maps[index].boundary = if is_boundary { side } else { None };
        if is_boundary {
            boundaries.push(index);
        }
    }

    debug!("{} of {} planes bound the level", boundaries.len(), maps.len());
    Ok(boundaries)
}

fn hull_side(
    maps: &[MapPlane],
    index: usize,
    polygons: &PolygonPool,
) -> Result<(bool, Option<HullSide>)> {
    let plane = &maps[index].plane;
    let mut first_side = None;

    // Records `side`, reporting false when it disagrees with the first one.
    let mut agree = |side: HullSide| match first_side {
        None => {
            first_side = Some(side);
            true
        }
        Some(first) => first == side,
    };

    for (other_index, other) in maps.iter().enumerate().rev() {
        if other_index == index {
            continue;
        }

        match plane.classify_plane(&other.plane) {
            Classification::Front => {
                if !agree(HullSide::Front) {
                    return Ok((false, None));
                }
            }
            Classification::Back => {
                if !agree(HullSide::Back) {
                    return Ok((false, None));
                }
            }
            Classification::Coplanar => return Err(Invariant::CoplanarMapPlanes.into()),
            Classification::Spanning => {
                for polygon in other.polygons.iter().filter_map(|&key| polygons.get(key)) {
                    if polygon.lies_in(plane) {
                        return Err(Invariant::CoplanarBoundaryPolygon.into());
                    }

                    let consistent = match HullSide::from_classification(polygon.side(plane)) {
                        Some(side) => agree(side),
                        None => false,
                    };
                    if !consistent {
                        return Ok((false, None));
                    }
                }
            }
        }
    }

    Ok((true, first_side))
}

/// Removes the polygons of every boundary from the tree.
///
/// Returns the removed polygons, one list per boundary in the order of
/// `boundaries`.
pub fn strip_boundary_planes(
    maps: &mut [MapPlane],
    boundaries: &[usize],
    polygons: &mut PolygonPool,
) -> Vec<Vec<Polygon>> {
    boundaries
        .iter()
        .map(|&index| {
            maps[index]
                .polygons
                .drain(..)
                .filter_map(|key| polygons.free(key))
                .collect()
        })
        .collect()
}

/// Clips a huge quad on boundary `index` down to its face of the hull.
pub(crate) fn hull_face(maps: &[MapPlane], boundaries: &[usize], index: usize, extent: f64) -> Polygon {
    let plane = &maps[index].plane;
    let mut face = Polygon::from(Rectangle::on_plane(plane, extent));

    for &clip_index in boundaries {
        if clip_index == index {
            continue;
        }
        let clip = &maps[clip_index];
        if matches!(
            plane.classify_plane(&clip.plane),
            Classification::Front | Classification::Back
        ) {
            continue;
        }

        let (front, back) = face.cut(&clip.plane);
        face = match (clip.boundary, front, back) {
            (Some(HullSide::Front), Some(front), _) => front,
            (_, _, Some(back)) => back,
            _ => face,
        };
    }

    face
}

/// Everything the root portal builder touches.
pub(crate) struct RootPortals<'a> {
    pub root: CellId,
    pub outside: CellId,
    pub root_maps: &'a mut [MapPlane],
    pub outside_maps: &'a mut Vec<MapPlane>,
    pub portals: &'a mut PortalPool,
    pub extent: f64,
}

impl RootPortals<'_> {
    /// Links the root to the outside through every part of the hull that
    /// the seal polygons leave open. Returns the number of portals made.
    ///
    /// A level whose hull faces are fully covered gets no root portals.
    pub fn build(self, boundaries: &[usize], seals: &[Vec<Polygon>]) -> Result<usize> {
        let mut count = 0;

        for (&index, seal) in boundaries.iter().zip(seals) {
            let face = hull_face(&*self.root_maps, boundaries, index, self.extent);

            for opening in face.subtract_all(seal) {
                let key = self.portals.alloc(Portal::new(opening, self.root, self.outside));
                self.root_maps[index].portals.push(key);

                let plane = self.root_maps[index].plane.clone();
                attach_portals(&mut *self.outside_maps, &[key], &*self.portals, Some(&plane))?;
                count += 1;
            }
        }

        debug!("{count} openings from the root to the outside");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bsp::map_plane::group_by_plane;
    use approx::assert_relative_eq;
    use slotmap::SlotMap;

    /// Inward-facing faces of an axis-aligned box, minus the faces in `skip`.
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

    fn make_cells() -> (CellId, CellId) {
        let mut cells: SlotMap<CellId, ()> = SlotMap::with_key();
        (cells.insert(()), cells.insert(()))
    }

    #[test]
    fn room_walls_are_front_boundaries() {
        let mut pool = PolygonPool::new();
        let mut maps = group_by_plane(&make_room(1.0, &[]), &mut pool).unwrap();

        let boundaries = mark_boundary_planes(&mut maps, &pool).unwrap();
        assert_eq!(boundaries.len(), 6);
        assert!(maps.iter().all(|m| m.boundary() == Some(HullSide::Front)));
    }

    #[test]
    fn interior_plane_is_not_a_boundary() {
        let mut polygons = make_room(2.0, &[]);
        // A free-standing wall across the middle of the room.
        polygons.push(Polygon::from_coords(&[
            [0.0, -1.0, -1.0],
            [0.0, 1.0, -1.0],
            [0.0, 1.0, 1.0],
            [0.0, -1.0, 1.0],
        ]));

        let mut pool = PolygonPool::new();
        let mut maps = group_by_plane(&polygons, &mut pool).unwrap();
        let boundaries = mark_boundary_planes(&mut maps, &pool).unwrap();

        assert_eq!(boundaries.len(), 6);
        assert_eq!(maps[6].boundary(), None);
    }

    #[test]
    fn marking_twice_is_stable() {
        let mut pool = PolygonPool::new();
        let mut maps = group_by_plane(&make_room(1.0, &[2]), &mut pool).unwrap();

        let first = mark_boundary_planes(&mut maps, &pool).unwrap();
        let tags: Vec<_> = maps.iter().map(MapPlane::boundary).collect();
        let second = mark_boundary_planes(&mut maps, &pool).unwrap();

        assert_eq!(first, second);
        assert_eq!(tags, maps.iter().map(MapPlane::boundary).collect::<Vec<_>>());
    }

    #[test]
    fn coincident_planes_are_fatal() {
        let mut pool = PolygonPool::new();
        let mut maps = group_by_plane(&make_room(1.0, &[]), &mut pool).unwrap();
        let copy = maps[0].sibling();
        maps.push(copy);

        let err = mark_boundary_planes(&mut maps, &pool).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn strip_returns_seals() {
        let mut pool = PolygonPool::new();
        let mut maps = group_by_plane(&make_room(1.0, &[]), &mut pool).unwrap();
        let boundaries = mark_boundary_planes(&mut maps, &pool).unwrap();

        let seals = strip_boundary_planes(&mut maps, &boundaries, &mut pool);
        assert_eq!(seals.len(), 6);
        assert!(seals.iter().all(|s| s.len() == 1));
        assert!(maps.iter().all(|m| m.polygons().is_empty()));
        assert!(pool.is_empty());
    }

    #[test]
    fn hull_face_is_the_wall() {
        let mut pool = PolygonPool::new();
        let mut maps = group_by_plane(&make_room(1.0, &[]), &mut pool).unwrap();
        let boundaries = mark_boundary_planes(&mut maps, &pool).unwrap();

        for &index in &boundaries {
            let face = hull_face(&maps, &boundaries, index, 1000.0);
            assert_relative_eq!(face.area(), 4.0, epsilon = 1e-6);
            assert!(face.lies_in(maps[index].plane()));
        }
    }

    #[test]
    fn sealed_room_has_no_root_portals() {
        let (root, outside) = make_cells();
        let mut pool = PolygonPool::new();
        let mut portals = PortalPool::new();
        let mut outside_maps = Vec::new();

        let mut maps = group_by_plane(&make_room(1.0, &[]), &mut pool).unwrap();
        let boundaries = mark_boundary_planes(&mut maps, &pool).unwrap();
        let seals = strip_boundary_planes(&mut maps, &boundaries, &mut pool);

        let count = RootPortals {
            root,
            outside,
            root_maps: &mut maps,
            outside_maps: &mut outside_maps,
            portals: &mut portals,
            extent: 1000.0,
        }
        .build(&boundaries, &seals)
        .unwrap();

        assert_eq!(count, 0);
        assert!(portals.is_empty());
        assert!(outside_maps.is_empty());
    }

    #[test]
    fn open_room_links_root_to_outside() {
        let (root, outside) = make_cells();
        let mut pool = PolygonPool::new();
        let mut portals = PortalPool::new();
        let mut outside_maps = Vec::new();

        // No ceiling: the four walls extend upwards without a seal.
        let mut maps = group_by_plane(&make_room(1.0, &[5]), &mut pool).unwrap();
        let boundaries = mark_boundary_planes(&mut maps, &pool).unwrap();
        let seals = strip_boundary_planes(&mut maps, &boundaries, &mut pool);

        let count = RootPortals {
            root,
            outside,
            root_maps: &mut maps,
            outside_maps: &mut outside_maps,
            portals: &mut portals,
            extent: 1000.0,
        }
        .build(&boundaries, &seals)
        .unwrap();

        assert_eq!(count, 4);
        assert_eq!(outside_maps.len(), 4);
        for (_, portal) in portals.iter() {
            assert_eq!(portal.other(root), Some(outside));
            assert!(portal.polygon().vertices().iter().all(|v| v.z >= 1.0 - 1e-6));
        }
    }
}

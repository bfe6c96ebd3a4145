//! Recursive partitioning of cells into convex leaves.
//!
//! Each unresolved cell either becomes a leaf or is split by one of its map
//! planes. Splitting hands every map plane of the parent to the children,
//! cutting polygons and portals that straddle the partition, and joins the
//! two children with a new portal lying on the partition plane.

use std::mem;

use crate::cuttable::Cuttable;
use crate::error::{Invariant, Result};
use crate::keys::{CellId, PortalKey};
use crate::status::Status;
use crate::{Classification, Plane, Polygon, Portal, Rectangle};

use super::cell::{Cell, CellKind, Contents};
use super::map_plane::{attach_portals, HullSide, MapPlane};
use super::selector::PartitionSelector;
use super::world::World;

/// Child map planes built while splitting one parent map plane.
struct Halves {
    front: Option<MapPlane>,
    back: Option<MapPlane>,
}

impl Halves {
    fn empty() -> Self {
        Self {
            front: None,
            back: None,
        }
    }

    /// Both halves exist from the start, so the plane reaches both children
    /// even when it carries nothing.
    fn both(map: &MapPlane) -> Self {
        Self {
            front: Some(map.sibling()),
            back: Some(map.sibling()),
        }
    }

    fn front(&mut self, template: &MapPlane) -> &mut MapPlane {
        self.front.get_or_insert_with(|| template.sibling())
    }

    fn back(&mut self, template: &MapPlane) -> &mut MapPlane {
        self.back.get_or_insert_with(|| template.sibling())
    }

    fn push_into(self, front: &mut Vec<MapPlane>, back: &mut Vec<MapPlane>) {
        front.extend(self.front);
        back.extend(self.back);
    }
}

impl World {
    /// Partitions the root until every cell is a leaf.
    ///
    /// Cells are processed depth first, front child before back child. Front
    /// children that become leaves are empty, back children solid.
    pub(crate) fn partition<S: PartitionSelector>(
        &mut self,
        selector: &S,
        extent: f64,
        status: &mut Status<'_>,
    ) -> Result<()> {
        let mut work = vec![(self.root, Contents::Empty, None)];

        while let Some((cell, proposed, label)) = work.pop() {
            if let Some(label) = label {
                status.step(label);
            }

            match selector.select(&self.cells[cell].maps, &self.polygons) {
                None => self.make_leaf(cell, proposed, status)?,
                Some(index) => {
                    let (front, back) = self.split_cell(cell, index, extent, status)?;
                    work.push((back, Contents::Solid, Some("partition (back)...")));
                    work.push((front, Contents::Empty, Some("partition (front)...")));
                }
            }
        }

        Ok(())
    }

    /// Turns `cell` into a leaf and drops portals it cannot see through.
    ///
    /// A portal survives when the far cell is not yet a leaf or is a leaf
    /// with the same contents. An empty leaf also keeps its portals to the
    /// outside cell; they are the openings the flood fill leaks through.
    fn make_leaf(&mut self, cell: CellId, contents: Contents, status: &mut Status<'_>) -> Result<()> {
        status.step("leaf");

        let mut maps = mem::take(&mut self.cells[cell].maps);
        self.cells[cell].kind = CellKind::Leaf(contents);

        for map in &mut maps {
            let mut kept = Vec::with_capacity(map.portals.len());

            for key in mem::take(&mut map.portals) {
                if !self.portals.is_valid(key) {
                    self.portals.release(key);
                    continue;
                }

                let other = self.portals[key]
                    .other(cell)
                    .ok_or(Invariant::MislinkedPortal)?;
                let far = self
                    .cells
                    .get(other)
                    .ok_or(Invariant::MislinkedPortal)?
                    .contents();

                let keep = match far {
                    Some(far) if far != contents => {
                        contents == Contents::Empty && other == self.outside
                    }
                    _ => true,
                };

                if keep {
                    kept.push(key);
                } else {
                    self.portals.release(key);
                }
            }

            map.portals = kept;
            if contents != Contents::Empty {
                map.clear_polygons(&mut self.polygons);
            }
        }

        self.cells[cell].maps = maps;
        Ok(())
    }

    /// Splits `cell` by the plane of its map plane `chosen`, returning the
    /// front and back children.
    fn split_cell(
        &mut self,
        cell: CellId,
        chosen: usize,
        extent: f64,
        status: &mut Status<'_>,
    ) -> Result<(CellId, CellId)> {
        let maps = mem::take(&mut self.cells[cell].maps);
        let partition = maps[chosen].plane.clone();

        let front = self.cells.insert(Cell::unresolved(Vec::new()));
        let back = self.cells.insert(Cell::unresolved(Vec::new()));
        let quad = Polygon::from(Rectangle::on_plane(&partition, extent));
        let portal = self.portals.alloc(Portal::new(quad, front, back));

        let mut split = Split {
            cell,
            front,
            back,
            partition: &partition,
            portal,
            front_maps: Vec::new(),
            back_maps: Vec::new(),
        };

        for (index, map) in maps.into_iter().enumerate().rev() {
            if index == chosen {
                status.step("in");
                split.coplanar(self, map);
                continue;
            }

            match partition.classify_plane(&map.plane) {
                Classification::Front => {
                    status.step("front");
                    split.parallel(self, map, HullSide::Front)?;
                }
                Classification::Back => {
                    status.step("back");
                    split.parallel(self, map, HullSide::Back)?;
                }
                Classification::Spanning => {
                    status.step("across");
                    split.across(self, map)?;
                }
                Classification::Coplanar => return Err(Invariant::CoplanarMapPlanes.into()),
            }
        }

        let Split {
            front_maps,
            back_maps,
            ..
        } = split;

        self.cells[front].maps = front_maps;
        self.cells[back].maps = back_maps;
        self.cells[cell].kind = CellKind::Internal {
            partition,
            front,
            back,
        };

        Ok((front, back))
    }
}

/// State of one cell split.
struct Split<'p> {
    cell: CellId,
    front: CellId,
    back: CellId,
    partition: &'p Plane,
    portal: PortalKey,
    front_maps: Vec<MapPlane>,
    back_maps: Vec<MapPlane>,
}

impl Split<'_> {
    fn child(&self, side: HullSide) -> CellId {
        match side {
            HullSide::Front => self.front,
            HullSide::Back => self.back,
        }
    }

    /// Moves a parallel map plane whole into one child.
    fn parallel(&mut self, world: &mut World, mut map: MapPlane, side: HullSide) -> Result<()> {
        let child = self.child(side);
        map.reclaim_stale(&mut world.portals);

        for &key in &map.portals {
            if !world.portals[key].relink(self.cell, child) {
                return Err(Invariant::MislinkedPortal.into());
            }
        }

        match side {
            HullSide::Front => self.front_maps.push(map),
            HullSide::Back => self.back_maps.push(map),
        }
        Ok(())
    }

    /// Handles the partition's own map plane.
    ///
    /// Polygons facing along the partition normal go front, the rest back.
    /// Both children get a copy of the plane carrying the partition portal,
    /// tagged so it is never chosen again. Portals already on the plane are
    /// released.
    fn coplanar(&mut self, world: &mut World, mut map: MapPlane) {
        let mut front = map.sibling();
        front.boundary = Some(HullSide::Front);
        front.portals.push(self.portal);

        let mut back = map.sibling();
        back.boundary = Some(HullSide::Back);
        back.portals.push(self.portal);

        let normal = self.partition.normal();
        for key in mem::take(&mut map.polygons) {
            let facing = world
                .polygons
                .get(key)
                .is_some_and(|polygon| polygon.normal().dot(&normal) > 0.0);
            if facing {
                front.polygons.push(key);
            } else {
                back.polygons.push(key);
            }
        }

        map.clear_portals(&mut world.portals);

        self.front_maps.push(front);
        self.back_maps.push(back);
    }

    /// Splits a map plane crossing the partition between the children.
    fn across(&mut self, world: &mut World, mut map: MapPlane) -> Result<()> {
        let mut halves = match map.boundary {
            Some(side) => {
                self.clip_portal(world, &map.plane, side)?;
                Halves::both(&map)
            }
            None => Halves::empty(),
        };

        for key in mem::take(&mut map.polygons) {
            let Some(polygon) = world.polygons.get(key) else {
                continue;
            };

            match polygon.side(self.partition) {
                Classification::Front | Classification::Coplanar => halves.front(&map).polygons.push(key),
                Classification::Back => halves.back(&map).polygons.push(key),
                Classification::Spanning => {
                    let (front, back) = polygon.cut(self.partition);
                    world.polygons.free(key);

                    if let Some(front) = front {
                        let key = world.polygons.alloc(front);
                        halves.front(&map).polygons.push(key);
                    }
                    if let Some(back) = back {
                        let key = world.polygons.alloc(back);
                        halves.back(&map).polygons.push(key);
                    }
                }
            }
        }

        for key in mem::take(&mut map.portals) {
            if !world.portals.is_valid(key) {
                world.portals.release(key);
                continue;
            }

            match world.portals[key].polygon().side(self.partition) {
                Classification::Front | Classification::Coplanar => {
                    if !world.portals[key].relink(self.cell, self.front) {
                        return Err(Invariant::MislinkedPortal.into());
                    }
                    halves.front(&map).portals.push(key);
                }
                Classification::Back => {
                    if !world.portals[key].relink(self.cell, self.back) {
                        return Err(Invariant::MislinkedPortal.into());
                    }
                    halves.back(&map).portals.push(key);
                }
                Classification::Spanning => {
                    let (front_key, back_key) = self.split_portal(world, key, &map.plane)?;
                    halves.front(&map).portals.push(front_key);
                    halves.back(&map).portals.push(back_key);
                }
            }
        }

        halves.push_into(&mut self.front_maps, &mut self.back_maps);
        Ok(())
    }

    /// Clips the partition portal to the inner side of a boundary.
    fn clip_portal(&self, world: &mut World, boundary: &Plane, side: HullSide) -> Result<()> {
        let portal = &mut world.portals[self.portal];
        let (front, back) = portal.polygon().cut(boundary);

        let kept = match side {
            HullSide::Front => front,
            HullSide::Back => back,
        };
        portal.set_polygon(kept.ok_or(Invariant::EmptyPartitionPortal)?);
        Ok(())
    }

    /// Cuts a straddling portal in two, one piece per child, and hands both
    /// pieces to the cell on its far side. The original portal is released.
    fn split_portal(&self, world: &mut World, key: PortalKey, plane: &Plane) -> Result<(PortalKey, PortalKey)> {
        let portal = &world.portals[key];
        let other = portal.other(self.cell).ok_or(Invariant::MislinkedPortal)?;

        let (Some(front), Some(back)) = portal.polygon().cut(self.partition) else {
            return Err(Invariant::EmptyPortalSplit.into());
        };

        let front_key = world.portals.alloc(Portal::new(front, self.front, other));
        let back_key = world.portals.alloc(Portal::new(back, self.back, other));

        // Only the outside cell may lack a map plane for the pieces.
        let fallback = (other == world.outside).then_some(plane);
        let far = world
            .cells
            .get_mut(other)
            .ok_or(Invariant::MislinkedPortal)?;
        attach_portals(&mut far.maps, &[front_key, back_key], &world.portals, fallback)?;

        world.portals.release(key);
        Ok((front_key, back_key))
    }
}

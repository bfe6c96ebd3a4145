//! The compiled world and the compilation pipeline.

use log::{debug, info};
use nalgebra::Point3;
use slotmap::SlotMap;

use crate::error::{Error, Result};
use crate::keys::{CellId, PolygonKey, PortalKey};
use crate::options::CompileOptions;
use crate::pool::{PolygonPool, PoolStats, PortalPool};
use crate::status::Status;
use crate::{Polygon, Portal, Triangle};

use super::boundary::{mark_boundary_planes, strip_boundary_planes, RootPortals};
use super::cell::{Cell, CellKind, Contents};
use super::flood::EntityReport;
use super::map_plane::group_by_plane;
use super::selector::LeastSplits;

/// A BSP tree of convex cells joined by portals, compiled from the polygons
/// bounding an indoor level.
///
/// # Construction
///
/// ```ignore
/// use indoor::{World, Polygon};
///
/// let polygons: Vec<Polygon> = /* walls, floors, ceilings */;
/// let world = World::compile(&polygons)?;
/// assert!(!world.has_leak());
/// world.save("level.bin")?;
/// ```
///
/// Besides the tree the world owns a distinguished outside cell. Every leaf
/// reachable from it through portals is reclassified as outside; a probe
/// point landing in such a leaf is a leak.
#[derive(Debug)]
pub struct World {
    pub(crate) cells: SlotMap<CellId, Cell>,
    pub(crate) root: CellId,
    pub(crate) outside: CellId,
    pub(crate) polygons: PolygonPool,
    pub(crate) portals: PortalPool,
    pub(crate) reports: Vec<EntityReport>,
    pub(crate) leaked: usize,
}

impl World {
    pub(crate) fn new() -> Self {
        let mut cells = SlotMap::with_key();
        let outside = cells.insert(Cell::leaf(Contents::Outside));
        let root = cells.insert(Cell::unresolved(Vec::new()));

        Self {
            cells,
            root,
            outside,
            polygons: PolygonPool::new(),
            portals: PortalPool::new(),
            reports: Vec::new(),
            leaked: 0,
        }
    }

    /// Compiles polygons with the default options and no progress callback.
    pub fn compile(polygons: &[Polygon]) -> Result<Self> {
        Self::compile_with(polygons, &CompileOptions::default(), None)
    }

    /// Compiles polygons into a world.
    ///
    /// `status`, when given, receives the name of each phase and each
    /// routing decision of the partitioner. No world is returned when the
    /// input is rejected or an invariant breaks.
    pub fn compile_with(
        polygons: &[Polygon],
        options: &CompileOptions,
        status: Option<&mut dyn FnMut(&str)>,
    ) -> Result<Self> {
        let mut status = Status::new(status);
        validate(polygons, options.max_vertices)?;

        let mut world = World::new();

        status.phase("group_by_plane...");
        let mut maps = group_by_plane(polygons, &mut world.polygons)?;

        status.phase("mark_boundary_planes...");
        let boundaries = mark_boundary_planes(&mut maps, &world.polygons)?;

        status.phase("strip_boundary_planes...");
        let seals = strip_boundary_planes(&mut maps, &boundaries, &mut world.polygons);

        status.phase("make_root_portals...");
        let mut outside_maps = Vec::new();
        RootPortals {
            root: world.root,
            outside: world.outside,
            root_maps: &mut maps,
            outside_maps: &mut outside_maps,
            portals: &mut world.portals,
            extent: options.plane_extent,
        }
        .build(&boundaries, &seals)?;
        world.cells[world.root].maps = maps;
        world.cells[world.outside].maps = outside_maps;

        status.phase("partition...");
        world.partition(&LeastSplits, options.plane_extent, &mut status)?;

        status.phase("verify_portals...");
        world.verify_portals()?;

        status.phase("fill_outside...");
        world.leaked = world.fill_outside()?;

        status.phase("check_entities...");
        world.reports = world.check_entities(&options.entities, &mut status);

        status.phase("Done");

        info!(
            "{} leaves, depth {}, {} triangles, {} leaked",
            world.leaves().count(),
            world.depth(),
            world.triangle_count(),
            world.leaked
        );
        debug!("polygon pool: {:?}", world.polygons.stats());
        debug!("portal pool: {:?}", world.portals.stats());

        Ok(world)
    }

    /// The root of the tree.
    #[inline]
    pub fn root(&self) -> CellId {
        self.root
    }

    /// The cell standing for everything outside the level.
    #[inline]
    pub fn outside(&self) -> CellId {
        self.outside
    }

    #[inline]
    pub fn cell(&self, id: CellId) -> Option<&Cell> {
        self.cells.get(id)
    }

    #[inline]
    pub fn polygon(&self, key: PolygonKey) -> Option<&Polygon> {
        self.polygons.get(key)
    }

    #[inline]
    pub fn portal(&self, key: PortalKey) -> Option<&Portal> {
        self.portals.get(key)
    }

    /// Leaves of the tree in front-to-back preorder.
    pub fn leaves(&self) -> impl Iterator<Item = (CellId, &Cell)> + '_ {
        let mut stack = vec![self.root];
        std::iter::from_fn(move || {
            while let Some(id) = stack.pop() {
                let cell = self.cells.get(id)?;
                match cell.children() {
                    Some((front, back)) => {
                        stack.push(back);
                        stack.push(front);
                    }
                    None => return Some((id, cell)),
                }
            }
            None
        })
    }

    /// Maximum depth of the tree; a lone leaf has depth 1.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self.root, 1)];

        while let Some((id, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            if let Some((front, back)) = self.cells.get(id).and_then(Cell::children) {
                stack.push((front, depth + 1));
                stack.push((back, depth + 1));
            }
        }

        deepest
    }

    /// Polygons kept on a leaf, newest map plane first.
    pub fn leaf_polygons(&self, id: CellId) -> impl Iterator<Item = &Polygon> + '_ {
        self.cells
            .get(id)
            .into_iter()
            .flat_map(|cell| cell.maps().iter().rev())
            .flat_map(|map| map.polygons())
            .filter_map(|&key| self.polygons.get(key))
    }

    /// Valid portals of a leaf.
    pub fn leaf_portals(&self, id: CellId) -> impl Iterator<Item = &Portal> + '_ {
        self.cells
            .get(id)
            .into_iter()
            .flat_map(|cell| cell.maps())
            .flat_map(|map| map.portals())
            .filter_map(|&key| self.portals.get(key))
            .filter(|portal| portal.is_valid())
    }

    /// Fan triangles of a leaf as written to a level file. Only empty leaves
    /// have any.
    pub fn leaf_triangles(&self, id: CellId) -> Vec<Triangle> {
        if self.cells.get(id).and_then(Cell::contents) != Some(Contents::Empty) {
            return Vec::new();
        }
        self.leaf_polygons(id)
            .flat_map(Polygon::fan)
            .map(Triangle::from_fan)
            .collect()
    }

    /// Triangles written for the whole tree.
    pub fn triangle_count(&self) -> usize {
        self.leaves()
            .filter(|(_, cell)| cell.contents() == Some(Contents::Empty))
            .flat_map(|(id, _)| self.leaf_polygons(id))
            .map(Polygon::fan_len)
            .sum()
    }

    /// Contents of the leaf containing `point`.
    pub fn contents_at(&self, point: Point3<f64>) -> Option<Contents> {
        self.cells.get(self.locate(point)).and_then(Cell::contents)
    }

    /// Leaves that the outside flooded into.
    #[inline]
    pub fn leaked_leaves(&self) -> usize {
        self.leaked
    }

    /// Results of the probe point check, one per configured entity.
    #[inline]
    pub fn entity_reports(&self) -> &[EntityReport] {
        &self.reports
    }

    /// True if any probe point ended up outside the level.
    pub fn has_leak(&self) -> bool {
        self.reports.iter().any(EntityReport::is_leak)
    }

    pub fn polygon_stats(&self) -> PoolStats {
        self.polygons.stats()
    }

    pub fn portal_stats(&self) -> PoolStats {
        self.portals.stats()
    }

    /// The cell kind of `id`, for walking the tree by hand.
    pub fn kind(&self, id: CellId) -> Option<&CellKind> {
        self.cells.get(id).map(Cell::kind)
    }
}

fn validate(polygons: &[Polygon], max_vertices: usize) -> Result<()> {
    if polygons.is_empty() {
        return Err(Error::EmptyInput);
    }

    for (index, polygon) in polygons.iter().enumerate() {
        let count = polygon.len();
        if !(3..=max_vertices).contains(&count) {
            return Err(Error::VertexCount {
                index,
                count,
                max: max_vertices,
            });
        }
        if polygon.unit_normal().is_none() {
            return Err(Error::DegeneratePolygon(index));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_triangle(z: f64) -> Polygon {
        Polygon::from_coords(&[[0.0, 0.0, z], [1.0, 0.0, z], [0.0, 1.0, z]])
    }

    /// Inward-facing faces of the cube spanning `-h..h` on every axis.
    fn make_room(h: f64) -> Vec<Polygon> {
        [
            [[-h, -h, -h], [-h, h, -h], [-h, h, h], [-h, -h, h]],
            [[h, -h, -h], [h, -h, h], [h, h, h], [h, h, -h]],
            [[-h, -h, -h], [-h, -h, h], [h, -h, h], [h, -h, -h]],
            [[-h, h, -h], [h, h, -h], [h, h, h], [-h, h, h]],
            [[-h, -h, -h], [h, -h, -h], [h, h, -h], [-h, h, -h]],
            [[-h, -h, h], [-h, h, h], [h, h, h], [h, -h, h]],
        ]
        .iter()
        .map(|face| Polygon::from_coords(face))
        .collect()
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(World::compile(&[]), Err(Error::EmptyInput)));
    }

    #[test]
    fn vertex_count_is_checked() {
        let line = Polygon::from_coords(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);
        let err = World::compile(&[make_triangle(0.0), line]).unwrap_err();
        assert!(matches!(err, Error::VertexCount { index: 1, count: 2, max: 8 }));

        let options = CompileOptions::default().with_max_vertices(3);
        let square = Polygon::from_coords(&[
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ]);
        let err = World::compile_with(&[square], &options, None).unwrap_err();
        assert!(matches!(err, Error::VertexCount { index: 0, count: 4, max: 3 }));
    }

    #[test]
    fn zero_area_polygon_is_rejected() {
        let sliver = Polygon::from_coords(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]]);
        let err = World::compile(&[make_triangle(0.0), sliver]).unwrap_err();
        assert!(matches!(err, Error::DegeneratePolygon(1)));
        assert!(!err.is_fatal());
    }

    #[test]
    fn closed_room_is_a_single_empty_leaf() {
        let world = World::compile(&make_room(1.0)).unwrap();

        assert_eq!(world.depth(), 1);
        assert_eq!(world.leaves().count(), 1);
        assert_eq!(world.contents_at(Point3::origin()), Some(Contents::Empty));
        assert_eq!(world.leaked_leaves(), 0);
        assert!(!world.has_leak());

        // Hull faces are stripped, nothing is left to draw.
        assert_eq!(world.triangle_count(), 0);
    }

    #[test]
    fn status_sink_sees_every_phase() {
        let mut seen = Vec::new();
        let mut sink = |m: &str| seen.push(m.to_owned());
        World::compile_with(&make_room(1.0), &CompileOptions::default(), Some(&mut sink)).unwrap();

        let phases = [
            "group_by_plane...",
            "mark_boundary_planes...",
            "strip_boundary_planes...",
            "make_root_portals...",
            "partition...",
            "leaf",
            "verify_portals...",
            "fill_outside...",
            "check_entities...",
            "Done",
        ];
        assert_eq!(seen, phases);
    }

    #[test]
    fn single_polygon_compiles() {
        // A lone plane is a boundary without a side: its polygon is stripped
        // but the plane still splits the root.
        let world = World::compile(&[make_triangle(0.0)]).unwrap();
        assert_eq!(world.depth(), 2);
        assert_eq!(world.contents_at(Point3::new(0.0, 0.0, 1.0)), Some(Contents::Empty));
        assert_eq!(world.contents_at(Point3::new(0.0, 0.0, -1.0)), Some(Contents::Solid));
        assert_eq!(world.triangle_count(), 0);
        assert!(!world.has_leak());
    }
}

//! Partition plane selection.
//!
//! The choice of partition plane decides how many polygons get split and so
//! how much geometry the compiled level carries.

use crate::pool::PolygonPool;
use crate::Classification;

use super::map_plane::MapPlane;

/// Strategy for choosing which map plane of a cell partitions it.
pub trait PartitionSelector {
    /// Returns the index into `maps` of the partition plane, or `None` when
    /// the cell cannot be split and becomes a leaf.
    ///
    /// Map planes carrying a boundary tag must never be chosen.
    fn select(&self, maps: &[MapPlane], polygons: &PolygonPool) -> Option<usize>;
}

/// Picks the untagged map plane that splits the fewest polygons.
///
/// Only polygons on planes crossing the candidate are counted. Ties go to
/// the newest candidate.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeastSplits;

impl LeastSplits {
    /// Number of polygons the plane of `maps[index]` would split.
    pub fn cost(maps: &[MapPlane], index: usize, polygons: &PolygonPool) -> usize {
        let plane = maps[index].plane();

        maps.iter()
            .enumerate()
            .filter(|&(other, map)| {
                other != index && plane.classify_plane(map.plane()) == Classification::Spanning
            })
            .flat_map(|(_, map)| map.polygons())
            .filter_map(|&key| polygons.get(key))
            .filter(|polygon| polygon.side(plane) == Classification::Spanning)
            .count()
    }
}

impl PartitionSelector for LeastSplits {
    fn select(&self, maps: &[MapPlane], polygons: &PolygonPool) -> Option<usize> {
        let mut best: Option<(usize, usize)> = None;

        for index in (0..maps.len()).rev() {
            if maps[index].boundary().is_some() {
                continue;
            }

            let cost = Self::cost(maps, index, polygons);
            if best.is_none_or(|(_, best_cost)| cost < best_cost) {
                best = Some((index, cost));
            }
        }

        best.map(|(index, _)| index)
    }
}

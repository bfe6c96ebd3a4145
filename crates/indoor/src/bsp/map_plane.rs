//! Map planes: the polygons and portals of one cell that share a plane.

use log::debug;

use crate::error::{Error, Invariant, Result};
use crate::keys::{PolygonKey, PortalKey};
use crate::pool::{PolygonPool, PortalPool};
use crate::{Classification, Plane, Polygon, Portal};

/// The side of a hull face on which the rest of the level lies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HullSide {
    Front,
    Back,
}

impl HullSide {
    /// Converts a strict front/back classification.
    pub fn from_classification(classification: Classification) -> Option<Self> {
        match classification {
            Classification::Front => Some(HullSide::Front),
            Classification::Back => Some(HullSide::Back),
            Classification::Coplanar | Classification::Spanning => None,
        }
    }
}

/// A plane of a cell together with the polygons and portals lying on it.
///
/// `boundary` is set on hull faces and on the two copies of a partition
/// plane handed to its children. Tagged planes are never chosen as
/// partitions again.
#[derive(Debug, Clone, PartialEq)]
pub struct MapPlane {
    pub(crate) plane: Plane,
    pub(crate) polygons: Vec<PolygonKey>,
    pub(crate) portals: Vec<PortalKey>,
    pub(crate) boundary: Option<HullSide>,
}

impl MapPlane {
    pub fn new(plane: Plane) -> Self {
        Self {
            plane,
            polygons: Vec::new(),
            portals: Vec::new(),
            boundary: None,
        }
    }

    /// An empty map plane with the same plane and tag as `self`.
    pub(crate) fn sibling(&self) -> Self {
        Self {
            boundary: self.boundary,
            ..Self::new(self.plane.clone())
        }
    }

    #[inline]
    pub fn plane(&self) -> &Plane {
        &self.plane
    }

    #[inline]
    pub fn polygons(&self) -> &[PolygonKey] {
        &self.polygons
    }

    #[inline]
    pub fn portals(&self) -> &[PortalKey] {
        &self.portals
    }

    #[inline]
    pub fn boundary(&self) -> Option<HullSide> {
        self.boundary
    }

    /// Frees every polygon of the plane.
    pub(crate) fn clear_polygons(&mut self, pool: &mut PolygonPool) {
        for key in self.polygons.drain(..) {
            pool.free(key);
        }
    }

    /// Releases every portal of the plane.
    pub(crate) fn clear_portals(&mut self, pool: &mut PortalPool) {
        for key in self.portals.drain(..) {
            pool.release(key);
        }
    }

    /// Drops stale portals from the list, freeing their slots.
    pub(crate) fn reclaim_stale(&mut self, pool: &mut PortalPool) {
        self.portals.retain(|&key| {
            if pool.is_valid(key) {
                true
            } else {
                pool.release(key);
                false
            }
        });
    }
}

/// Adds portals to the newest map plane of a cell that the first of them
/// lies in.
///
/// When no map plane matches, a new one is made on `fallback`; without a
/// fallback the missing plane is an invariant violation.
pub(crate) fn attach_portals(
    maps: &mut Vec<MapPlane>,
    keys: &[PortalKey],
    portals: &PortalPool,
    fallback: Option<&Plane>,
) -> std::result::Result<(), Invariant> {
    let Some(polygon) = keys.first().and_then(|&key| portals.get(key)).map(Portal::polygon) else {
        return Ok(());
    };

    if let Some(map) = maps.iter_mut().rev().find(|m| polygon.lies_in(&m.plane)) {
        map.portals.extend_from_slice(keys);
        return Ok(());
    }

    let plane = fallback.ok_or(Invariant::MissingMapPlane)?;
    let mut map = MapPlane::new(plane.clone());
    map.portals.extend_from_slice(keys);
    maps.push(map);
    Ok(())
}

/// Buckets polygons by plane.
///
/// Each polygon joins the newest existing map plane it lies in; otherwise a
/// new map plane is made from the polygon's own plane and becomes the
/// newest. The result is ordered oldest first.
pub fn group_by_plane(polygons: &[Polygon], pool: &mut PolygonPool) -> Result<Vec<MapPlane>> {
    let mut maps: Vec<MapPlane> = Vec::new();

    for (index, polygon) in polygons.iter().enumerate() {
        let key = pool.alloc(polygon.clone());

        if let Some(map) = maps.iter_mut().rev().find(|m| polygon.lies_in(&m.plane)) {
            map.polygons.push(key);
            continue;
        }

        let Some(plane) = polygon.plane() else {
            pool.free(key);
            return Err(Error::DegeneratePolygon(index));
        };

        let mut map = MapPlane::new(plane);
        map.polygons.push(key);
        maps.push(map);
    }

    debug!("{} polygons on {} planes", polygons.len(), maps.len());
    Ok(maps)
}

//! Portals: polygons shared by two adjacent cells.

use crate::keys::{CellId, PortalKey};
use crate::pool::PortalPool;
use crate::Polygon;

/// A polygon linking two cells of the tree.
///
/// A portal is valid while both ends are set. Releasing a valid portal
/// detaches it, leaving a stale portal that is still listed by the other
/// cell; whoever meets a stale portal next reclaims its slot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Portal {
    polygon: Polygon,
    a: Option<CellId>,
    b: Option<CellId>,
}

impl Portal {
    /// Creates a portal linking `a` and `b`.
    pub fn new(polygon: Polygon, a: CellId, b: CellId) -> Self {
        Self {
            polygon,
            a: Some(a),
            b: Some(b),
        }
    }

    #[inline]
    pub fn polygon(&self) -> &Polygon {
        &self.polygon
    }

    #[inline]
    pub fn set_polygon(&mut self, polygon: Polygon) {
        self.polygon = polygon;
    }

    #[inline]
    pub fn a(&self) -> Option<CellId> {
        self.a
    }

    #[inline]
    pub fn b(&self) -> Option<CellId> {
        self.b
    }

    /// True while both ends are linked.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.a.is_some() && self.b.is_some()
    }

    /// Returns the cell on the far side from `cell`, or `None` if the portal
    /// does not touch `cell`.
    pub fn other(&self, cell: CellId) -> Option<CellId> {
        if self.a == Some(cell) {
            self.b
        } else if self.b == Some(cell) {
            self.a
        } else {
            None
        }
    }

    /// Replaces the end that names `from` with `to`.
    ///
    /// Returns false if neither end names `from`.
    pub fn relink(&mut self, from: CellId, to: CellId) -> bool {
        if self.a == Some(from) {
            self.a = Some(to);
        } else if self.b == Some(from) {
            self.b = Some(to);
        } else {
            return false;
        }
        true
    }

    /// Clears both ends, making the portal stale.
    pub fn detach(&mut self) {
        self.a = None;
        self.b = None;
    }
}

impl PortalPool {
    /// Releases one holder's claim on a portal.
    ///
    /// The first release of a valid portal only detaches it so the other
    /// holder sees it as stale. Releasing a stale portal frees its slot.
    pub fn release(&mut self, key: PortalKey) {
        match self.get_mut(key) {
            Some(portal) if portal.is_valid() => portal.detach(),
            Some(_) => {
                self.free(key);
            }
            None => {}
        }
    }

    /// True if `key` names a live, valid portal.
    pub fn is_valid(&self, key: PortalKey) -> bool {
        self.get(key).is_some_and(Portal::is_valid)
    }
}

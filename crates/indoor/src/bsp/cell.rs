//! Tree cells and leaf contents.

use crate::error::Invariant;
use crate::keys::CellId;
use crate::Plane;

use super::map_plane::MapPlane;

/// File tag of an internal node.
pub const INTERNAL_TAG: u8 = 255;

/// What fills a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Contents {
    /// Walkable space. The only contents whose surfaces are kept.
    Empty,
    /// Inside matter.
    Solid,
    /// The exterior, or interior space that leaks into it.
    Outside,
}

impl Contents {
    /// Byte written for a leaf with these contents.
    pub fn tag(self) -> u8 {
        match self {
            Contents::Empty => 0,
            Contents::Solid => 1,
            Contents::Outside => 2,
        }
    }

    pub fn from_tag(tag: u8) -> Result<Self, Invariant> {
        match tag {
            0 => Ok(Contents::Empty),
            1 => Ok(Contents::Solid),
            2 => Ok(Contents::Outside),
            other => Err(Invariant::UnknownContents(other)),
        }
    }
}

/// State of a cell during and after partitioning.
#[derive(Debug, Clone, PartialEq)]
pub enum CellKind {
    /// Holds map planes waiting to be partitioned.
    Unresolved,
    /// A convex region of space.
    Leaf(Contents),
    /// Split in two by `partition`.
    Internal {
        partition: Plane,
        front: CellId,
        back: CellId,
    },
}

/// A node of the tree together with the map planes it owns.
///
/// Internal cells give all their map planes to their children; leaves keep
/// theirs for rendering and for the portal graph.
#[derive(Debug, Clone)]
pub struct Cell {
    pub(crate) kind: CellKind,
    pub(crate) maps: Vec<MapPlane>,
}

impl Cell {
    pub(crate) fn unresolved(maps: Vec<MapPlane>) -> Self {
        Self {
            kind: CellKind::Unresolved,
            maps,
        }
    }

    pub(crate) fn leaf(contents: Contents) -> Self {
        Self {
            kind: CellKind::Leaf(contents),
            maps: Vec::new(),
        }
    }

    #[inline]
    pub fn kind(&self) -> &CellKind {
        &self.kind
    }

    /// Map planes, oldest first.
    #[inline]
    pub fn maps(&self) -> &[MapPlane] {
        &self.maps
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, CellKind::Leaf(_))
    }

    /// Contents of a leaf, `None` for other cells.
    pub fn contents(&self) -> Option<Contents> {
        match self.kind {
            CellKind::Leaf(contents) => Some(contents),
            _ => None,
        }
    }

    /// Front and back children of an internal cell.
    pub fn children(&self) -> Option<(CellId, CellId)> {
        match self.kind {
            CellKind::Internal { front, back, .. } => Some((front, back)),
            _ => None,
        }
    }

    pub fn partition(&self) -> Option<&Plane> {
        match &self.kind {
            CellKind::Internal { partition, .. } => Some(partition),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contents_tags() {
        for contents in [Contents::Empty, Contents::Solid, Contents::Outside] {
            assert_eq!(Contents::from_tag(contents.tag()), Ok(contents));
        }
        assert_eq!(
            Contents::from_tag(INTERNAL_TAG),
            Err(Invariant::UnknownContents(255))
        );
        assert_eq!(Contents::from_tag(3), Err(Invariant::UnknownContents(3)));
    }

    #[test]
    fn leaf_accessors() {
        let cell = Cell::leaf(Contents::Solid);
        assert!(cell.is_leaf());
        assert_eq!(cell.contents(), Some(Contents::Solid));
        assert!(cell.children().is_none());
        assert!(cell.partition().is_none());

        let unresolved = Cell::unresolved(Vec::new());
        assert!(!unresolved.is_leaf());
        assert_eq!(unresolved.contents(), None);
    }
}

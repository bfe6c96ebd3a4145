//! Error types for compiling, saving and loading worlds.

/// Result type alias for world operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while compiling, saving or loading a world.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Compilation needs at least one polygon.
    #[error("no input polygons")]
    EmptyInput,

    /// An input polygon has too few or too many vertices.
    #[error("polygon {index} has {count} vertices, expected 3..={max}")]
    VertexCount { index: usize, count: usize, max: usize },

    /// An input polygon has no area, so it has no plane.
    #[error("polygon {0} is degenerate")]
    DegeneratePolygon(usize),

    /// Reading or writing a level file failed, including truncated files.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The file does not start with the level magic.
    #[error("not a compiled indoor level (bad magic)")]
    BadMagic,

    /// The geometry or the tree broke an invariant. No usable world exists.
    #[error("invariant violated: {0}")]
    Invariant(#[from] Invariant),
}

impl Error {
    /// True for invariant violations, which indicate corrupt input geometry
    /// or a bug rather than a problem the caller can fix by retrying.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Invariant(_))
    }
}

/// Broken invariants detected while building or reading a tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Invariant {
    /// A portal did not name the cell that holds it.
    #[error("portal is not linked to the cell holding it")]
    MislinkedPortal,

    /// A leaf portal leads to an internal cell after partitioning.
    #[error("portal leads to an internal cell")]
    PortalToInternalCell,

    /// Two distinct map planes of one cell coincide.
    #[error("two map planes coincide")]
    CoplanarMapPlanes,

    /// A polygon of a crossing map plane lies in a boundary candidate.
    #[error("polygon of a crossing plane lies in the boundary plane")]
    CoplanarBoundaryPolygon,

    /// A partition portal vanished when clipped by a boundary.
    #[error("partition portal is empty after clipping by a boundary plane")]
    EmptyPartitionPortal,

    /// Splitting a straddling portal left one half empty.
    #[error("straddling portal split into an empty half")]
    EmptyPortalSplit,

    /// The far cell of a split portal has no map plane for it.
    #[error("far cell has no map plane for a split portal")]
    MissingMapPlane,

    /// A stored node carries an unknown contents tag.
    #[error("unknown contents tag {0}")]
    UnknownContents(u8),

    /// A cell was neither split nor made a leaf.
    #[error("cell left unresolved")]
    UnresolvedCell,

    /// A partition plane has a zero normal.
    #[error("degenerate partition plane")]
    DegeneratePlane,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invariants_are_fatal() {
        assert!(Error::from(Invariant::MislinkedPortal).is_fatal());
        assert!(!Error::EmptyInput.is_fatal());
        assert!(!Error::BadMagic.is_fatal());
    }

    #[test]
    fn messages_name_the_problem() {
        let err = Error::VertexCount {
            index: 3,
            count: 9,
            max: 8,
        };
        assert_eq!(err.to_string(), "polygon 3 has 9 vertices, expected 3..=8");
        assert_eq!(
            Error::from(Invariant::UnknownContents(7)).to_string(),
            "invariant violated: unknown contents tag 7"
        );
    }
}

//! Indoor level compiler.
//!
//! Turns the convex polygons bounding an indoor level into a BSP tree of
//! convex cells joined by portals, finds leaks into the outside, and writes
//! the tree as a compact file that [`LoadedWorld`] reads back.

pub mod bsp;
mod cuttable;
mod error;
mod format;
pub mod keys;
mod loaded;
mod options;
mod plane;
mod polygon;
pub mod pool;
mod portal;
mod rectangle;
mod status;
mod triangle;
mod visitor;

pub use bsp::{Cell, CellKind, Contents, EntityReport, HullSide, MapPlane, World};
pub use cuttable::{Cuttable, AREA_EPSILON};
pub use error::{Error, Invariant, Result};
pub use format::MAGIC;
pub use loaded::{LoadedNode, LoadedWorld};
pub use options::CompileOptions;
pub use plane::{Classification, Plane, PlaneSide, PLANE_EPSILON};
pub use polygon::{Polygon, MAX_INPUT_VERTICES};
pub use portal::Portal;
pub use rectangle::{Rectangle, DEFAULT_PLANE_EXTENT};
pub use triangle::Triangle;
pub use visitor::{CollectingVisitor, LeafVisitor};

//! The BSP compiler: cells, map planes, partitioning and the portal graph.
//!
//! Compilation runs in phases over one [`World`]:
//!
//! 1. group the input polygons by plane ([`group_by_plane`]);
//! 2. find and strip the planes bounding the level ([`mark_boundary_planes`],
//!    [`strip_boundary_planes`]) and open the root to the outside cell
//!    wherever the hull is not covered;
//! 3. partition cells until every one is a convex leaf, choosing planes
//!    with a [`PartitionSelector`];
//! 4. verify the portal graph and flood from the outside cell to find
//!    leaks.
//!
//! # Architecture
//!
//! - [`World`]: owns every cell, polygon and portal of one compilation
//! - [`Cell`]: an unresolved, internal or leaf node of the tree
//! - [`MapPlane`]: the polygons and portals of a cell sharing one plane
//! - [`PartitionSelector`]: strategy trait for choosing partition planes

mod boundary;
mod cell;
mod flood;
mod map_plane;
mod partition;
mod selector;
mod world;

pub use boundary::{mark_boundary_planes, strip_boundary_planes};
pub use cell::{Cell, CellKind, Contents, INTERNAL_TAG};
pub use flood::EntityReport;
pub use map_plane::{group_by_plane, HullSide, MapPlane};
pub use selector::{LeastSplits, PartitionSelector};
pub use world::World;

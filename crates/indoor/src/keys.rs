//! Key types for arena-based storage.
//!
//! Cells, polygons and portals live in slot maps and are referred to by
//! these generational keys. A key stays valid until its entry is freed;
//! freed slots are reused by later allocations.

use slotmap::new_key_type;

new_key_type! {
    /// Key for a cell (node) of the BSP tree, including the outside cell.
    pub struct CellId;

    /// Key for a polygon held by a map plane.
    pub struct PolygonKey;

    /// Key for a portal shared by the two cells it links.
    pub struct PortalKey;
}

//! Compiled level files.
//!
//! A file is the 8-byte magic `RKINDOOR` followed by the tree in depth-first
//! preorder, front child before back child. Each node starts with a tag byte:
//!
//! | tag | node | payload |
//! |-----|------|---------|
//! | 255 | internal | plane as four `f32` (normal x, y, z, distance), then both children |
//! | 0 | empty leaf | `u32` triangle count, then nine `f32` per triangle |
//! | 1 | solid leaf | none |
//! | 2 | outside leaf | none |
//!
//! All numbers are little-endian.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};
use log::info;

use crate::bsp::{CellKind, Contents, World, INTERNAL_TAG};
use crate::error::{Invariant, Result};
use crate::Plane;

/// First bytes of every compiled level file.
pub const MAGIC: [u8; 8] = *b"RKINDOOR";

pub(crate) fn write_plane<W: Write>(out: &mut W, plane: &Plane) -> Result<()> {
    let normal = plane.normal();
    out.write_f32::<LittleEndian>(normal.x as f32)?;
    out.write_f32::<LittleEndian>(normal.y as f32)?;
    out.write_f32::<LittleEndian>(normal.z as f32)?;
    out.write_f32::<LittleEndian>(plane.distance() as f32)?;
    Ok(())
}

impl World {
    /// Writes the tree to a file at `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let mut out = BufWriter::new(File::create(path)?);
        self.write_to(&mut out)?;
        out.flush()?;

        info!("wrote {} triangles to {}", self.triangle_count(), path.display());
        Ok(())
    }

    /// Writes the tree to any writer.
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        out.write_all(&MAGIC)?;

        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let Some(cell) = self.cells.get(id) else {
                return Err(Invariant::UnresolvedCell.into());
            };

            match cell.kind() {
                CellKind::Internal {
                    partition,
                    front,
                    back,
                } => {
                    out.write_u8(INTERNAL_TAG)?;
                    write_plane(out, partition)?;
                    stack.push(*back);
                    stack.push(*front);
                }
                CellKind::Leaf(Contents::Empty) => {
                    let triangles = self.leaf_triangles(id);
                    out.write_u8(Contents::Empty.tag())?;
                    out.write_u32::<LittleEndian>(triangles.len() as u32)?;
                    for triangle in &triangles {
                        for value in triangle.to_floats() {
                            out.write_f32::<LittleEndian>(value)?;
                        }
                    }
                }
                CellKind::Leaf(contents) => out.write_u8(contents.tag())?,
                CellKind::Unresolved => return Err(Invariant::UnresolvedCell.into()),
            }
        }

        Ok(())
    }
}

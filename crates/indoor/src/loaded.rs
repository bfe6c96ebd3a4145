//! Reading compiled level files back into a tree.
//!
//! This is the renderer's view of a level: partition planes and the triangle
//! soups of empty leaves, without portals or map planes.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use log::info;
use nalgebra::{Point3, Vector3};

use crate::bsp::{Contents, INTERNAL_TAG};
use crate::error::{Error, Invariant, Result};
use crate::format::MAGIC;
use crate::visitor::LeafVisitor;
use crate::{Plane, Triangle, PLANE_EPSILON};

/// Largest triangle count reserved up front; longer lists still load.
const RESERVE_LIMIT: usize = 4096;

/// A node of a loaded tree. Children are indices into [`LoadedWorld::node`].
#[derive(Debug, Clone, PartialEq)]
pub enum LoadedNode {
    Internal {
        plane: Plane,
        front: usize,
        back: usize,
    },
    Leaf {
        contents: Contents,
        triangles: Vec<Triangle>,
    },
}

impl LoadedNode {
    /// Contents of a leaf, `None` for internal nodes.
    pub fn contents(&self) -> Option<Contents> {
        match self {
            LoadedNode::Leaf { contents, .. } => Some(*contents),
            LoadedNode::Internal { .. } => None,
        }
    }

    /// Children ordered nearest to `eye` first.
    fn near_far(&self, eye: Point3<f64>) -> Option<(usize, usize)> {
        match self {
            LoadedNode::Internal { plane, front, back } => {
                if plane.point_distance(eye) < -PLANE_EPSILON {
                    Some((*back, *front))
                } else {
                    Some((*front, *back))
                }
            }
            LoadedNode::Leaf { .. } => None,
        }
    }
}

/// A compiled level as loaded from disk.
///
/// Nodes are stored flat in file order, so the root is node 0 and every
/// child sits after its parent. Nothing here recurses, whatever the depth.
///
/// ```ignore
/// use indoor::{LoadedWorld, CollectingVisitor};
///
/// let level = LoadedWorld::load("level.bin")?;
/// let mut visitor = CollectingVisitor::new();
/// level.traverse_front_to_back(eye, &mut visitor);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedWorld {
    nodes: Vec<LoadedNode>,
}

impl LoadedWorld {
    /// Loads a level file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let world = Self::read_from(&mut BufReader::new(File::open(path)?))?;

        info!(
            "loaded {} triangles, depth {} from {}",
            world.triangle_count(),
            world.depth(),
            path.display()
        );
        Ok(world)
    }

    /// Reads a level from any reader.
    ///
    /// A missing or wrong magic is [`Error::BadMagic`]; a file cut short
    /// after the magic is an i/o error.
    pub fn read_from<R: Read>(input: &mut R) -> Result<Self> {
        let mut magic = [0u8; 8];
        match input.read_exact(&mut magic) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => return Err(Error::BadMagic),
            Err(err) => return Err(err.into()),
        }
        if magic != MAGIC {
            return Err(Error::BadMagic);
        }

        // Preorder: an internal node's front child follows it directly, its
        // back child follows the last leaf of the front subtree.
        let mut nodes = Vec::new();
        let mut awaiting_back = Vec::new();
        loop {
            let index = nodes.len();
            let node = read_node(input, index)?;
            let is_leaf = matches!(node, LoadedNode::Leaf { .. });
            nodes.push(node);

            if !is_leaf {
                awaiting_back.push(index);
                continue;
            }
            match awaiting_back.pop() {
                Some(parent) => {
                    if let LoadedNode::Internal { back, .. } = &mut nodes[parent] {
                        *back = index + 1;
                    }
                }
                None => break,
            }
        }

        Ok(Self { nodes })
    }

    #[inline]
    pub fn root(&self) -> &LoadedNode {
        &self.nodes[0]
    }

    pub fn node(&self, index: usize) -> Option<&LoadedNode> {
        self.nodes.get(index)
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// The leaf containing `point`. Points on a plane go front.
    pub fn locate(&self, point: Point3<f64>) -> &LoadedNode {
        let mut node = self.root();
        while let Some((near, _)) = node.near_far(point) {
            node = &self.nodes[near];
        }
        node
    }

    pub fn contents_at(&self, point: Point3<f64>) -> Option<Contents> {
        self.locate(point).contents()
    }

    pub fn triangle_count(&self) -> usize {
        self.nodes
            .iter()
            .map(|node| match node {
                LoadedNode::Leaf { triangles, .. } => triangles.len(),
                LoadedNode::Internal { .. } => 0,
            })
            .sum()
    }

    /// Number of nodes on the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        let mut depths = vec![1; self.nodes.len()];
        for (index, node) in self.nodes.iter().enumerate() {
            if let LoadedNode::Internal { front, back, .. } = node {
                let child = depths[index] + 1;
                depths[*front] = child;
                depths[*back] = child;
            }
        }
        depths.into_iter().max().unwrap_or(0)
    }

    /// Visits the triangles of each empty leaf, nearest to `eye` first.
    pub fn traverse_front_to_back<V: LeafVisitor>(&self, eye: Point3<f64>, visitor: &mut V) {
        self.traverse(eye, visitor, true);
    }

    /// Visits the triangles of each empty leaf, farthest from `eye` first.
    pub fn traverse_back_to_front<V: LeafVisitor>(&self, eye: Point3<f64>, visitor: &mut V) {
        self.traverse(eye, visitor, false);
    }

    fn traverse<V: LeafVisitor>(&self, eye: Point3<f64>, visitor: &mut V, near_first: bool) {
        let mut stack = vec![0];
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            match node.near_far(eye) {
                Some((near, far)) => {
                    let (first, second) = if near_first { (near, far) } else { (far, near) };
                    stack.push(second);
                    stack.push(first);
                }
                None => {
                    if let LoadedNode::Leaf { triangles, .. } = node {
                        if !triangles.is_empty() {
                            visitor.visit(triangles);
                        }
                    }
                }
            }
        }
    }
}

fn read_plane<R: Read>(input: &mut R) -> Result<Plane> {
    let x = input.read_f32::<LittleEndian>()?;
    let y = input.read_f32::<LittleEndian>()?;
    let z = input.read_f32::<LittleEndian>()?;
    let distance = input.read_f32::<LittleEndian>()?;

    let normal = Vector3::new(x, y, z).cast::<f64>();
    Plane::try_new(normal, f64::from(distance)).ok_or_else(|| Invariant::DegeneratePlane.into())
}

/// Reads the node stored at `index`. An internal node's back child is left
/// pointing at the root until the reader knows where it starts.
fn read_node<R: Read>(input: &mut R, index: usize) -> Result<LoadedNode> {
    let tag = input.read_u8()?;

    if tag == INTERNAL_TAG {
        let plane = read_plane(input)?;
        return Ok(LoadedNode::Internal {
            plane,
            front: index + 1,
            back: 0,
        });
    }

    let contents = Contents::from_tag(tag)?;
    let triangles = match contents {
        Contents::Empty => {
            let count = input.read_u32::<LittleEndian>()? as usize;
            let mut triangles = Vec::with_capacity(count.min(RESERVE_LIMIT));
            for _ in 0..count {
                let mut floats = [0.0f32; 9];
                input.read_f32_into::<LittleEndian>(&mut floats)?;
                triangles.push(Triangle::from_floats(floats));
            }
            triangles
        }
        Contents::Solid | Contents::Outside => Vec::new(),
    };

    Ok(LoadedNode::Leaf { contents, triangles })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visitor::CollectingVisitor;

    fn make_bytes(nodes: &[u8]) -> Vec<u8> {
        let mut bytes = MAGIC.to_vec();
        bytes.extend_from_slice(nodes);
        bytes
    }

    /// Internal node on `z = 0` with an empty front leaf holding one
    /// triangle at `z = 1` and a solid back leaf.
    fn make_split_level() -> Vec<u8> {
        let mut nodes = vec![INTERNAL_TAG];
        for value in [0.0f32, 0.0, 1.0, 0.0] {
            nodes.extend_from_slice(&value.to_le_bytes());
        }
        nodes.push(0);
        nodes.extend_from_slice(&1u32.to_le_bytes());
        for value in [0.0f32, 0.0, 1.0, 1.0, 0.0, 1.0, 0.0, 1.0, 1.0] {
            nodes.extend_from_slice(&value.to_le_bytes());
        }
        nodes.push(1);
        make_bytes(&nodes)
    }

    #[test]
    fn reads_a_split_level() {
        let level = LoadedWorld::read_from(&mut make_split_level().as_slice()).unwrap();

        assert_eq!(level.depth(), 2);
        assert_eq!(level.triangle_count(), 1);
        assert_eq!(level.contents_at(Point3::new(0.0, 0.0, 1.0)), Some(Contents::Empty));
        assert_eq!(level.contents_at(Point3::new(0.0, 0.0, 0.0)), Some(Contents::Empty));
        assert_eq!(level.contents_at(Point3::new(0.0, 0.0, -1.0)), Some(Contents::Solid));
    }

    #[test]
    fn bad_magic_is_rejected() {
        let mut bytes = make_split_level();
        bytes[0] = b'X';
        assert!(matches!(
            LoadedWorld::read_from(&mut bytes.as_slice()),
            Err(Error::BadMagic)
        ));

        assert!(matches!(
            LoadedWorld::read_from(&mut &b"RKIN"[..]),
            Err(Error::BadMagic)
        ));
    }

    #[test]
    fn truncated_file_is_an_io_error() {
        let bytes = make_split_level();
        let cut = &bytes[..bytes.len() - 6];
        assert!(matches!(LoadedWorld::read_from(&mut &cut[..]), Err(Error::Io(_))));
    }

    #[test]
    fn unknown_tag_is_fatal() {
        let err = LoadedWorld::read_from(&mut make_bytes(&[7]).as_slice()).unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(err, Error::Invariant(Invariant::UnknownContents(7))));
    }

    #[test]
    fn zero_normal_is_fatal() {
        let mut nodes = vec![INTERNAL_TAG];
        nodes.extend_from_slice(&[0u8; 16]);
        nodes.extend_from_slice(&[1, 1]);
        let err = LoadedWorld::read_from(&mut make_bytes(&nodes).as_slice()).unwrap_err();
        assert!(matches!(err, Error::Invariant(Invariant::DegeneratePlane)));
    }

    #[test]
    fn traversal_orders_leaves_by_eye() {
        // Two empty leaves, one triangle each, on either side of z = 0.
        let mut nodes = vec![INTERNAL_TAG];
        for value in [0.0f32, 0.0, 1.0, 0.0] {
            nodes.extend_from_slice(&value.to_le_bytes());
        }
        for z in [1.0f32, -1.0] {
            nodes.push(0);
            nodes.extend_from_slice(&1u32.to_le_bytes());
            for value in [0.0f32, 0.0, z, 1.0, 0.0, z, 0.0, 1.0, z] {
                nodes.extend_from_slice(&value.to_le_bytes());
            }
        }
        let level = LoadedWorld::read_from(&mut make_bytes(&nodes).as_slice()).unwrap();

        let below = Point3::new(0.0, 0.0, -5.0);
        let mut near_first = CollectingVisitor::new();
        level.traverse_front_to_back(below, &mut near_first);
        let mut far_first = CollectingVisitor::new();
        level.traverse_back_to_front(below, &mut far_first);

        let z = |v: &CollectingVisitor| v.triangles()[0].vertices()[0].z;
        assert_eq!(near_first.leaves(), 2);
        assert_eq!(z(&near_first), -1.0);
        assert_eq!(z(&far_first), 1.0);
    }

    #[test]
    fn deep_chain_loads_without_recursion() {
        // Each internal node's front is the next internal node and its back
        // is a solid leaf; the innermost front is an empty leaf.
        const CHAIN: usize = 300_000;
        let mut nodes = Vec::with_capacity(CHAIN * 17 + CHAIN + 6);
        for _ in 0..CHAIN {
            nodes.push(INTERNAL_TAG);
            for value in [0.0f32, 0.0, 1.0, 0.0] {
                nodes.extend_from_slice(&value.to_le_bytes());
            }
        }
        nodes.push(0);
        nodes.extend_from_slice(&0u32.to_le_bytes());
        nodes.resize(nodes.len() + CHAIN, 1);

        let level = LoadedWorld::read_from(&mut make_bytes(&nodes).as_slice()).unwrap();

        assert_eq!(level.node_count(), 2 * CHAIN + 1);
        assert_eq!(level.depth(), CHAIN + 1);
        assert_eq!(level.triangle_count(), 0);
        assert_eq!(level.contents_at(Point3::new(0.0, 0.0, 1.0)), Some(Contents::Empty));
        assert_eq!(level.contents_at(Point3::new(0.0, 0.0, -1.0)), Some(Contents::Solid));
        assert!(matches!(
            level.root(),
            LoadedNode::Internal { front: 1, back, .. } if *back == 2 * CHAIN
        ));

        let mut visitor = CollectingVisitor::new();
        level.traverse_back_to_front(Point3::new(0.0, 0.0, 1.0), &mut visitor);
        assert_eq!(visitor.leaves(), 0);

        let copy = level.clone();
        assert_eq!(copy, level);
    }
}

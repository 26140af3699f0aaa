//! Levels on disk: a BSP tree with faces and leaf portals, written as RON.

#[cfg(feature = "hprof")]
use coarse_prof::profile;
use glam::DVec3;
use log::info;
use math::{BoundingBox, Plane, Polygon};
use nanoserde::{DeRon, SerRon};
use std::path::Path;

use crate::{BspError, BspLeaf, BspNode, BspTree, IS_LEAF_MASK, child_index, is_leaf};

#[derive(Debug, Clone, Copy, Default, PartialEq, DeRon, SerRon)]
pub struct VertexRon {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl From<VertexRon> for DVec3 {
    fn from(v: VertexRon) -> Self {
        DVec3::new(v.x, v.y, v.z)
    }
}

impl From<DVec3> for VertexRon {
    fn from(v: DVec3) -> Self {
        Self {
            x: v.x,
            y: v.y,
            z: v.z,
        }
    }
}

/// Vertices in clockwise order seen from the front
#[derive(Debug, Clone, Default, PartialEq, DeRon, SerRon)]
pub struct PolygonRon {
    pub vertices: Vec<VertexRon>,
}

impl From<&Polygon> for PolygonRon {
    fn from(poly: &Polygon) -> Self {
        Self {
            vertices: poly.vertices.iter().map(|&v| v.into()).collect(),
        }
    }
}

impl PolygonRon {
    fn to_polygon(&self) -> Polygon {
        Polygon::from_vertices(self.vertices.iter().map(|&v| v.into()).collect())
    }
}

#[derive(Debug, Clone, PartialEq, DeRon, SerRon)]
pub struct NodeRon {
    pub normal: VertexRon,
    pub dist: f64,
    pub front: u32,
    pub front_is_leaf: bool,
    pub back: u32,
    pub back_is_leaf: bool,
}

#[derive(Debug, Clone, PartialEq, DeRon, SerRon)]
pub struct LeafRon {
    pub faces: Vec<u32>,
    pub portals: Vec<PolygonRon>,
    pub min: VertexRon,
    pub max: VertexRon,
    pub is_inner: bool,
}

#[derive(Debug, Clone, Default, PartialEq, DeRon, SerRon)]
pub struct LevelFile {
    pub faces: Vec<PolygonRon>,
    pub nodes: Vec<NodeRon>,
    pub leaves: Vec<LeafRon>,
}

fn encode_child(node: usize, index: u32, leaf: bool) -> Result<u32, BspError> {
    if index & IS_LEAF_MASK != 0 {
        return Err(BspError::IndexOutOfRange {
            node,
            kind: if leaf { "leaf" } else { "node" },
            index: index as usize,
            count: IS_LEAF_MASK as usize,
        });
    }
    Ok(if leaf { index | IS_LEAF_MASK } else { index })
}

impl LevelFile {
    pub fn parse(ron: &str) -> Result<Self, BspError> {
        LevelFile::deserialize_ron(ron).map_err(|e| BspError::Parse(format!("{e:?}")))
    }

    pub fn to_ron(&self) -> String {
        self.serialize_ron()
    }

    /// Builds and validates the tree
    pub fn into_tree(self) -> Result<BspTree, BspError> {
        let faces = self.faces.iter().map(PolygonRon::to_polygon).collect();

        let nodes = self
            .nodes
            .iter()
            .enumerate()
            .map(|(node_nr, node)| {
                Ok(BspNode {
                    plane: Plane::new(node.normal.into(), node.dist),
                    children: [
                        encode_child(node_nr, node.front, node.front_is_leaf)?,
                        encode_child(node_nr, node.back, node.back_is_leaf)?,
                    ],
                })
            })
            .collect::<Result<Vec<_>, BspError>>()?;

        let leaves = self
            .leaves
            .iter()
            .map(|leaf| BspLeaf {
                faces: leaf.faces.iter().map(|&f| f as usize).collect(),
                portals: leaf.portals.iter().map(PolygonRon::to_polygon).collect(),
                bb: BoundingBox::from_corners(leaf.min.into(), leaf.max.into()),
                is_inner: leaf.is_inner,
            })
            .collect();

        BspTree::new(faces, nodes, leaves)
    }

    pub fn from_tree(tree: &BspTree) -> Self {
        let decode = |child: u32| (child_index(child) as u32, is_leaf(child));

        Self {
            faces: tree.faces.iter().map(PolygonRon::from).collect(),
            nodes: tree
                .nodes()
                .iter()
                .map(|node| {
                    let (front, front_is_leaf) = decode(node.children[0]);
                    let (back, back_is_leaf) = decode(node.children[1]);
                    NodeRon {
                        normal: node.plane.normal.into(),
                        dist: node.plane.dist,
                        front,
                        front_is_leaf,
                        back,
                        back_is_leaf,
                    }
                })
                .collect(),
            leaves: tree
                .leaves()
                .iter()
                .map(|leaf| LeafRon {
                    faces: leaf.faces.iter().map(|&f| f as u32).collect(),
                    portals: leaf.portals.iter().map(PolygonRon::from).collect(),
                    min: leaf.bb.min.into(),
                    max: leaf.bb.max.into(),
                    is_inner: leaf.is_inner,
                })
                .collect(),
        }
    }
}

/// Reads a RON level file from disk
pub fn load_level<P: AsRef<Path>>(path: P) -> Result<BspTree, BspError> {
    #[cfg(feature = "hprof")]
    profile!("load_level");
    let path = path.as_ref();
    let data = std::fs::read_to_string(path)?;
    let tree = LevelFile::parse(&data)?.into_tree()?;
    info!(
        "Loaded {:?}: {} nodes, {} leaves, {} faces",
        path,
        tree.nodes().len(),
        tree.leaves().len(),
        tree.faces.len()
    );
    Ok(tree)
}

/// Writes `tree` as a RON level file
pub fn save_level<P: AsRef<Path>>(tree: &BspTree, path: P) -> Result<(), BspError> {
    std::fs::write(path, LevelFile::from_tree(tree).to_ron())?;
    Ok(())
}

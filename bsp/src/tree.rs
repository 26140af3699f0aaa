#[cfg(feature = "hprof")]
use coarse_prof::profile;
use glam::DVec3;
use math::{BoundingBox, Plane, Polygon};

use crate::BspError;

/// Set on a child index that refers to a leaf instead of a node
pub const IS_LEAF_MASK: u32 = 0x8000_0000;

#[inline]
pub const fn is_leaf(child: u32) -> bool {
    child & IS_LEAF_MASK != 0
}

#[inline]
pub const fn child_index(child: u32) -> usize {
    (child & !IS_LEAF_MASK) as usize
}

#[derive(Debug, Clone)]
pub struct BspNode {
    pub plane: Plane,
    /// Front child at 0, back child at 1
    pub children: [u32; 2],
}

impl BspNode {
    /// 0 if `point` is in front of the plane, 1 otherwise
    #[inline]
    pub fn point_on_side(&self, point: DVec3) -> usize {
        if self.plane.distance_to_point(point) > 0.0 {
            0
        } else {
            1
        }
    }
}

#[derive(Debug, Clone)]
pub struct BspLeaf {
    /// Indices into [`BspTree::faces`]
    pub faces: Vec<usize>,
    /// Openings to neighbouring leaves, normals pointing into this leaf
    pub portals: Vec<Polygon>,
    pub bb: BoundingBox,
    /// Inner leaves are empty space, all others are solid
    pub is_inner: bool,
}

/// Binary space partition of the whole level. Node 0 is the root, unless the
/// tree has no nodes at all and consists of leaf 0 alone.
#[derive(Debug, Clone)]
pub struct BspTree {
    pub faces: Vec<Polygon>,
    nodes: Vec<BspNode>,
    leaves: Vec<BspLeaf>,
    root: u32,
}

impl BspTree {
    pub fn new(
        faces: Vec<Polygon>,
        nodes: Vec<BspNode>,
        leaves: Vec<BspLeaf>,
    ) -> Result<Self, BspError> {
        if leaves.is_empty() {
            return Err(BspError::NoLeaves);
        }

        for (node_nr, node) in nodes.iter().enumerate() {
            for &child in &node.children {
                let index = child_index(child);
                if is_leaf(child) {
                    if index >= leaves.len() {
                        return Err(BspError::IndexOutOfRange {
                            node: node_nr,
                            kind: "leaf",
                            index,
                            count: leaves.len(),
                        });
                    }
                } else if index >= nodes.len() {
                    return Err(BspError::IndexOutOfRange {
                        node: node_nr,
                        kind: "node",
                        index,
                        count: nodes.len(),
                    });
                } else if index <= node_nr {
                    return Err(BspError::NotATree {
                        node: node_nr,
                        child: index,
                    });
                }
            }
        }

        for (leaf_nr, leaf) in leaves.iter().enumerate() {
            if let Some(&face) = leaf.faces.iter().find(|&&f| f >= faces.len()) {
                return Err(BspError::FaceOutOfRange {
                    leaf: leaf_nr,
                    face,
                    count: faces.len(),
                });
            }
        }

        let root = if nodes.is_empty() { IS_LEAF_MASK } else { 0 };
        Ok(Self {
            faces,
            nodes,
            leaves,
            root,
        })
    }

    #[inline]
    pub fn nodes(&self) -> &[BspNode] {
        &self.nodes
    }

    #[inline]
    pub fn leaves(&self) -> &[BspLeaf] {
        &self.leaves
    }

    #[inline]
    pub fn leaf(&self, index: usize) -> &BspLeaf {
        &self.leaves[index]
    }

    #[inline]
    pub fn root(&self) -> u32 {
        self.root
    }

    /// Index of the leaf containing `point`. Points on a node plane belong to
    /// its back side.
    pub fn what_leaf(&self, point: DVec3) -> usize {
        let mut child = self.root;
        while !is_leaf(child) {
            let node = &self.nodes[child_index(child)];
            child = node.children[node.point_on_side(point)];
        }
        child_index(child)
    }

    /// Clips the ray `p + t * u`, `t` in `min..max`, against the solid leaves
    /// and returns the `t` at which it first enters one. `max` if it never
    /// does.
    pub fn clip_line(&self, p: DVec3, u: DVec3, min: f64, max: f64) -> f64 {
        #[cfg(feature = "hprof")]
        profile!("clip_line");
        self.clip_child(self.root, p, u, min, max)
    }

    fn clip_child(&self, child: u32, p: DVec3, u: DVec3, min: f64, max: f64) -> f64 {
        if is_leaf(child) {
            return if self.leaves[child_index(child)].is_inner {
                max
            } else {
                min
            };
        }

        let node = &self.nodes[child_index(child)];
        let [front, back] = node.children;
        let dist_p = node.plane.distance_to_point(p);
        let div = node.plane.normal.dot(u);
        let dist_min = dist_p + min * div;
        let dist_max = dist_p + max * div;

        // The sign change between the two ends means `div` is not zero below
        let (near, far) = if dist_min > 0.0 {
            if dist_max > 0.0 {
                return self.clip_child(front, p, u, min, max);
            }
            (front, back)
        } else {
            if dist_max <= 0.0 {
                return self.clip_child(back, p, u, min, max);
            }
            (back, front)
        };

        let range = -dist_p / div;
        let hit = self.clip_child(near, p, u, min, range);
        if hit < range {
            hit
        } else {
            self.clip_child(far, p, u, range, max)
        }
    }
}

impl pvs::World for BspTree {
    fn what_leaf(&self, point: DVec3) -> usize {
        BspTree::what_leaf(self, point)
    }

    fn clip_line(&self, origin: DVec3, direction: DVec3) -> f64 {
        BspTree::clip_line(self, origin, direction, 0.0, 1.0)
    }
}

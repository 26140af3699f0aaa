#[cfg(feature = "hprof")]
use coarse_prof::profile;
use log::info;
use math::BoundingBox;
use pvs::Region;

use crate::{BspTree, child_index, is_leaf};

/// When to stop descending the tree and merge a whole subtree into one
/// region
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SuperLeafPolicy {
    /// Subtrees starting deeper than this become a single region
    pub max_recursion_depth: u32,
    /// Subtrees whose faces add up to less area become a single region
    pub min_sub_tree_faces_area: f64,
}

impl Default for SuperLeafPolicy {
    fn default() -> Self {
        Self {
            max_recursion_depth: u32::MAX,
            min_sub_tree_faces_area: 0.0,
        }
    }
}

/// Groups the leaves of `tree` into the regions the visibility is computed
/// for. With the default policy every leaf is its own region.
///
/// Regions come out in tree order, front subtrees before back subtrees.
pub fn create_super_leaves(tree: &BspTree, policy: &SuperLeafPolicy) -> Vec<Region> {
    #[cfg(feature = "hprof")]
    profile!("create_super_leaves");
    let mut regions = Vec::new();

    if is_leaf(tree.root()) {
        regions.push(single_leaf(tree, child_index(tree.root())));
    } else {
        create_recursive(tree, policy, 0, 0, &mut regions);
    }

    info!(
        "{} super leaves created from {} leaves",
        regions.len(),
        tree.leaves().len()
    );
    regions
}

fn single_leaf(tree: &BspTree, leaf_nr: usize) -> Region {
    let leaf = tree.leaf(leaf_nr);
    Region::new(vec![leaf_nr], leaf.portals.clone(), leaf.bb)
}

fn create_recursive(
    tree: &BspTree,
    policy: &SuperLeafPolicy,
    node_nr: usize,
    depth: u32,
    regions: &mut Vec<Region>,
) {
    for child in tree.nodes()[node_nr].children {
        let index = child_index(child);
        if is_leaf(child) {
            regions.push(single_leaf(tree, index));
            continue;
        }

        let depth = depth.saturating_add(1);
        if depth > policy.max_recursion_depth
            || sub_tree_faces_area(tree, index) < policy.min_sub_tree_faces_area
        {
            regions.push(merge_sub_tree(tree, index));
        } else {
            create_recursive(tree, policy, index, depth, regions);
        }
    }
}

fn sub_tree_leaves(tree: &BspTree, node_nr: usize, leaves: &mut Vec<usize>) {
    for child in tree.nodes()[node_nr].children {
        if is_leaf(child) {
            leaves.push(child_index(child));
        } else {
            sub_tree_leaves(tree, child_index(child), leaves);
        }
    }
}

fn merge_sub_tree(tree: &BspTree, node_nr: usize) -> Region {
    let mut leaves = Vec::new();
    sub_tree_leaves(tree, node_nr, &mut leaves);

    let mut portals = Vec::new();
    let mut bb = BoundingBox::new();
    for &leaf_nr in &leaves {
        let leaf = tree.leaf(leaf_nr);
        portals.extend(leaf.portals.iter().cloned());
        bb.expand_to_include_box(&leaf.bb);
    }
    Region::new(leaves, portals, bb)
}

/// Summed area of all faces in the leaves below `node_nr`. A face shared by
/// several leaves counts once.
pub fn sub_tree_faces_area(tree: &BspTree, node_nr: usize) -> f64 {
    let mut leaves = Vec::new();
    sub_tree_leaves(tree, node_nr, &mut leaves);

    let mut faces: Vec<usize> = leaves
        .iter()
        .flat_map(|&leaf_nr| tree.leaf(leaf_nr).faces.iter().copied())
        .collect();
    faces.sort_unstable();
    faces.dedup();

    faces.iter().map(|&face| tree.faces[face].area()).sum()
}

#[cfg(feature = "hprof")]
use coarse_prof::profile;
use math::{BoundingBox, BoxSide, Polygon, Side};

use crate::{RegionGraph, VisibilityStore, build_frustum};

/// Outcome of a visibility search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    NotVisible,
}

impl Visibility {
    #[inline]
    pub const fn is_visible(self) -> bool {
        matches!(self, Visibility::Visible)
    }
}

/// Sight line search from one master region to one target region.
///
/// Every region reached on the way is flagged mutually visible with all
/// regions on the path leading to it, through the `VisibilityStore`. Rows of
/// regions with a lower index than the master must be complete, they are
/// used to prune the search.
pub struct Search<'a, M: VisibilityStore> {
    graph: &'a RegionGraph,
    matrix: &'a mut M,
    epsilon: f64,
    master: usize,
    target: usize,
}

impl<'a, M: VisibilityStore> Search<'a, M> {
    pub fn new(graph: &'a RegionGraph, matrix: &'a mut M, master: usize, target: usize) -> Self {
        Self {
            graph,
            matrix,
            epsilon: graph.epsilon(),
            master,
            target,
        }
    }

    /// True if `region` has already been proven unable to see the target
    #[inline]
    fn known_blind(&self, region: usize) -> bool {
        region < self.master && !self.matrix.is_visible(region, self.target)
    }

    /// Tries every way out of the master region through one of its
    /// neighbours and on into a neighbour of that. The first two steps set up
    /// the master portal and entering portal pair the recursion works with.
    ///
    /// A target already flagged visible, the master itself included, is
    /// reported without searching.
    pub fn can_see_target(&mut self) -> Visibility {
        #[cfg(feature = "hprof")]
        profile!("can_see_target");
        if self.master == self.target || self.matrix.is_visible(self.master, self.target) {
            return Visibility::Visible;
        }
        let target_bb = *self.graph.target_bb(self.target);
        if !target_bb.is_inited() {
            return Visibility::NotVisible;
        }

        let graph = self.graph;
        for first_hop in graph.neighbours(self.master) {
            if self.known_blind(first_hop.region) {
                continue;
            }
            let master_portal = &first_hop.sub_portal;

            for second_hop in graph.neighbours(first_hop.region) {
                if second_hop.region == self.master {
                    continue;
                }
                let entering = &second_hop.sub_portal;
                if master_portal
                    .what_side(&entering.plane, self.epsilon)
                    .is_coplanar()
                {
                    continue;
                }
                if self.known_blind(second_hop.region) {
                    continue;
                }

                let ancestors = vec![self.master, first_hop.region];
                if self
                    .determine_visibility(
                        second_hop.region,
                        entering,
                        ancestors,
                        master_portal,
                        target_bb,
                    )
                    .is_visible()
                {
                    return Visibility::Visible;
                }
            }
        }
        Visibility::NotVisible
    }

    /// Enters `current` through `entering`, a sub-portal of the region before
    /// it. `master_portal` is what is left of the first portal of the path
    /// that can still see through all portals after it, `target_bb` what is
    /// left of the target's box that may still be reached.
    pub fn determine_visibility(
        &mut self,
        current: usize,
        entering: &Polygon,
        mut ancestors: Vec<usize>,
        master_portal: &Polygon,
        mut target_bb: BoundingBox,
    ) -> Visibility {
        #[cfg(feature = "hprof")]
        profile!("determine_visibility");
        let epsilon = self.epsilon;

        for &ancestor in &ancestors {
            self.matrix.flag_mutual(ancestor, current);
        }

        if current == self.target {
            return Visibility::Visible;
        }

        // Drop the part of the target that lies back where we came from.
        // Splitting at half the epsilon keeps both halves non-empty whenever
        // the shrunken box straddles the plane.
        match target_bb
            .epsilon_box(-epsilon)
            .what_side(&entering.plane, 0.0)
        {
            BoxSide::Front => return Visibility::NotVisible,
            BoxSide::Back => {}
            BoxSide::Both => {
                target_bb = target_bb.splits(&entering.plane, epsilon / 2.0)[1];
                if !target_bb.is_inited() {
                    return Visibility::NotVisible;
                }
            }
        }

        let frustum = build_frustum(master_portal, entering, epsilon);
        if frustum.is_empty() {
            return Visibility::NotVisible;
        }

        for plane in &frustum {
            match target_bb.epsilon_box(-epsilon).what_side(plane, 0.0) {
                BoxSide::Front => {}
                BoxSide::Back => return Visibility::NotVisible,
                BoxSide::Both => {
                    target_bb = target_bb.splits(plane, epsilon / 2.0)[0];
                    if !target_bb.is_inited() {
                        return Visibility::NotVisible;
                    }
                }
            }
        }

        ancestors.push(current);

        let graph = self.graph;
        'neighbours: for neighbour in graph.neighbours(current) {
            if self.known_blind(neighbour.region) {
                continue;
            }

            let mut next_portal = neighbour.sub_portal.clone();
            if next_portal.what_side(&entering.plane, epsilon).is_coplanar() {
                continue;
            }

            for plane in &frustum {
                match next_portal.what_side_simple(plane, epsilon) {
                    Side::Both => {
                        let [inside, _] = next_portal.splits(plane, epsilon);
                        next_portal = inside;
                    }
                    Side::Front => {}
                    _ => continue 'neighbours,
                }
            }

            let frustum2 = build_frustum(entering, &next_portal, epsilon);
            if frustum2.is_empty() {
                continue;
            }

            // Looking back from the next portal through the entering portal,
            // only the part of the master portal behind the planes remains.
            let mut narrowed = master_portal.clone();
            for plane in &frustum2 {
                match narrowed.what_side_simple(plane, epsilon) {
                    Side::Both => {
                        let [_, behind] = narrowed.splits(plane, epsilon);
                        narrowed = behind;
                    }
                    Side::Back => {}
                    _ => continue 'neighbours,
                }
            }

            if self
                .determine_visibility(
                    neighbour.region,
                    &next_portal,
                    ancestors.clone(),
                    &narrowed,
                    target_bb,
                )
                .is_visible()
            {
                return Visibility::Visible;
            }
        }

        Visibility::NotVisible
    }
}

use log::debug;

use crate::{RegionGraph, VisibilityStore};

/// Every region sees itself and every region it shares a portal with.
///
/// Both directions of each neighbour pair are flagged.
pub fn determine_trivial_visibility<M: VisibilityStore>(graph: &RegionGraph, matrix: &mut M) {
    for (region_nr, region) in graph.regions().iter().enumerate() {
        matrix.flag_visible(region_nr, region_nr);

        for neighbour in region.neighbours() {
            matrix.flag_mutual(region_nr, neighbour.region);
        }
    }

    debug!("Trivial visibility  : {:10.5}", matrix.average_visibility());
}

#[cfg(feature = "hprof")]
use coarse_prof::profile;
use glam::DVec3;
use log::{debug, warn};

use crate::build_pvs::report_progress;
use crate::{RegionGraph, VisibilityStore, World};

/// Distance the ray sample points are moved off their sub-portal, into the
/// region owning it
pub const SAMPLE_OFFSET: f64 = 0.2;

/// One ray endpoint per neighbour edge of a region, `None` where the point
/// did not land in one of the region's own leaves
fn sample_points<W: World + ?Sized>(
    graph: &RegionGraph,
    world: &W,
    offset: f64,
) -> Vec<Vec<Option<DVec3>>> {
    graph
        .regions()
        .iter()
        .enumerate()
        .map(|(region_nr, region)| {
            region
                .neighbours()
                .iter()
                .map(|neighbour| {
                    let portal = &neighbour.sub_portal;
                    let center = portal.centroid() + portal.plane.normal * offset;
                    let leaf = world.what_leaf(center);
                    if region.leaves.contains(&leaf) {
                        Some(center)
                    } else {
                        warn!(
                            "Sample point {center:?} of region {region_nr} is in foreign leaf {leaf}"
                        );
                        None
                    }
                })
                .collect()
        })
        .collect()
}

fn in_base_pvs<W: World + ?Sized>(graph: &RegionGraph, world: &W, a: usize, b: usize) -> bool {
    let leaves_b = &graph.region(b).leaves;
    graph
        .region(a)
        .leaves
        .iter()
        .any(|&la| leaves_b.iter().any(|&lb| world.leaves_in_base_pvs(la, lb)))
}

/// Traces rays between the sub-portal centers of every region pair that is
/// not yet known to be visible. A clear ray proves visibility and flags the
/// pair both ways, a blocked one proves nothing.
///
/// Returns the number of pairs newly flagged.
pub fn determine_ray_presampled_visibility<W, M>(
    graph: &RegionGraph,
    world: &W,
    matrix: &mut M,
    offset: f64,
    progress: bool,
) -> usize
where
    W: World + ?Sized,
    M: VisibilityStore,
{
    #[cfg(feature = "hprof")]
    profile!("determine_ray_presampled_visibility");
    let samples = sample_points(graph, world, offset);
    let start = std::time::Instant::now();
    let mut flagged = 0;

    for first in 0..graph.len() {
        if progress {
            report_progress("Presampling", first, graph.len(), start);
        }

        'pairs: for second in first + 1..graph.len() {
            if matrix.is_visible(first, second) || !in_base_pvs(graph, world, first, second) {
                continue;
            }

            for center1 in samples[first].iter().flatten() {
                for center2 in samples[second].iter().flatten() {
                    if world.clip_line(*center1, *center2 - *center1) == 1.0 {
                        matrix.flag_mutual(first, second);
                        flagged += 1;
                        continue 'pairs;
                    }
                }
            }
        }
    }
    if progress {
        println!();
    }

    debug!(
        "Estimated PVS       : {:10.5} ({flagged} pairs by ray tests)",
        matrix.average_visibility()
    );
    flagged
}

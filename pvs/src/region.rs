#[cfg(feature = "hprof")]
use coarse_prof::profile;
use log::{debug, info, warn};
use math::{BoundingBox, MIN_VERTEX_DIST, Polygon, Side};

use crate::PvsError;

/// Directed edge of the region graph
#[derive(Debug, Clone)]
pub struct Neighbour {
    /// Index of the region on the other side
    pub region: usize,
    /// The shared opening. It lies on one of the portals of the region that
    /// owns this edge and its normal points into that region.
    pub sub_portal: Polygon,
}

/// A convex cluster of level leaves, treated as one unit of visibility
#[derive(Debug, Clone)]
pub struct Region {
    /// Indices of the leaves this region was made of
    pub leaves: Vec<usize>,
    /// Portals of all member leaves, normals pointing into the region
    pub portals: Vec<Polygon>,
    pub bb: BoundingBox,
    pub(crate) neighbours: Vec<Neighbour>,
}

impl Region {
    pub fn new(leaves: Vec<usize>, portals: Vec<Polygon>, bb: BoundingBox) -> Self {
        Self {
            leaves,
            portals,
            bb,
            neighbours: Vec::new(),
        }
    }

    #[inline]
    pub fn neighbours(&self) -> &[Neighbour] {
        &self.neighbours
    }
}

/// The regions together with their adjacency, immutable once built
#[derive(Debug, Clone)]
pub struct RegionGraph {
    pub(crate) regions: Vec<Region>,
    pub(crate) target_bbs: Vec<BoundingBox>,
    epsilon: f64,
}

impl RegionGraph {
    /// Validates `regions`, then fills in their neighbour lists and the
    /// target bounding boxes. `epsilon` is the plane and edge thickness used
    /// here and by every later phase.
    pub fn new(mut regions: Vec<Region>, epsilon: f64) -> Result<Self, PvsError> {
        #[cfg(feature = "hprof")]
        profile!("region_graph_new");
        validate_regions(&regions, epsilon)?;

        let start = std::time::Instant::now();
        determine_adjacency(&mut regions, epsilon);
        let target_bbs = target_bounding_boxes(&regions);

        let graph = Self {
            regions,
            target_bbs,
            epsilon,
        };
        info!(
            "Region adjacency: {} regions, {} neighbour edges in {:.2}ms",
            graph.len(),
            graph.neighbour_edge_count(),
            start.elapsed().as_secs_f32() * 1000.0
        );
        Ok(graph)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    #[inline]
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    #[inline]
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    #[inline]
    pub fn region(&self, index: usize) -> &Region {
        &self.regions[index]
    }

    #[inline]
    pub fn neighbours(&self, index: usize) -> &[Neighbour] {
        &self.regions[index].neighbours
    }

    /// Box over all sub-portal vertices of the region. Uninitialized for a
    /// region without neighbours, such a region can never be a target.
    #[inline]
    pub fn target_bb(&self, index: usize) -> &BoundingBox {
        &self.target_bbs[index]
    }

    pub fn neighbour_edge_count(&self) -> usize {
        self.regions.iter().map(|r| r.neighbours.len()).sum()
    }
}

fn validate_regions(regions: &[Region], epsilon: f64) -> Result<(), PvsError> {
    for (region_nr, region) in regions.iter().enumerate() {
        if region.leaves.is_empty() {
            return Err(PvsError::EmptyRegion { region: region_nr });
        }

        for (portal_nr, portal) in region.portals.iter().enumerate() {
            if portal.vertices.len() < 3 {
                return Err(PvsError::TooFewVertices {
                    region: region_nr,
                    portal: portal_nr,
                    count: portal.vertices.len(),
                });
            }
            if !portal.plane.is_valid() {
                return Err(PvsError::InvalidPlane {
                    region: region_nr,
                    portal: portal_nr,
                });
            }
            for (vertex_nr, vertex) in portal.vertices.iter().enumerate() {
                let distance = portal.plane.distance_to_point(*vertex);
                if distance.abs() > epsilon {
                    return Err(PvsError::NotPlanar {
                        region: region_nr,
                        portal: portal_nr,
                        vertex: vertex_nr,
                        distance,
                    });
                }
            }
            if !portal.is_valid(epsilon, MIN_VERTEX_DIST) {
                warn!("Portal {portal_nr} of region {region_nr} is degenerate or not convex");
            }
        }
    }
    Ok(())
}

/// Every pair of regions whose boxes touch is tested portal against portal.
/// Two portals connect their regions if they lie in mirrored planes and
/// overlap with some area.
fn determine_adjacency(regions: &mut [Region], epsilon: f64) {
    #[cfg(feature = "hprof")]
    profile!("determine_adjacency");
    let mut edges: Vec<Vec<Neighbour>> = vec![Vec::new(); regions.len()];

    for first in 0..regions.len() {
        let near = regions[first].bb.epsilon_box(epsilon);

        for second in first + 1..regions.len() {
            if !near.intersects(&regions[second].bb) {
                continue;
            }

            for p1 in &regions[first].portals {
                for p2 in &regions[second].portals {
                    if !p1.overlaps(p2, false, epsilon) {
                        continue;
                    }
                    if p1.what_side(&p2.plane, epsilon) != Side::InMirrored {
                        continue;
                    }

                    let (Some(sub1), Some(sub2)) = (
                        p1.chopped_up_along(p2, epsilon).pop(),
                        p2.chopped_up_along(p1, epsilon).pop(),
                    ) else {
                        continue;
                    };

                    debug!(
                        "Regions {first} and {second} share {:.1} units of portal area",
                        sub1.area()
                    );
                    edges[first].push(Neighbour {
                        region: second,
                        sub_portal: sub1,
                    });
                    edges[second].push(Neighbour {
                        region: first,
                        sub_portal: sub2,
                    });
                }
            }
        }
    }

    for (region, neighbours) in regions.iter_mut().zip(edges) {
        region.neighbours = neighbours;
    }
}

fn target_bounding_boxes(regions: &[Region]) -> Vec<BoundingBox> {
    regions
        .iter()
        .map(|region| {
            let mut bb = BoundingBox::new();
            for neighbour in &region.neighbours {
                bb.expand_to_include_points(&neighbour.sub_portal.vertices);
            }
            bb
        })
        .collect()
}

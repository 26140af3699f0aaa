#[cfg(feature = "hprof")]
use coarse_prof::profile;
use log::{debug, info};
use std::time::{Duration, Instant};

use crate::{
    RegionGraph, SAMPLE_OFFSET, Search, VisibilityMatrix, VisibilityStore, World,
    determine_ray_presampled_visibility, determine_trivial_visibility,
};

/// Switches for the visibility phases
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PvsOptions {
    /// Trace rays to seed the matrix before the analytic phase
    pub presample: bool,
    /// See [`SAMPLE_OFFSET`]
    pub sample_offset: f64,
    /// Print a progress line to stdout during the long phases
    pub progress: bool,
}

impl Default for PvsOptions {
    fn default() -> Self {
        Self {
            presample: true,
            sample_offset: SAMPLE_OFFSET,
            progress: false,
        }
    }
}

/// Average visibility after each phase, and the time each phase took
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhaseStats {
    pub trivial: f64,
    pub trivial_time: Duration,
    /// `None` if presampling did not run
    pub presampled: Option<f64>,
    pub presample_time: Duration,
    pub presampled_pairs: usize,
    pub analytic: f64,
    pub analytic_time: Duration,
}

/// Runs all visibility phases on `graph` and returns the finished,
/// symmetric matrix. Presampling only runs if a `world` is given and
/// `options.presample` is set.
pub fn compute_pvs(
    graph: &RegionGraph,
    world: Option<&dyn World>,
    options: &PvsOptions,
) -> (VisibilityMatrix, PhaseStats) {
    #[cfg(feature = "hprof")]
    profile!("compute_pvs");
    info!("Building PVS for {} regions", graph.len());
    let total_start = Instant::now();
    let mut matrix = VisibilityMatrix::new(graph.len());
    let mut stats = PhaseStats::default();

    let start = Instant::now();
    determine_trivial_visibility(graph, &mut matrix);
    stats.trivial = matrix.average_visibility();
    stats.trivial_time = start.elapsed();

    if let (true, Some(world)) = (options.presample, world) {
        let start = Instant::now();
        stats.presampled_pairs = determine_ray_presampled_visibility(
            graph,
            world,
            &mut matrix,
            options.sample_offset,
            options.progress,
        );
        stats.presampled = Some(matrix.average_visibility());
        stats.presample_time = start.elapsed();
    }

    let start = Instant::now();
    build_pvs(graph, &mut matrix, options.progress);
    stats.analytic = matrix.average_visibility();
    stats.analytic_time = start.elapsed();

    info!(
        "Total PVS build time: {:.2}s, {} bytes",
        total_start.elapsed().as_secs_f32(),
        matrix.memory_usage()
    );
    (matrix, stats)
}

/// Already visible, potentially visible and not visible regions of one
/// master region
struct Candidates {
    av: Vec<bool>,
    pv: Vec<bool>,
    nv: Vec<bool>,
}

impl Candidates {
    fn new(count: usize) -> Self {
        Self {
            av: vec![false; count],
            pv: vec![false; count],
            nv: vec![false; count],
        }
    }

    /// Rebuilds AV from the matrix row and PV from the neighbours of AV.
    /// Regions up to the master are left out of PV, their own rows already
    /// settled them. NV is kept.
    fn refresh<M: VisibilityStore>(&mut self, graph: &RegionGraph, matrix: &M, master: usize) {
        for region in 0..graph.len() {
            self.av[region] = matrix.is_visible(master, region);
            self.pv[region] = false;
        }

        for region in 0..graph.len() {
            if !self.av[region] {
                continue;
            }
            for neighbour in graph.neighbours(region) {
                let next = neighbour.region;
                if !self.av[next] && !self.nv[next] && next > master {
                    self.pv[next] = true;
                }
            }
        }
    }

    fn next_target(&self) -> Option<usize> {
        self.pv.iter().position(|&pv| pv)
    }
}

/// Settles every remaining region pair analytically.
///
/// Regions are handled in index order as masters. For each master the
/// candidates one neighbour step beyond what it already sees are resolved one
/// at a time, until none are left. A successful search may reveal more
/// regions on the way, so the candidates are rebuilt after each success.
///
/// Expects the trivial visibility to be in `matrix` already.
pub fn build_pvs<M: VisibilityStore>(graph: &RegionGraph, matrix: &mut M, progress: bool) {
    #[cfg(feature = "hprof")]
    profile!("build_pvs");
    let start = Instant::now();
    let mut searches = 0usize;

    for master in 0..graph.len() {
        if progress {
            report_progress("PVS Build", master, graph.len(), start);
        }

        let mut candidates = Candidates::new(graph.len());
        candidates.refresh(graph, matrix, master);

        while let Some(target) = candidates.next_target() {
            if !graph.target_bb(target).is_inited() {
                candidates.pv[target] = false;
                candidates.nv[target] = true;
                continue;
            }

            searches += 1;
            if Search::new(graph, matrix, master, target)
                .can_see_target()
                .is_visible()
            {
                matrix.flag_mutual(master, target);
                candidates.refresh(graph, matrix, master);
            } else {
                candidates.pv[target] = false;
                candidates.nv[target] = true;
            }
        }

        debug!(
            "Region {master}: {} visible, {} ruled out",
            candidates.av.iter().filter(|&&v| v).count(),
            candidates.nv.iter().filter(|&&v| v).count()
        );
    }
    if progress {
        println!();
    }

    debug!(
        "Final avg visibility: {:10.5} ({searches} searches in {:.2}s)",
        matrix.average_visibility(),
        start.elapsed().as_secs_f32()
    );
}

/// Reports progress for long-running phases
pub(crate) fn report_progress(phase: &str, done: usize, total: usize, function_start: Instant) {
    let progress = if total > 0 {
        (done as f32 / total as f32) * 100.0
    } else {
        100.0
    };
    let elapsed = function_start.elapsed().as_secs_f32();
    let remaining_time = if progress > 0.0 {
        elapsed * (100.0 - progress) / progress
    } else {
        0.0
    };

    print!(
        "\r{phase}: {:.1}% | Time: {:.1}s | ETA: {:.1}s",
        progress, elapsed, remaining_time
    );
    let _ = std::io::Write::flush(&mut std::io::stdout());
}

//! `portalvis` reads a BSP level, groups its leaves into super leaves,
//! computes which of them can see each other and writes the leaf PVS.

mod cli;
mod config;
mod run_log;

use cli::*;
use simplelog::TermLogger;
use std::error::Error;
use std::path::Path;
use std::time::Instant;

use crate::config::UserConfig;
use bsp::{create_super_leaves, load_level, store_pvs};
use pvs::log::{self, info};
use pvs::math::ROUND_EPSILON;
use pvs::{PhaseStats, PvsOptions, RegionGraph, compute_pvs};

const BASE_DIR: &str = "portalvis/";

fn main() -> Result<(), Box<dyn Error>> {
    let mut options: CLIOptions = argh::from_env();

    TermLogger::init(
        options.verbose.unwrap_or(log::LevelFilter::Info),
        simplelog::ConfigBuilder::default()
            .set_time_level(log::LevelFilter::Trace)
            .build(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let mut user_config = UserConfig::load();
    user_config.sync_cli(&mut options);
    user_config.write();

    build(&options, &user_config).map_err(|e| build_failed(&options.level, e))
}

fn build_failed(level: &Path, e: Box<dyn Error>) -> Box<dyn Error> {
    format!("Failed to build PVS for {:?}: {}", level, e).into()
}

fn build(options: &CLIOptions, user_config: &UserConfig) -> Result<(), Box<dyn Error>> {
    let start = Instant::now();
    let tree = load_level(&options.level)?;

    let regions = create_super_leaves(&tree, &user_config.super_leaf_policy());
    if options.only_super_leaves {
        println!(
            "{} super leaves would be created from {} leaves",
            regions.len(),
            tree.leaves().len()
        );
        return Ok(());
    }

    let graph = RegionGraph::new(regions, options.epsilon.unwrap_or(ROUND_EPSILON))?;
    let pvs_options = PvsOptions {
        presample: options.presample.unwrap_or(true),
        progress: true,
        ..PvsOptions::default()
    };
    let (matrix, stats) = compute_pvs(&graph, Some(&tree), &pvs_options);
    log_phase_stats(&stats);

    let leaf_pvs = store_pvs(&tree, graph.regions(), &matrix);
    let output = options.output_path();
    leaf_pvs.save_to_file(&output)?;
    info!("Saved PVS to {:?}", output);

    if let Some(log_file) = &options.log_file {
        run_log::append_entry(log_file, &options.level, start.elapsed(), leaf_pvs.checksum())?;
    }

    #[cfg(feature = "hprof")]
    coarse_prof::write(&mut std::io::stdout())?;

    info!(
        "Done in {:.2}s, checksum {}",
        start.elapsed().as_secs_f32(),
        leaf_pvs.checksum()
    );
    Ok(())
}

fn log_phase_stats(stats: &PhaseStats) {
    info!(
        "Trivial visibility  : {:10.5} in {:.2}s",
        stats.trivial,
        stats.trivial_time.as_secs_f32()
    );
    if let Some(presampled) = stats.presampled {
        info!(
            "Estimated PVS       : {:10.5} in {:.2}s, {} pairs by ray tests",
            presampled,
            stats.presample_time.as_secs_f32(),
            stats.presampled_pairs
        );
    }
    info!(
        "Final avg visibility: {:10.5} in {:.2}s",
        stats.analytic,
        stats.analytic_time.as_secs_f32()
    );
}

use argh::FromArgs;
use pvs::log;
use std::path::PathBuf;

/// Computes the potentially visible set of a RON level file
#[derive(Debug, Clone, FromArgs)]
pub struct CLIOptions {
    /// verbose level: off, error, warn, info, debug
    #[argh(option)]
    pub verbose: Option<log::LevelFilter>,
    /// leaves that are deeper in the BSP tree than this get combined in a
    /// common super leaf created at this depth
    #[argh(option)]
    pub max_rec_depth_sl: Option<u32>,
    /// BSP subtrees whose faces have less area than this get combined in a
    /// super leaf. Negative values count as 0
    #[argh(option)]
    pub min_area_sl: Option<f64>,
    /// only print how many super leaves would be created, without computing
    /// the PVS
    #[argh(switch)]
    pub only_super_leaves: bool,
    /// trace rays to find visible pairs before the exact analysis
    #[argh(option)]
    pub presample: Option<bool>,
    /// plane thickness used by all geometric tests, in level units
    #[argh(option)]
    pub epsilon: Option<f64>,
    /// where to write the PVS, defaults to the level path with a `pvs`
    /// extension
    #[argh(option)]
    pub output: Option<PathBuf>,
    /// append a one line summary of the run to this file
    #[argh(option)]
    pub log_file: Option<PathBuf>,
    /// path to the level file
    #[argh(positional)]
    pub level: PathBuf,
}

impl CLIOptions {
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.level.with_extension("pvs"))
    }
}

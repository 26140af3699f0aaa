//! User configuration options.

use crate::{BASE_DIR, CLIOptions};
use bsp::SuperLeafPolicy;
use dirs::config_dir;
use nanoserde::{DeRon, SerRon};
use pvs::log::{error, info, warn};
use pvs::math::ROUND_EPSILON;
use std::fs::{File, create_dir_all};
use std::io::Write;
use std::path::PathBuf;

const LOG_TAG: &str = "UserConfig";

fn get_cfg_file() -> Option<PathBuf> {
    let mut dir = config_dir()?;
    dir.push(BASE_DIR);
    if !dir.exists() {
        if let Err(e) = create_dir_all(&dir) {
            warn!(target: LOG_TAG, "Couldn't create {:?}: {}", dir, e);
            return None;
        }
    }
    dir.push("user.ron");
    Some(dir)
}

/// Defaults for the build options, persisted between runs
#[derive(Debug, Clone, PartialEq, DeRon, SerRon)]
pub struct UserConfig {
    pub max_rec_depth_sl: u32,
    pub min_area_sl: f64,
    pub epsilon: f64,
    pub presample: bool,
}

impl Default for UserConfig {
    fn default() -> Self {
        let policy = SuperLeafPolicy::default();
        Self {
            max_rec_depth_sl: policy.max_recursion_depth,
            min_area_sl: policy.min_sub_tree_faces_area,
            epsilon: ROUND_EPSILON,
            presample: true,
        }
    }
}

impl UserConfig {
    /// `load` reads the config, falling back to the defaults if there is none
    /// or it can't be read
    pub fn load() -> Self {
        let Some(path) = get_cfg_file() else {
            warn!(target: LOG_TAG, "No user config dir, using defaults");
            return UserConfig::default();
        };

        match std::fs::read_to_string(&path) {
            Ok(buf) => match UserConfig::deserialize_ron(&buf) {
                Ok(data) => {
                    info!(target: LOG_TAG, "Loaded user config file");
                    data
                }
                Err(e) => {
                    warn!("Could not deserialise {:?} ({:?}), recreating config", path, e);
                    UserConfig::default()
                }
            },
            Err(_) => {
                info!("Created default user config file");
                UserConfig::default()
            }
        }
    }

    pub fn write(&self) {
        let Some(path) = get_cfg_file() else {
            return;
        };
        let data = self.serialize_ron();
        match File::create(&path).and_then(|mut file| file.write_all(data.as_bytes())) {
            Ok(()) => info!("Saved user config to {:?}", path),
            Err(err) => error!("Could not write config: {}", err),
        }
    }

    /// Sync the CLI options and UserOptions with each other
    pub fn sync_cli(&mut self, cli: &mut CLIOptions) {
        info!("Checking CLI options");

        if let Some(depth) = cli.max_rec_depth_sl {
            self.max_rec_depth_sl = depth;
        } else {
            cli.max_rec_depth_sl = Some(self.max_rec_depth_sl);
        }

        if let Some(area) = cli.min_area_sl {
            let area = area.max(0.0);
            self.min_area_sl = area;
            cli.min_area_sl = Some(area);
        } else {
            cli.min_area_sl = Some(self.min_area_sl);
        }

        if let Some(epsilon) = cli.epsilon {
            self.epsilon = epsilon;
        } else {
            cli.epsilon = Some(self.epsilon);
        }

        if let Some(f) = cli.presample {
            self.presample = f;
        } else {
            cli.presample = Some(self.presample);
        }
    }

    pub fn super_leaf_policy(&self) -> SuperLeafPolicy {
        SuperLeafPolicy {
            max_recursion_depth: self.max_rec_depth_sl,
            min_sub_tree_faces_area: self.min_area_sl,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli() -> CLIOptions {
        CLIOptions {
            verbose: None,
            max_rec_depth_sl: None,
            min_area_sl: None,
            only_super_leaves: false,
            presample: None,
            epsilon: None,
            output: None,
            log_file: None,
            level: PathBuf::from("level.ron"),
        }
    }

    #[test]
    fn test_config_fills_missing_cli_options() {
        let mut config = UserConfig {
            max_rec_depth_sl: 12,
            ..UserConfig::default()
        };
        let mut options = cli();
        config.sync_cli(&mut options);

        assert_eq!(options.max_rec_depth_sl, Some(12));
        assert_eq!(options.min_area_sl, Some(0.0));
        assert_eq!(options.epsilon, Some(ROUND_EPSILON));
        assert_eq!(options.presample, Some(true));
        assert_eq!(config.super_leaf_policy().max_recursion_depth, 12);
    }

    #[test]
    fn test_cli_options_override_config() {
        let mut config = UserConfig::default();
        let mut options = CLIOptions {
            max_rec_depth_sl: Some(4),
            min_area_sl: Some(-10.0),
            presample: Some(false),
            ..cli()
        };
        config.sync_cli(&mut options);

        assert_eq!(config.max_rec_depth_sl, 4);
        assert_eq!(config.min_area_sl, 0.0);
        assert_eq!(options.min_area_sl, Some(0.0));
        assert!(!config.presample);
    }

    #[test]
    fn test_config_ron() {
        let config = UserConfig {
            max_rec_depth_sl: 7,
            min_area_sl: 1500.5,
            epsilon: 1.0,
            presample: false,
        };
        let restored = UserConfig::deserialize_ron(&config.serialize_ron()).unwrap();
        assert_eq!(restored, config);
    }
}

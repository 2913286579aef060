use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::source::{FALLBACK_INPUT, PRIMARY_INPUT};

/// Default round count and duration when the CLI gives none (or garbage)
pub const DEFAULT_COUNT: usize = 15;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub number_of_symbols: usize,
    pub number_of_secs: u64,
    pub show_preview: bool,
    pub input_file: PathBuf,
    pub fallback_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            number_of_symbols: DEFAULT_COUNT,
            number_of_secs: DEFAULT_COUNT as u64,
            show_preview: true,
            input_file: PathBuf::from(PRIMARY_INPUT),
            fallback_file: PathBuf::from(FALLBACK_INPUT),
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    /// Load the stored config, writing the defaults out first if none exists
    /// so there is a file to edit.
    pub fn load_or_init(&self) -> Config {
        if !self.path.exists() {
            let cfg = Config::default();
            if let Err(err) = self.save(&cfg) {
                warn!("could not write {}: {}", self.path.display(), err);
            }
            return cfg;
        }
        self.load()
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        match fs::read(&self.path) {
            Ok(bytes) => match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => cfg,
                Err(err) => {
                    warn!("ignoring malformed {}: {}", self.path.display(), err);
                    Config::default()
                }
            },
            Err(err) => {
                debug!("no config at {}: {}", self.path.display(), err);
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}

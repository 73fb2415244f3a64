use crate::app_dirs::AppDirs;
use crate::error::{Error, Result};
use crate::palette::{default_palette, ColorName, MAX_PALETTE_SIZE};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fs;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

/// Longest blank interval allowed before a stimulus
pub const MAX_FIXATION_MS: u64 = 10_000;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub number_of_trials: usize,
    pub palette: Vec<ColorName>,
    pub min_age: u32,
    pub max_age: u32,
    pub fixation_ms: u64,
    pub seed: Option<u64>,
    pub model_path: Option<PathBuf>,
    pub export_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            number_of_trials: 5,
            palette: default_palette(),
            min_age: 10,
            max_age: 120,
            fixation_ms: 300,
            seed: None,
            model_path: None,
            export_dir: None,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.number_of_trials == 0 {
            return Err(Error::InvalidConfiguration(
                "number_of_trials must be positive".into(),
            ));
        }
        if self.palette.is_empty() {
            return Err(Error::InvalidConfiguration("palette is empty".into()));
        }
        // every ink must be reachable from a response key
        if self.palette.len() > MAX_PALETTE_SIZE {
            return Err(Error::InvalidConfiguration(format!(
                "palette has {} colors, at most {MAX_PALETTE_SIZE} can be answered",
                self.palette.len()
            )));
        }
        if !self.palette.iter().all_unique() {
            return Err(Error::InvalidConfiguration(format!(
                "palette repeats a color: {}",
                self.palette.iter().join(",")
            )));
        }
        if self.min_age > self.max_age {
            return Err(Error::InvalidConfiguration(format!(
                "min_age {} is greater than max_age {}",
                self.min_age, self.max_age
            )));
        }
        if self.fixation_ms > MAX_FIXATION_MS {
            return Err(Error::InvalidConfiguration(format!(
                "fixation_ms {} exceeds {MAX_FIXATION_MS}",
                self.fixation_ms
            )));
        }
        Ok(())
    }

    pub fn age_range(&self) -> RangeInclusive<u32> {
        self.min_age..=self.max_age
    }

    pub fn model_path(&self) -> PathBuf {
        self.model_path
            .clone()
            .unwrap_or_else(AppDirs::default_model_path)
    }

    pub fn export_dir(&self) -> PathBuf {
        self.export_dir.clone().unwrap_or_else(AppDirs::export_dir)
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

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    /// Missing or unreadable files fall back to defaults
    fn load(&self) -> Config {
        match fs::read(&self.path) {
            Ok(bytes) => serde_json::from_slice::<Config>(&bytes).unwrap_or_else(|e| {
                tracing::warn!(path = %self.path.display(), error = %e, "ignoring malformed config");
                Config::default()
            }),
            Err(_) => Config::default(),
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

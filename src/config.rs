use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

use crate::engine::{DEFAULT_POPULATION, EmitterParams};
use crate::types::Rgb;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeartfieldConfig {
    /// Number of emitters. Fixed for the lifetime of the animation.
    pub population: usize,
    pub frame_rate: u32,
    /// Surface units covered by one terminal pixel (half a cell).
    pub pixel_size: f64,
    pub background: Rgb,
    /// Seed for a reproducible run. Unset means fresh randomness every run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Write log output here instead of stderr.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
    pub emitter: EmitterParams,
}

impl Default for HeartfieldConfig {
    fn default() -> Self {
        HeartfieldConfig {
            population: DEFAULT_POPULATION,
            frame_rate: 60,
            pixel_size: 4.0,
            background: Rgb::BLACK,
            seed: None,
            log_file: None,
            emitter: EmitterParams::default(),
        }
    }
}

impl HeartfieldConfig {
    /// Load from `path` if given, otherwise from the user config file.
    ///
    /// An explicit path must exist and parse. The user config file is
    /// optional; if it is unreadable the defaults are used, and if it is
    /// invalid the defaults are used and a warning is returned alongside.
    /// The warning is handed back rather than logged because the logger is
    /// configured from the loaded config.
    pub fn load(path: Option<&str>) -> Result<(Self, Option<String>)> {
        let (config, warning) = match path {
            Some(path) => (Self::from_file(Path::new(path))?, None),
            None => Self::from_user_file(&Self::config_path()),
        };
        config.validate()?;
        Ok((config, warning))
    }

    fn from_user_file(path: &Path) -> (Self, Option<String>) {
        match fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(config) => (config, None),
                Err(e) => {
                    let warning =
                        format!("invalid config {} ({e}), using defaults", path.display());
                    (Self::default(), Some(warning))
                }
            },
            Err(_) => (Self::default(), None),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&json).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.population > 0, "population must be at least 1");
        ensure!(self.frame_rate > 0, "frame_rate must be at least 1");
        ensure!(
            self.pixel_size.is_finite() && self.pixel_size > 0.0,
            "pixel_size must be positive, got {}",
            self.pixel_size
        );

        self.emitter.validate()
    }

    fn config_path() -> PathBuf {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        let mut path = PathBuf::from(home);
        path.push(".config");
        path.push("heartfield");
        path.push("config.json");
        path
    }
}

use crate::deterrent::DEFAULT_TARGET;
use crate::error::ConfigError;
use crate::recorder::RESULTS_LOG;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::{env, fs};
use tracing::debug;

pub const CONFIG_ENV: &str = "BIRD_SENTRY_CONFIG";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Sound the deterrent on the target label and keep non-background frames.
    Deterrent,
    /// Keep frames whose label set differs from the previous frame.
    Training,
}

/// Settings as read from the config file and command line, before checks.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub model: Option<PathBuf>,
    pub model_repo: Option<String>,
    pub labels: Option<PathBuf>,
    pub top_k: usize,
    pub threshold: f32,
    pub storage: Option<PathBuf>,
    pub sound: Option<PathBuf>,
    pub sound_player: String,
    pub print: bool,
    pub training: bool,
    pub deterrent_in_training: bool,
    pub target: String,
    pub source: String,
    pub extension: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: None,
            model_repo: None,
            labels: None,
            top_k: 3,
            threshold: 0.1,
            storage: None,
            sound: None,
            sound_player: "aplay".to_string(),
            print: false,
            training: false,
            deterrent_in_training: false,
            target: DEFAULT_TARGET.to_string(),
            source: "0".to_string(),
            extension: "png".to_string(),
        }
    }
}

/// Validated settings the program runs with.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub model: PathBuf,
    pub model_repo: Option<String>,
    pub labels: PathBuf,
    pub top_k: usize,
    pub threshold: f32,
    pub storage: PathBuf,
    pub sound: PathBuf,
    pub sound_player: String,
    pub print: bool,
    pub mode: Mode,
    pub deterrent_in_training: bool,
    pub target: String,
    pub source: String,
    pub extension: String,
}

impl Config {
    pub fn validate(self) -> Result<Settings, ConfigError> {
        if self.top_k == 0 {
            return Err(ConfigError::TopK(self.top_k));
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(ConfigError::Threshold(self.threshold));
        }
        let model = self.model.ok_or(ConfigError::Missing("model"))?;
        if self.model_repo.is_none() {
            require_file("model", &model)?;
        }
        let labels = self.labels.ok_or(ConfigError::Missing("labels"))?;
        require_file("label file", &labels)?;
        let sound = self.sound.ok_or(ConfigError::Missing("sound"))?;
        require_file("sound file", &sound)?;
        let storage = self.storage.ok_or(ConfigError::Missing("storage"))?;
        if !storage.exists() {
            return Err(ConfigError::NotFound {
                what: "storage directory",
                path: storage,
            });
        }
        if !storage.is_dir() {
            return Err(ConfigError::StorageNotDirectory(storage));
        }
        let log = storage.join(RESULTS_LOG);
        if let Err(source) = OpenOptions::new().create(true).append(true).open(&log) {
            return Err(ConfigError::StorageNotWritable {
                path: storage,
                source,
            });
        }
        Ok(Settings {
            model,
            model_repo: self.model_repo,
            labels,
            top_k: self.top_k,
            threshold: self.threshold,
            storage,
            sound,
            sound_player: self.sound_player,
            print: self.print,
            mode: if self.training {
                Mode::Training
            } else {
                Mode::Deterrent
            },
            deterrent_in_training: self.deterrent_in_training,
            target: self.target,
            source: self.source,
            extension: self.extension,
        })
    }
}

fn require_file(what: &'static str, path: &Path) -> Result<(), ConfigError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(ConfigError::NotFound {
            what,
            path: path.to_path_buf(),
        })
    }
}

fn config_path() -> Option<PathBuf> {
    env::var_os(CONFIG_ENV).map(PathBuf::from)
}

/// Reads `path`, or the file named by `BIRD_SENTRY_CONFIG`, falling back to
/// defaults when neither is given.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let Some(path) = path.map(Path::to_path_buf).or_else(config_path) else {
        return Ok(Config::default());
    };
    let data = fs::read(&path).map_err(|source| ConfigError::File {
        path: path.clone(),
        source,
    })?;
    let cfg = serde_json::from_slice(&data).map_err(|source| ConfigError::Parse {
        path: path.clone(),
        source,
    })?;
    debug!(path = %path.display(), "loaded configuration");
    Ok(cfg)
}

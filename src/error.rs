use std::path::PathBuf;
use thiserror::Error;

/// Problems found while validating configuration before the loop starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("top_k must be a positive integer, got {0}")]
    TopK(usize),
    #[error("threshold must lie in [0, 1], got {0}")]
    Threshold(f32),
    #[error("missing required setting: {0}")]
    Missing(&'static str),
    #[error("{what} not found: {path}")]
    NotFound { what: &'static str, path: PathBuf },
    #[error("storage path is not a directory: {0}")]
    StorageNotDirectory(PathBuf),
    #[error("storage directory is not writable: {path}: {source}")]
    StorageNotWritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read config file {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum LabelError {
    #[error("failed to read label file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed label file line {line}: {text:?}")]
    Malformed { line: usize, text: String },
    #[error("class index {0} has no entry in the label file")]
    Missing(usize),
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model file not found: {0}")]
    NotFound(PathBuf),
    #[error("failed to download model: {0}")]
    Download(#[from] hf_hub::api::sync::ApiError),
    #[error("candle error: {0}")]
    Candle(#[from] candle_core::Error),
    #[error("model graph missing")]
    MissingGraph,
    #[error("model must expose exactly one output tensor, found {0}")]
    OutputCount(usize),
    #[error("model has no input tensor")]
    MissingInput,
    #[error("unsupported input tensor shape {0:?}: expected rank 4, batch 1, 1 or 3 channels")]
    InputShape(Vec<i64>),
}

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("inference failed: {0}")]
    Candle(#[from] candle_core::Error),
    #[error("model output {0} missing")]
    MissingOutput(String),
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("camera error: {0}")]
    Camera(#[from] nokhwa::NokhwaError),
    #[error("failed to read frame {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to list frames in {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to write image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to append to results log: {0}")]
    Log(#[from] std::io::Error),
    #[error("failed to encode results: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("failed to start sound player {player}: {source}")]
    Spawn {
        player: String,
        #[source]
        source: std::io::Error,
    },
}

/// Anything that stops the program from starting or the loop from running.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Label(#[from] LabelError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Source(#[from] SourceError),
}

use crate::config::{load_config, Config};
use crate::error::Error;
use crate::sentry::run_sentry;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "bird-sentry",
    version,
    about = "Classifies camera frames, deters squirrels and collects training images"
)]
pub struct Cli {
    /// JSON config file supplying defaults for the flags below
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// ONNX model path
    #[arg(long)]
    pub model: Option<PathBuf>,
    /// Hugging Face repository to fetch the model from when it is not on disk
    #[arg(long)]
    pub model_repo: Option<String>,
    /// Label file path
    #[arg(long)]
    pub labels: Option<PathBuf>,
    /// Number of classes with highest score to keep
    #[arg(long, alias = "top_k")]
    pub top_k: Option<usize>,
    /// Class score threshold
    #[arg(long)]
    pub threshold: Option<f32>,
    /// Directory to store images and results
    #[arg(long)]
    pub storage: Option<PathBuf>,
    /// Deterrent sound file
    #[arg(long)]
    pub sound: Option<PathBuf>,
    /// Command used to play the deterrent sound
    #[arg(long)]
    pub sound_player: Option<String>,
    /// Print inference results to the terminal
    #[arg(long)]
    pub print: bool,
    /// Training mode for image collection
    #[arg(long)]
    pub training: bool,
    /// Also sound the deterrent while in training mode
    #[arg(long)]
    pub deterrent_in_training: bool,
    /// Label that triggers the deterrent
    #[arg(long)]
    pub target: Option<String>,
    /// Camera index, camera name, image directory or image file
    #[arg(long)]
    pub source: Option<String>,
    /// Extension (and format) of saved frames
    #[arg(long)]
    pub extension: Option<String>,
}

impl Cli {
    /// Overrides `cfg` with whatever was given on the command line.
    pub fn apply(self, mut cfg: Config) -> Config {
        if let Some(v) = self.top_k {
            cfg.top_k = v;
        }
        if let Some(v) = self.threshold {
            cfg.threshold = v;
        }
        if let Some(v) = self.sound_player {
            cfg.sound_player = v;
        }
        if let Some(v) = self.target {
            cfg.target = v;
        }
        if let Some(v) = self.source {
            cfg.source = v;
        }
        if let Some(v) = self.extension {
            cfg.extension = v;
        }
        cfg.model = self.model.or(cfg.model);
        cfg.model_repo = self.model_repo.or(cfg.model_repo);
        cfg.labels = self.labels.or(cfg.labels);
        cfg.storage = self.storage.or(cfg.storage);
        cfg.sound = self.sound.or(cfg.sound);
        cfg.print |= self.print;
        cfg.training |= self.training;
        cfg.deterrent_in_training |= self.deterrent_in_training;
        cfg
    }
}

pub fn run_cli() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let cli = Cli::parse();
    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

pub fn execute(cli: Cli) -> Result<(), Error> {
    let cfg = load_config(cli.config.as_deref())?;
    let settings = cli.apply(cfg).validate()?;
    run_sentry(settings)
}

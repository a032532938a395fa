pub mod ai;
pub mod cli;
pub mod config;
pub mod deterrent;
pub mod error;
pub mod frame;
pub mod frame_loop;
pub mod labels;
pub mod novelty;
pub mod recorder;
pub mod results;
pub mod sentry;
pub mod sound;

pub use cli::{execute, run_cli, Cli};
pub use config::{load_config, Config, Mode, Settings};
pub use error::Error;
pub use frame_loop::{FrameLoop, FrameLoopState, FrameReport, LoopOptions};
pub use labels::LabelCatalog;
pub use results::{ClassScore, ResultSet, ScoredLabel};

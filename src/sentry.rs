use crate::ai::{resolve_model_path, OnnxClassifier};
use crate::config::Settings;
use crate::deterrent::DeterrentTrigger;
use crate::error::Error;
use crate::frame::open_source;
use crate::frame_loop::{FrameLoop, LoopOptions};
use crate::labels::LabelCatalog;
use crate::recorder::{FrameRecorder, ResultsLog};
use crate::sound::CommandPlayer;
use tracing::{debug, info};

/// Loads every collaborator named by `settings` and runs the frame loop
/// until the video source ends.
pub fn run_sentry(settings: Settings) -> Result<(), Error> {
    println!(
        "Loading {} with {} labels.",
        settings.model.display(),
        settings.labels.display()
    );
    let model_path = resolve_model_path(&settings.model, settings.model_repo.as_deref())?;
    let classifier = OnnxClassifier::load(&model_path)?;
    let catalog = LabelCatalog::load(&settings.labels)?;

    let log = ResultsLog::in_dir(&settings.storage);
    debug!(path = %log.path().display(), "results log");
    let recorder = FrameRecorder::new(&settings.storage, &settings.extension, log.clone());
    let player = CommandPlayer::new(&settings.sound_player);
    let deterrent = DeterrentTrigger::new(
        settings.target.clone(),
        settings.sound.clone(),
        Box::new(player),
        log,
    );

    let mut source = open_source(&settings.source)?;
    info!(source = %settings.source, "video source opened");

    let options = LoopOptions {
        mode: settings.mode,
        top_k: settings.top_k,
        threshold: settings.threshold,
        print: settings.print,
        deterrent_in_training: settings.deterrent_in_training,
    };
    let mut frame_loop = FrameLoop::new(
        options,
        catalog,
        Box::new(classifier),
        recorder,
        deterrent,
    );
    frame_loop.run(source.as_mut())?;
    Ok(())
}

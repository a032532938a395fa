#![allow(dead_code)]

use bird_sentry::ai::Classifier;
use bird_sentry::deterrent::DeterrentTrigger;
use bird_sentry::error::{ClassifyError, PlaybackError};
use bird_sentry::recorder::{FrameRecorder, ResultsLog};
use bird_sentry::sound::SoundPlayer;
use bird_sentry::{ClassScore, FrameLoop, LabelCatalog, LoopOptions, Mode};
use image::DynamicImage;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::rc::Rc;

pub const SQUIRREL: &str = "fox squirrel, eastern fox squirrel, Sciurus niger";

/// Returns queued score vectors in order; an empty queue is an error.
pub struct ScriptedClassifier {
    frames: VecDeque<Option<Vec<ClassScore>>>,
}

impl ScriptedClassifier {
    pub fn new(frames: Vec<Option<Vec<ClassScore>>>) -> Self {
        Self {
            frames: frames.into(),
        }
    }
}

impl Classifier for ScriptedClassifier {
    fn classify(&mut self, _image: &DynamicImage) -> Result<Vec<ClassScore>, ClassifyError> {
        self.frames
            .pop_front()
            .flatten()
            .ok_or_else(|| ClassifyError::MissingOutput("scores".to_string()))
    }
}

#[derive(Clone, Default)]
pub struct RecordingPlayer {
    pub played: Rc<RefCell<Vec<PathBuf>>>,
}

impl SoundPlayer for RecordingPlayer {
    fn play(&mut self, sound: &Path) -> Result<(), PlaybackError> {
        self.played.borrow_mut().push(sound.to_path_buf());
        Ok(())
    }
}

pub struct BrokenPlayer;

impl SoundPlayer for BrokenPlayer {
    fn play(&mut self, _sound: &Path) -> Result<(), PlaybackError> {
        Err(PlaybackError::Spawn {
            player: "missing".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        })
    }
}

/// Labels: 0 background, 1 squirrel, 2 cardinal, 3 blue jay, 4 sparrow.
pub fn catalog() -> LabelCatalog {
    LabelCatalog::parse(&format!(
        "0 background\n1 {SQUIRREL}\n2 cardinal\n3 blue jay\n4 sparrow\n"
    ))
    .unwrap()
}

pub fn scores(pairs: &[(usize, f32)]) -> Option<Vec<ClassScore>> {
    Some(pairs.iter().map(|&(i, s)| ClassScore::new(i, s)).collect())
}

pub fn options(mode: Mode) -> LoopOptions {
    LoopOptions {
        mode,
        top_k: 3,
        threshold: 0.1,
        print: false,
        deterrent_in_training: false,
    }
}

pub fn frame() -> DynamicImage {
    DynamicImage::new_rgb8(4, 4)
}

pub fn build_loop(
    options: LoopOptions,
    storage: &Path,
    frames: Vec<Option<Vec<ClassScore>>>,
    player: Box<dyn SoundPlayer>,
) -> FrameLoop {
    let log = ResultsLog::in_dir(storage);
    let recorder = FrameRecorder::new(storage, "png", log.clone());
    let deterrent = DeterrentTrigger::new(SQUIRREL, storage.join("alarm.wav"), player, log);
    FrameLoop::new(
        options,
        catalog(),
        Box::new(ScriptedClassifier::new(frames)),
        recorder,
        deterrent,
    )
}

pub fn log_lines(storage: &Path) -> Vec<serde_json::Value> {
    std::fs::read_to_string(storage.join("results.log"))
        .unwrap_or_default()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

pub fn saved_images(storage: &Path) -> Vec<PathBuf> {
    let mut images: Vec<PathBuf> = std::fs::read_dir(storage)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.extension().is_some_and(|e| e == "png"))
        .collect();
    images.sort();
    images
}

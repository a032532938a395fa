use crate::ai::Classifier;
use crate::config::Mode;
use crate::deterrent::DeterrentTrigger;
use crate::error::LabelError;
use crate::frame::FrameSource;
use crate::labels::LabelCatalog;
use crate::novelty::is_novel;
use crate::recorder::FrameRecorder;
use crate::results::ResultSet;
use image::DynamicImage;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, error, info, trace};

/// Label meaning "nothing of interest"; frames topped by it are not kept.
pub const BACKGROUND: &str = "background";

/// What the previous frame left behind for the next one.
#[derive(Debug, Clone)]
pub struct FrameLoopState {
    pub previous: ResultSet,
    pub previous_time: Instant,
}

impl FrameLoopState {
    pub fn new(now: Instant) -> Self {
        Self {
            previous: ResultSet::placeholder(),
            previous_time: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub results: ResultSet,
    /// Set in training mode only.
    pub novel: Option<bool>,
    pub saved: Option<PathBuf>,
    pub deterrent: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopOptions {
    pub mode: Mode,
    pub top_k: usize,
    pub threshold: f32,
    pub print: bool,
    pub deterrent_in_training: bool,
}

pub fn is_foreground(results: &ResultSet) -> bool {
    results.top().is_some_and(|top| top.label != BACKGROUND)
}

pub struct FrameLoop {
    options: LoopOptions,
    catalog: LabelCatalog,
    classifier: Box<dyn Classifier>,
    recorder: FrameRecorder,
    deterrent: DeterrentTrigger,
}

impl FrameLoop {
    pub fn new(
        options: LoopOptions,
        catalog: LabelCatalog,
        classifier: Box<dyn Classifier>,
        recorder: FrameRecorder,
        deterrent: DeterrentTrigger,
    ) -> Self {
        Self {
            options,
            catalog,
            classifier,
            recorder,
            deterrent,
        }
    }

    /// Pulls frames until the source runs dry. Only a label lookup failure
    /// ends the loop early.
    pub fn run(&mut self, source: &mut dyn FrameSource) -> Result<(), LabelError> {
        let mut state = FrameLoopState::new(Instant::now());
        info!(mode = ?self.options.mode, "frame loop started");
        loop {
            trace!("awaiting frame");
            let image = match source.next_frame() {
                Ok(Some(image)) => image,
                Ok(None) => break,
                Err(e) => {
                    error!("failed to capture frame: {e}");
                    continue;
                }
            };
            (state, _) = self.handle_frame(state, &image)?;
        }
        info!("frame source ended");
        Ok(())
    }

    /// Classifies one frame and acts on it. The returned state carries this
    /// frame's results; the report is `None` when classification failed and
    /// the frame was skipped.
    pub fn handle_frame(
        &mut self,
        state: FrameLoopState,
        image: &DynamicImage,
    ) -> Result<(FrameLoopState, Option<FrameReport>), LabelError> {
        trace!("classifying");
        let start = Instant::now();
        let scores = match self.classifier.classify(image) {
            Ok(scores) => scores,
            Err(e) => {
                error!("failed to classify frame: {e}");
                return Ok((state, None));
            }
        };
        let end = Instant::now();
        let results = ResultSet::build(
            &scores,
            &self.catalog,
            self.options.top_k,
            self.options.threshold,
        )?;

        if self.options.print {
            print_results(start, state.previous_time, end, &results);
        }

        trace!("dispatching");
        let report = self.dispatch(image, results, &state.previous);
        debug!(
            count = report.results.len(),
            saved = report.saved.is_some(),
            deterrent = report.deterrent,
            "frame handled"
        );
        let next = FrameLoopState {
            previous: report.results.clone(),
            previous_time: end,
        };
        Ok((next, Some(report)))
    }

    fn dispatch(
        &mut self,
        image: &DynamicImage,
        results: ResultSet,
        previous: &ResultSet,
    ) -> FrameReport {
        let mut report = FrameReport {
            results,
            novel: None,
            saved: None,
            deterrent: false,
        };
        match self.options.mode {
            Mode::Training => {
                let novel = is_novel(&report.results, previous, self.options.top_k);
                if novel {
                    println!("Difference detected");
                    report.saved = self.persist(image, &report.results);
                }
                report.novel = Some(novel);
                if self.options.deterrent_in_training {
                    report.deterrent = self.deterrent.check(&report.results);
                }
            }
            Mode::Deterrent => {
                if is_foreground(&report.results) {
                    report.saved = self.persist(image, &report.results);
                }
                report.deterrent = self.deterrent.check(&report.results);
            }
        }
        report
    }

    fn persist(&mut self, image: &DynamicImage, results: &ResultSet) -> Option<PathBuf> {
        match self.recorder.save(image, results) {
            Ok(path) => Some(path),
            Err(e) => {
                error!("failed to save frame: {e}");
                None
            }
        }
    }
}

fn print_results(start: Instant, last: Instant, end: Instant, results: &ResultSet) {
    let inference = (end - start).as_secs_f64() * 1000.0;
    let fps = 1.0 / end.saturating_duration_since(last).as_secs_f64();
    println!("\nInference: {inference:.2} ms, FPS: {fps:.2} fps");
    print!("{results}");
}

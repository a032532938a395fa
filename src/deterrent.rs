use crate::recorder::{LogEvent, ResultsLog};
use crate::results::ResultSet;
use crate::sound::SoundPlayer;
use std::path::PathBuf;
use tracing::{error, info};

pub const DEFAULT_TARGET: &str = "fox squirrel, eastern fox squirrel, Sciurus niger";

/// Sounds an alarm when the target label is among the current results.
pub struct DeterrentTrigger {
    target: String,
    sound: PathBuf,
    player: Box<dyn SoundPlayer>,
    log: ResultsLog,
}

impl DeterrentTrigger {
    pub fn new(
        target: impl Into<String>,
        sound: PathBuf,
        player: Box<dyn SoundPlayer>,
        log: ResultsLog,
    ) -> Self {
        Self {
            target: target.into(),
            sound,
            player,
            log,
        }
    }

    pub fn should_fire(&self, current: &ResultSet) -> bool {
        current.contains(&self.target)
    }

    /// Returns whether the deterrent fired. Playback and log failures are
    /// reported but never stop the caller.
    pub fn check(&mut self, current: &ResultSet) -> bool {
        if !self.should_fire(current) {
            return false;
        }
        info!(label = %self.target, "target detected, sounding deterrent");
        let played = match self.player.play(&self.sound) {
            Ok(()) => true,
            Err(e) => {
                error!("failed to play deterrent: {e}");
                false
            }
        };
        if let Err(e) = self.log.append(LogEvent::Deterrent {
            label: &self.target,
            played,
        }) {
            error!("failed to log deterrent: {e}");
        }
        true
    }
}

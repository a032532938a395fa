use crate::error::PlaybackError;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use tracing::trace;

pub trait SoundPlayer {
    /// Starts playback of `sound`. Implementations need not wait for it to end.
    fn play(&mut self, sound: &Path) -> Result<(), PlaybackError>;
}

/// Plays sounds by spawning an external player such as `aplay` or `paplay`.
pub struct CommandPlayer {
    program: String,
    args: Vec<String>,
    running: Vec<Child>,
}

impl CommandPlayer {
    /// `command` is split on whitespace; the sound path is appended last.
    pub fn new(command: &str) -> Self {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next().unwrap_or_else(|| "aplay".to_string());
        Self {
            program,
            args: parts.collect(),
            running: Vec::new(),
        }
    }
}

impl SoundPlayer for CommandPlayer {
    fn play(&mut self, sound: &Path) -> Result<(), PlaybackError> {
        // reap finished players
        self.running
            .retain_mut(|child| !matches!(child.try_wait(), Ok(Some(_)) | Err(_)));
        trace!(player = %self.program, sound = %sound.display(), "spawning sound player");
        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(sound)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| PlaybackError::Spawn {
                player: self.program.clone(),
                source,
            })?;
        self.running.push(child);
        Ok(())
    }
}

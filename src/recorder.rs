use crate::error::PersistenceError;
use crate::results::ResultSet;
use image::DynamicImage;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tracing::debug;

pub const RESULTS_LOG: &str = "results.log";
const TAG_WIDTH: usize = 13;

#[derive(Serialize, Debug)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LogEvent<'a> {
    Frame { tag: &'a str, results: &'a ResultSet },
    Deterrent { label: &'a str, played: bool },
}

#[derive(Serialize)]
struct Record<'a> {
    timestamp: String,
    #[serde(flatten)]
    event: LogEvent<'a>,
}

/// Append-only JSON-lines log kept in the storage directory.
#[derive(Debug, Clone)]
pub struct ResultsLog {
    path: PathBuf,
}

impl ResultsLog {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            path: dir.join(RESULTS_LOG),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, event: LogEvent<'_>) -> Result<(), PersistenceError> {
        let record = Record {
            timestamp: chrono::Local::now().to_rfc3339(),
            event,
        };
        let mut line = serde_json::to_vec(&record)?;
        line.push(b'\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(&line)?;
        Ok(())
    }
}

/// Writes frames as `img-<tag>.<ext>` where the tag is a millisecond
/// timestamp from a monotonic clock anchored at wall-clock time on creation.
pub struct FrameRecorder {
    dir: PathBuf,
    extension: String,
    log: ResultsLog,
    base_ms: u64,
    epoch: Instant,
    last_tag: Option<u64>,
}

impl FrameRecorder {
    pub fn new(dir: &Path, extension: &str, log: ResultsLog) -> Self {
        let base_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        Self::with_base(dir, extension, log, base_ms)
    }

    pub fn with_base(dir: &Path, extension: &str, log: ResultsLog, base_ms: u64) -> Self {
        Self {
            dir: dir.to_path_buf(),
            extension: extension.trim_start_matches('.').to_string(),
            log,
            base_ms,
            epoch: Instant::now(),
            last_tag: None,
        }
    }

    /// Next tag, strictly greater than the previous one.
    pub fn next_tag(&mut self) -> String {
        let now = self.base_ms + self.epoch.elapsed().as_millis() as u64;
        let tag = match self.last_tag {
            Some(last) if now <= last => last + 1,
            _ => now,
        };
        self.last_tag = Some(tag);
        format!("{tag:0width$}", width = TAG_WIDTH)
    }

    pub fn save(
        &mut self,
        image: &DynamicImage,
        results: &ResultSet,
    ) -> Result<PathBuf, PersistenceError> {
        let tag = self.next_tag();
        let path = self.dir.join(format!("img-{tag}.{}", self.extension));
        image
            .save(&path)
            .map_err(|source| PersistenceError::Image {
                path: path.clone(),
                source,
            })?;
        println!("Frame saved as: {}", path.display());
        self.log.append(LogEvent::Frame {
            tag: &tag,
            results,
        })?;
        debug!(%tag, count = results.len(), "frame recorded");
        Ok(path)
    }
}

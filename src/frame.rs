use crate::error::SourceError;
use image::DynamicImage;
use nokhwa::{
    pixel_format::RgbFormat,
    utils::{CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType},
    Camera,
};
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// Delivers frames one at a time. `Ok(None)` means the stream has ended.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<DynamicImage>, SourceError>;
}

/// Picks a source for `id`: an image directory or file when the path
/// exists, otherwise a camera by index or device name.
pub fn open_source(id: &str) -> Result<Box<dyn FrameSource>, SourceError> {
    let path = Path::new(id);
    if path.is_dir() {
        return Ok(Box::new(ImageFiles::from_dir(path)?));
    }
    if path.is_file() {
        return Ok(Box::new(ImageFiles::new(vec![path.to_path_buf()])));
    }
    let index = match id.parse::<u32>() {
        Ok(i) => CameraIndex::Index(i),
        Err(_) => CameraIndex::String(id.to_string()),
    };
    Ok(Box::new(CameraSource::open(index)?))
}

pub struct CameraSource {
    camera: Camera,
}

impl CameraSource {
    pub fn open(index: CameraIndex) -> Result<Self, SourceError> {
        let mut cam = None;
        for (w, h) in [(1280, 720), (640, 480)] {
            for fmt in [FrameFormat::RAWRGB, FrameFormat::MJPEG, FrameFormat::YUYV] {
                let req = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(
                    CameraFormat::new_from(w, h, fmt, 30),
                ));
                if let Ok(c) = Camera::new(index.clone(), req) {
                    cam = Some(c);
                    break;
                }
            }
            if cam.is_some() {
                break;
            }
        }
        let mut camera = match cam {
            Some(c) => c,
            None => Camera::new(
                index,
                RequestedFormat::new::<RgbFormat>(RequestedFormatType::None),
            )?,
        };
        camera.open_stream()?;
        debug!(format = ?camera.camera_format(), "camera stream opened");
        Ok(Self { camera })
    }
}

impl FrameSource for CameraSource {
    fn next_frame(&mut self) -> Result<Option<DynamicImage>, SourceError> {
        let frame = self.camera.frame()?;
        let img = frame.decode_image::<RgbFormat>()?;
        Ok(Some(DynamicImage::ImageRgb8(img)))
    }
}

/// Replays image files in order, ending after the last one.
pub struct ImageFiles {
    frames: Vec<PathBuf>,
    index: usize,
}

impl ImageFiles {
    pub fn new(frames: Vec<PathBuf>) -> Self {
        Self { frames, index: 0 }
    }

    pub fn from_dir(dir: &Path) -> Result<Self, SourceError> {
        Ok(Self::new(load_frames(dir)?))
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl FrameSource for ImageFiles {
    fn next_frame(&mut self) -> Result<Option<DynamicImage>, SourceError> {
        let Some(path) = self.frames.get(self.index) else {
            return Ok(None);
        };
        self.index += 1;
        image::open(path)
            .map(Some)
            .map_err(|source| SourceError::Image {
                path: path.clone(),
                source,
            })
    }
}

fn load_frames(dir: &Path) -> Result<Vec<PathBuf>, SourceError> {
    let rd = std::fs::read_dir(dir).map_err(|source| SourceError::Directory {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut paths: Vec<PathBuf> = rd
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && image::ImageFormat::from_path(p).is_ok())
        .collect();
    paths.sort();
    if paths.is_empty() {
        error!("no frames found in {}", dir.display());
    }
    Ok(paths)
}

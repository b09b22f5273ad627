//! Still-image sequences on disk used as frame streams

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::frame::VideoFrame;
use crate::source::{FrameSink, FrameSource, StreamInfo};
use crate::{FrameError, SourceError};

const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// Decode a still image file into an RGB frame
pub fn load_image(path: impl AsRef<Path>) -> Result<VideoFrame, FrameError> {
    let img = image::open(path.as_ref())?.to_rgb8();
    Ok(VideoFrame::from_rgb_image(img, 0, 0))
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Frame source reading a directory of still images in file-name order
#[derive(Debug)]
pub struct ImageSequenceSource {
    dir: PathBuf,
    fps: f64,
    files: VecDeque<PathBuf>,
    index: u64,
}

impl ImageSequenceSource {
    /// Create a source over `dir` replayed at `fps`. Nothing is read until `open`.
    pub fn new(dir: impl Into<PathBuf>, fps: f64) -> Self {
        Self {
            dir: dir.into(),
            fps,
            files: VecDeque::new(),
            index: 0,
        }
    }
}

impl FrameSource for ImageSequenceSource {
    fn open(&mut self) -> Result<StreamInfo, SourceError> {
        let entries = fs::read_dir(&self.dir)
            .map_err(|e| SourceError::Open(format!("{}: {}", self.dir.display(), e)))?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file() && is_image(p))
            .collect();
        files.sort();

        let first = files
            .first()
            .ok_or_else(|| SourceError::Open(format!("{}: no image files", self.dir.display())))?;
        let (width, height) = image::image_dimensions(first)
            .map_err(|e| SourceError::Open(format!("{}: {}", first.display(), e)))?;

        info!(
            "Opened image sequence {}: {} frames, {}x{} @ {:.1} FPS",
            self.dir.display(),
            files.len(),
            width,
            height,
            self.fps
        );

        let info = StreamInfo {
            fps: self.fps,
            total_frames: files.len() as u64,
            width,
            height,
        };
        self.files = files.into();
        self.index = 0;
        Ok(info)
    }

    fn next_frame(&mut self) -> Result<Option<VideoFrame>, SourceError> {
        let Some(path) = self.files.pop_front() else {
            return Ok(None);
        };
        let index = self.index;
        self.index += 1;

        let mut frame = load_image(&path).map_err(|e| SourceError::Read {
            index,
            reason: format!("{}: {}", path.display(), e),
        })?;
        frame.sequence = index as u32;
        if self.fps > 0.0 {
            frame.timestamp_ns = (index as f64 / self.fps * 1e9) as u64;
        }
        debug!("Read frame {} from {}", index, path.display());
        Ok(Some(frame))
    }
}

/// Frame sink writing numbered PNG files into a directory
#[derive(Debug)]
pub struct ImageSequenceSink {
    dir: PathBuf,
    index: u64,
}

impl ImageSequenceSink {
    /// Create the output directory if needed
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self, SourceError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .map_err(|e| SourceError::Open(format!("{}: {}", dir.display(), e)))?;
        Ok(Self { dir, index: 0 })
    }

    /// Number of frames written so far
    pub fn frames_written(&self) -> u64 {
        self.index
    }
}

impl FrameSink for ImageSequenceSink {
    fn write_frame(&mut self, frame: &VideoFrame) -> Result<(), SourceError> {
        let index = self.index;
        let write_err = |reason: String| SourceError::Write { index, reason };

        let img = frame.to_rgb_image().map_err(|e| write_err(e.to_string()))?;
        let path = self.dir.join(format!("frame_{:06}.png", index));
        img.save(&path).map_err(|e| write_err(format!("{}: {}", path.display(), e)))?;

        self.index += 1;
        Ok(())
    }
}

//! Frame source and sink abstractions

use std::collections::VecDeque;

use crate::frame::VideoFrame;
use crate::SourceError;

/// Stream metadata reported by a frame source
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamInfo {
    /// Frames per second (0 when unknown)
    pub fps: f64,
    /// Total frame count reported by the container (0 when unknown)
    pub total_frames: u64,
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
}

/// Pull-based decoded frame stream
pub trait FrameSource {
    /// Open the stream and report its metadata. Called once, before any read.
    fn open(&mut self) -> Result<StreamInfo, SourceError>;

    /// Next decoded frame, `None` at end of stream
    fn next_frame(&mut self) -> Result<Option<VideoFrame>, SourceError>;
}

/// Ordered frame consumer
pub trait FrameSink {
    /// Append one frame to the output stream
    fn write_frame(&mut self, frame: &VideoFrame) -> Result<(), SourceError>;

    /// Flush the output stream once the last frame has been written
    fn finish(&mut self) -> Result<(), SourceError> {
        Ok(())
    }
}

/// Frame source backed by an in-memory frame list
#[derive(Debug, Clone, Default)]
pub struct MemoryFrameSource {
    frames: VecDeque<VideoFrame>,
    fps: f64,
}

impl MemoryFrameSource {
    /// Create a source replaying `frames` at `fps`
    pub fn new(frames: Vec<VideoFrame>, fps: f64) -> Self {
        Self {
            frames: frames.into(),
            fps,
        }
    }
}

impl FrameSource for MemoryFrameSource {
    fn open(&mut self) -> Result<StreamInfo, SourceError> {
        let (width, height) = self
            .frames
            .front()
            .map(|f| (f.width, f.height))
            .unwrap_or((0, 0));
        Ok(StreamInfo {
            fps: self.fps,
            total_frames: self.frames.len() as u64,
            width,
            height,
        })
    }

    fn next_frame(&mut self) -> Result<Option<VideoFrame>, SourceError> {
        Ok(self.frames.pop_front())
    }
}

/// Frame sink collecting frames in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryFrameSink {
    /// Frames in write order
    pub frames: Vec<VideoFrame>,
    /// Set once `finish` has been called
    pub finished: bool,
}

impl MemoryFrameSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FrameSink for MemoryFrameSink {
    fn write_frame(&mut self, frame: &VideoFrame) -> Result<(), SourceError> {
        self.frames.push(frame.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SourceError> {
        self.finished = true;
        Ok(())
    }
}

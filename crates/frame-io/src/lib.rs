//! Frame I/O for Pothole Analysis
//!
//! Provides the decoded pixel buffer handed to the analysis core and the
//! pull/push abstractions used to walk a video:
//! - `VideoFrame`: packed RGB buffer for one still image or video frame
//! - `FrameSource`: pull-based decoded frame stream with stream metadata
//! - `FrameSink`: ordered frame consumer used to rebuild the output video
//! - In-memory and image-sequence implementations of both

pub mod frame;
pub mod sequence;
pub mod source;

pub use frame::VideoFrame;
pub use sequence::{load_image, ImageSequenceSink, ImageSequenceSource};
pub use source::{FrameSink, FrameSource, MemoryFrameSink, MemoryFrameSource, StreamInfo};

use thiserror::Error;

/// Pixel buffer error types
#[derive(Error, Debug)]
pub enum FrameError {
    #[error("Invalid frame buffer: expected {expected} bytes for {width}x{height} RGB, got {actual}")]
    Decode {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("Empty frame ({width}x{height})")]
    Empty { width: u32, height: u32 },

    #[error("Image decode failed: {0}")]
    Image(#[from] image::ImageError),
}

/// Frame stream error types
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to open frame source: {0}")]
    Open(String),

    #[error("Failed to read frame {index}: {reason}")]
    Read { index: u64, reason: String },

    #[error("Failed to write frame {index}: {reason}")]
    Write { index: u64, reason: String },
}

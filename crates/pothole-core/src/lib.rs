//! Pothole Measurement Core
//!
//! Single-frame and route-level pothole analysis:
//! - Dominant contour extraction (blur, hysteresis edges, outer borders)
//! - Pixel-to-centimeter measurement behind a calibration strategy
//! - Photometric depth estimation
//! - Severity, impact, priority and repair cost scoring
//! - Annotated overlays for human review
//! - Strided video sampling and route aggregation
//!
//! The core holds no state between calls and performs no storage or network
//! I/O; frames come in through `frame_io` and records go out as plain values.

pub mod aggregate;
pub mod annotate;
pub mod calibration;
pub mod config;
pub mod contour;
pub mod depth;
pub mod impact;
pub mod measurement;
pub mod pipeline;
pub mod severity;
pub mod video;

pub use aggregate::{AggregateStatsCalculator, TimelineEntry, VideoAggregateStats};
pub use annotate::{AnnotatedFrame, AnnotationRenderer, AnnotationStyle, TextLabel};
pub use calibration::{
    CalibrationStrategy, FrameHeightCalibration, ImageMetadata, ReferenceObjectCalibration,
};
pub use config::{
    AnalyzerConfig, AnnotationConfig, CalibrationConfig, ContourConfig, CostModel, DepthConfig,
    VideoConfig,
};
pub use contour::{BoundingBox, Contour, ContourExtractor};
pub use depth::DepthEstimator;
pub use impact::{ImpactAssessment, ImpactScorer};
pub use measurement::{MeasurementCalculator, PlanarMeasurement, PotholeMeasurement};
pub use pipeline::{FrameAnalysis, FrameAnalysisPipeline, FrameOutcome};
pub use severity::{Severity, SeverityAssessment, SeverityScorer};
pub use video::{
    analyze_video, FrameDetection, FrameFault, RunStatus, SamplerState, VideoAnalysis,
    VideoFrameSampler, VideoMetadata,
};

use frame_io::{FrameError, SourceError};
use thiserror::Error;

/// Single-frame analysis error types
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Frame decode failed: {0}")]
    Decode(#[from] FrameError),

    #[error("No pothole contour found")]
    NoDetection,

    #[error("Contour encloses no pixels")]
    EmptyMask,

    #[error("Degenerate contour: {0}")]
    DegenerateContour(String),

    #[error("Calibration failed: {0}")]
    Calibration(String),

    #[error("Annotation failed: {0}")]
    Annotation(String),
}

/// Video analysis error types
#[derive(Error, Debug)]
pub enum VideoError {
    #[error("Frame source unavailable: {0}")]
    SourceUnavailable(#[source] SourceError),

    #[error("Frame sink failed: {0}")]
    Sink(#[source] SourceError),

    #[error("Frame stride must be at least 1")]
    InvalidStride,
}

/// Round to two decimal places
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

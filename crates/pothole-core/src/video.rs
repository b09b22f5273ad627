//! Strided video sampling
//!
//! Walks a frame source in order, analyzes every Nth frame and forwards every
//! frame (annotated when something was found) to a sink so the output video
//! keeps the input's frame count and order.

use std::sync::atomic::{AtomicBool, Ordering};

use frame_io::{FrameSink, FrameSource, StreamInfo, VideoFrame};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::aggregate::{AggregateStatsCalculator, VideoAggregateStats};
use crate::annotate::AnnotationStyle;
use crate::impact::ImpactAssessment;
use crate::measurement::PotholeMeasurement;
use crate::pipeline::{FrameAnalysis, FrameAnalysisPipeline, FrameOutcome};
use crate::severity::SeverityAssessment;
use crate::{round2, VideoError};

/// Sampler lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerState {
    Idle,
    Sampling,
    Done,
    Failed,
    Cancelled,
}

/// Pothole found on one sampled frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameDetection {
    pub frame_number: u64,
    pub timestamp_seconds: f64,
    pub measurement: PotholeMeasurement,
    pub severity: SeverityAssessment,
    pub impact: ImpactAssessment,
}

impl FrameDetection {
    pub fn from_analysis(frame_number: u64, timestamp_seconds: f64, analysis: &FrameAnalysis) -> Self {
        Self {
            frame_number,
            timestamp_seconds,
            measurement: analysis.measurement,
            severity: analysis.severity,
            impact: analysis.impact,
        }
    }
}

/// Sampled frame whose analysis failed; the frame was forwarded unannotated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameFault {
    pub frame_number: u64,
    pub timestamp_seconds: f64,
    pub reason: String,
}

/// Stream properties of an analyzed video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub fps: f64,
    pub total_frames: u64,
    pub duration_seconds: f64,
    pub frames_analyzed: u64,
    pub width: u32,
    pub height: u32,
}

/// How a run that did not fail ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunStatus {
    Completed { faulted_frames: usize },
    Cancelled { at_frame: u64 },
}

/// Result of a video run
#[derive(Debug, Clone, Serialize)]
pub struct VideoAnalysis {
    pub metadata: VideoMetadata,
    /// Detections in frame order
    pub detections: Vec<FrameDetection>,
    pub faults: Vec<FrameFault>,
    pub aggregate: VideoAggregateStats,
    /// Frames forwarded without analysis (off-stride)
    pub frames_passed_through: u64,
    pub status: RunStatus,
    /// Raw first detection frame, else the first frame of the video
    #[serde(skip)]
    pub thumbnail: Option<VideoFrame>,
}

/// Seconds since the start of the stream, 0 when fps is unknown
pub fn frame_timestamp(frame_number: u64, fps: f64) -> f64 {
    if fps > 0.0 {
        round2(frame_number as f64 / fps)
    } else {
        0.0
    }
}

/// Percentage of the stream reached at `frame_number`, clamped to 100
pub fn progress_percent(frame_number: u64, total_frames: u64) -> u8 {
    if total_frames == 0 {
        return 0;
    }
    ((frame_number as f64 / total_frames as f64) * 100.0).floor().min(100.0) as u8
}

/// Drives the frame pipeline over a video
pub struct VideoFrameSampler<'a> {
    pipeline: &'a FrameAnalysisPipeline,
    stride: u32,
    cancel: Option<&'a AtomicBool>,
    state: SamplerState,
}

impl<'a> VideoFrameSampler<'a> {
    pub fn new(pipeline: &'a FrameAnalysisPipeline, stride: u32) -> Result<Self, VideoError> {
        if stride == 0 {
            return Err(VideoError::InvalidStride);
        }
        Ok(Self {
            pipeline,
            stride,
            cancel: None,
            state: SamplerState::Idle,
        })
    }

    /// Check `flag` before each frame and stop early once it is set
    pub fn with_cancel_flag(mut self, flag: &'a AtomicBool) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn state(&self) -> SamplerState {
        self.state
    }

    pub fn is_sampled(&self, frame_number: u64) -> bool {
        frame_number % self.stride as u64 == 0
    }

    /// Run to completion. Blocks; `on_progress` is called after each sampled frame.
    pub fn run<S, K, F>(
        &mut self,
        source: &mut S,
        sink: &mut K,
        mut on_progress: F,
    ) -> Result<VideoAnalysis, VideoError>
    where
        S: FrameSource + ?Sized,
        K: FrameSink + ?Sized,
        F: FnMut(u8),
    {
        let info = match source.open() {
            Ok(info) => info,
            Err(e) => {
                self.state = SamplerState::Failed;
                return Err(VideoError::SourceUnavailable(e));
            }
        };
        info!(
            "Sampling video: {}x{} @ {:.1} FPS, {} frames, stride {}",
            info.width, info.height, info.fps, info.total_frames, self.stride
        );
        self.state = SamplerState::Sampling;

        let mut detections = Vec::new();
        let mut faults = Vec::new();
        let mut frames_analyzed = 0u64;
        let mut frames_passed_through = 0u64;
        let mut last_progress = 0u8;
        let mut first_frame: Option<VideoFrame> = None;
        let mut first_detection_frame: Option<VideoFrame> = None;
        let mut cancelled_at = None;
        let mut frame_number = 0u64;

        loop {
            if self.cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                info!("Video analysis cancelled at frame {}", frame_number);
                cancelled_at = Some(frame_number);
                break;
            }

            let frame = match source.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(e) => {
                    warn!("Frame source failed at frame {}: {}; ending stream", frame_number, e);
                    faults.push(FrameFault {
                        frame_number,
                        timestamp_seconds: frame_timestamp(frame_number, info.fps),
                        reason: e.to_string(),
                    });
                    break;
                }
            };

            if frame_number == 0 {
                first_frame = Some(frame.clone());
            }
            let timestamp_seconds = frame_timestamp(frame_number, info.fps);

            let written = if self.is_sampled(frame_number) {
                frames_analyzed += 1;
                let written = match self.pipeline.analyze_frame(&frame, AnnotationStyle::Compact) {
                    Ok(FrameOutcome::Detected(analysis)) => {
                        detections.push(FrameDetection::from_analysis(
                            frame_number,
                            timestamp_seconds,
                            &analysis,
                        ));
                        if first_detection_frame.is_none() {
                            first_detection_frame = Some(frame.clone());
                        }
                        match analysis.annotated {
                            Some(annotated) => sink.write_frame(&annotated.frame),
                            None => sink.write_frame(&frame),
                        }
                    }
                    Ok(FrameOutcome::NoDetection) => sink.write_frame(&frame),
                    Err(e) => {
                        warn!("Error analyzing frame {}: {}", frame_number, e);
                        faults.push(FrameFault {
                            frame_number,
                            timestamp_seconds,
                            reason: e.to_string(),
                        });
                        sink.write_frame(&frame)
                    }
                };

                last_progress = last_progress.max(progress_percent(frame_number, info.total_frames));
                on_progress(last_progress);
                written
            } else {
                frames_passed_through += 1;
                sink.write_frame(&frame)
            };

            if let Err(e) = written {
                self.state = SamplerState::Failed;
                return Err(VideoError::Sink(e));
            }
            frame_number += 1;
        }

        if let Err(e) = sink.finish() {
            self.state = SamplerState::Failed;
            return Err(VideoError::Sink(e));
        }

        let status = match cancelled_at {
            Some(at_frame) => {
                self.state = SamplerState::Cancelled;
                RunStatus::Cancelled { at_frame }
            }
            None => {
                self.state = SamplerState::Done;
                RunStatus::Completed {
                    faulted_frames: faults.len(),
                }
            }
        };

        let aggregate = AggregateStatsCalculator::compute(&detections, self.pipeline.cost_model());
        let metadata = build_metadata(&info, frame_number, frames_analyzed);

        info!(
            "Video analysis finished: {} frames read, {} analyzed, {} potholes, {} faults",
            frame_number,
            frames_analyzed,
            detections.len(),
            faults.len()
        );
        debug!("Run status: {:?}", status);

        Ok(VideoAnalysis {
            metadata,
            detections,
            faults,
            aggregate,
            frames_passed_through,
            status,
            thumbnail: first_detection_frame.or(first_frame),
        })
    }
}

fn build_metadata(info: &StreamInfo, frames_read: u64, frames_analyzed: u64) -> VideoMetadata {
    // Some containers do not report a frame count
    let total_frames = if info.total_frames > 0 {
        info.total_frames
    } else {
        frames_read
    };
    let duration_seconds = if info.fps > 0.0 {
        round2(total_frames as f64 / info.fps)
    } else {
        0.0
    };
    VideoMetadata {
        fps: info.fps,
        total_frames,
        duration_seconds,
        frames_analyzed,
        width: info.width,
        height: info.height,
    }
}

/// Analyze a whole video with a fresh sampler
pub fn analyze_video<S, K, F>(
    pipeline: &FrameAnalysisPipeline,
    source: &mut S,
    sink: &mut K,
    stride: u32,
    on_progress: F,
) -> Result<VideoAnalysis, VideoError>
where
    S: FrameSource + ?Sized,
    K: FrameSink + ?Sized,
    F: FnMut(u8),
{
    VideoFrameSampler::new(pipeline, stride)?.run(source, sink, on_progress)
}

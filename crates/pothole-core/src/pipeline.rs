//! Single-frame analysis pipeline

use frame_io::VideoFrame;
use serde::Serialize;
use tracing::debug;

use crate::annotate::{AnnotatedFrame, AnnotationRenderer, AnnotationStyle};
use crate::calibration::{resolve_pixels_per_cm, CalibrationStrategy, ImageMetadata};
use crate::config::{AnalyzerConfig, CostModel};
use crate::contour::ContourExtractor;
use crate::depth::DepthEstimator;
use crate::impact::{ImpactAssessment, ImpactScorer};
use crate::measurement::{MeasurementCalculator, PotholeMeasurement};
use crate::severity::{SeverityAssessment, SeverityScorer};
use crate::AnalysisError;

/// Complete result for one frame with a detected pothole
#[derive(Debug, Clone, Serialize)]
pub struct FrameAnalysis {
    pub measurement: PotholeMeasurement,
    pub severity: SeverityAssessment,
    pub impact: ImpactAssessment,
    /// Overlay, when annotation is enabled
    #[serde(skip)]
    pub annotated: Option<AnnotatedFrame>,
}

/// Result of analyzing one frame
#[derive(Debug, Clone)]
pub enum FrameOutcome {
    Detected(Box<FrameAnalysis>),
    /// No contour in the frame; nothing to report
    NoDetection,
}

/// Contour -> measurement/depth -> severity -> impact -> overlay.
///
/// Holds configuration only, so a single instance can analyze independent
/// frames from several threads.
pub struct FrameAnalysisPipeline {
    extractor: ContourExtractor,
    depth: DepthEstimator,
    calibration: Box<dyn CalibrationStrategy>,
    cost: CostModel,
    renderer: Option<AnnotationRenderer>,
}

impl FrameAnalysisPipeline {
    /// Build the pipeline from configuration
    pub fn new(config: &AnalyzerConfig) -> Result<Self, AnalysisError> {
        let renderer = if config.annotation.enabled {
            Some(AnnotationRenderer::new(&config.annotation)?)
        } else {
            None
        };
        Ok(Self {
            extractor: ContourExtractor::new(config.contour.clone()),
            depth: DepthEstimator::new(config.depth.clone()),
            calibration: config.calibration.strategy(),
            cost: config.cost,
            renderer,
        })
    }

    /// Replace the calibration strategy
    pub fn with_calibration(mut self, strategy: Box<dyn CalibrationStrategy>) -> Self {
        self.calibration = strategy;
        self
    }

    /// Cost model used for repair estimates
    pub fn cost_model(&self) -> &CostModel {
        &self.cost
    }

    /// Analyze one frame
    pub fn analyze_frame(
        &self,
        frame: &VideoFrame,
        style: AnnotationStyle,
    ) -> Result<FrameOutcome, AnalysisError> {
        let gray = frame.to_gray_image()?;

        let Some(contour) = self.extractor.extract(&gray) else {
            debug!("Frame {}: no contour", frame.sequence);
            return Ok(FrameOutcome::NoDetection);
        };

        let meta = ImageMetadata {
            width: frame.width,
            height: frame.height,
        };
        let pixels_per_cm = resolve_pixels_per_cm(self.calibration.as_ref(), &meta)?;

        let planar = MeasurementCalculator::measure(&contour, pixels_per_cm);
        let depth_cm = self.depth.estimate(&gray, &contour)?;
        let measurement = PotholeMeasurement::new(planar, depth_cm);

        let severity = SeverityScorer::assess(&measurement)?;
        let impact = ImpactScorer::assess(&measurement, &severity, &self.cost);

        debug!(
            "Frame {}: {} points, {:.2} px/cm, area {} cm2, depth {} cm, {} ({})",
            frame.sequence,
            contour.len(),
            pixels_per_cm,
            measurement.area_cm2,
            measurement.depth_cm,
            severity.severity,
            severity.score
        );

        let annotated = match &self.renderer {
            Some(renderer) => Some(renderer.render(
                frame,
                &contour,
                &measurement,
                severity.severity,
                style,
            )?),
            None => None,
        };

        Ok(FrameOutcome::Detected(Box::new(FrameAnalysis {
            measurement,
            severity,
            impact,
            annotated,
        })))
    }

    /// Analyze a still image; no contour is an error
    pub fn analyze_image(&self, frame: &VideoFrame) -> Result<FrameAnalysis, AnalysisError> {
        match self.analyze_frame(frame, AnnotationStyle::Full)? {
            FrameOutcome::Detected(analysis) => Ok(*analysis),
            FrameOutcome::NoDetection => Err(AnalysisError::NoDetection),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::ReferenceObjectCalibration;
    use crate::config::AnnotationConfig;

    fn pothole_frame() -> VideoFrame {
        let (w, h) = (240u32, 200u32);
        let mut data = Vec::with_capacity((w * h * 3) as usize);
        for y in 0..h {
            for x in 0..w {
                let dx = (x as f32 - 120.0) / 50.0;
                let dy = (y as f32 - 100.0) / 35.0;
                let v = if dx * dx + dy * dy <= 1.0 { 50 } else { 190 };
                data.extend_from_slice(&[v, v, v]);
            }
        }
        VideoFrame::new(data, w, h, 0, 0)
    }

    #[test]
    fn test_uniform_frame_is_no_detection() {
        let pipeline = FrameAnalysisPipeline::new(&AnalyzerConfig::default()).unwrap();
        let frame = VideoFrame::filled(80, 60, [120, 120, 120]);
        assert!(matches!(
            pipeline.analyze_frame(&frame, AnnotationStyle::Full).unwrap(),
            FrameOutcome::NoDetection
        ));
        assert!(matches!(
            pipeline.analyze_image(&frame),
            Err(AnalysisError::NoDetection)
        ));
    }

    #[test]
    fn test_bad_buffer_is_decode_error() {
        let pipeline = FrameAnalysisPipeline::new(&AnalyzerConfig::default()).unwrap();
        let frame = VideoFrame::new(vec![0; 7], 4, 4, 0, 0);
        assert!(matches!(
            pipeline.analyze_image(&frame),
            Err(AnalysisError::Decode(_))
        ));
    }

    #[test]
    fn test_detects_dark_ellipse() {
        let pipeline = FrameAnalysisPipeline::new(&AnalyzerConfig::default()).unwrap();
        let analysis = pipeline.analyze_image(&pothole_frame()).unwrap();

        // 200 px frame height -> 2 px/cm; ellipse is ~101x71 px
        let m = analysis.measurement;
        assert!((m.width_cm - 50.5).abs() <= 1.5, "width {}", m.width_cm);
        assert!((m.height_cm - 35.5).abs() <= 1.5, "height {}", m.height_cm);
        assert!(m.depth_cm > 5.0 && m.depth_cm < 15.0, "depth {}", m.depth_cm);
        assert!(analysis.impact.estimated_cost >= 50.0);
        assert!(analysis.annotated.is_some());
    }

    #[test]
    fn test_default_overlay_contains_text() {
        let pipeline = FrameAnalysisPipeline::new(&AnalyzerConfig::default()).unwrap();
        let analysis = pipeline.analyze_image(&pothole_frame()).unwrap();
        let annotated = analysis.annotated.unwrap();

        assert_eq!(annotated.labels.len(), 4);
        let frame = &annotated.frame;
        let text_pixels = (0..frame.height)
            .flat_map(|y| (0..frame.width).map(move |x| (x, y)))
            .filter(|&(x, y)| {
                matches!(frame.get_pixel(x, y), Some([r, g, b]) if r > 150 && g > 150 && b < 100)
            })
            .count();
        assert!(text_pixels > 20, "only {} text pixels", text_pixels);
    }

    #[test]
    fn test_repeat_analysis_is_identical() {
        let pipeline = FrameAnalysisPipeline::new(&AnalyzerConfig::default()).unwrap();
        let frame = pothole_frame();
        let a = pipeline.analyze_image(&frame).unwrap();
        let b = pipeline.analyze_image(&frame).unwrap();
        assert_eq!(a.measurement, b.measurement);
        assert_eq!(a.severity, b.severity);
        assert_eq!(a.impact, b.impact);
    }

    #[test]
    fn test_annotation_does_not_change_scores() {
        let frame = pothole_frame();
        let with = FrameAnalysisPipeline::new(&AnalyzerConfig::default())
            .unwrap()
            .analyze_image(&frame)
            .unwrap();
        let config = AnalyzerConfig {
            annotation: AnnotationConfig {
                enabled: false,
                ..Default::default()
            },
            ..Default::default()
        };
        let without = FrameAnalysisPipeline::new(&config)
            .unwrap()
            .analyze_image(&frame)
            .unwrap();

        assert!(without.annotated.is_none());
        assert_eq!(with.measurement, without.measurement);
        assert_eq!(with.severity, without.severity);
        assert_eq!(with.impact, without.impact);
    }

    #[test]
    fn test_calibration_strategy_is_swappable() {
        let frame = pothole_frame();
        let default = FrameAnalysisPipeline::new(&AnalyzerConfig::default())
            .unwrap()
            .analyze_image(&frame)
            .unwrap();
        // 4 px/cm instead of 2 px/cm halves linear sizes
        let finer = FrameAnalysisPipeline::new(&AnalyzerConfig::default())
            .unwrap()
            .with_calibration(Box::new(ReferenceObjectCalibration {
                object_size_cm: 10.0,
                object_size_px: 40.0,
            }))
            .analyze_image(&frame)
            .unwrap();

        assert!((finer.measurement.width_cm * 2.0 - default.measurement.width_cm).abs() < 0.02);
        assert_eq!(finer.measurement.depth_cm, default.measurement.depth_cm);
    }

    #[test]
    fn test_pipeline_is_thread_safe() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FrameAnalysisPipeline>();
    }
}

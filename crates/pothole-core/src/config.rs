//! Analyzer configuration

use serde::{Deserialize, Serialize};

use crate::calibration::{CalibrationStrategy, FrameHeightCalibration, ReferenceObjectCalibration};

/// Contour extraction parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContourConfig {
    /// Hysteresis low threshold for edge detection
    pub canny_low: f32,

    /// Hysteresis high threshold for edge detection
    pub canny_high: f32,

    /// Apply the 5x5 smoothing pass before edge detection
    pub blur: bool,
}

impl Default for ContourConfig {
    fn default() -> Self {
        Self {
            canny_low: 50.0,
            canny_high: 150.0,
            blur: true,
        }
    }
}

/// Pixel-to-centimeter calibration selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum CalibrationConfig {
    /// Frame height spans `reference_extent_cm` of road
    FrameHeight { reference_extent_cm: f64 },

    /// Reference object of known size measured in the frame
    ReferenceObject { object_size_cm: f64, object_size_px: f64 },
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self::FrameHeight {
            reference_extent_cm: 100.0,
        }
    }
}

impl CalibrationConfig {
    /// Build the calibration strategy this config describes
    pub fn strategy(&self) -> Box<dyn CalibrationStrategy> {
        match *self {
            Self::FrameHeight { reference_extent_cm } => {
                Box::new(FrameHeightCalibration { reference_extent_cm })
            }
            Self::ReferenceObject {
                object_size_cm,
                object_size_px,
            } => Box::new(ReferenceObjectCalibration {
                object_size_cm,
                object_size_px,
            }),
        }
    }
}

/// Depth estimation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DepthConfig {
    /// Depth assigned to a fully dark pothole (cm)
    pub max_depth_cm: f64,
}

impl Default for DepthConfig {
    fn default() -> Self {
        Self { max_depth_cm: 15.0 }
    }
}

/// Repair cost coefficients
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostModel {
    /// Fixed cost per repair
    pub base_cost: f64,

    /// Cost per square centimeter of surface
    pub cost_per_cm2: f64,

    /// Cost per centimeter of depth
    pub cost_per_cm_depth: f64,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            base_cost: 50.0,
            cost_per_cm2: 0.5,
            cost_per_cm_depth: 10.0,
        }
    }
}

/// Overlay rendering options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationConfig {
    /// Render the annotated overlay at all
    pub enabled: bool,

    /// TrueType/OpenType font used to burn text into the overlay
    pub font_path: Option<String>,

    /// Text height in pixels
    pub text_scale: f32,
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            font_path: None,
            text_scale: 18.0,
        }
    }
}

/// Video sampling parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Analyze every Nth frame
    pub frame_stride: u32,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self { frame_stride: 5 }
    }
}

/// Complete analyzer configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub contour: ContourConfig,
    pub calibration: CalibrationConfig,
    pub depth: DepthConfig,
    pub cost: CostModel,
    pub annotation: AnnotationConfig,
    pub video: VideoConfig,
}

impl AnalyzerConfig {
    /// Batch survey config (sparser sampling, no overlays)
    pub fn survey() -> Self {
        Self {
            annotation: AnnotationConfig {
                enabled: false,
                ..Default::default()
            },
            video: VideoConfig { frame_stride: 15 },
            ..Default::default()
        }
    }

    /// Inspection config (every frame analyzed)
    pub fn inspection() -> Self {
        Self {
            video: VideoConfig { frame_stride: 1 },
            ..Default::default()
        }
    }
}

//! Pixel-to-centimeter calibration strategies

use std::fmt;

use crate::AnalysisError;

/// Image properties a calibration strategy may depend on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageMetadata {
    pub width: u32,
    pub height: u32,
}

/// Maps image metadata to a pixels-per-centimeter scale
pub trait CalibrationStrategy: fmt::Debug + Send + Sync {
    fn pixels_per_cm(&self, meta: &ImageMetadata) -> f64;
}

/// Assumes the frame height covers a fixed extent of road surface.
///
/// This is a heuristic, not a measured calibration: the true scale depends on
/// camera height, tilt and focal length, so absolute sizes are only
/// comparable between photos taken from a similar distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameHeightCalibration {
    /// Road extent spanned by the frame height (cm)
    pub reference_extent_cm: f64,
}

impl Default for FrameHeightCalibration {
    fn default() -> Self {
        Self {
            reference_extent_cm: 100.0,
        }
    }
}

impl CalibrationStrategy for FrameHeightCalibration {
    fn pixels_per_cm(&self, meta: &ImageMetadata) -> f64 {
        meta.height as f64 / self.reference_extent_cm
    }
}

/// Scale measured from a reference object of known size in the scene
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceObjectCalibration {
    /// Physical size of the reference object (cm)
    pub object_size_cm: f64,
    /// Measured size of the reference object (pixels)
    pub object_size_px: f64,
}

impl CalibrationStrategy for ReferenceObjectCalibration {
    fn pixels_per_cm(&self, _meta: &ImageMetadata) -> f64 {
        self.object_size_px / self.object_size_cm
    }
}

/// Evaluate a strategy and reject unusable scales
pub fn resolve_pixels_per_cm(
    strategy: &dyn CalibrationStrategy,
    meta: &ImageMetadata,
) -> Result<f64, AnalysisError> {
    let scale = strategy.pixels_per_cm(meta);
    if scale.is_finite() && scale > 0.0 {
        Ok(scale)
    } else {
        Err(AnalysisError::Calibration(format!(
            "{:?} produced {} px/cm for {}x{}",
            strategy, scale, meta.width, meta.height
        )))
    }
}

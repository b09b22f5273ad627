//! Pixel geometry to physical units

use serde::{Deserialize, Serialize};

use crate::contour::{BoundingBox, Contour};
use crate::round2;

/// Surface measurements of a contour, in centimeters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanarMeasurement {
    pub width_cm: f64,
    pub height_cm: f64,
    pub area_cm2: f64,
    pub perimeter_cm: f64,
    /// Bounding box in source pixels
    pub bbox: BoundingBox,
}

/// Physical pothole measurement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PotholeMeasurement {
    pub width_cm: f64,
    pub height_cm: f64,
    pub area_cm2: f64,
    pub perimeter_cm: f64,
    pub depth_cm: f64,
    /// Bounding box in source pixels
    pub bbox: BoundingBox,
}

impl PotholeMeasurement {
    /// Combine surface measurements with a depth estimate
    pub fn new(planar: PlanarMeasurement, depth_cm: f64) -> Self {
        Self {
            width_cm: planar.width_cm,
            height_cm: planar.height_cm,
            area_cm2: planar.area_cm2,
            perimeter_cm: planar.perimeter_cm,
            depth_cm,
            bbox: planar.bbox,
        }
    }

    /// Shape regularity `4*pi*area / perimeter^2`; 1.0 for a circle.
    /// `None` when the perimeter is zero.
    pub fn circularity(&self) -> Option<f64> {
        if self.perimeter_cm > 0.0 {
            Some(4.0 * std::f64::consts::PI * self.area_cm2 / self.perimeter_cm.powi(2))
        } else {
            None
        }
    }
}

/// Converts contour geometry to centimeters
pub struct MeasurementCalculator;

impl MeasurementCalculator {
    /// Measure `contour` at the given scale. Outputs are rounded to 0.01.
    pub fn measure(contour: &Contour, pixels_per_cm: f64) -> PlanarMeasurement {
        let bbox = contour.bounding_box();
        let area_px = contour.area();
        let perimeter_px = contour.perimeter();

        PlanarMeasurement {
            width_cm: round2(bbox.width as f64 / pixels_per_cm),
            height_cm: round2(bbox.height as f64 / pixels_per_cm),
            area_cm2: round2(area_px / pixels_per_cm.powi(2)),
            perimeter_cm: round2(perimeter_px / pixels_per_cm),
            bbox,
        }
    }
}

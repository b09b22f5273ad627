//! Photometric depth estimation
//!
//! Darker pothole interiors are treated as deeper: the mean intensity inside
//! the contour maps linearly from 0 cm (white) to `max_depth_cm` (black).

use image::{GrayImage, Luma};
use imageproc::drawing::{draw_line_segment_mut, draw_polygon_mut};
use imageproc::point::Point;
use tracing::debug;

use crate::config::DepthConfig;
use crate::contour::Contour;
use crate::{round2, AnalysisError};

/// Depth estimator from masked intensity
#[derive(Debug, Clone, Default)]
pub struct DepthEstimator {
    config: DepthConfig,
}

impl DepthEstimator {
    pub fn new(config: DepthConfig) -> Self {
        Self { config }
    }

    /// Filled interior mask of `contour`, boundary included
    pub fn mask(width: u32, height: u32, contour: &Contour) -> GrayImage {
        let mut mask = GrayImage::new(width, height);
        let on = Luma([255u8]);

        let mut poly: Vec<Point<i32>> = contour.points.clone();
        poly.dedup();
        while poly.len() > 1 && poly.first() == poly.last() {
            poly.pop();
        }

        if poly.len() >= 3 {
            draw_polygon_mut(&mut mask, &poly, on);
        }
        if poly.len() >= 2 {
            for (i, a) in poly.iter().enumerate() {
                let b = poly[(i + 1) % poly.len()];
                draw_line_segment_mut(
                    &mut mask,
                    (a.x as f32, a.y as f32),
                    (b.x as f32, b.y as f32),
                    on,
                );
            }
        }
        for p in &poly {
            if p.x >= 0 && p.y >= 0 && (p.x as u32) < width && (p.y as u32) < height {
                mask.put_pixel(p.x as u32, p.y as u32, on);
            }
        }
        mask
    }

    /// Mean intensity of `gray` over the contour mask
    pub fn mean_intensity(gray: &GrayImage, contour: &Contour) -> Result<f64, AnalysisError> {
        let mask = Self::mask(gray.width(), gray.height(), contour);

        let (sum, count) = mask
            .enumerate_pixels()
            .filter(|(_, _, m)| m[0] > 0)
            .fold((0u64, 0u64), |(sum, count), (x, y, _)| {
                (sum + gray.get_pixel(x, y)[0] as u64, count + 1)
            });

        if count == 0 {
            return Err(AnalysisError::EmptyMask);
        }
        Ok(sum as f64 / count as f64)
    }

    /// Estimated depth in centimeters, rounded to 0.01
    pub fn estimate(&self, gray: &GrayImage, contour: &Contour) -> Result<f64, AnalysisError> {
        let mean = Self::mean_intensity(gray, contour)?;
        let depth = ((255.0 - mean) / 255.0) * self.config.max_depth_cm;
        debug!("Mean masked intensity {:.1} -> depth {:.2} cm", mean, depth);
        Ok(round2(depth))
    }
}

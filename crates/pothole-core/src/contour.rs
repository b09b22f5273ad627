//! Dominant contour extraction

use std::cmp::Ordering;

use image::GrayImage;
use imageproc::contours::{self, BorderType};
use imageproc::point::Point;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ContourConfig;

/// Normalized 5-tap binomial kernel; applied separably it is the 5x5 Gaussian
const BLUR_KERNEL_5: [f32; 5] = [1.0 / 16.0, 4.0 / 16.0, 6.0 / 16.0, 4.0 / 16.0, 1.0 / 16.0];

/// Axis-aligned bounding rectangle in pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Closed boundary curve of a detected region
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contour {
    pub points: Vec<Point<i32>>,
}

impl Contour {
    pub fn new(points: Vec<Point<i32>>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Enclosed area in square pixels (shoelace formula)
    pub fn area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let twice: i64 = (0..n)
            .map(|i| {
                let a = self.points[i];
                let b = self.points[(i + 1) % n];
                a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64
            })
            .sum();
        twice.abs() as f64 / 2.0
    }

    /// Length of the closed curve in pixels, closing edge included
    pub fn perimeter(&self) -> f64 {
        let n = self.points.len();
        if n < 2 {
            return 0.0;
        }
        (0..n)
            .map(|i| {
                let a = self.points[i];
                let b = self.points[(i + 1) % n];
                ((b.x - a.x) as f64).hypot((b.y - a.y) as f64)
            })
            .sum()
    }

    /// Inclusive bounding rectangle (a single point is 1x1)
    pub fn bounding_box(&self) -> BoundingBox {
        let Some(first) = self.points.first() else {
            return BoundingBox::default();
        };
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &self.points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        BoundingBox {
            x: min_x,
            y: min_y,
            width: (max_x - min_x + 1) as u32,
            height: (max_y - min_y + 1) as u32,
        }
    }
}

/// Finds the boundary curve believed to be the pothole
#[derive(Debug, Clone, Default)]
pub struct ContourExtractor {
    config: ContourConfig,
}

impl ContourExtractor {
    pub fn new(config: ContourConfig) -> Self {
        Self { config }
    }

    /// Hysteresis edge map of an intensity image
    pub fn edges(&self, gray: &GrayImage) -> GrayImage {
        if self.config.blur {
            let blurred = imageproc::filter::separable_filter_equal(gray, &BLUR_KERNEL_5);
            imageproc::edges::canny(&blurred, self.config.canny_low, self.config.canny_high)
        } else {
            imageproc::edges::canny(gray, self.config.canny_low, self.config.canny_high)
        }
    }

    /// Outermost boundary curves, largest enclosed area first.
    /// Equal areas keep discovery order.
    pub fn candidates(&self, gray: &GrayImage) -> Vec<Contour> {
        let edges = self.edges(gray);

        let mut scored: Vec<(f64, Contour)> = contours::find_contours::<i32>(&edges)
            .into_iter()
            .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
            .map(|c| {
                let contour = Contour::new(c.points);
                (contour.area(), contour)
            })
            .collect();

        // sort_by is stable
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

        debug!("Found {} outer contours", scored.len());
        scored.into_iter().map(|(_, c)| c).collect()
    }

    /// Dominant contour, or `None` when the image has no edges
    pub fn extract(&self, gray: &GrayImage) -> Option<Contour> {
        self.candidates(gray).into_iter().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn pts(coords: &[(i32, i32)]) -> Contour {
        Contour::new(coords.iter().map(|&(x, y)| Point::new(x, y)).collect())
    }

    /// Ellipse with a circular bump on its right flank, dark on light
    fn blob_image() -> (GrayImage, (i32, i32, i32, i32)) {
        let mut img = GrayImage::from_pixel(200, 160, Luma([200]));
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (i32::MAX, i32::MAX, i32::MIN, i32::MIN);
        for y in 0..160 {
            for x in 0..200 {
                let (fx, fy) = (x as f32, y as f32);
                let ellipse = ((fx - 90.0) / 40.0).powi(2) + ((fy - 80.0) / 28.0).powi(2) <= 1.0;
                let bump = (fx - 125.0).powi(2) + (fy - 95.0).powi(2) <= 18.0f32.powi(2);
                if ellipse || bump {
                    img.put_pixel(x, y, Luma([40]));
                    min_x = min_x.min(x as i32);
                    min_y = min_y.min(y as i32);
                    max_x = max_x.max(x as i32);
                    max_y = max_y.max(y as i32);
                }
            }
        }
        (img, (min_x, min_y, max_x, max_y))
    }

    #[test]
    fn test_square_area_and_perimeter() {
        let square = pts(&[(0, 0), (10, 0), (10, 10), (0, 10)]);
        assert_eq!(square.area(), 100.0);
        assert_eq!(square.perimeter(), 40.0);
        assert_eq!(
            square.bounding_box(),
            BoundingBox { x: 0, y: 0, width: 11, height: 11 }
        );
    }

    #[test]
    fn test_area_independent_of_orientation() {
        let cw = pts(&[(0, 0), (0, 4), (3, 4), (3, 0)]);
        let ccw = pts(&[(0, 0), (3, 0), (3, 4), (0, 4)]);
        assert_eq!(cw.area(), ccw.area());
        assert_eq!(cw.area(), 12.0);
    }

    #[test]
    fn test_degenerate_contours() {
        let single = pts(&[(5, 7)]);
        assert_eq!(single.area(), 0.0);
        assert_eq!(single.perimeter(), 0.0);
        assert_eq!(single.bounding_box(), BoundingBox { x: 5, y: 7, width: 1, height: 1 });

        let segment = pts(&[(0, 0), (3, 4)]);
        assert_eq!(segment.perimeter(), 10.0);
        assert_eq!(Contour::new(Vec::new()).bounding_box(), BoundingBox::default());
    }

    #[test]
    fn test_uniform_image_has_no_contour() {
        let img = GrayImage::from_pixel(64, 48, Luma([128]));
        assert!(ContourExtractor::default().extract(&img).is_none());
    }

    #[test]
    fn test_single_blob_bounding_box() {
        let (img, (min_x, min_y, max_x, max_y)) = blob_image();
        let extractor = ContourExtractor::default();

        let candidates = extractor.candidates(&img);
        assert_eq!(candidates.len(), 1);

        let bbox = candidates[0].bounding_box();
        let right = bbox.x + bbox.width as i32 - 1;
        let bottom = bbox.y + bbox.height as i32 - 1;
        assert!((bbox.x - min_x).abs() <= 1, "left {} vs {}", bbox.x, min_x);
        assert!((bbox.y - min_y).abs() <= 1, "top {} vs {}", bbox.y, min_y);
        assert!((right - max_x).abs() <= 1, "right {} vs {}", right, max_x);
        assert!((bottom - max_y).abs() <= 1, "bottom {} vs {}", bottom, max_y);
    }

    #[test]
    fn test_largest_blob_wins() {
        let mut img = GrayImage::from_pixel(160, 120, Luma([210]));
        for y in 0..120u32 {
            for x in 0..160u32 {
                let small = (x as i32 - 30).pow(2) + (y as i32 - 30).pow(2) <= 10 * 10;
                let large = (x as i32 - 100).pow(2) + (y as i32 - 70).pow(2) <= 30 * 30;
                if small || large {
                    img.put_pixel(x, y, Luma([30]));
                }
            }
        }
        let contour = ContourExtractor::default().extract(&img).unwrap();
        let bbox = contour.bounding_box();
        assert!((bbox.x - 70).abs() <= 1);
        assert!((bbox.y - 40).abs() <= 1);
    }
}

//! Human-review overlays
//!
//! Nothing here feeds back into scoring; an overlay is a side artifact.

use ab_glyph::{FontArc, PxScale};
use frame_io::VideoFrame;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_line_segment_mut, draw_text_mut};
use imageproc::rect::Rect;
use tracing::info;

use crate::config::AnnotationConfig;
use crate::contour::{BoundingBox, Contour};
use crate::measurement::PotholeMeasurement;
use crate::severity::Severity;
use crate::AnalysisError;

const CONTOUR_COLOR: [u8; 3] = [0, 255, 0];
const BOX_COLOR: [u8; 3] = [0, 0, 255];
const TEXT_COLOR: [u8; 3] = [255, 255, 0];
const LINE_SPACING: i32 = 30;

/// DejaVu Sans, used when no font file is configured
const BUNDLED_FONT: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");

/// Overlay layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationStyle {
    /// Contour, box and the full measurement text block (still images)
    Full,
    /// Box and a one-line severity/area label (video frames)
    Compact,
}

/// A text line anchored at its baseline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextLabel {
    pub text: String,
    pub x: i32,
    pub y: i32,
    pub color: [u8; 3],
}

/// Annotated copy of a frame
#[derive(Debug, Clone)]
pub struct AnnotatedFrame {
    pub frame: VideoFrame,
    /// Text lines burned into `frame`, in drawing order
    pub labels: Vec<TextLabel>,
}

/// Label color for a severity category
pub fn severity_color(severity: Severity) -> [u8; 3] {
    match severity {
        Severity::Low => [0, 255, 0],
        Severity::Medium => [255, 255, 0],
        Severity::High => [255, 165, 0],
        Severity::Critical => [255, 0, 0],
    }
}

/// Draws contour, bounding box and text onto frame copies
pub struct AnnotationRenderer {
    font: FontArc,
    scale: f32,
}

impl AnnotationRenderer {
    /// Create a renderer with the configured font, or the bundled one
    pub fn new(config: &AnnotationConfig) -> Result<Self, AnalysisError> {
        let font = match &config.font_path {
            Some(path) => {
                info!("Loading annotation font from {}", path);
                let bytes = std::fs::read(path)
                    .map_err(|e| AnalysisError::Annotation(format!("{}: {}", path, e)))?;
                FontArc::try_from_vec(bytes)
                    .map_err(|e| AnalysisError::Annotation(format!("{}: {}", path, e)))?
            }
            None => FontArc::try_from_slice(BUNDLED_FONT)
                .map_err(|e| AnalysisError::Annotation(format!("bundled font: {}", e)))?,
        };
        Ok(Self {
            font,
            scale: config.text_scale,
        })
    }

    /// Text block for the full style, moved below the box near the top edge
    pub fn full_labels(m: &PotholeMeasurement, severity: Severity) -> Vec<TextLabel> {
        let bbox = m.bbox;
        let lines = [
            format!("Size: {}x{} cm", m.width_cm, m.height_cm),
            format!("Area: {} cm2", m.area_cm2),
            format!("Depth: ~{} cm", m.depth_cm),
            format!("Severity: {}", severity.as_str().to_uppercase()),
        ];
        let y_offset = bbox.y - 10;
        lines
            .into_iter()
            .enumerate()
            .map(|(i, text)| {
                let i = i as i32;
                let mut y = y_offset - i * LINE_SPACING;
                if y < LINE_SPACING {
                    y = bbox.y + bbox.height as i32 + LINE_SPACING + i * LINE_SPACING;
                }
                TextLabel {
                    text,
                    x: bbox.x,
                    y,
                    color: TEXT_COLOR,
                }
            })
            .collect()
    }

    /// One-line label for the compact style
    pub fn compact_label(m: &PotholeMeasurement, severity: Severity) -> TextLabel {
        TextLabel {
            text: format!("{} - {:.0}cm2", severity.as_str().to_uppercase(), m.area_cm2),
            x: m.bbox.x,
            y: m.bbox.y - 10,
            color: severity_color(severity),
        }
    }

    pub fn render(
        &self,
        frame: &VideoFrame,
        contour: &Contour,
        m: &PotholeMeasurement,
        severity: Severity,
        style: AnnotationStyle,
    ) -> Result<AnnotatedFrame, AnalysisError> {
        let mut img = frame.to_rgb_image()?;

        let labels = match style {
            AnnotationStyle::Full => {
                draw_contour(&mut img, contour, CONTOUR_COLOR);
                draw_box(&mut img, m.bbox, BOX_COLOR, 2);
                Self::full_labels(m, severity)
            }
            AnnotationStyle::Compact => {
                draw_box(&mut img, m.bbox, CONTOUR_COLOR, 2);
                vec![Self::compact_label(m, severity)]
            }
        };

        let scale = PxScale::from(self.scale);
        for label in &labels {
            // Labels are anchored at the baseline; imageproc takes the top edge
            let top = label.y - self.scale.round() as i32;
            draw_text_mut(&mut img, Rgb(label.color), label.x, top, scale, &self.font, &label.text);
        }

        Ok(AnnotatedFrame {
            frame: VideoFrame::from_rgb_image(img, frame.timestamp_ns, frame.sequence),
            labels,
        })
    }
}

/// Closed polyline, 3 px wide
fn draw_contour(img: &mut RgbImage, contour: &Contour, color: [u8; 3]) {
    let n = contour.points.len();
    if n == 0 {
        return;
    }
    for i in 0..n {
        let a = contour.points[i];
        let b = contour.points[(i + 1) % n];
        for dy in -1..=1 {
            for dx in -1..=1 {
                draw_line_segment_mut(
                    img,
                    ((a.x + dx) as f32, (a.y + dy) as f32),
                    ((b.x + dx) as f32, (b.y + dy) as f32),
                    Rgb(color),
                );
            }
        }
    }
}

/// Hollow rectangle through `(x, y)` and `(x + w, y + h)`, stroke centred on that outline
fn draw_box(img: &mut RgbImage, bbox: BoundingBox, color: [u8; 3], thickness: u32) {
    let (w, h) = (bbox.width as i64 + 1, bbox.height as i64 + 1);
    let first = -(thickness as i64 / 2);
    for offset in first..first + thickness as i64 {
        let (rw, rh) = (w - 2 * offset, h - 2 * offset);
        if rw <= 0 || rh <= 0 {
            break;
        }
        let rect = Rect::at(bbox.x + offset as i32, bbox.y + offset as i32).of_size(rw as u32, rh as u32);
        draw_hollow_rect_mut(img, rect, Rgb(color));
    }
}

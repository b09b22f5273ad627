//! Video frame types and conversions

use image::{GrayImage, RgbImage};

use crate::FrameError;

/// Decoded RGB video frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFrame {
    /// RGB pixel data (width * height * 3)
    pub data: Vec<u8>,
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Presentation timestamp (nanoseconds)
    pub timestamp_ns: u64,
    /// Frame sequence number
    pub sequence: u32,
}

impl VideoFrame {
    /// Create a new video frame from raw RGB data
    pub fn new(data: Vec<u8>, width: u32, height: u32, timestamp_ns: u64, sequence: u32) -> Self {
        Self {
            data,
            width,
            height,
            timestamp_ns,
            sequence,
        }
    }

    /// Create a frame from raw RGB data, checking the buffer length
    pub fn from_rgb(data: Vec<u8>, width: u32, height: u32) -> Result<Self, FrameError> {
        let frame = Self::new(data, width, height, 0, 0);
        frame.validate()?;
        Ok(frame)
    }

    /// Create a frame filled with a single color
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let data = rgb
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 3)
            .collect();
        Self::new(data, width, height, 0, 0)
    }

    /// Check that the buffer holds exactly `width * height` RGB pixels
    pub fn validate(&self) -> Result<(), FrameError> {
        if self.width == 0 || self.height == 0 {
            return Err(FrameError::Empty {
                width: self.width,
                height: self.height,
            });
        }
        let expected = self.width as usize * self.height as usize * 3;
        if self.data.len() != expected {
            return Err(FrameError::Decode {
                width: self.width,
                height: self.height,
                expected,
                actual: self.data.len(),
            });
        }
        Ok(())
    }

    /// Get pixel at (x, y)
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 3;
        self.data
            .get(idx..idx + 3)
            .map(|p| [p[0], p[1], p[2]])
    }

    /// Convert to grayscale
    pub fn to_grayscale(&self) -> Vec<u8> {
        let mut gray = Vec::with_capacity((self.width * self.height) as usize);
        for pixel in self.data.chunks_exact(3) {
            // Luminance formula: 0.299*R + 0.587*G + 0.114*B
            let y = (pixel[0] as f32 * 0.299
                   + pixel[1] as f32 * 0.587
                   + pixel[2] as f32 * 0.114).round().min(255.0) as u8;
            gray.push(y);
        }
        gray
    }

    /// Convert to a single-channel intensity image
    pub fn to_gray_image(&self) -> Result<GrayImage, FrameError> {
        self.validate()?;
        GrayImage::from_raw(self.width, self.height, self.to_grayscale())
            .ok_or_else(|| self.decode_error())
    }

    /// Copy into an `image` RGB buffer
    pub fn to_rgb_image(&self) -> Result<RgbImage, FrameError> {
        self.validate()?;
        RgbImage::from_raw(self.width, self.height, self.data.clone())
            .ok_or_else(|| self.decode_error())
    }

    /// Build a frame from an `image` RGB buffer
    pub fn from_rgb_image(img: RgbImage, timestamp_ns: u64, sequence: u32) -> Self {
        let (width, height) = img.dimensions();
        Self::new(img.into_raw(), width, height, timestamp_ns, sequence)
    }

    fn decode_error(&self) -> FrameError {
        FrameError::Decode {
            width: self.width,
            height: self.height,
            expected: self.width as usize * self.height as usize * 3,
            actual: self.data.len(),
        }
    }
}

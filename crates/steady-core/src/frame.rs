//! Frame buffer and frame rate types for video frames in CPU memory.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SteadyError};

/// A packed RGB24 video frame.
///
/// RGB24 is the interchange format with FFmpeg on both the decode and
/// encode side, so frames are stored exactly as they cross the pipe:
/// tightly packed rows, three bytes per pixel, no padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl FrameBuffer {
    /// Bytes per pixel.
    pub const CHANNELS: usize = 3;

    /// Create a black frame with the given dimensions.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; width as usize * height as usize * Self::CHANNELS],
        }
    }

    /// Wrap raw packed RGB24 bytes.
    ///
    /// Fails if `data` does not hold exactly `width * height * 3` bytes.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * Self::CHANNELS;
        if data.len() != expected {
            return Err(SteadyError::InvalidParameter(format!(
                "frame data is {} bytes, expected {} for {}x{} RGB24",
                data.len(),
                expected,
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Frame width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Frame height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The packed pixel data.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Total size in bytes.
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    /// One row of packed pixels.
    #[inline]
    pub fn row(&self, y: u32) -> &[u8] {
        let stride = self.width as usize * Self::CHANNELS;
        let start = y as usize * stride;
        &self.data[start..start + stride]
    }

    /// Read a pixel. Coordinates are clamped to the frame, so sampling
    /// outside the image replicates the border pixel.
    #[inline]
    pub fn pixel_clamped(&self, x: i64, y: i64) -> [u8; 3] {
        let x = x.clamp(0, self.width as i64 - 1) as usize;
        let y = y.clamp(0, self.height as i64 - 1) as usize;
        let idx = (y * self.width as usize + x) * Self::CHANNELS;
        [self.data[idx], self.data[idx + 1], self.data[idx + 2]]
    }

    /// Write a pixel. Out-of-bounds writes are ignored.
    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        if x < self.width && y < self.height {
            let idx = (y as usize * self.width as usize + x as usize) * Self::CHANNELS;
            self.data[idx..idx + 3].copy_from_slice(&rgb);
        }
    }

    /// Create a color-bars test frame (8 vertical bars).
    pub fn test_pattern(width: u32, height: u32) -> Self {
        let mut frame = Self::new(width, height);
        let colors: [[u8; 3]; 8] = [
            [255, 255, 255], // White
            [255, 255, 0],   // Yellow
            [0, 255, 255],   // Cyan
            [0, 255, 0],     // Green
            [255, 0, 255],   // Magenta
            [255, 0, 0],     // Red
            [0, 0, 255],     // Blue
            [0, 0, 0],       // Black
        ];
        for y in 0..height {
            for x in 0..width {
                let bar = (x * 8 / width) as usize;
                frame.set_pixel(x, y, colors[bar.min(7)]);
            }
        }
        frame
    }
}

/// Frame rate as a rational number (e.g., 30000/1001 for 29.97 fps).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameRate {
    /// Numerator (e.g., 30000)
    pub numerator: u32,
    /// Denominator (e.g., 1001)
    pub denominator: u32,
}

impl FrameRate {
    /// Create a new frame rate.
    #[inline]
    pub const fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Convert to frames per second as f64.
    #[inline]
    pub fn to_fps_f64(self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }

    /// Common frame rates
    pub const FPS_23_976: Self = Self::new(24000, 1001);
    pub const FPS_24: Self = Self::new(24, 1);
    pub const FPS_25: Self = Self::new(25, 1);
    pub const FPS_29_97: Self = Self::new(30000, 1001);
    pub const FPS_30: Self = Self::new(30, 1);
    pub const FPS_60: Self = Self::new(60, 1);
}

impl Default for FrameRate {
    fn default() -> Self {
        Self::FPS_30
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fps = self.to_fps_f64();
        if (fps - fps.round()).abs() < 0.001 {
            write!(f, "{} fps", fps.round() as u32)
        } else {
            write!(f, "{:.3} fps", fps)
        }
    }
}

impl FromStr for FrameRate {
    type Err = SteadyError;

    /// Parse ffprobe-style rates: `"30000/1001"` or a bare `"25"`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || SteadyError::InvalidParameter(format!("invalid frame rate: {s:?}"));
        let (num, den) = match s.split_once('/') {
            Some((n, d)) => (
                n.trim().parse::<u32>().map_err(|_| invalid())?,
                d.trim().parse::<u32>().map_err(|_| invalid())?,
            ),
            None => (s.trim().parse::<u32>().map_err(|_| invalid())?, 1),
        };
        if num == 0 || den == 0 {
            return Err(invalid());
        }
        Ok(Self::new(num, den))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_size() {
        let frame = FrameBuffer::new(320, 240);
        assert_eq!(frame.byte_len(), 320 * 240 * 3);
        assert_eq!(frame.row(0).len(), 320 * 3);
    }

    #[test]
    fn test_from_raw_rejects_bad_length() {
        assert!(FrameBuffer::from_raw(4, 4, vec![0u8; 47]).is_err());
        assert!(FrameBuffer::from_raw(4, 4, vec![0u8; 48]).is_ok());
    }

    #[test]
    fn test_pixel_clamping_replicates_border() {
        let mut frame = FrameBuffer::new(4, 4);
        frame.set_pixel(0, 0, [10, 20, 30]);
        assert_eq!(frame.pixel_clamped(-5, -5), [10, 20, 30]);
        assert_eq!(frame.pixel_clamped(0, 0), [10, 20, 30]);
    }

    #[test]
    fn test_test_pattern() {
        let frame = FrameBuffer::test_pattern(160, 90);
        // First bar is white, last is black.
        assert_eq!(frame.pixel_clamped(0, 0), [255, 255, 255]);
        assert_eq!(frame.pixel_clamped(159, 89), [0, 0, 0]);
    }

    #[test]
    fn test_frame_rate_parse() {
        let rate: FrameRate = "30000/1001".parse().unwrap();
        assert_eq!(rate, FrameRate::FPS_29_97);
        assert!((rate.to_fps_f64() - 29.97).abs() < 0.001);

        let plain: FrameRate = "25".parse().unwrap();
        assert_eq!(plain, FrameRate::FPS_25);

        assert!("0/0".parse::<FrameRate>().is_err());
        assert!("abc".parse::<FrameRate>().is_err());
    }

    #[test]
    fn test_frame_rate_display() {
        assert_eq!(FrameRate::FPS_24.to_string(), "24 fps");
        assert_eq!(FrameRate::FPS_23_976.to_string(), "23.976 fps");
    }
}

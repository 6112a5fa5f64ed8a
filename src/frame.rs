//! Raw and processed frame representations
//!
//! Contains the 3-channel frame handed over by the capture device and the
//! square circular-masked RGBA frame produced by the pipeline.

use thiserror::Error;

/// Per-frame failure modes shared by acquisition and processing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// The device had no frame ready (or the read failed); retry next tick
    #[error("no frame available from the capture device")]
    Absent,
    /// The frame does not match its declared shape and cannot be processed
    #[error("invalid frame: {0}")]
    InvalidFrame(String),
}

/// Channel order of raw frame data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelOrder {
    /// Blue, green, red - the order classic capture stacks deliver
    Bgr,
    /// Red, green, blue - the order the nokhwa decoder delivers
    Rgb,
}

/// A raw 3-channel frame as delivered by the capture device
#[derive(Debug, Clone)]
pub struct RawFrame {
    /// Packed pixel data, 3 bytes per pixel in `order`
    pub data: Vec<u8>,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Channel order of `data`
    pub order: PixelOrder,
}

impl RawFrame {
    /// Create a new raw frame
    pub fn new(data: Vec<u8>, width: u32, height: u32, order: PixelOrder) -> Self {
        Self {
            data,
            width,
            height,
            order,
        }
    }

    /// Get the expected data size for 3-channel frame dimensions
    pub fn expected_size(width: u32, height: u32) -> usize {
        (width as usize) * (height as usize) * 3
    }

    /// Get the stride (bytes per row)
    pub fn stride(&self) -> usize {
        (self.width as usize) * 3
    }

    /// Check that the dimensions are usable and the buffer matches them
    pub fn validate(&self) -> Result<(), FrameError> {
        if self.width == 0 || self.height == 0 {
            return Err(FrameError::InvalidFrame(format!(
                "degenerate dimensions {}x{}",
                self.width, self.height
            )));
        }
        let expected = Self::expected_size(self.width, self.height);
        if self.data.len() != expected {
            return Err(FrameError::InvalidFrame(format!(
                "buffer holds {} bytes, expected {} for {}x{}",
                self.data.len(),
                expected,
                self.width,
                self.height
            )));
        }
        Ok(())
    }
}

/// A processed square RGBA frame with circular alpha, ready for display
#[derive(Debug, Clone)]
pub struct DisplayFrame {
    /// Packed RGBA pixel data, 4 bytes per pixel
    pub data: Vec<u8>,
    /// Side length in pixels (the frame is always square)
    pub size: u32,
}

impl DisplayFrame {
    /// Create a new display frame
    pub fn new(data: Vec<u8>, size: u32) -> Self {
        Self { data, size }
    }

    /// Get the expected data size for a square RGBA frame
    pub fn expected_size(size: u32) -> usize {
        (size as usize) * (size as usize) * 4
    }

    /// Check if the frame data has the correct size
    pub fn is_valid(&self) -> bool {
        self.data.len() == Self::expected_size(self.size)
    }

    /// Get the stride (bytes per row)
    pub fn stride(&self) -> usize {
        (self.size as usize) * 4
    }

    /// Get the wgpu texture format for this frame
    pub fn texture_format(&self) -> wgpu::TextureFormat {
        wgpu::TextureFormat::Rgba8UnormSrgb
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_frame_creation() {
        let width = 640;
        let height = 480;
        let data = vec![0u8; RawFrame::expected_size(width, height)];
        let frame = RawFrame::new(data, width, height, PixelOrder::Bgr);

        assert_eq!(frame.width, 640);
        assert_eq!(frame.height, 480);
        assert_eq!(frame.stride(), 640 * 3);
        assert!(frame.validate().is_ok());
    }

    #[test]
    fn test_expected_sizes() {
        assert_eq!(RawFrame::expected_size(640, 480), 640 * 480 * 3);
        assert_eq!(RawFrame::expected_size(1280, 720), 1280 * 720 * 3);
        assert_eq!(DisplayFrame::expected_size(480), 480 * 480 * 4);
    }

    #[test]
    fn test_validate_rejects_degenerate_dimensions() {
        let frame = RawFrame::new(Vec::new(), 0, 0, PixelOrder::Rgb);
        assert!(matches!(
            frame.validate(),
            Err(FrameError::InvalidFrame(_))
        ));

        let frame = RawFrame::new(vec![0u8; 30], 0, 10, PixelOrder::Rgb);
        assert!(matches!(
            frame.validate(),
            Err(FrameError::InvalidFrame(_))
        ));
    }

    #[test]
    fn test_validate_rejects_size_mismatch() {
        let frame = RawFrame::new(vec![0u8; 10], 4, 4, PixelOrder::Bgr);
        assert!(matches!(
            frame.validate(),
            Err(FrameError::InvalidFrame(_))
        ));
    }

    #[test]
    fn test_display_frame_creation() {
        let size = 480;
        let data = vec![0u8; DisplayFrame::expected_size(size)];
        let frame = DisplayFrame::new(data, size);

        assert!(frame.is_valid());
        assert_eq!(frame.stride(), 480 * 4);
        assert_eq!(
            frame.texture_format(),
            wgpu::TextureFormat::Rgba8UnormSrgb
        );
    }
}

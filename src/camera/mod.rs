//! Camera capture module
//!
//! Wraps a single nokhwa capture device behind a pull interface: the render
//! loop asks for one frame per tick and the device is released when the
//! grabber drops. Capture stays on the caller's thread; a tick with nothing
//! ready is skipped, not waited on.

use image::{ImageBuffer, Rgb};
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{ApiBackend, CameraIndex, RequestedFormat, RequestedFormatType, Resolution};
use nokhwa::{Camera, NokhwaError};
use thiserror::Error;

use crate::frame::{FrameError, PixelOrder, RawFrame};

/// Failure to set up the capture device; fatal at startup
#[derive(Debug, Error)]
pub enum CaptureError {
    /// No usable format could be negotiated with the device
    #[error("failed to open camera {index}: {source}")]
    Open { index: u32, source: NokhwaError },
    /// The device opened but its stream would not start
    #[error("failed to start camera stream: {0}")]
    Stream(NokhwaError),
}

/// Information about an available camera
#[derive(Clone, Debug)]
pub struct DeviceInfo {
    /// Camera index
    pub index: u32,
    /// Camera name
    pub name: String,
}

/// Owns one open capture device for the lifetime of the overlay
pub struct CameraGrabber {
    camera: Camera,
    frames_grabbed: u64,
}

impl CameraGrabber {
    /// List cameras visible to the native backend
    pub fn list_devices() -> Vec<DeviceInfo> {
        let mut devices = Vec::new();

        match nokhwa::query(ApiBackend::Auto) {
            Ok(camera_list) => {
                for (idx, info) in camera_list.iter().enumerate() {
                    devices.push(DeviceInfo {
                        index: idx as u32,
                        name: info.human_name().to_string(),
                    });
                }
            }
            Err(e) => {
                log::warn!("Failed to enumerate cameras: {:?}", e);
            }
        }

        devices
    }

    /// Open the capture device and start streaming
    ///
    /// The device stays open until the grabber drops. Opening is the only
    /// fatal setup step; "nothing ready yet" during capture is not an error
    /// here.
    pub fn open(index: u32) -> Result<Self, CaptureError> {
        let camera_index = CameraIndex::Index(index);

        // Prefer the highest native resolution, then fall back to whatever
        // the device will accept
        let requested =
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestResolution);
        let mut camera = match Camera::new(camera_index.clone(), requested) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("Failed to open camera at highest resolution: {:?}", e);

                let fallback = RequestedFormat::new::<RgbFormat>(
                    RequestedFormatType::HighestResolution(Resolution::new(640, 480)),
                );
                match Camera::new(camera_index.clone(), fallback) {
                    Ok(c) => c,
                    Err(e2) => {
                        log::warn!("Failed with bounded resolution: {:?}", e2);

                        let last_resort =
                            RequestedFormat::new::<RgbFormat>(RequestedFormatType::None);
                        Camera::new(camera_index, last_resort)
                            .map_err(|source| CaptureError::Open { index, source })?
                    }
                }
            }
        };

        camera.open_stream().map_err(CaptureError::Stream)?;

        log::info!(
            "Camera opened: {} ({}x{})",
            camera.info().human_name(),
            camera.resolution().width(),
            camera.resolution().height()
        );

        Ok(Self {
            camera,
            frames_grabbed: 0,
        })
    }

    /// Pull one frame from the device
    ///
    /// A driver with nothing ready, or a failed read or decode, comes back
    /// as `Absent`; the device is simply polled again next tick. Degenerate
    /// driver output surfaces as `InvalidFrame`.
    pub fn try_acquire(&mut self) -> Result<RawFrame, FrameError> {
        let buffer = match self.camera.frame() {
            Ok(buffer) => buffer,
            Err(e) => {
                log::debug!("Camera read failed: {:?}", e);
                return Err(FrameError::Absent);
            }
        };

        let decoded: ImageBuffer<Rgb<u8>, Vec<u8>> = match buffer.decode_image::<RgbFormat>() {
            Ok(image) => image,
            Err(e) => {
                log::debug!("Frame decode failed: {:?}", e);
                return Err(FrameError::Absent);
            }
        };

        let (width, height) = (decoded.width(), decoded.height());
        let frame = RawFrame::new(decoded.into_raw(), width, height, PixelOrder::Rgb);
        frame.validate()?;

        self.frames_grabbed += 1;
        Ok(frame)
    }

    /// Resolution the device is streaming at
    pub fn resolution(&self) -> (u32, u32) {
        let res = self.camera.resolution();
        (res.width(), res.height())
    }

    /// Whether the device stream is currently open
    pub fn is_open(&self) -> bool {
        self.camera.is_stream_open()
    }

    /// Frames successfully acquired since open
    pub fn frames_grabbed(&self) -> u64 {
        self.frames_grabbed
    }
}

impl Drop for CameraGrabber {
    fn drop(&mut self) {
        if let Err(e) = self.camera.stop_stream() {
            log::warn!("Failed to stop camera stream: {:?}", e);
        } else {
            log::info!("Camera released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Hardware-dependent tests skip quietly when no device is attached so
    // machines without a webcam still pass.

    #[test]
    fn test_list_devices_does_not_panic() {
        let _ = CameraGrabber::list_devices();
    }

    #[test]
    fn test_open_and_acquire() {
        let Ok(mut grabber) = CameraGrabber::open(0) else {
            eprintln!("skipping: no capture device available");
            return;
        };
        assert!(grabber.is_open());

        // Warm-up reads may come back Absent; that is the skip contract
        for _ in 0..10 {
            match grabber.try_acquire() {
                Ok(frame) => {
                    assert!(frame.validate().is_ok());
                    assert_eq!(frame.order, PixelOrder::Rgb);
                    assert_eq!(grabber.frames_grabbed(), 1);
                    return;
                }
                Err(FrameError::Absent) => {
                    std::thread::sleep(std::time::Duration::from_millis(30));
                }
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
    }

    #[test]
    fn test_open_missing_device_fails() {
        // Index far beyond any real machine's device count
        assert!(CameraGrabber::open(250).is_err());
    }
}

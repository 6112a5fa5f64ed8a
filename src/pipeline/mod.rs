//! Per-frame image pipeline
//!
//! Turns one raw camera frame into the square, circularly-masked, optionally
//! beautified RGBA frame the overlay displays. Pure CPU work, deterministic
//! given the frame bytes and the beauty flag; the caller's buffer is never
//! mutated.

pub mod beauty;

use crate::frame::{DisplayFrame, FrameError, PixelOrder, RawFrame};

/// Horizontal crop bias on the plain path
pub const PLAIN_CROP_BIAS: f64 = 0.2;
/// Horizontal crop bias on the beautified path
// TODO: unify with PLAIN_CROP_BIAS; the differing biases make the view jump
// sideways when the filter toggles, which looks like an upstream defect.
pub const BEAUTY_CROP_BIAS: f64 = 0.3;

/// Process one raw frame into a display frame
///
/// Stages run in a fixed order: channel permutation to RGB, horizontal
/// mirror, biased square crop, optional beautification, RGBA composition
/// with the circular alpha mask. The square side is `min(width, height)`,
/// recomputed from the incoming frame every call.
pub fn process(frame: &RawFrame, beauty_enabled: bool) -> Result<DisplayFrame, FrameError> {
    frame.validate()?;

    let mut rgb = to_rgb(frame);
    mirror_in_place(&mut rgb, frame.width);

    let size = frame.width.min(frame.height);
    let bias = if beauty_enabled {
        BEAUTY_CROP_BIAS
    } else {
        PLAIN_CROP_BIAS
    };
    let cropped = crop_square(&rgb, frame.width, size, crop_offset(size, frame.width, bias));

    let rgb = if beauty_enabled {
        beauty::beautify(&cropped, size, size)
    } else {
        cropped
    };

    Ok(compose_rgba(&rgb, size))
}

/// Resolve one tick's acquisition result into a new display frame
///
/// `Absent` and `InvalidFrame` both skip the tick, so the caller keeps the
/// previously displayed image; only a fully processed frame replaces it.
pub fn process_tick(
    acquired: Result<RawFrame, FrameError>,
    beauty_enabled: bool,
) -> Option<DisplayFrame> {
    match acquired {
        Ok(frame) => match process(&frame, beauty_enabled) {
            Ok(display) => Some(display),
            Err(err) => {
                log::warn!("Dropping frame: {err}");
                None
            }
        },
        Err(FrameError::Absent) => {
            log::debug!("No frame available this tick");
            None
        }
        Err(err) => {
            log::warn!("Dropping frame: {err}");
            None
        }
    }
}

/// Permute the frame's declared channel order into packed RGB
fn to_rgb(frame: &RawFrame) -> Vec<u8> {
    let mut rgb = frame.data.clone();
    if frame.order == PixelOrder::Bgr {
        for px in rgb.chunks_exact_mut(3) {
            px.swap(0, 2);
        }
    }
    rgb
}

/// Flip each row left to right
fn mirror_in_place(rgb: &mut [u8], width: u32) {
    let w = width as usize;
    for row in rgb.chunks_exact_mut(w * 3) {
        for x in 0..w / 2 {
            let a = x * 3;
            let b = (w - 1 - x) * 3;
            for c in 0..3 {
                row.swap(a + c, b + c);
            }
        }
    }
}

/// Horizontal offset of the crop window, clamped so the window stays inside
fn crop_offset(size: u32, width: u32, bias: f64) -> u32 {
    let offset = (size as f64 * bias).floor() as u32;
    offset.min(width - size)
}

/// Copy the `size x size` window starting at column `x_offset`, top row first
fn crop_square(rgb: &[u8], width: u32, size: u32, x_offset: u32) -> Vec<u8> {
    let w = width as usize;
    let s = size as usize;
    let x0 = x_offset as usize;
    let mut out = Vec::with_capacity(s * s * 3);
    for y in 0..s {
        let start = (y * w + x0) * 3;
        out.extend_from_slice(&rgb[start..start + s * 3]);
    }
    out
}

/// Interleave RGB with the circular alpha mask into a packed RGBA buffer
fn compose_rgba(rgb: &[u8], size: u32) -> DisplayFrame {
    let s = size as usize;
    let mut data = vec![0u8; DisplayFrame::expected_size(size)];
    for i in 0..s * s {
        data[i * 4..i * 4 + 3].copy_from_slice(&rgb[i * 3..i * 3 + 3]);
    }
    apply_circle_mask(&mut data, size);
    DisplayFrame::new(data, size)
}

/// Write the alpha channel: opaque inside the inscribed circle, clear outside
///
/// Center and radius both use integer `size / 2`, matching a filled-circle
/// rasterization with an inclusive boundary.
fn apply_circle_mask(rgba: &mut [u8], size: u32) {
    let s = size as i64;
    let c = s / 2;
    let r2 = c * c;
    for y in 0..s {
        for x in 0..s {
            let dx = x - c;
            let dy = y - c;
            let alpha = if dx * dx + dy * dy <= r2 { 255 } else { 0 };
            rgba[((y * s + x) * 4 + 3) as usize] = alpha;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterned_frame(width: u32, height: u32, order: PixelOrder) -> RawFrame {
        let mut data = Vec::with_capacity(RawFrame::expected_size(width, height));
        for y in 0..height {
            for x in 0..width {
                data.push((x * 3 + y * 7) as u8);
                data.push((x * 5 + y * 11) as u8);
                data.push((x * 13 + y * 17) as u8);
            }
        }
        RawFrame::new(data, width, height, order)
    }

    fn solid_frame(width: u32, height: u32, value: u8) -> RawFrame {
        RawFrame::new(
            vec![value; RawFrame::expected_size(width, height)],
            width,
            height,
            PixelOrder::Bgr,
        )
    }

    #[test]
    fn test_output_is_square_rgba() {
        let out = process(&patterned_frame(64, 48, PixelOrder::Bgr), false).unwrap();
        assert_eq!(out.size, 48);
        assert_eq!(out.data.len(), DisplayFrame::expected_size(48));
        assert!(out.is_valid());

        let out = process(&patterned_frame(48, 64, PixelOrder::Rgb), false).unwrap();
        assert_eq!(out.size, 48);
    }

    #[test]
    fn test_plain_path_matches_mirrored_cropped_source() {
        // Walk every output pixel back to its source pixel: mirror first,
        // then crop, so output column x reads source column
        // width - 1 - (x + x_offset).
        let (w, h) = (8u32, 6u32);
        let frame = patterned_frame(w, h, PixelOrder::Bgr);
        let out = process(&frame, false).unwrap();

        let size = h.min(w);
        let x_offset = (size as f64 * PLAIN_CROP_BIAS).floor() as u32;
        assert_eq!(x_offset, 1);

        for y in 0..size {
            for x in 0..size {
                let sx = (w - 1 - (x + x_offset)) as usize;
                let src = ((y as usize) * (w as usize) + sx) * 3;
                let dst = ((y * size + x) * 4) as usize;
                // BGR source, so red is channel 2 and blue channel 0
                assert_eq!(out.data[dst], frame.data[src + 2]);
                assert_eq!(out.data[dst + 1], frame.data[src + 1]);
                assert_eq!(out.data[dst + 2], frame.data[src]);
            }
        }
    }

    #[test]
    fn test_bgr_and_rgb_orders_agree() {
        let bgr = patterned_frame(10, 8, PixelOrder::Bgr);
        let mut swapped = bgr.data.clone();
        for px in swapped.chunks_exact_mut(3) {
            px.swap(0, 2);
        }
        let rgb = RawFrame::new(swapped, 10, 8, PixelOrder::Rgb);

        let a = process(&bgr, false).unwrap();
        let b = process(&rgb, false).unwrap();
        assert_eq!(a.data, b.data);
    }

    #[test]
    fn test_crop_offsets_for_vga() {
        assert_eq!(crop_offset(480, 640, PLAIN_CROP_BIAS), 96);
        assert_eq!(crop_offset(480, 640, BEAUTY_CROP_BIAS), 144);
    }

    #[test]
    fn test_crop_offset_clamps_to_frame() {
        // A square source leaves no room to shift the window
        assert_eq!(crop_offset(100, 100, BEAUTY_CROP_BIAS), 0);
        // Nearly square: floor(100 * 0.3) = 30 exceeds the 10 spare columns
        assert_eq!(crop_offset(100, 110, BEAUTY_CROP_BIAS), 10);
    }

    #[test]
    fn test_alpha_mask_is_inscribed_circle() {
        let out = process(&patterned_frame(16, 12, PixelOrder::Bgr), false).unwrap();
        let s = out.size as i64;
        let c = s / 2;
        for y in 0..s {
            for x in 0..s {
                let inside = (x - c) * (x - c) + (y - c) * (y - c) <= c * c;
                let alpha = out.data[((y * s + x) * 4 + 3) as usize];
                assert_eq!(alpha, if inside { 255 } else { 0 }, "at ({x},{y})");
            }
        }
    }

    #[test]
    fn test_alpha_mask_ignores_beauty_flag() {
        let frame = patterned_frame(14, 12, PixelOrder::Bgr);
        let plain = process(&frame, false).unwrap();
        let beautified = process(&frame, true).unwrap();

        let alpha = |f: &DisplayFrame| -> Vec<u8> {
            f.data.iter().skip(3).step_by(4).copied().collect()
        };
        assert_eq!(alpha(&plain), alpha(&beautified));
    }

    #[test]
    fn test_beauty_path_lifts_black_frame() {
        // Uniform input smooths to itself, so only the lift shows
        let out = process(&solid_frame(12, 10, 0), true).unwrap();
        for px in out.data.chunks_exact(4) {
            assert_eq!(&px[..3], &[10, 10, 10]);
        }
    }

    #[test]
    fn test_beauty_path_saturates_white_frame() {
        let out = process(&solid_frame(12, 10, 255), true).unwrap();
        for px in out.data.chunks_exact(4) {
            assert_eq!(&px[..3], &[255, 255, 255]);
        }
    }

    #[test]
    fn test_toggle_round_trip_restores_output() {
        let frame = patterned_frame(14, 12, PixelOrder::Bgr);
        let before = process(&frame, false).unwrap();
        let _ = process(&frame, true).unwrap();
        let after = process(&frame, false).unwrap();
        assert_eq!(before.data, after.data);
    }

    #[test]
    fn test_degenerate_frames_rejected() {
        let empty = RawFrame::new(Vec::new(), 0, 0, PixelOrder::Bgr);
        assert!(matches!(
            process(&empty, false),
            Err(FrameError::InvalidFrame(_))
        ));

        let short = RawFrame::new(vec![0u8; 5], 4, 4, PixelOrder::Bgr);
        assert!(matches!(
            process(&short, true),
            Err(FrameError::InvalidFrame(_))
        ));
    }

    #[test]
    fn test_process_tick_skips_absent_and_invalid() {
        assert!(process_tick(Err(FrameError::Absent), false).is_none());

        let bad = RawFrame::new(vec![0u8; 5], 4, 4, PixelOrder::Bgr);
        assert!(process_tick(Ok(bad), false).is_none());

        let good = patterned_frame(8, 6, PixelOrder::Bgr);
        assert!(process_tick(Ok(good), false).is_some());
    }
}

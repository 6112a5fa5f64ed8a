//! Skin-smoothing "beauty" filter
//!
//! Two CPU stages over packed RGB bytes: an edge-preserving smoothing pass
//! (OpenCV `bilateralFilter` parameterization, reflected borders) and a
//! linear brightness/contrast lift. Flat regions blur, edges survive.

/// Neighborhood diameter of the smoothing pass
pub const SMOOTH_DIAMETER: i64 = 9;
/// Color-distance falloff scale of the smoothing pass
pub const SMOOTH_SIGMA_COLOR: f32 = 75.0;
/// Spatial falloff scale of the smoothing pass
pub const SMOOTH_SIGMA_SPACE: f32 = 75.0;
/// Multiplicative gain of the lift stage
pub const LIFT_GAIN: f32 = 1.3;
/// Additive bias of the lift stage
pub const LIFT_BIAS: f32 = 10.0;

/// Apply both beauty stages to a packed RGB buffer
pub fn beautify(rgb: &[u8], width: u32, height: u32) -> Vec<u8> {
    let mut out = smooth(rgb, width, height);
    lift_in_place(&mut out);
    out
}

/// Edge-preserving smoothing over a packed RGB buffer
///
/// Each output pixel is a weighted average of the disc-shaped neighborhood
/// around it; weights decay with spatial distance and with L1 color distance
/// across all three channels, so a uniform region averages to itself while a
/// hard edge contributes near-zero weight from the far side.
pub fn smooth(rgb: &[u8], width: u32, height: u32) -> Vec<u8> {
    let w = width as i64;
    let h = height as i64;
    let radius = SMOOTH_DIAMETER / 2;

    let color_coeff = -0.5 / (SMOOTH_SIGMA_COLOR * SMOOTH_SIGMA_COLOR);
    let space_coeff = -0.5 / (SMOOTH_SIGMA_SPACE * SMOOTH_SIGMA_SPACE);

    // Lookup table over every possible 3-channel L1 color distance
    let color_weight: Vec<f32> = (0..=255 * 3)
        .map(|d| ((d * d) as f32 * color_coeff).exp())
        .collect();

    // Disc-limited neighborhood offsets with their spatial weights
    let mut offsets: Vec<(i64, i64, f32)> = Vec::new();
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let dist2 = dx * dx + dy * dy;
            if dist2 > radius * radius {
                continue;
            }
            offsets.push((dx, dy, (dist2 as f32 * space_coeff).exp()));
        }
    }

    let mut out = vec![0u8; rgb.len()];
    for y in 0..h {
        for x in 0..w {
            let center = ((y * w + x) * 3) as usize;
            let c0 = rgb[center] as i32;
            let c1 = rgb[center + 1] as i32;
            let c2 = rgb[center + 2] as i32;

            let mut weight_sum = 0.0f32;
            let mut sum = [0.0f32; 3];
            for &(dx, dy, space_weight) in &offsets {
                let nx = reflect_101(x + dx, w);
                let ny = reflect_101(y + dy, h);
                let n = ((ny * w + nx) * 3) as usize;
                let n0 = rgb[n] as i32;
                let n1 = rgb[n + 1] as i32;
                let n2 = rgb[n + 2] as i32;

                let color_dist =
                    ((n0 - c0).abs() + (n1 - c1).abs() + (n2 - c2).abs()) as usize;
                let weight = space_weight * color_weight[color_dist];

                weight_sum += weight;
                sum[0] += weight * n0 as f32;
                sum[1] += weight * n1 as f32;
                sum[2] += weight * n2 as f32;
            }

            // weight_sum >= 1: the center sample always carries weight 1.0
            out[center] = (sum[0] / weight_sum).round() as u8;
            out[center + 1] = (sum[1] / weight_sum).round() as u8;
            out[center + 2] = (sum[2] / weight_sum).round() as u8;
        }
    }
    out
}

/// Saturating linear lift, `clamp(gain * v + bias, 0, 255)` per channel
pub fn lift_in_place(rgb: &mut [u8]) {
    for v in rgb.iter_mut() {
        *v = (LIFT_GAIN * *v as f32 + LIFT_BIAS).round().clamp(0.0, 255.0) as u8;
    }
}

/// Mirror an out-of-range coordinate back into `[0, len)` without repeating
/// the edge sample (reflect-101 border rule)
fn reflect_101(mut i: i64, len: i64) -> i64 {
    if len == 1 {
        return 0;
    }
    while i < 0 || i >= len {
        if i < 0 {
            i = -i;
        } else {
            i = 2 * (len - 1) - i;
        }
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smoothing_uniform_image_is_identity() {
        let rgb = vec![120u8; 16 * 16 * 3];
        assert_eq!(smooth(&rgb, 16, 16), rgb);
    }

    #[test]
    fn test_smoothing_preserves_hard_edge() {
        // Left half black, right half white; the color weight across the
        // step is vanishingly small, so both sides stay exact.
        let (w, h) = (16u32, 16u32);
        let mut rgb = vec![0u8; (w * h * 3) as usize];
        for y in 0..h {
            for x in w / 2..w {
                let i = ((y * w + x) * 3) as usize;
                rgb[i] = 255;
                rgb[i + 1] = 255;
                rgb[i + 2] = 255;
            }
        }
        assert_eq!(smooth(&rgb, w, h), rgb);
    }

    #[test]
    fn test_smoothing_pulls_impulse_toward_neighbors() {
        let (w, h) = (11u32, 11u32);
        let mut rgb = vec![120u8; (w * h * 3) as usize];
        let center = ((5 * w + 5) * 3) as usize;
        rgb[center] = 150;
        rgb[center + 1] = 150;
        rgb[center + 2] = 150;

        let out = smooth(&rgb, w, h);
        assert!(out[center] < 150);
        assert!(out[center] >= 120);
    }

    #[test]
    fn test_lift_biases_black_frame() {
        let mut rgb = vec![0u8; 8 * 8 * 3];
        lift_in_place(&mut rgb);
        assert!(rgb.iter().all(|&v| v == 10));
    }

    #[test]
    fn test_lift_saturates_white_frame() {
        let mut rgb = vec![255u8; 8 * 8 * 3];
        lift_in_place(&mut rgb);
        assert!(rgb.iter().all(|&v| v == 255));
    }

    #[test]
    fn test_beautify_applies_both_stages() {
        // Smoothing is the identity on a uniform frame, so only the lift
        // shows: 1.3 * 100 + 10 = 140.
        let rgb = vec![100u8; 8 * 8 * 3];
        let out = beautify(&rgb, 8, 8);
        assert!(out.iter().all(|&v| v == 140));
    }

    #[test]
    fn test_reflect_101() {
        assert_eq!(reflect_101(-1, 10), 1);
        assert_eq!(reflect_101(-2, 10), 2);
        assert_eq!(reflect_101(10, 10), 8);
        assert_eq!(reflect_101(11, 10), 7);
        assert_eq!(reflect_101(4, 10), 4);
        assert_eq!(reflect_101(-3, 1), 0);
    }
}

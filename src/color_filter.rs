// src/color_filter.rs
//
// Lane marking color isolation.
//
// Road paint is either white (high lightness, any hue) or yellow (a narrow
// hue band with enough lightness and saturation to rule out dirty asphalt).
// Both tests are run in HLS space on the 8-bit scale, and a pixel survives
// when it passes either one.

use crate::types::{ColorConfig, Frame, HlsRange, ACTIVE};
use image::{GrayImage, Luma};
use tracing::debug;

// ============================================================================
// HLS CONVERSION
// ============================================================================

/// Convert an RGB pixel to 8-bit HLS.
/// Returns [H: 0-180, L: 0-255, S: 0-255]; hue is halved to fit a byte.
#[inline]
pub fn rgb_to_hls(r: u8, g: u8, b: u8) -> [u8; 3] {
    let r_n = r as f32 / 255.0;
    let g_n = g as f32 / 255.0;
    let b_n = b as f32 / 255.0;

    let max = r_n.max(g_n).max(b_n);
    let min = r_n.min(g_n).min(b_n);
    let delta = max - min;
    let l = (max + min) * 0.5;

    let (h, s) = if delta > f32::EPSILON {
        let s = if l < 0.5 {
            delta / (max + min)
        } else {
            delta / (2.0 - max - min)
        };
        let scale = 60.0 / delta;
        let h = if max == r_n {
            (g_n - b_n) * scale
        } else if max == g_n {
            (b_n - r_n) * scale + 120.0
        } else {
            (r_n - g_n) * scale + 240.0
        };
        (if h < 0.0 { h + 360.0 } else { h }, s)
    } else {
        (0.0, 0.0)
    };

    [
        (h * 0.5).round().clamp(0.0, 255.0) as u8,
        (l * 255.0).round().clamp(0.0, 255.0) as u8,
        (s * 255.0).round().clamp(0.0, 255.0) as u8,
    ]
}

// ============================================================================
// MASKS
// ============================================================================

/// Binary mask of pixels whose HLS value lies inside any of `ranges`.
pub fn hls_mask(frame: &Frame, ranges: &[&HlsRange]) -> GrayImage {
    let mut mask = GrayImage::new(frame.width as u32, frame.height as u32);
    for (i, px) in frame.data.chunks_exact(3).enumerate() {
        let hls = rgb_to_hls(px[0], px[1], px[2]);
        if ranges.iter().any(|r| r.contains(hls)) {
            let x = (i % frame.width) as u32;
            let y = (i / frame.width) as u32;
            mask.put_pixel(x, y, Luma([ACTIVE]));
        }
    }
    mask
}

pub fn white_mask(frame: &Frame, config: &ColorConfig) -> GrayImage {
    hls_mask(frame, &[&config.white])
}

pub fn yellow_mask(frame: &Frame, config: &ColorConfig) -> GrayImage {
    hls_mask(frame, &[&config.yellow])
}

/// White OR yellow.
pub fn lane_color_mask(frame: &Frame, config: &ColorConfig) -> GrayImage {
    hls_mask(frame, &[&config.white, &config.yellow])
}

/// Copy of `frame` with every pixel outside the lane color mask zeroed.
pub fn filter_lane_colors(frame: &Frame, config: &ColorConfig) -> Frame {
    let mask = lane_color_mask(frame, config);
    let mut data = frame.data.clone();
    let mut kept = 0usize;

    for (px, m) in data.chunks_exact_mut(3).zip(mask.as_raw().iter()) {
        if *m == ACTIVE {
            kept += 1;
        } else {
            px.fill(0);
        }
    }

    debug!(
        "Color filter kept {}/{} pixels",
        kept,
        frame.width * frame.height
    );

    Frame {
        data,
        width: frame.width,
        height: frame.height,
        timestamp_ms: frame.timestamp_ms,
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    /// 30x10 frame: columns 0-9 `left`, 10-19 `mid`, 20-29 black.
    fn banded_frame(left: [u8; 3], mid: [u8; 3]) -> Frame {
        let img = RgbImage::from_fn(30, 10, |x, _| match x {
            0..=9 => Rgb(left),
            10..=19 => Rgb(mid),
            _ => Rgb([0, 0, 0]),
        });
        Frame::from_rgb_image(img)
    }

    fn active_count(mask: &GrayImage) -> usize {
        mask.as_raw().iter().filter(|&&v| v == ACTIVE).count()
    }

    #[test]
    fn test_rgb_to_hls_white_black() {
        assert_eq!(rgb_to_hls(255, 255, 255), [0, 255, 0]);
        assert_eq!(rgb_to_hls(0, 0, 0), [0, 0, 0]);
    }

    #[test]
    fn test_rgb_to_hls_yellow() {
        // 60 degrees -> 30 on the halved scale, full saturation
        assert_eq!(rgb_to_hls(255, 255, 0), [30, 128, 255]);
    }

    #[test]
    fn test_rgb_to_hls_blue_hue() {
        let [h, _, s] = rgb_to_hls(0, 0, 255);
        assert_eq!(h, 120);
        assert_eq!(s, 255);
    }

    #[test]
    fn test_white_and_black_frame_equals_white_mask() {
        let config = ColorConfig::default();
        let frame = banded_frame([255, 255, 255], [0, 0, 0]);

        let combined = lane_color_mask(&frame, &config);
        let white = white_mask(&frame, &config);

        assert_eq!(combined, white);
        assert_eq!(active_count(&white), 100);
        assert_eq!(active_count(&yellow_mask(&frame, &config)), 0);
    }

    #[test]
    fn test_yellow_region_is_added_by_or() {
        let config = ColorConfig::default();
        let frame = banded_frame([255, 255, 255], [255, 255, 0]);

        let combined = lane_color_mask(&frame, &config);
        assert_eq!(active_count(&combined), 200);
        for y in 0..10 {
            assert_eq!(combined.get_pixel(5, y)[0], ACTIVE);
            assert_eq!(combined.get_pixel(15, y)[0], ACTIVE);
            assert_eq!(combined.get_pixel(25, y)[0], 0);
        }
        // Pure yellow is not light enough to count as white
        assert_eq!(active_count(&white_mask(&frame, &config)), 100);
    }

    #[test]
    fn test_filter_zeroes_outside_mask() {
        let config = ColorConfig::default();
        let frame = banded_frame([240, 240, 240], [90, 90, 90]);
        let filtered = filter_lane_colors(&frame, &config);

        assert_eq!(filtered.width, frame.width);
        assert_eq!(filtered.height, frame.height);
        assert_eq!(filtered.pixel(3, 3), [240, 240, 240]);
        assert_eq!(filtered.pixel(12, 3), [0, 0, 0]);
    }

    #[test]
    fn test_all_zero_frame_yields_all_zero_mask() {
        let frame = Frame::new(vec![0u8; 8 * 8 * 3], 8, 8).unwrap();
        let mask = lane_color_mask(&frame, &ColorConfig::default());
        assert_eq!(active_count(&mask), 0);
    }
}

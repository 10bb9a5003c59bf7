// src/analysis/sliding_window.rs
//
// Sliding-window lane pixel search.
//
// 1. Column histogram of active cells in the bottom half seeds one start x
//    per side (left half / right half, lowest column wins ties).
// 2. The height is cut into `num_windows` equal bands, walked bottom → top.
// 3. Each band collects active cells within ±margin of the side's current x.
// 4. A band holding more than `min_pixels` cells moves that side's x to the
//    (truncated) mean x of those cells; otherwise x carries over.
//
// The walk state lives in a `WindowCursor` local to one call. Nothing
// carries over between frames, and a noisy seed is followed to the top
// with no retry.
//
// When the height is not a multiple of `num_windows`, the leftover rows at
// the top are never scanned.

use crate::types::{EdgeMap, LanePixelSet, SlidingWindowConfig};
use tracing::debug;

/// Pixel sets for both sides of one frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanePixels {
    pub left: LanePixelSet,
    pub right: LanePixelSet,
}

impl LanePixels {
    pub fn is_empty(&self) -> bool {
        self.left.is_empty() && self.right.is_empty()
    }
}

/// Per-call walk state.
#[derive(Debug, Clone, Copy)]
struct WindowCursor {
    left_x: i64,
    right_x: i64,
}

/// Active cells per column over rows `[height / 2, height)`.
pub fn bottom_half_histogram(edges: &EdgeMap) -> Vec<u32> {
    let (width, height) = edges.dimensions();
    let mut histogram = vec![0u32; width as usize];
    for y in height / 2..height {
        for x in 0..width {
            if edges.get_pixel(x, y)[0] != 0 {
                histogram[x as usize] += 1;
            }
        }
    }
    histogram
}

/// Index of the first maximum. 0 for an empty slice.
pub fn argmax_first(values: &[u32]) -> usize {
    let mut best = 0usize;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}

/// Start columns `(left, right)`: peaks of the left and right halves.
pub fn histogram_bases(histogram: &[u32]) -> (usize, usize) {
    let midpoint = histogram.len() / 2;
    let left = argmax_first(&histogram[..midpoint]);
    let right = midpoint + argmax_first(&histogram[midpoint..]);
    (left, right)
}

/// Collect active cells of rows `[y_low, y_high)` and columns `[x_low, x_high)`,
/// clamped to the map, into `out`. Returns `(count, sum_x)` for this window.
fn collect_window(
    edges: &EdgeMap,
    y_low: i64,
    y_high: i64,
    x_low: i64,
    x_high: i64,
    out: &mut LanePixelSet,
) -> (usize, u64) {
    let (width, height) = edges.dimensions();
    let y0 = y_low.max(0);
    let y1 = y_high.min(height as i64);
    let x0 = x_low.max(0);
    let x1 = x_high.min(width as i64);

    let mut count = 0usize;
    let mut sum_x = 0u64;
    for y in y0..y1 {
        for x in x0..x1 {
            if edges.get_pixel(x as u32, y as u32)[0] != 0 {
                out.push(x as u32, y as u32);
                count += 1;
                sum_x += x as u64;
            }
        }
    }
    (count, sum_x)
}

pub fn find_lane_pixels(edges: &EdgeMap, config: &SlidingWindowConfig) -> LanePixels {
    let histogram = bottom_half_histogram(edges);
    let (left_base, right_base) = histogram_bases(&histogram);

    debug!(
        "Histogram bases: left={} right={} (width={})",
        left_base,
        right_base,
        histogram.len()
    );

    let height = edges.height() as i64;
    let num_windows = config.num_windows.max(1) as i64;
    let window_height = height / num_windows;
    let margin = config.margin as i64;

    let mut cursor = WindowCursor {
        left_x: left_base as i64,
        right_x: right_base as i64,
    };
    let mut pixels = LanePixels::default();

    for window in 0..num_windows {
        let y_low = height - (window + 1) * window_height;
        let y_high = height - window * window_height;

        let (left_count, left_sum) = collect_window(
            edges,
            y_low,
            y_high,
            cursor.left_x - margin,
            cursor.left_x + margin,
            &mut pixels.left,
        );
        let (right_count, right_sum) = collect_window(
            edges,
            y_low,
            y_high,
            cursor.right_x - margin,
            cursor.right_x + margin,
            &mut pixels.right,
        );

        if left_count > config.min_pixels {
            cursor.left_x = (left_sum / left_count as u64) as i64;
        }
        if right_count > config.min_pixels {
            cursor.right_x = (right_sum / right_count as u64) as i64;
        }

        debug!(
            "  Window {} rows [{}, {}): left {} px → x={}, right {} px → x={}",
            window, y_low, y_high, left_count, cursor.left_x, right_count, cursor.right_x
        );
    }

    pixels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ACTIVE;
    use image::{GrayImage, Luma};

    #[test]
    fn test_argmax_picks_lowest_index_on_tie() {
        assert_eq!(argmax_first(&[1, 4, 2, 4, 0]), 1);
        assert_eq!(argmax_first(&[0, 0, 0]), 0);
        assert_eq!(argmax_first(&[]), 0);
    }

    #[test]
    fn test_histogram_bases_tie_break_is_reproducible() {
        // Left half peaks at 1 and 2, right half peaks at 5 and 6
        let histogram = [0, 7, 7, 1, 0, 3, 3, 2];
        for _ in 0..3 {
            assert_eq!(histogram_bases(&histogram), (1, 5));
        }
    }

    #[test]
    fn test_histogram_counts_bottom_half_only() {
        let mut edges = GrayImage::new(4, 6);
        edges.put_pixel(1, 0, Luma([ACTIVE])); // top half, ignored
        edges.put_pixel(1, 3, Luma([ACTIVE]));
        edges.put_pixel(1, 5, Luma([ACTIVE]));
        edges.put_pixel(3, 4, Luma([ACTIVE]));
        assert_eq!(bottom_half_histogram(&edges), vec![0, 2, 0, 1]);
    }

    #[test]
    fn test_empty_map_yields_empty_sets() {
        let edges = GrayImage::new(320, 180);
        let pixels = find_lane_pixels(&edges, &SlidingWindowConfig::default());
        assert!(pixels.left.is_empty());
        assert!(pixels.right.is_empty());
        assert!(pixels.is_empty());
    }

    #[test]
    fn test_two_vertical_lines_split_by_side() {
        let mut edges = GrayImage::new(400, 180);
        for y in 0..180 {
            edges.put_pixel(80, y, Luma([ACTIVE]));
            edges.put_pixel(300, y, Luma([ACTIVE]));
        }
        let pixels = find_lane_pixels(&edges, &SlidingWindowConfig::default());

        assert_eq!(pixels.left.len(), 180);
        assert_eq!(pixels.right.len(), 180);
        assert!(pixels.left.xs().iter().all(|&x| x == 80));
        assert!(pixels.right.xs().iter().all(|&x| x == 300));
        // Bottom band is collected first
        assert_eq!(pixels.left.ys()[0], 160);
    }

    #[test]
    fn test_window_recenters_only_above_min_pixels() {
        // Band height 20 with one cell per row: 20 cells never exceeds 50,
        // so the cursor stays on the seed and a drifting line escapes it.
        let config = SlidingWindowConfig {
            num_windows: 9,
            margin: 10,
            min_pixels: 50,
        };
        let mut edges = GrayImage::new(200, 180);
        for y in 0..180u32 {
            let x = if y >= 90 { 40 } else { 70 };
            edges.put_pixel(x, y, Luma([ACTIVE]));
        }
        let pixels = find_lane_pixels(&edges, &config);
        assert!(pixels.left.xs().iter().all(|&x| x == 40));
        assert_eq!(pixels.left.len(), 90);

        // With a low threshold and wider margin the window follows the jump
        let follow = SlidingWindowConfig {
            min_pixels: 5,
            margin: 40,
            ..config
        };
        let pixels = find_lane_pixels(&edges, &follow);
        assert_eq!(pixels.left.len(), 180);
    }

    #[test]
    fn test_windows_clamped_at_image_edges() {
        // Line hugging column 0 puts the window partly off-image
        let mut edges = GrayImage::new(120, 90);
        for y in 0..90 {
            edges.put_pixel(0, y, Luma([ACTIVE]));
            edges.put_pixel(119, y, Luma([ACTIVE]));
        }
        let pixels = find_lane_pixels(&edges, &SlidingWindowConfig::default());
        assert_eq!(pixels.left.len(), 90);
        assert_eq!(pixels.right.len(), 90);
    }

    #[test]
    fn test_short_map_has_no_bands() {
        // Fewer rows than windows: band height is 0
        let mut edges = GrayImage::new(50, 5);
        for x in 0..50 {
            edges.put_pixel(x, 4, Luma([ACTIVE]));
        }
        let pixels = find_lane_pixels(&edges, &SlidingWindowConfig::default());
        assert!(pixels.is_empty());
    }
}

// src/road_overlay.rs
//
// Lane overlay rendering.
//
//   ┌─────────────────────────────────────────────┐
//   │                                             │
//   │          ║▒▒▒▒▒▒▒▒▒▒▒▒▒▒▒▒▒▒▒▒▒║             │
//   │         ║▒▒▒▒▒ lane area ▒▒▒▒▒▒▒║            │
//   │        ║▒▒▒▒▒▒▒▒▒▒▒▒▒▒▒▒▒▒▒▒▒▒▒▒▒║           │
//   │   left ║▒▒▒▒▒▒▒▒▒▒▒▒▒▒▒▒▒▒▒▒▒▒▒▒▒▒║ right     │
//   └─────────────────────────────────────────────┘
//
// Each side is sampled at `samples` rows spread evenly over [0, H-1] and
// drawn as a thick polyline. The lane area is the polygon formed by the left
// samples followed by the right samples in reverse. Everything is drawn into
// a black overlay image, then blended onto the frame:
//
//   out = saturate(round(frame·frame_weight + overlay·overlay_weight + gamma))
//
// An absent side is sampled as x = 0 on every row, so a missing boundary
// shows up as a band along the left image edge and the fill spans from it.

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_polygon_mut};
use imageproc::point::Point;
use tracing::debug;

use crate::types::{Frame, OverlayConfig, PolynomialCurve};

/// Pixel coordinates beyond this are clamped before drawing.
const COORD_LIMIT: f64 = 32767.0;

// ============================================================================
// SAMPLING
// ============================================================================

/// Integer points of `curve` at `samples` rows evenly spaced over `[0, height-1]`.
/// `None` yields x = 0 for every row.
pub fn sample_curve_points(
    curve: Option<&PolynomialCurve>,
    height: usize,
    samples: usize,
) -> Vec<Point<i32>> {
    let last_row = height.saturating_sub(1) as f64;
    (0..samples)
        .map(|i| {
            let y = if samples > 1 {
                last_row * i as f64 / (samples - 1) as f64
            } else {
                0.0
            };
            let x = curve.map_or(0.0, |c| c.eval(y));
            Point::new(to_pixel(x), to_pixel(y))
        })
        .collect()
}

fn to_pixel(v: f64) -> i32 {
    if v.is_nan() {
        return 0;
    }
    v.clamp(-COORD_LIMIT, COORD_LIMIT) as i32
}

// ============================================================================
// PRIMITIVES
// ============================================================================

/// Open polyline of the given thickness: one quad per segment plus a round
/// joint at every vertex.
pub fn draw_thick_polyline(
    img: &mut RgbImage,
    points: &[Point<i32>],
    thickness: u32,
    color: Rgb<u8>,
) {
    let half = thickness as f64 / 2.0;
    let radius = (thickness / 2) as i32;

    for seg in points.windows(2) {
        let (p0, p1) = (seg[0], seg[1]);
        let dx = (p1.x - p0.x) as f64;
        let dy = (p1.y - p0.y) as f64;
        let len = (dx * dx + dy * dy).sqrt();
        if len < 1e-9 || thickness <= 1 {
            continue;
        }

        // Unit normal scaled to half the thickness
        let nx = -dy / len * half;
        let ny = dx / len * half;
        let quad = [
            offset(p0, nx, ny),
            offset(p1, nx, ny),
            offset(p1, -nx, -ny),
            offset(p0, -nx, -ny),
        ];
        fill_polygon(img, &quad, color);
    }

    for p in points {
        draw_filled_circle_mut(img, (p.x, p.y), radius, color);
    }
}

fn offset(p: Point<i32>, dx: f64, dy: f64) -> Point<i32> {
    Point::new(
        to_pixel(p.x as f64 + dx.round()),
        to_pixel(p.y as f64 + dy.round()),
    )
}

/// Filled polygon that tolerates repeated and closing vertices.
pub fn fill_polygon(img: &mut RgbImage, points: &[Point<i32>], color: Rgb<u8>) {
    let mut poly: Vec<Point<i32>> = Vec::with_capacity(points.len());
    for &p in points {
        if poly.last() != Some(&p) {
            poly.push(p);
        }
    }
    // The fill routine refuses a closing vertex equal to the first one
    while poly.len() > 1 && poly[0] == poly[poly.len() - 1] {
        poly.pop();
    }

    match poly.len() {
        0 => {}
        1 => {
            let p = poly[0];
            if p.x >= 0 && p.y >= 0 && (p.x as u32) < img.width() && (p.y as u32) < img.height()
            {
                img.put_pixel(p.x as u32, p.y as u32, color);
            }
        }
        _ => draw_polygon_mut(img, &poly, color),
    }
}

/// Per-channel weighted sum of `frame` and `overlay`, rounded and saturated.
pub fn blend_weighted(frame: &Frame, overlay: &RgbImage, config: &OverlayConfig) -> Frame {
    let data = frame
        .data
        .iter()
        .zip(overlay.as_raw().iter())
        .map(|(&f, &o)| {
            let v = f as f64 * config.frame_weight + o as f64 * config.overlay_weight + config.gamma;
            v.round().clamp(0.0, 255.0) as u8
        })
        .collect();

    Frame {
        data,
        width: frame.width,
        height: frame.height,
        timestamp_ms: frame.timestamp_ms,
    }
}

// ============================================================================
// RENDER
// ============================================================================

/// Draw both boundaries and the lane area onto a copy of `frame`.
pub fn render_lane_overlay(
    frame: &Frame,
    left: Option<&PolynomialCurve>,
    right: Option<&PolynomialCurve>,
    config: &OverlayConfig,
) -> Frame {
    let color = Rgb(config.color);
    let mut overlay = RgbImage::new(frame.width as u32, frame.height as u32);

    let left_pts = sample_curve_points(left, frame.height, config.samples);
    let right_pts = sample_curve_points(right, frame.height, config.samples);

    draw_thick_polyline(&mut overlay, &left_pts, config.thickness, color);
    draw_thick_polyline(&mut overlay, &right_pts, config.thickness, color);

    let lane_area: Vec<Point<i32>> = left_pts
        .iter()
        .chain(right_pts.iter().rev())
        .copied()
        .collect();
    fill_polygon(&mut overlay, &lane_area, color);

    debug!(
        "Overlay: left={} right={} samples={} thickness={}",
        left.is_some(),
        right.is_some(),
        config.samples,
        config.thickness
    );

    blend_weighted(frame, &overlay, config)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_frame(w: usize, h: usize, v: u8) -> Frame {
        Frame::new(vec![v; w * h * 3], w, h).unwrap()
    }

    #[test]
    fn test_samples_span_full_height() {
        let curve = PolynomialCurve::from_coefficients(0.0, 0.5, 10.0);
        let pts = sample_curve_points(Some(&curve), 100, 100);
        assert_eq!(pts.len(), 100);
        assert_eq!(pts[0], Point::new(10, 0));
        assert_eq!(pts[99], Point::new(59, 99));
    }

    #[test]
    fn test_absent_curve_samples_at_zero() {
        let pts = sample_curve_points(None, 480, 100);
        assert_eq!(pts.len(), 100);
        assert!(pts.iter().all(|p| p.x == 0));
        assert_eq!(pts[99].y, 479);
    }

    #[test]
    fn test_runaway_coordinates_are_clamped() {
        let curve = PolynomialCurve::from_coefficients(1e9, 0.0, 0.0);
        let pts = sample_curve_points(Some(&curve), 50, 10);
        assert_eq!(pts[9].x, 32767);
    }

    #[test]
    fn test_absent_curves_draw_degenerate_band_at_left_edge() {
        let frame = solid_frame(200, 120, 50);
        let out = render_lane_overlay(&frame, None, None, &OverlayConfig::default());

        // 50·1.0 + 255·0.8 = 254 on green, others keep 50
        assert_eq!(out.pixel(0, 60), [50, 254, 50]);
        assert_eq!(out.pixel(3, 60), [50, 254, 50]);
        // Far from the band nothing changes
        assert_eq!(out.pixel(60, 60), [50, 50, 50]);
        assert_eq!(out.pixel(199, 119), [50, 50, 50]);
        assert_ne!(out, frame);
    }

    #[test]
    fn test_lane_area_is_filled_between_curves() {
        let frame = solid_frame(400, 200, 0);
        let left = PolynomialCurve::from_coefficients(0.0, 0.0, 100.0);
        let right = PolynomialCurve::from_coefficients(0.0, 0.0, 300.0);
        let out = render_lane_overlay(&frame, Some(&left), Some(&right), &OverlayConfig::default());

        assert_eq!(out.pixel(200, 100), [0, 204, 0]); // inside
        assert_eq!(out.pixel(100, 100), [0, 204, 0]); // on the boundary
        assert_eq!(out.pixel(20, 100), [0, 0, 0]);
        assert_eq!(out.pixel(380, 100), [0, 0, 0]);
    }

    #[test]
    fn test_one_side_absent_still_renders() {
        let frame = solid_frame(300, 100, 0);
        let right = PolynomialCurve::from_coefficients(0.0, 0.0, 200.0);
        let out = render_lane_overlay(&frame, None, Some(&right), &OverlayConfig::default());
        assert_eq!(out.pixel(100, 50), [0, 204, 0]);
        assert_eq!(out.pixel(280, 50), [0, 0, 0]);
    }

    #[test]
    fn test_output_dimensions_match_input() {
        for &(w, h) in &[(1usize, 1usize), (7, 3), (64, 200), (321, 17)] {
            let frame = solid_frame(w, h, 10);
            let curve = PolynomialCurve::from_coefficients(0.01, -2.0, w as f64 / 2.0);
            let out =
                render_lane_overlay(&frame, Some(&curve), None, &OverlayConfig::default());
            assert_eq!((out.width, out.height), (w, h));
            assert_eq!(out.data.len(), w * h * 3);
        }
    }

    #[test]
    fn test_blend_saturates_at_ceiling() {
        let frame = solid_frame(2, 1, 200);
        let overlay = RgbImage::from_pixel(2, 1, Rgb([255, 0, 10]));
        let out = blend_weighted(&frame, &overlay, &OverlayConfig::default());
        assert_eq!(out.pixel(0, 0), [255, 200, 208]);
    }

    #[test]
    fn test_fill_polygon_tolerates_degenerate_input() {
        let mut img = RgbImage::new(10, 10);
        let green = Rgb([0, 255, 0]);
        fill_polygon(&mut img, &[], green);
        fill_polygon(&mut img, &[Point::new(3, 3), Point::new(3, 3)], green);
        assert_eq!(*img.get_pixel(3, 3), green);
        // Closed ring with the first vertex repeated at the end
        let ring = [
            Point::new(1, 1),
            Point::new(8, 1),
            Point::new(8, 8),
            Point::new(1, 1),
        ];
        fill_polygon(&mut img, &ring, green);
        assert_eq!(*img.get_pixel(7, 2), green);
    }
}

// src/region.rs
//
// Fixed trapezoidal region of interest.
//
//        (top_left_x·W, top_y·H)   (top_right_x·W, top_y·H)
//                   ┌──────────────┐
//                  ╱                ╲
//                 ╱                  ╲
//                └────────────────────┘
//   (bottom_left_x·W, H)        (bottom_right_x·W, H)
//
// Assumes a forward-facing camera with the horizon near the vertical middle.
// Vertices are truncated to integers before filling, and the polygon
// boundary itself counts as inside.

use crate::types::{EdgeMap, RegionConfig, ACTIVE};
use image::{GrayImage, Luma};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point;

/// Trapezoid vertices in drawing order: bottom-left, top-left, top-right, bottom-right.
pub fn roi_vertices(width: u32, height: u32, config: &RegionConfig) -> [Point<i32>; 4] {
    let w = width as f64;
    let h = height as f64;
    let top = (config.top_y * h) as i32;
    [
        Point::new((config.bottom_left_x * w) as i32, height as i32),
        Point::new((config.top_left_x * w) as i32, top),
        Point::new((config.top_right_x * w) as i32, top),
        Point::new((config.bottom_right_x * w) as i32, height as i32),
    ]
}

/// 255 inside the trapezoid, 0 outside.
pub fn region_mask(width: u32, height: u32, config: &RegionConfig) -> GrayImage {
    let mut mask = GrayImage::new(width, height);
    if width == 0 || height == 0 {
        return mask;
    }

    let mut poly = roi_vertices(width, height, config).to_vec();
    // The fill routine refuses a closing vertex equal to the first one
    while poly.len() > 1 && poly[0] == poly[poly.len() - 1] {
        poly.pop();
    }
    if poly.len() > 1 {
        draw_polygon_mut(&mut mask, &poly, Luma([ACTIVE]));
    }
    mask
}

/// Zero every cell of `edges` outside the trapezoid.
pub fn apply_region_of_interest(edges: &EdgeMap, config: &RegionConfig) -> EdgeMap {
    let mask = region_mask(edges.width(), edges.height(), config);
    let mut out = edges.clone();
    for (cell, m) in out.iter_mut().zip(mask.as_raw().iter()) {
        if *m != ACTIVE {
            *cell = 0;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_map(w: u32, h: u32) -> EdgeMap {
        GrayImage::from_pixel(w, h, Luma([ACTIVE]))
    }

    #[test]
    fn test_vertices_follow_ratios() {
        let v = roi_vertices(200, 100, &RegionConfig::default());
        assert_eq!(v[0], Point::new(10, 100));
        assert_eq!(v[1], Point::new(90, 60));
        assert_eq!(v[2], Point::new(110, 60));
        assert_eq!(v[3], Point::new(200, 100));
    }

    #[test]
    fn test_cells_outside_trapezoid_are_zeroed() {
        let roi = apply_region_of_interest(&full_map(200, 100), &RegionConfig::default());
        // Above the top edge
        assert_eq!(roi.get_pixel(100, 10)[0], 0);
        assert_eq!(roi.get_pixel(100, 59)[0], 0);
        // Just inside the narrow top
        assert_eq!(roi.get_pixel(100, 61)[0], ACTIVE);
        // Bottom row: left of the base is outside, the rest inside
        assert_eq!(roi.get_pixel(2, 99)[0], 0);
        assert_eq!(roi.get_pixel(20, 99)[0], ACTIVE);
        assert_eq!(roi.get_pixel(190, 99)[0], ACTIVE);
        // Upper corners of the lower half are outside the slanted sides
        assert_eq!(roi.get_pixel(5, 65)[0], 0);
        assert_eq!(roi.get_pixel(195, 65)[0], 0);
    }

    #[test]
    fn test_region_masking_is_idempotent() {
        let config = RegionConfig::default();
        let mut edges = GrayImage::new(160, 120);
        for (i, px) in edges.iter_mut().enumerate() {
            if i % 7 == 0 || i % 11 == 3 {
                *px = ACTIVE;
            }
        }
        let once = apply_region_of_interest(&edges, &config);
        let twice = apply_region_of_interest(&once, &config);
        assert_eq!(once, twice);
        assert_ne!(once, edges);
    }

    #[test]
    fn test_dimensions_unchanged() {
        let roi = apply_region_of_interest(&full_map(33, 17), &RegionConfig::default());
        assert_eq!(roi.dimensions(), (33, 17));
    }
}

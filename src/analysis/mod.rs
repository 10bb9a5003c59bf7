// src/analysis/mod.rs
//
// Lane geometry from a masked edge map.
//
// Signal flow:
//   ROI EdgeMap → sliding_window (histogram seed + banded walk) → LanePixelSet ×2
//   LanePixelSet → curve_fit (quadratic x = f(y)) → PolynomialCurve
//   PolynomialCurve → departure (offset at reference height) → DepartureStatus

pub mod curve_fit;
pub mod departure;
pub mod sliding_window;

pub use curve_fit::{fit_all_active, fit_lane_curve, fit_least_squares, fit_ransac};
pub use departure::{check_lane_departure, lane_center_curve, reference_y};
pub use sliding_window::{
    argmax_first, bottom_half_histogram, find_lane_pixels, histogram_bases, LanePixels,
};

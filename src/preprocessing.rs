// src/preprocessing.rs
//
// Edge extraction: grayscale -> fixed-kernel smoothing -> two-threshold
// (Canny) edge operator. Output cells are either 0 or 255.

use crate::types::{EdgeConfig, EdgeMap, Frame};
use image::GrayImage;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use tracing::debug;

/// Luma with BT.601 weights, rounded to nearest.
pub fn to_grayscale(frame: &Frame) -> GrayImage {
    let mut gray = Vec::with_capacity(frame.width * frame.height);
    for px in frame.data.chunks_exact(3) {
        let r = px[0] as f32;
        let g = px[1] as f32;
        let b = px[2] as f32;
        gray.push((0.299 * r + 0.587 * g + 0.114 * b).round().min(255.0) as u8);
    }
    GrayImage::from_raw(frame.width as u32, frame.height as u32, gray)
        .unwrap_or_else(|| GrayImage::new(frame.width as u32, frame.height as u32))
}

/// Gaussian sigma for a square kernel of side `kernel`, same rule OpenCV
/// applies when sigma is left at 0.
pub fn kernel_sigma(kernel: u32) -> f32 {
    0.3 * ((kernel as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

pub fn extract_edges(frame: &Frame, config: &EdgeConfig) -> EdgeMap {
    let gray = to_grayscale(frame);
    let sigma = kernel_sigma(config.blur_kernel);
    let blurred = gaussian_blur_f32(&gray, sigma);
    let edges = canny(&blurred, config.low_threshold, config.high_threshold);

    debug!(
        "Edges: sigma={:.2} thresholds=({}, {}) active={}",
        sigma,
        config.low_threshold,
        config.high_threshold,
        edges.as_raw().iter().filter(|&&v| v != 0).count()
    );

    edges
}

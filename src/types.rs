// src/types.rs

use crate::error::LaneError;
use image::{GrayImage, RgbImage};
use serde::{Deserialize, Serialize};

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub color: ColorConfig,
    pub edges: EdgeConfig,
    pub region: RegionConfig,
    pub sliding_window: SlidingWindowConfig,
    pub fit: FitConfig,
    pub departure: DepartureConfig,
    pub overlay: OverlayConfig,
    pub video: VideoConfig,
    pub logging: LoggingConfig,
}

/// Inclusive per-channel range in 8-bit HLS space (H in [0, 180), L and S in [0, 255]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HlsRange {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl HlsRange {
    #[inline]
    pub fn contains(&self, hls: [u8; 3]) -> bool {
        (0..3).all(|c| hls[c] >= self.lower[c] && hls[c] <= self.upper[c])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    pub white: HlsRange,
    pub yellow: HlsRange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeConfig {
    /// Side length of the smoothing kernel. Must be odd.
    pub blur_kernel: u32,
    pub low_threshold: f32,
    pub high_threshold: f32,
}

/// Trapezoid ratios, relative to frame width (x) and height (y).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionConfig {
    pub bottom_left_x: f64,
    pub top_left_x: f64,
    pub top_right_x: f64,
    pub bottom_right_x: f64,
    pub top_y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlidingWindowConfig {
    pub num_windows: usize,
    /// Half-width of each search window in pixels.
    pub margin: usize,
    /// A window must hold MORE than this many cells to recenter.
    pub min_pixels: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitStrategy {
    LeastSquares,
    Ransac,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RansacConfig {
    pub max_iters: usize,
    /// Horizontal residual (px) under which a point counts as an inlier.
    pub inlier_threshold_px: f64,
    pub min_inliers: usize,
    pub seed: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitConfig {
    /// Pixel sets smaller than this are treated as empty.
    pub min_points: usize,
    pub strategy: FitStrategy,
    pub ransac: RansacConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepartureConfig {
    pub threshold_px: f64,
    /// Vehicle reference x. `None` means half the frame width.
    pub vehicle_x: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub samples: usize,
    pub thickness: u32,
    pub color: [u8; 3],
    pub frame_weight: f64,
    pub overlay_weight: f64,
    pub gamma: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// A single image file or a directory of frames.
    pub input: String,
    pub output_dir: String,
    pub save_annotated: bool,
    /// JSON-lines file receiving departure events.
    pub events_file: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

// ============================================================================
// FRAME DATA
// ============================================================================

/// One RGB video frame, row-major, 3 bytes per pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub data: Vec<u8>,
    pub width: usize,
    pub height: usize,
    pub timestamp_ms: f64,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: usize, height: usize) -> Result<Self, LaneError> {
        let frame = Self {
            data,
            width,
            height,
            timestamp_ms: 0.0,
        };
        frame.validate()?;
        Ok(frame)
    }

    /// Rejects zero-area frames and buffers that are not `width * height * 3` bytes.
    pub fn validate(&self) -> Result<(), LaneError> {
        if self.width == 0 || self.height == 0 {
            return Err(LaneError::EmptyFrame {
                width: self.width,
                height: self.height,
            });
        }
        let expected = self.width * self.height * 3;
        if self.data.len() != expected {
            return Err(LaneError::ChannelMismatch {
                expected,
                actual: self.data.len(),
            });
        }
        Ok(())
    }

    pub fn from_rgb_image(img: RgbImage) -> Self {
        let width = img.width() as usize;
        let height = img.height() as usize;
        Self {
            data: img.into_raw(),
            width,
            height,
            timestamp_ms: 0.0,
        }
    }

    /// Returns `None` when the buffer does not match the dimensions.
    pub fn to_rgb_image(&self) -> Option<RgbImage> {
        RgbImage::from_raw(self.width as u32, self.height as u32, self.data.clone())
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 3] {
        let idx = (y * self.width + x) * 3;
        [self.data[idx], self.data[idx + 1], self.data[idx + 2]]
    }
}

/// Binary single-channel map: 0 = inactive, [`ACTIVE`] = active.
pub type EdgeMap = GrayImage;

pub const ACTIVE: u8 = 255;

// ============================================================================
// LANE GEOMETRY
// ============================================================================

/// Coordinates believed to belong to one lane boundary, in window order.
///
/// The two sequences only grow together through [`LanePixelSet::push`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanePixelSet {
    xs: Vec<u32>,
    ys: Vec<u32>,
}

impl LanePixelSet {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn push(&mut self, x: u32, y: u32) {
        self.xs.push(x);
        self.ys.push(y);
    }

    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    pub fn xs(&self) -> &[u32] {
        &self.xs
    }

    pub fn ys(&self) -> &[u32] {
        &self.ys
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.xs.iter().copied().zip(self.ys.iter().copied())
    }

    /// Points as `(x, y)` floats, ready for fitting.
    pub fn to_points(&self) -> Vec<(f64, f64)> {
        self.iter().map(|(x, y)| (x as f64, y as f64)).collect()
    }
}

/// Lane boundary curve x = a·y² + b·y + c in image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolynomialCurve {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    /// Number of points the curve was fitted to.
    pub num_points: usize,
    /// RMS horizontal residual of the fit, in pixels.
    pub rmse_px: f64,
}

impl PolynomialCurve {
    pub fn from_coefficients(a: f64, b: f64, c: f64) -> Self {
        Self {
            a,
            b,
            c,
            num_points: 0,
            rmse_px: 0.0,
        }
    }

    #[inline]
    pub fn eval(&self, y: f64) -> f64 {
        self.a * y * y + self.b * y + self.c
    }

    /// Coefficient-wise mean of two curves.
    pub fn mean(&self, other: &Self) -> Self {
        Self {
            a: (self.a + other.a) / 2.0,
            b: (self.b + other.b) / 2.0,
            c: (self.c + other.c) / 2.0,
            num_points: self.num_points + other.num_points,
            rmse_px: (self.rmse_px + other.rmse_px) / 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaneSide {
    Left,
    Right,
    /// Midline between both boundaries.
    Center,
}

impl LaneSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
            Self::Center => "CENTER",
        }
    }
}

/// Result of comparing the vehicle x against one lane curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepartureStatus {
    pub side: LaneSide,
    /// Curve x at the reference point.
    pub lane_x: f64,
    pub vehicle_x: f64,
    pub offset_px: f64,
    pub departing: bool,
}

/// Per-frame fitting result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LaneFinding {
    /// At least one side has a curve.
    Lanes {
        left: Option<PolynomialCurve>,
        right: Option<PolynomialCurve>,
    },
    NoLanes,
}

impl LaneFinding {
    pub fn from_fits(left: Option<PolynomialCurve>, right: Option<PolynomialCurve>) -> Self {
        if left.is_none() && right.is_none() {
            Self::NoLanes
        } else {
            Self::Lanes { left, right }
        }
    }

    pub fn is_detected(&self) -> bool {
        matches!(self, Self::Lanes { .. })
    }

    pub fn left(&self) -> Option<&PolynomialCurve> {
        match self {
            Self::Lanes { left, .. } => left.as_ref(),
            Self::NoLanes => None,
        }
    }

    pub fn right(&self) -> Option<&PolynomialCurve> {
        match self {
            Self::Lanes { right, .. } => right.as_ref(),
            Self::NoLanes => None,
        }
    }
}

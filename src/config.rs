// src/config.rs

use crate::error::LaneError;
use crate::types::{
    ColorConfig, Config, DepartureConfig, EdgeConfig, FitConfig, FitStrategy, HlsRange,
    LoggingConfig, OverlayConfig, RansacConfig, RegionConfig, SlidingWindowConfig, VideoConfig,
};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("reading config {}", path))?;
        Self::from_yaml(&contents).with_context(|| format!("parsing config {}", path))
    }

    /// Loads `path` if it exists, otherwise returns the defaults.
    /// The flag reports whether the file was found.
    pub fn load_or_default(path: &str) -> Result<(Self, bool)> {
        if Path::new(path).exists() {
            Ok((Self::load(path)?, true))
        } else {
            Ok((Self::default(), false))
        }
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        // An empty document deserializes to unit, not to a map
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), LaneError> {
        let invalid = |msg: &str| Err(LaneError::InvalidConfig(msg.to_string()));

        if self.edges.blur_kernel == 0 || self.edges.blur_kernel % 2 == 0 {
            return invalid("edges.blur_kernel must be a positive odd number");
        }
        if !(self.edges.low_threshold >= 0.0 && self.edges.low_threshold <= self.edges.high_threshold)
        {
            return invalid("edges thresholds must satisfy 0 <= low <= high");
        }

        let r = &self.region;
        let ratios = [
            r.bottom_left_x,
            r.top_left_x,
            r.top_right_x,
            r.bottom_right_x,
            r.top_y,
        ];
        if ratios.iter().any(|v| !(0.0..=1.0).contains(v)) {
            return invalid("region ratios must lie in [0, 1]");
        }
        if r.bottom_left_x >= r.bottom_right_x || r.top_left_x > r.top_right_x {
            return invalid("region trapezoid must have left vertices before right vertices");
        }

        if self.sliding_window.num_windows == 0 {
            return invalid("sliding_window.num_windows must be at least 1");
        }

        if self.fit.min_points < 3 {
            return invalid("fit.min_points must be at least 3 for a quadratic");
        }
        if self.fit.strategy == FitStrategy::Ransac {
            let rc = &self.fit.ransac;
            if rc.max_iters == 0 || rc.min_inliers < 3 {
                return invalid("fit.ransac needs max_iters >= 1 and min_inliers >= 3");
            }
            if !(rc.inlier_threshold_px > 0.0) {
                return invalid("fit.ransac.inlier_threshold_px must be positive");
            }
        }

        if !(self.departure.threshold_px >= 0.0) {
            return invalid("departure.threshold_px must be non-negative");
        }
        if let Some(x) = self.departure.vehicle_x {
            if !x.is_finite() {
                return invalid("departure.vehicle_x must be finite");
            }
        }

        let o = &self.overlay;
        if o.samples == 0 || o.thickness == 0 {
            return invalid("overlay.samples and overlay.thickness must be at least 1");
        }
        if !(o.frame_weight.is_finite() && o.overlay_weight.is_finite() && o.gamma.is_finite()) {
            return invalid("overlay blend weights must be finite");
        }

        Ok(())
    }
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            white: HlsRange {
                lower: [0, 180, 0],
                upper: [255, 255, 255],
            },
            yellow: HlsRange {
                lower: [10, 60, 80],
                upper: [40, 255, 255],
            },
        }
    }
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            blur_kernel: 5,
            low_threshold: 50.0,
            high_threshold: 150.0,
        }
    }
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            bottom_left_x: 0.05,
            top_left_x: 0.45,
            top_right_x: 0.55,
            bottom_right_x: 1.0,
            top_y: 0.6,
        }
    }
}

impl Default for SlidingWindowConfig {
    fn default() -> Self {
        Self {
            num_windows: 9,
            margin: 100,
            min_pixels: 50,
        }
    }
}

impl Default for RansacConfig {
    fn default() -> Self {
        Self {
            max_iters: 100,
            inlier_threshold_px: 10.0,
            min_inliers: 3,
            seed: 42,
        }
    }
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            min_points: 3,
            strategy: FitStrategy::LeastSquares,
            ransac: RansacConfig::default(),
        }
    }
}

impl Default for DepartureConfig {
    fn default() -> Self {
        Self {
            threshold_px: 50.0,
            vehicle_x: None,
        }
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            samples: 100,
            thickness: 15,
            color: [0, 255, 0],
            frame_weight: 1.0,
            overlay_weight: 0.8,
            gamma: 0.0,
        }
    }
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            input: "frames".to_string(),
            output_dir: "output".to_string(),
            save_annotated: true,
            events_file: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "lane_finder=info".to_string(),
        }
    }
}

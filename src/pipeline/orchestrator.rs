// src/pipeline/orchestrator.rs
//
// Per-frame lane pipeline.
//
//   Frame → color mask → edges → region → window search → fit ×2
//         → departure (center curve) → overlay → FrameOutcome
//
// `process` borrows `self` immutably and allocates every intermediate
// buffer per call, so a single `LanePipeline` can serve several threads.

use std::time::Instant;
use tracing::debug;

use crate::analysis::{
    check_lane_departure, find_lane_pixels, fit_lane_curve, lane_center_curve, reference_y,
};
use crate::color_filter::filter_lane_colors;
use crate::error::LaneError;
use crate::pipeline::FrameOutcome;
use crate::preprocessing::extract_edges;
use crate::region::apply_region_of_interest;
use crate::road_overlay::render_lane_overlay;
use crate::types::{Config, Frame, LaneFinding};

#[derive(Debug, Clone)]
pub struct LanePipeline {
    config: Config,
}

impl LanePipeline {
    pub fn new(config: Config) -> Result<Self, LaneError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn process(&self, frame: &Frame) -> Result<FrameOutcome, LaneError> {
        frame.validate()?;
        let start = Instant::now();
        let cfg = &self.config;

        let filtered = filter_lane_colors(frame, &cfg.color);
        let edges = extract_edges(&filtered, &cfg.edges);
        let roi = apply_region_of_interest(&edges, &cfg.region);
        let pixels = find_lane_pixels(&roi, &cfg.sliding_window);

        if pixels.is_empty() {
            debug!("No lane pixels in {}x{} frame", frame.width, frame.height);
            return Ok(FrameOutcome::no_lanes(frame, pixels));
        }

        let left = fit_lane_curve(&pixels.left, &cfg.fit);
        let right = fit_lane_curve(&pixels.right, &cfg.fit);

        let finding = LaneFinding::from_fits(left, right);
        if !finding.is_detected() {
            debug!(
                "No lane fit (left {} px, right {} px)",
                pixels.left.len(),
                pixels.right.len()
            );
            return Ok(FrameOutcome::no_lanes(frame, pixels));
        }

        let vehicle_x = cfg
            .departure
            .vehicle_x
            .unwrap_or((frame.width / 2) as f64);
        let departure =
            lane_center_curve(left.as_ref(), right.as_ref()).map(|(side, curve)| {
                check_lane_departure(
                    &curve,
                    side,
                    reference_y(frame.width),
                    vehicle_x,
                    cfg.departure.threshold_px,
                )
            });

        let rendered = render_lane_overlay(frame, left.as_ref(), right.as_ref(), &cfg.overlay);

        debug!(
            "Frame done in {:.1}ms: left={} right={} departing={}",
            start.elapsed().as_secs_f64() * 1000.0,
            left.is_some(),
            right.is_some(),
            departure.map_or(false, |d| d.departing)
        );

        Ok(FrameOutcome {
            frame: rendered,
            finding,
            departure,
            left_pixels: pixels.left,
            right_pixels: pixels.right,
        })
    }
}

// src/pipeline/metrics.rs
//
// Run counters for the harness. Shared handles, so clones observe the same
// totals and can be updated from several worker threads.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::pipeline::FrameOutcome;

#[derive(Debug, Clone)]
pub struct PipelineMetrics {
    pub total_frames: Arc<AtomicU64>,
    pub frames_with_lanes: Arc<AtomicU64>,
    pub frames_without_lanes: Arc<AtomicU64>,
    pub departures: Arc<AtomicU64>,
    pub skipped_frames: Arc<AtomicU64>,
    pub processing_time_us: Arc<AtomicU64>,
    pub started_at: Instant,
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self {
            total_frames: Arc::new(AtomicU64::new(0)),
            frames_with_lanes: Arc::new(AtomicU64::new(0)),
            frames_without_lanes: Arc::new(AtomicU64::new(0)),
            departures: Arc::new(AtomicU64::new(0)),
            skipped_frames: Arc::new(AtomicU64::new(0)),
            processing_time_us: Arc::new(AtomicU64::new(0)),
            started_at: Instant::now(),
        }
    }

    pub fn inc(&self, counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_outcome(&self, outcome: &FrameOutcome, elapsed: Duration) {
        self.inc(&self.total_frames);
        if outcome.finding.is_detected() {
            self.inc(&self.frames_with_lanes);
        } else {
            self.inc(&self.frames_without_lanes);
        }
        if outcome.is_departing() {
            self.inc(&self.departures);
        }
        self.processing_time_us
            .fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn record_skipped(&self) {
        self.inc(&self.skipped_frames);
    }

    pub fn fps(&self) -> f64 {
        let frames = self.total_frames.load(Ordering::Relaxed);
        let elapsed = self.started_at.elapsed().as_secs_f64();
        if elapsed > 0.01 {
            frames as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        let total_frames = self.total_frames.load(Ordering::Relaxed);
        let total_us = self.processing_time_us.load(Ordering::Relaxed);
        MetricsSummary {
            total_frames,
            fps: self.fps(),
            frames_with_lanes: self.frames_with_lanes.load(Ordering::Relaxed),
            frames_without_lanes: self.frames_without_lanes.load(Ordering::Relaxed),
            departures: self.departures.load(Ordering::Relaxed),
            skipped_frames: self.skipped_frames.load(Ordering::Relaxed),
            avg_processing_us: if total_frames > 0 {
                total_us / total_frames
            } else {
                0
            },
            elapsed_secs: self.started_at.elapsed().as_secs_f64(),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricsSummary {
    pub total_frames: u64,
    pub fps: f64,
    pub frames_with_lanes: u64,
    pub frames_without_lanes: u64,
    pub departures: u64,
    pub skipped_frames: u64,
    pub avg_processing_us: u64,
    pub elapsed_secs: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DepartureStatus, Frame, LaneFinding, LanePixelSet, LaneSide, PolynomialCurve};

    fn outcome(detected: bool, departing: bool) -> FrameOutcome {
        let curve = PolynomialCurve::from_coefficients(0.0, 0.0, 1.0);
        FrameOutcome {
            frame: Frame::new(vec![0; 3], 1, 1).unwrap(),
            finding: if detected {
                LaneFinding::from_fits(Some(curve), None)
            } else {
                LaneFinding::NoLanes
            },
            departure: detected.then_some(DepartureStatus {
                side: LaneSide::Left,
                lane_x: 1.0,
                vehicle_x: 0.0,
                offset_px: 1.0,
                departing,
            }),
            left_pixels: LanePixelSet::new(),
            right_pixels: LanePixelSet::new(),
        }
    }

    #[test]
    fn test_summary_counts_outcomes() {
        let metrics = PipelineMetrics::new();
        let shared = metrics.clone();

        metrics.record_outcome(&outcome(true, false), Duration::from_micros(100));
        shared.record_outcome(&outcome(true, true), Duration::from_micros(300));
        metrics.record_outcome(&outcome(false, false), Duration::from_micros(200));
        metrics.record_skipped();

        let summary = metrics.summary();
        assert_eq!(summary.total_frames, 3);
        assert_eq!(summary.frames_with_lanes, 2);
        assert_eq!(summary.frames_without_lanes, 1);
        assert_eq!(summary.departures, 1);
        assert_eq!(summary.skipped_frames, 1);
        assert_eq!(summary.avg_processing_us, 200);
    }

    #[test]
    fn test_empty_summary_has_zero_average() {
        assert_eq!(PipelineMetrics::new().summary().avg_processing_us, 0);
    }
}

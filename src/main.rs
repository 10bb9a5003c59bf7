// src/main.rs

use anyhow::{Context, Result};
use lane_finder::pipeline::{EventBus, PipelineMetrics};
use lane_finder::video_processor::{load_frame, VideoProcessor};
use lane_finder::{Config, LanePipeline};
use std::path::Path;
use std::time::Instant;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_PATH: &str = "config.yaml";
const FRAME_INTERVAL_MS: f64 = 1000.0 / 30.0;

fn main() -> Result<()> {
    let config_path =
        std::env::var("LANE_FINDER_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let (config, found) = Config::load_or_default(&config_path)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("🛣️  Lane Finder Starting");
    if found {
        info!("✓ Configuration loaded from {}", config_path);
    } else {
        warn!("Config {} not found, using defaults", config_path);
    }

    info!(
        "Window search: {} windows, margin ±{}px, recenter > {}px | departure > {:.0}px | fit {:?}",
        config.sliding_window.num_windows,
        config.sliding_window.margin,
        config.sliding_window.min_pixels,
        config.departure.threshold_px,
        config.fit.strategy
    );

    let pipeline = LanePipeline::new(config.clone()).context("invalid configuration")?;
    let video_processor = VideoProcessor::new(config.video.clone());
    let frame_files = video_processor.find_frame_files()?;

    if frame_files.is_empty() {
        error!("No frame files found in {}", config.video.input);
        return Ok(());
    }

    let mut events_out = video_processor.open_event_writer()?;
    let mut bus = EventBus::new(256);
    let metrics = PipelineMetrics::new();

    for (idx, path) in frame_files.iter().enumerate() {
        let frame_id = idx as u64;
        let mut frame = match load_frame(path) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Skipping {}: {:#}", path.display(), e);
                metrics.record_skipped();
                continue;
            }
        };
        frame.timestamp_ms = frame_id as f64 * FRAME_INTERVAL_MS;

        let start = Instant::now();
        let outcome = match pipeline.process(&frame) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                metrics.record_skipped();
                continue;
            }
        };
        metrics.record_outcome(&outcome, start.elapsed());

        if let Some(d) = outcome.departure.filter(|d| d.departing) {
            info!(
                "Frame {} ({}): departing {} by {:.1}px",
                frame_id,
                path.display(),
                d.side.as_str(),
                d.offset_px
            );
        }

        if let Some(saved) = video_processor.save_annotated(path, &outcome.frame)? {
            log_progress(idx, frame_files.len(), &saved);
        }

        bus.publish_outcome(frame_id, &outcome);
        for event in bus.drain() {
            if let Some(writer) = events_out.as_mut() {
                if event.is_departure() {
                    writer.write(&event)?;
                }
            }
        }
    }

    if let Some(writer) = events_out {
        let written = writer.finish()?;
        info!("✓ {} departure event(s) written", written);
    }

    let summary = metrics.summary();
    info!("\n========================================");
    info!("✓ Run complete");
    info!("  Total frames: {}", summary.total_frames);
    info!(
        "  Frames with lanes: {} | without: {}",
        summary.frames_with_lanes, summary.frames_without_lanes
    );
    info!("  ⚠️  Departures: {}", summary.departures);
    info!("  Skipped frames: {}", summary.skipped_frames);
    info!(
        "  Avg processing: {}µs/frame | {:.1} FPS",
        summary.avg_processing_us, summary.fps
    );
    info!("========================================");

    Ok(())
}

fn log_progress(idx: usize, total: usize, saved: &Path) {
    if idx % 50 == 0 || idx + 1 == total {
        info!(
            "Progress: {}/{} ({:.1}%) → {}",
            idx + 1,
            total,
            (idx + 1) as f64 / total as f64 * 100.0,
            saved.display()
        );
    }
}

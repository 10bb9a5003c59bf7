// src/video_processor.rs
//
// Frame source and sink for the harness: image files on disk in, annotated
// PNGs and a JSON-lines event log out.

use crate::pipeline::PipelineEvent;
use crate::types::{Frame, VideoConfig};
use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

const FRAME_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

pub struct VideoProcessor {
    config: VideoConfig,
}

impl VideoProcessor {
    pub fn new(config: VideoConfig) -> Self {
        Self { config }
    }

    /// Image files under `input`, sorted by path. `input` may also name a
    /// single image file.
    pub fn find_frame_files(&self) -> Result<Vec<PathBuf>> {
        let input = Path::new(&self.config.input);
        if !input.exists() {
            anyhow::bail!("Input path does not exist: {}", input.display());
        }

        let mut frames: Vec<PathBuf> = WalkDir::new(input)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| is_frame_file(p))
            .collect();
        frames.sort();

        info!("Found {} frame file(s) in {}", frames.len(), input.display());
        Ok(frames)
    }

    /// Annotated output path: `<output_dir>/<stem>_lanes.png`.
    pub fn output_path(&self, input: &Path) -> PathBuf {
        let stem = input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("frame");
        Path::new(&self.config.output_dir).join(format!("{stem}_lanes.png"))
    }

    pub fn save_annotated(&self, input: &Path, frame: &Frame) -> Result<Option<PathBuf>> {
        if !self.config.save_annotated {
            return Ok(None);
        }
        let path = self.output_path(input);
        save_frame(&path, frame)?;
        Ok(Some(path))
    }

    pub fn open_event_writer(&self) -> Result<Option<EventWriter>> {
        self.config
            .events_file
            .as_deref()
            .map(EventWriter::create)
            .transpose()
    }
}

fn is_frame_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| FRAME_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Decode an image file into an RGB frame.
pub fn load_frame(path: &Path) -> Result<Frame> {
    let img = image::open(path)
        .with_context(|| format!("Failed to decode frame {}", path.display()))?
        .to_rgb8();
    let frame = Frame::from_rgb_image(img);
    frame
        .validate()
        .with_context(|| format!("Malformed frame {}", path.display()))?;
    debug!("Loaded {} ({}x{})", path.display(), frame.width, frame.height);
    Ok(frame)
}

pub fn save_frame(path: &Path, frame: &Frame) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output dir {}", dir.display()))?;
    }
    let img = frame
        .to_rgb_image()
        .context("Frame buffer does not match its dimensions")?;
    img.save(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Appends one JSON object per line.
pub struct EventWriter {
    path: PathBuf,
    out: BufWriter<File>,
    written: usize,
}

impl EventWriter {
    pub fn create(path: &str) -> Result<Self> {
        let path = PathBuf::from(path);
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let file = File::create(&path)
            .with_context(|| format!("Failed to create events file {}", path.display()))?;
        info!("Writing events to {}", path.display());
        Ok(Self {
            path,
            out: BufWriter::new(file),
            written: 0,
        })
    }

    pub fn write(&mut self, event: &PipelineEvent) -> Result<()> {
        serde_json::to_writer(&mut self.out, event)?;
        self.out.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    pub fn finish(mut self) -> Result<usize> {
        self.out
            .flush()
            .with_context(|| format!("Failed to flush {}", self.path.display()))?;
        Ok(self.written)
    }
}

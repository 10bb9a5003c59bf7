// src/pipeline/outcome.rs

use crate::analysis::LanePixels;
use crate::types::{DepartureStatus, Frame, LaneFinding, LanePixelSet};

/// Everything one pipeline call produces for a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameOutcome {
    /// Annotated frame, or an untouched copy when no lanes were found.
    pub frame: Frame,
    pub finding: LaneFinding,
    pub departure: Option<DepartureStatus>,
    pub left_pixels: LanePixelSet,
    pub right_pixels: LanePixelSet,
}

impl FrameOutcome {
    pub(crate) fn no_lanes(frame: &Frame, pixels: LanePixels) -> Self {
        Self {
            frame: frame.clone(),
            finding: LaneFinding::NoLanes,
            departure: None,
            left_pixels: pixels.left,
            right_pixels: pixels.right,
        }
    }

    pub fn is_departing(&self) -> bool {
        self.departure.map_or(false, |d| d.departing)
    }
}

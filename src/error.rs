// src/error.rs

use std::fmt;

/// Errors the lane pipeline can return.
///
/// Empty detections and degenerate fits are not errors; they surface as
/// absent curves. Only inputs the pipeline refuses to touch end up here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaneError {
    /// Frame has zero width or zero height.
    EmptyFrame { width: usize, height: usize },
    /// Pixel buffer length does not match `width * height * 3`.
    ChannelMismatch { expected: usize, actual: usize },
    /// A configuration value is out of range.
    InvalidConfig(String),
}

impl fmt::Display for LaneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyFrame { width, height } => {
                write!(f, "empty frame: {width}x{height}")
            }
            Self::ChannelMismatch { expected, actual } => {
                write!(
                    f,
                    "channel mismatch: expected {expected} bytes of RGB data, got {actual}"
                )
            }
            Self::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for LaneError {}

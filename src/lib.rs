// src/lib.rs
//
// Lane finding for single RGB frames: color masking, edge extraction, a
// trapezoid region of interest, sliding-window pixel search, quadratic
// boundary fits, a departure check and an annotated overlay.

pub mod analysis;
pub mod color_filter;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod preprocessing;
pub mod region;
pub mod road_overlay;
pub mod types;
pub mod video_processor;

pub use error::LaneError;
pub use pipeline::{FrameOutcome, LanePipeline, PipelineEvent};
pub use types::{
    Config, DepartureStatus, EdgeMap, Frame, LaneFinding, LanePixelSet, LaneSide,
    PolynomialCurve,
};

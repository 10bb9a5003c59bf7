// src/pipeline/mod.rs

pub mod event_bus;
pub mod metrics;
pub mod orchestrator;
pub mod outcome;

pub use event_bus::{EventBus, PipelineEvent};
pub use metrics::{MetricsSummary, PipelineMetrics};
pub use orchestrator::LanePipeline;
pub use outcome::FrameOutcome;

// src/pipeline/event_bus.rs
//
// Events derived from frame outcomes. The harness publishes them here and
// drains them into whatever sink it has (log, events file, vehicle link).
// The core pipeline never publishes on its own.

use crate::pipeline::FrameOutcome;
use crate::types::{DepartureStatus, LaneFinding, PolynomialCurve};
use serde::Serialize;
use std::collections::VecDeque;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PipelineEvent {
    LanesFound {
        frame_id: u64,
        timestamp_ms: f64,
        left: Option<PolynomialCurve>,
        right: Option<PolynomialCurve>,
    },

    NoLanes {
        frame_id: u64,
        timestamp_ms: f64,
    },

    Departure {
        frame_id: u64,
        timestamp_ms: f64,
        status: DepartureStatus,
    },
}

impl PipelineEvent {
    /// Events for one outcome: a detection event, then a departure event
    /// when the vehicle is past the threshold.
    pub fn from_outcome(frame_id: u64, outcome: &FrameOutcome) -> Vec<Self> {
        let timestamp_ms = outcome.frame.timestamp_ms;
        let mut events = Vec::with_capacity(2);

        match outcome.finding {
            LaneFinding::Lanes { left, right } => events.push(Self::LanesFound {
                frame_id,
                timestamp_ms,
                left,
                right,
            }),
            LaneFinding::NoLanes => events.push(Self::NoLanes {
                frame_id,
                timestamp_ms,
            }),
        }

        if let Some(status) = outcome.departure.filter(|d| d.departing) {
            events.push(Self::Departure {
                frame_id,
                timestamp_ms,
                status,
            });
        }

        events
    }

    pub fn is_departure(&self) -> bool {
        matches!(self, Self::Departure { .. })
    }
}

pub struct EventBus {
    events: VecDeque<PipelineEvent>,
    max_pending: usize,
}

impl EventBus {
    pub fn new(max_pending: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(max_pending),
            max_pending,
        }
    }

    pub fn publish(&mut self, event: PipelineEvent) {
        if self.events.len() >= self.max_pending {
            warn!(
                "Event bus full ({} events), dropping oldest",
                self.max_pending
            );
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    pub fn publish_outcome(&mut self, frame_id: u64, outcome: &FrameOutcome) {
        for event in PipelineEvent::from_outcome(frame_id, outcome) {
            self.publish(event);
        }
    }

    pub fn drain(&mut self) -> Vec<PipelineEvent> {
        self.events.drain(..).collect()
    }

    pub fn pending_count(&self) -> usize {
        self.events.len()
    }
}

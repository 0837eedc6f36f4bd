use crate::{ComparisonId, Phase, ProgressSnapshot, Step, TransportKind};

/// Title shown before the backend reports a step.
pub const DEFAULT_TITLE: &str = "Processing...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepMarker {
    Done,
    Current,
    Pending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressView {
    pub step: Option<Step>,
    pub title: &'static str,
    pub message: Option<String>,
    /// Clamped to `[0, 100]`.
    pub percentage: f64,
    pub percent_label: u8,
    /// "3 of 12 completed", only when both counters are known.
    pub counter: Option<String>,
    /// One marker per step, empty until a step is known.
    pub markers: Vec<(Step, StepMarker)>,
}

impl ProgressView {
    pub fn from_snapshot(snapshot: &ProgressSnapshot) -> Self {
        let percentage = display_percentage(snapshot.percentage);
        let counter = match (snapshot.current, snapshot.total) {
            (Some(current), Some(total)) => Some(format!("{current} of {total} completed")),
            _ => None,
        };
        let markers = snapshot
            .step
            .map(|current| {
                Step::ALL
                    .iter()
                    .map(|&step| {
                        let marker = if step.index() < current.index() {
                            StepMarker::Done
                        } else if step == current {
                            StepMarker::Current
                        } else {
                            StepMarker::Pending
                        };
                        (step, marker)
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            step: snapshot.step,
            title: snapshot.step.map_or(DEFAULT_TITLE, Step::label),
            message: snapshot.message.clone(),
            percentage,
            percent_label: percentage.round() as u8,
            counter,
            markers,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackerView {
    pub phase: Phase,
    pub in_progress: bool,
    pub progress: ProgressView,
    pub error: Option<String>,
    pub comparison_id: Option<ComparisonId>,
    pub session_id: Option<String>,
    pub transport: Option<TransportKind>,
}

fn display_percentage(raw: f64) -> f64 {
    if raw.is_nan() {
        0.0
    } else {
        raw.clamp(0.0, 100.0)
    }
}

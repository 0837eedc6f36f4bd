use reconnoiter_core::{Phase, ProgressView, StepMarker, TrackerView};

use super::constants::*;

/// Text lines for the current view, top to bottom.
pub fn render_lines(view: &TrackerView) -> Vec<String> {
    match view.phase {
        Phase::Idle => Vec::new(),
        Phase::Creating => vec![SUBMITTING_TEXT.to_string()],
        Phase::Tracking => render_progress(&view.progress, true),
        // Steps are meaningless once the backend reports completion.
        Phase::Complete => render_progress(&view.progress, false),
        Phase::Failed => vec![format!(
            "Error: {}",
            view.error.as_deref().unwrap_or("An error occurred")
        )],
    }
}

fn render_progress(progress: &ProgressView, show_steps: bool) -> Vec<String> {
    let mut lines = vec![
        progress.title.to_string(),
        format!("{} {:>3}%", progress_bar(progress.percentage), progress.percent_label),
    ];
    if let Some(message) = progress.message.as_deref().filter(|m| !m.is_empty()) {
        lines.push(message.to_string());
    }
    if let Some(counter) = &progress.counter {
        lines.push(counter.clone());
    }
    if show_steps {
        lines.extend(progress.markers.iter().map(|(step, marker)| {
            let glyph = match marker {
                StepMarker::Done => MARKER_DONE,
                StepMarker::Current => MARKER_CURRENT,
                StepMarker::Pending => MARKER_PENDING,
            };
            format!("  {glyph} {}", step.label())
        }));
    }
    lines
}

fn progress_bar(percentage: f64) -> String {
    let filled = ((percentage / 100.0) * BAR_WIDTH as f64).round() as usize;
    let filled = filled.min(BAR_WIDTH);
    let mut bar = String::with_capacity(BAR_WIDTH + 2);
    bar.push('[');
    bar.extend(std::iter::repeat(BAR_FILLED).take(filled));
    bar.extend(std::iter::repeat(BAR_EMPTY).take(BAR_WIDTH - filled));
    bar.push(']');
    bar
}

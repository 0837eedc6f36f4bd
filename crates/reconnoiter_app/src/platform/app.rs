use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use reconnoiter_core::{Phase, TrackerView};
use reconnoiter_engine::{CreateError, TrackerHandle, TrackerParts};
use reconnoiter_logging::{recon_info, recon_warn};
use tokio::sync::{mpsc, watch};
use url::Url;

use super::config::AppConfig;
use super::navigation::TerminalNavigator;
use super::ui;
use crate::cli::Cli;

/// Conventional exit status after SIGINT.
const EXIT_CANCELLED: u8 = 130;

#[derive(Debug, PartialEq)]
enum Outcome {
    Completed(Url),
    Failed(String),
    Cancelled,
}

pub async fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = AppConfig::load(&cli).context("loading settings")?;
    let (navigator, mut opened) = TerminalNavigator::new(config.site_url()?);
    let parts = TrackerParts::network(
        config.api_settings()?,
        config.channel_settings()?,
        Arc::new(navigator),
        config.tracker_config(),
    )
    .context("building the API client")?;
    if parts.credential.is_none() {
        recon_info!("no session credential configured; progress will be polled");
    }

    let tracker = TrackerHandle::spawn(parts);
    let mut views = tracker.subscribe();
    let mut screen = Screen::default();

    let query = cli.query();
    let outcome = match submit(&tracker, &query).await {
        Ok(()) => follow(&tracker, &mut views, &mut opened, &mut screen).await,
        Err(outcome) => outcome,
    };
    tracker.shutdown().await;

    Ok(match outcome {
        Outcome::Completed(url) => {
            println!("Comparison ready: {url}");
            ExitCode::SUCCESS
        }
        Outcome::Failed(reason) => {
            eprintln!("Comparison failed: {reason}");
            ExitCode::FAILURE
        }
        Outcome::Cancelled => {
            println!("Cancelled.");
            ExitCode::from(EXIT_CANCELLED)
        }
    })
}

async fn submit(tracker: &TrackerHandle, query: &str) -> Result<(), Outcome> {
    println!("{}", ui::constants::SUBMITTING_TEXT);
    let created = tokio::select! {
        created = tracker.create(query) => created,
        _ = tokio::signal::ctrl_c() => Err(CreateError::Cancelled),
    };
    match created {
        Ok(session) => {
            recon_info!(session = session; "tracking comparison");
            Ok(())
        }
        Err(CreateError::Cancelled) => {
            tracker.cancel();
            Err(Outcome::Cancelled)
        }
        Err(err) => Err(Outcome::Failed(err.to_string())),
    }
}

async fn follow(
    tracker: &TrackerHandle,
    views: &mut watch::Receiver<TrackerView>,
    opened: &mut mpsc::UnboundedReceiver<Url>,
    screen: &mut Screen,
) -> Outcome {
    let view = views.borrow_and_update().clone();
    screen.show(&view);
    if let Some(outcome) = settled(view) {
        return outcome;
    }

    loop {
        tokio::select! {
            changed = views.changed() => {
                if changed.is_err() {
                    return Outcome::Failed("tracker stopped unexpectedly".to_string());
                }
                let view = views.borrow_and_update().clone();
                screen.show(&view);
                if let Some(outcome) = settled(view) {
                    return outcome;
                }
            }
            url = opened.recv() => {
                return match url {
                    Some(url) => Outcome::Completed(url),
                    None => Outcome::Failed("navigation was dropped".to_string()),
                };
            }
            _ = tokio::signal::ctrl_c() => {
                recon_warn!("interrupted; cancelling comparison");
                tracker.cancel();
                return Outcome::Cancelled;
            }
        }
    }
}

/// Ends the run once the view can no longer make progress. Completion is
/// reported by the navigator instead, after the navigation delay.
fn settled(view: TrackerView) -> Option<Outcome> {
    match view.phase {
        Phase::Failed => Some(Outcome::Failed(
            view.error.unwrap_or_else(|| "An error occurred".to_string()),
        )),
        Phase::Idle => Some(Outcome::Cancelled),
        Phase::Creating | Phase::Tracking | Phase::Complete => None,
    }
}

/// Prints each distinct frame once.
#[derive(Default)]
struct Screen {
    last: Vec<String>,
}

impl Screen {
    fn show(&mut self, view: &TrackerView) {
        let lines = ui::render::render_lines(view);
        if lines.is_empty() || lines == self.last {
            return;
        }
        println!();
        for line in &lines {
            println!("{line}");
        }
        self.last = lines;
    }
}

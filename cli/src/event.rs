//! Event plumbing for the terminal client.
//!
//! Terminal input is read on a dedicated thread and merged with application
//! events (async fetch results, out-of-band controller signals) and a frame
//! tick onto one unbounded channel. The tick is what drives the graph
//! simulation; it is independent of the state-store notification cycle.

use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};
use tokio::sync::mpsc::UnboundedSender;

use gitscope_core::ai::{Challenge, LearningPathResult};
use gitscope_core::error::ExploreError;
use gitscope_core::github::{RepoSnapshot, TrendingRepo};

const INPUT_POLL: Duration = Duration::from_millis(50);
const TICK_INTERVAL: Duration = Duration::from_millis(33);

#[derive(Debug)]
pub enum Event {
    Key(KeyEvent),
    Resize,
    Tick,
    App(AppEvent),
}

/// Results re-entering the UI loop, plus the two out-of-band signals that
/// bridge controllers around the state-store subscriber list.
#[derive(Debug)]
pub enum AppEvent {
    RepoLoaded {
        generation: u64,
        result: Result<RepoSnapshot, ExploreError>,
    },
    TrendingLoaded {
        result: Result<Vec<TrendingRepo>, ExploreError>,
    },
    FileLoaded {
        repo: String,
        path: String,
        result: Result<String, ExploreError>,
    },
    ExplainReady {
        repo: String,
        path: String,
        result: Result<String, ExploreError>,
    },
    LearningPathReady {
        repo: String,
        result: Result<LearningPathResult, ExploreError>,
    },
    ChallengesReady {
        repo: String,
        module_index: usize,
        result: Result<Vec<Challenge>, ExploreError>,
    },
    ChatReply {
        repo: String,
        result: Result<String, ExploreError>,
    },
    /// Graph-driven selection, observed via the viz controller.
    SelectionChanged(String),
    /// A state-store subscriber asking for a redraw.
    RenderRequested,
}

/// Blocking crossterm reader; lives on its own thread for the whole session.
pub fn spawn_terminal_reader(tx: UnboundedSender<Event>) {
    thread::spawn(move || loop {
        if event::poll(INPUT_POLL).unwrap_or(false) {
            match event::read() {
                Ok(CrosstermEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                    if tx.send(Event::Key(key)).is_err() {
                        break;
                    }
                }
                Ok(CrosstermEvent::Resize(_, _)) => {
                    if tx.send(Event::Resize).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(_) => break,
            }
        } else if tx.is_closed() {
            break;
        }
    });
}

pub fn spawn_tick(tx: UnboundedSender<Event>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(TICK_INTERVAL);
        loop {
            interval.tick().await;
            if tx.send(Event::Tick).is_err() {
                break;
            }
        }
    });
}

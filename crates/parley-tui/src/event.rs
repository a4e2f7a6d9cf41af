use std::time::Duration;

use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, MouseEventKind};
use parley_core::UiEvent;
use tokio::sync::mpsc;

#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Tick,
    Resize(u16, u16),
    MouseScroll(i8),
    Engine(UiEvent),
    Speech(SpeechEvent),
}

/// Results of an audio transcription started from the input line.
#[derive(Debug)]
pub enum SpeechEvent {
    Transcript(String),
    Ended,
    Failed(String),
}

pub struct EventReader {
    tx: mpsc::Sender<AppEvent>,
    tick_rate: Duration,
}

impl EventReader {
    #[must_use]
    pub fn new(tx: mpsc::Sender<AppEvent>, tick_rate: Duration) -> Self {
        Self { tx, tick_rate }
    }

    /// Blocking loop — must run on a dedicated `std::thread`, not a tokio worker.
    pub fn run(self) {
        loop {
            if event::poll(self.tick_rate).unwrap_or(false) {
                let evt = match event::read() {
                    Ok(CrosstermEvent::Key(key)) => AppEvent::Key(key),
                    Ok(CrosstermEvent::Resize(w, h)) => AppEvent::Resize(w, h),
                    Ok(CrosstermEvent::Mouse(mouse)) => match mouse.kind {
                        MouseEventKind::ScrollUp => AppEvent::MouseScroll(1),
                        MouseEventKind::ScrollDown => AppEvent::MouseScroll(-1),
                        _ => continue,
                    },
                    _ => continue,
                };
                if self.tx.blocking_send(evt).is_err() {
                    break;
                }
            } else if self.tx.blocking_send(AppEvent::Tick).is_err() {
                break;
            }
        }
    }
}

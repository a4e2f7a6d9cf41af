//! Terminal chat interface for parley document sessions.

pub mod app;
pub mod error;
pub mod event;
pub mod layout;
pub mod theme;
pub mod widgets;

use std::io;

pub use app::{App, InputMode, Prompt};
pub use error::TuiError;
pub use event::{AppEvent, EventReader, SpeechEvent};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
pub use theme::Theme;
use tokio::sync::mpsc;

/// # Errors
///
/// Returns an error if terminal init/restore or rendering fails.
pub async fn run_tui(mut app: App, mut event_rx: mpsc::Receiver<AppEvent>) -> Result<(), TuiError> {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = crossterm::terminal::disable_raw_mode();
        let _ = crossterm::execute!(
            io::stdout(),
            crossterm::terminal::LeaveAlternateScreen,
            crossterm::event::DisableMouseCapture
        );
        original_hook(info);
    }));

    let mut terminal = init_terminal()?;

    let result = tui_loop(&mut app, &mut event_rx, &mut terminal).await;

    restore_terminal(&mut terminal)?;

    // Restore the default panic hook
    let _ = std::panic::take_hook();

    result
}

async fn tui_loop(
    app: &mut App,
    event_rx: &mut mpsc::Receiver<AppEvent>,
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
) -> Result<(), TuiError> {
    loop {
        terminal.draw(|frame| app.draw(frame))?;

        match event_rx.recv().await {
            Some(event) => {
                app.handle_event(event);
                // Coalesce whatever else is queued before the next draw.
                while let Ok(event) = event_rx.try_recv() {
                    app.handle_event(event);
                }
            }
            None => return Err(TuiError::ChannelClosed),
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn init_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>, TuiError> {
    crossterm::terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    crossterm::execute!(
        stdout,
        crossterm::terminal::EnterAlternateScreen,
        crossterm::event::EnableMouseCapture,
    )?;
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<(), TuiError> {
    crossterm::terminal::disable_raw_mode()?;
    crossterm::execute!(
        terminal.backend_mut(),
        crossterm::terminal::LeaveAlternateScreen,
        crossterm::event::DisableMouseCapture,
    )?;
    terminal.show_cursor()?;
    Ok(())
}

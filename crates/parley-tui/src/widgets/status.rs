use parley_core::Severity;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::app::{App, InputMode};

pub fn render(app: &App, frame: &mut Frame, area: Rect) {
    let theme = app.theme();

    // The latest notice owns the whole status line until the next keypress.
    if let Some(notice) = app.notice() {
        let style = match notice.severity {
            Severity::Error => theme.error,
            Severity::Info => theme.status_bar,
        };
        let line = Line::from(Span::styled(format!(" {}", notice.text), style));
        frame.render_widget(Paragraph::new(line).style(theme.status_bar), area);
        return;
    }

    let mode = match app.input_mode() {
        InputMode::Normal => "Normal",
        InputMode::Insert => "Insert",
    };
    let busy = if app.is_busy() { " | working" } else { "" };
    let files = app.attachments().len();
    let speech_hint = if app.speech_available() { " [v]oice" } else { "" };

    let text = format!(
        " [{mode}] | [n]ew [t]heme [a]ttach{speech_hint} | files: {files}{busy}",
    );
    let line = Line::from(Span::styled(text, theme.status_bar));
    frame.render_widget(Paragraph::new(line).style(theme.status_bar), area);
}

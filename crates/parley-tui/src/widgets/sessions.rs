use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::app::App;

pub fn render(app: &App, frame: &mut Frame, area: Rect) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let theme = app.theme();

    let registry = app.registry().lock().unwrap();
    let active = registry.active_id().cloned();
    let lines: Vec<Line<'_>> = registry
        .sessions()
        .iter()
        .map(|session| {
            let marker = if Some(&session.id) == active.as_ref() {
                "> "
            } else {
                "  "
            };
            let files = if session.files.is_empty() {
                String::new()
            } else {
                format!(" ({})", session.files.len())
            };
            let style = if Some(&session.id) == active.as_ref() {
                theme.highlight
            } else {
                theme.assistant_message
            };
            Line::from(Span::styled(
                format!("{marker}{}{files}", session.title),
                style,
            ))
        })
        .collect();
    drop(registry);

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(theme.panel_border)
            .title(" Sessions ([n]ew, Tab) "),
    );
    frame.render_widget(paragraph, area);
}

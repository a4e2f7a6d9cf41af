use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::app::App;

/// Pretty-printed structured data plus the active session's file list.
pub fn render(app: &App, frame: &mut Frame, area: Rect) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let theme = app.theme();

    let mut lines: Vec<Line<'static>> = Vec::new();
    {
        let registry = app.registry().lock().unwrap();
        if let Some(session) = registry.active() {
            match &session.structured_data {
                Some(data) => {
                    let pretty = serde_json::to_string_pretty(data)
                        .unwrap_or_else(|_| "<unrenderable>".to_owned());
                    for part in pretty.lines() {
                        lines.push(Line::from(Span::styled(
                            part.to_owned(),
                            theme.assistant_message,
                        )));
                    }
                }
                None => lines.push(Line::from(Span::styled(
                    "No extracted data yet".to_owned(),
                    theme.system_message,
                ))),
            }
            if !session.files.is_empty() {
                lines.push(Line::default());
                lines.push(Line::from(Span::styled(
                    "Files".to_owned(),
                    theme.panel_title,
                )));
                for file in &session.files {
                    lines.push(Line::from(Span::styled(
                        format!("  {} ({} bytes)", file.name, file.size),
                        theme.citation,
                    )));
                }
            }
        }
    }

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(theme.panel_border)
            .title(" Data "),
    );
    frame.render_widget(paragraph, area);
}

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::Span;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use unicode_width::UnicodeWidthStr;

use crate::app::{App, InputMode, Prompt};

pub fn render(app: &App, frame: &mut Frame, area: Rect) {
    let theme = app.theme();

    let (title, text) = match app.prompt() {
        Some(Prompt::AttachFile) => (" Attach file path (Esc to cancel) ", app.prompt_buffer()),
        Some(Prompt::SpeechAudio) => (" Audio file path (Esc to cancel) ", app.prompt_buffer()),
        None => {
            let title = match app.input_mode() {
                InputMode::Normal => " Press 'i' to type ",
                InputMode::Insert => " Input (Esc for keys) ",
            };
            (title, app.input())
        }
    };

    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.panel_border)
        .title(title);

    if !app.attachments().is_empty() {
        let badge = format!(" [{} attached] ", app.attachments().len());
        block = block.title_bottom(Span::styled(badge, theme.highlight));
    }
    if app.is_listening() {
        block = block.title_bottom(Span::styled(" [listening] ", theme.error));
    }

    let paragraph = Paragraph::new(text)
        .block(block)
        .style(theme.input_cursor)
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, area);

    if app.prompt().is_some() {
        #[allow(clippy::cast_possible_truncation)]
        let cursor_x = area.x + app.prompt_buffer().width() as u16 + 1;
        frame.set_cursor_position((cursor_x, area.y + 1));
    } else if matches!(app.input_mode(), InputMode::Insert) {
        let prefix: String = app.input().chars().take(app.cursor_position()).collect();
        #[allow(clippy::cast_possible_truncation)]
        let cursor_x = area.x + prefix.width() as u16 + 1;
        frame.set_cursor_position((cursor_x, area.y + 1));
    }
}

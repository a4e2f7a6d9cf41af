use ratatui::style::{Color, Modifier, Style};

pub struct Theme {
    pub user_message: Style,
    pub assistant_message: Style,
    pub system_message: Style,
    pub pending_message: Style,
    pub input_cursor: Style,
    pub status_bar: Style,
    pub header: Style,
    pub panel_border: Style,
    pub panel_title: Style,
    pub highlight: Style,
    pub error: Style,
    pub confidence_bar: Style,
    pub citation: Style,
    pub stage_done: Style,
    pub stage_active: Style,
    pub stage_pending: Style,
    pub stage_error: Style,
}

impl Theme {
    #[must_use]
    pub fn dark() -> Self {
        Self {
            user_message: Style::default().fg(Color::Cyan),
            assistant_message: Style::default().fg(Color::White),
            system_message: Style::default().fg(Color::DarkGray),
            pending_message: Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::ITALIC),
            input_cursor: Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
            status_bar: Style::default().fg(Color::White).bg(Color::DarkGray),
            header: Style::default()
                .fg(Color::Rgb(200, 220, 255))
                .bg(Color::Rgb(20, 40, 80))
                .add_modifier(Modifier::BOLD),
            panel_border: Style::default().fg(Color::Gray),
            panel_title: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
            highlight: Style::default().fg(Color::Rgb(215, 150, 60)),
            error: Style::default().fg(Color::Red),
            confidence_bar: Style::default().fg(Color::Green),
            citation: Style::default().fg(Color::Rgb(150, 170, 200)),
            stage_done: Style::default().fg(Color::Green),
            stage_active: Style::default().fg(Color::Yellow),
            stage_pending: Style::default().fg(Color::DarkGray),
            stage_error: Style::default().fg(Color::Red),
        }
    }

    #[must_use]
    pub fn light() -> Self {
        Self {
            user_message: Style::default().fg(Color::Rgb(0, 90, 140)),
            assistant_message: Style::default().fg(Color::Black),
            system_message: Style::default().fg(Color::Gray),
            pending_message: Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
            input_cursor: Style::default()
                .fg(Color::Rgb(160, 100, 0))
                .add_modifier(Modifier::BOLD),
            status_bar: Style::default().fg(Color::Black).bg(Color::Rgb(210, 210, 210)),
            header: Style::default()
                .fg(Color::Rgb(20, 40, 80))
                .bg(Color::Rgb(200, 220, 255))
                .add_modifier(Modifier::BOLD),
            panel_border: Style::default().fg(Color::DarkGray),
            panel_title: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
            highlight: Style::default().fg(Color::Rgb(160, 100, 0)),
            error: Style::default().fg(Color::Rgb(170, 30, 30)),
            confidence_bar: Style::default().fg(Color::Rgb(0, 120, 40)),
            citation: Style::default().fg(Color::Rgb(80, 90, 120)),
            stage_done: Style::default().fg(Color::Rgb(0, 120, 40)),
            stage_active: Style::default().fg(Color::Rgb(160, 100, 0)),
            stage_pending: Style::default().fg(Color::Gray),
            stage_error: Style::default().fg(Color::Rgb(170, 30, 30)),
        }
    }

    #[must_use]
    pub fn for_mode(dark: bool) -> Self {
        if dark { Self::dark() } else { Self::light() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dark_theme_has_distinct_message_styles() {
        let theme = Theme::dark();
        assert_ne!(theme.user_message, theme.assistant_message);
        assert_ne!(theme.assistant_message, theme.system_message);
    }

    #[test]
    fn light_and_dark_differ() {
        assert_ne!(Theme::dark().assistant_message, Theme::light().assistant_message);
    }

    #[test]
    fn status_bar_has_background() {
        assert!(Theme::dark().status_bar.bg.is_some());
        assert!(Theme::light().status_bar.bg.is_some());
    }
}

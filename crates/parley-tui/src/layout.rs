use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Side panels collapse below this terminal width.
pub const SIDE_PANEL_MIN_WIDTH: u16 = 80;

pub struct AppLayout {
    pub header: Rect,
    pub sessions: Rect,
    pub chat: Rect,
    pub json_panel: Rect,
    pub input: Rect,
    pub status: Rect,
}

impl AppLayout {
    #[must_use]
    pub fn compute(area: Rect, show_sessions: bool, show_json: bool) -> Self {
        let outer = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(10),
                Constraint::Length(3),
                Constraint::Length(1),
            ])
            .split(area);

        let wide = area.width >= SIDE_PANEL_MIN_WIDTH;
        let sessions_visible = show_sessions && wide;
        let json_visible = show_json && wide;

        let mut constraints = Vec::new();
        if sessions_visible {
            constraints.push(Constraint::Percentage(20));
        }
        constraints.push(Constraint::Fill(1));
        if json_visible {
            constraints.push(Constraint::Percentage(30));
        }

        let main_split = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(constraints)
            .split(outer[1]);

        let mut cursor = 0;
        let sessions = if sessions_visible {
            cursor += 1;
            main_split[0]
        } else {
            Rect::default()
        };
        let chat = main_split[cursor];
        let json_panel = if json_visible {
            main_split[cursor + 1]
        } else {
            Rect::default()
        };

        Self {
            header: outer[0],
            sessions,
            chat,
            json_panel,
            input: outer[2],
            status: outer[3],
        }
    }
}

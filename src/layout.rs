//! Screen area splits.

use ratatui::prelude::*;

/// Body plus the two bottom bars.
pub struct MainLayout {
    pub body: Rect,
    pub help_bar: Rect,
    pub status_bar: Rect,
}

/// Body split into the working panel and the info panel.
pub struct BodyLayout {
    pub main: Rect,
    pub info: Rect,
}

pub fn create_main_layout(area: Rect) -> MainLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(area);

    MainLayout {
        body: chunks[0],
        help_bar: chunks[1],
        status_bar: chunks[2],
    }
}

/// 65% working panel, 35% info panel.
pub fn create_body_layout(area: Rect) -> BodyLayout {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(area);

    BodyLayout {
        main: chunks[0],
        info: chunks[1],
    }
}

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Row, Table},
};

use crate::config::{APP_SUMMARY, APP_TITLE};

pub fn render_help(frame: &mut Frame, accent: Color) {
    let area = frame.area();
    let width = 70.min(area.width);
    let height = 24.min(area.height);
    let dialog_area = Rect {
        x: area.width.saturating_sub(width) / 2,
        y: area.height.saturating_sub(height) / 2,
        width,
        height,
    };

    frame.render_widget(Clear, dialog_area);

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(accent));

    let inner = block.inner(dialog_area);
    frame.render_widget(block, dialog_area);

    let [about_area, keys_area] =
        Layout::vertical([Constraint::Length(4), Constraint::Min(1)]).areas(inner);

    let about = Text::from(vec![
        Line::from(vec![
            Span::styled(
                APP_TITLE,
                Style::default().fg(accent).add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!(" {}", env!("CARGO_PKG_VERSION"))),
        ]),
        Line::from(APP_SUMMARY),
        Line::from(Span::styled(
            "Movie data from OMDb. Folder names follow the Jellyfin convention.",
            Style::default().fg(Color::DarkGray),
        )),
    ]);
    frame.render_widget(Paragraph::new(about), about_area);

    let rows = vec![
        Row::new(vec!["Form", "Tab / Shift+Tab", "Next / previous field"]),
        Row::new(vec!["", "Enter, Ctrl+G", "Look up movie"]),
        Row::new(vec!["", "Ctrl+Y", "Copy folder name"]),
        Row::new(vec!["", "Ctrl+V", "Paste into field"]),
        Row::new(vec!["", "Ctrl+U", "Clear field"]),
        Row::new(vec!["", "Ctrl+R", "Reset"]),
        Row::new(vec!["", "Ctrl+N", "Minimize / restore"]),
        Row::new(vec!["", "Esc", "Quit"]),
        Row::new(vec!["Matches", "j/k, Up/Down", "Navigate"]),
        Row::new(vec!["", "Enter", "Use selected movie"]),
        Row::new(vec!["", "o", "Open IMDb page"]),
        Row::new(vec!["", "Esc", "Cancel"]),
        Row::new(vec!["Global", "F1", "Toggle help"]),
        Row::new(vec!["", "Ctrl+C", "Quit"]),
    ];

    let table = Table::new(
        rows,
        [
            Constraint::Percentage(20),
            Constraint::Percentage(30),
            Constraint::Percentage(50),
        ],
    )
    .header(
        Row::new(vec!["Context", "Key", "Action"])
            .style(Style::default().add_modifier(Modifier::BOLD).fg(accent)),
    )
    .block(Block::default().borders(Borders::NONE));

    frame.render_widget(table, keys_area);
}

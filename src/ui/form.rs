use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
};

use crate::form::{Field, MovieForm};

use super::widgets::{field_block, titled_block};

pub fn render_form_view(frame: &mut Frame, area: Rect, form: &MovieForm, accent: Color) {
    let [folder_area, top_row, imdb_area, _] = Layout::vertical([
        Constraint::Length(5),
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Min(0),
    ])
    .areas(area);

    let [title_area, year_area] =
        Layout::horizontal([Constraint::Min(20), Constraint::Length(10)]).areas(top_row);

    render_folder_preview(frame, folder_area, form.folder(), accent);

    for (field, field_area) in [
        (Field::Title, title_area),
        (Field::Year, year_area),
        (Field::Imdb, imdb_area),
    ] {
        render_input(frame, field_area, form, field, accent);
    }
}

fn render_folder_preview(frame: &mut Frame, area: Rect, folder: &str, accent: Color) {
    let line = if folder.is_empty() {
        Line::from(Span::styled(
            "Enter a title and year, or an IMDb id, then press Enter",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Line::from(vec![
            Span::styled("📁 ", Style::default().fg(accent)),
            Span::styled(
                folder,
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
        ])
    };

    let preview = Paragraph::new(line)
        .block(titled_block("Folder", accent))
        .wrap(Wrap { trim: true });

    frame.render_widget(preview, area);
}

fn render_input(frame: &mut Frame, area: Rect, form: &MovieForm, field: Field, accent: Color) {
    let focused = form.focus == field;
    let text = form.field_text(field);

    let input = Paragraph::new(text)
        .block(field_block(field.label(), focused, accent))
        .style(Style::default().fg(Color::White));

    frame.render_widget(input, area);

    if focused {
        let width = text.chars().count() as u16;
        let x = (area.x + width + 1).min(area.right().saturating_sub(2));
        frame.set_cursor_position((x, area.y + 1));
    }
}

/// One-line view shown while minimized
pub fn render_compact_view(frame: &mut Frame, area: Rect, folder: &str, accent: Color) {
    let text = if folder.is_empty() { "(no folder name yet)" } else { folder };

    let line = Line::from(vec![
        Span::styled(
            format!(" {} ", crate::config::APP_TITLE),
            Style::default()
                .fg(Color::Black)
                .bg(accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::raw(text),
        Span::styled("  Ctrl+N restore", Style::default().fg(Color::DarkGray)),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

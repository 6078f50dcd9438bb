use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout},
    style::{Color, Modifier, Style},
    widgets::{Cell, Clear, Row, Table, TableState},
};

use crate::movie::{MovieRecord, imdb_url};

use super::widgets::titled_block;

/// Disambiguation dialog listing every candidate record
pub fn render_select_dialog(
    frame: &mut Frame,
    records: &[MovieRecord],
    table_state: &mut TableState,
    accent: Color,
) {
    let area = frame.area();

    let dialog_width = 100.min(area.width.saturating_sub(4));
    let dialog_height = (records.len() as u16 + 3)
        .clamp(6, 24)
        .min(area.height.saturating_sub(2));

    let horizontal = Layout::horizontal([Constraint::Length(dialog_width)]).flex(Flex::Center);
    let vertical = Layout::vertical([Constraint::Length(dialog_height)]).flex(Flex::Center);
    let [dialog_area] = vertical.areas(area);
    let [dialog_area] = horizontal.areas(dialog_area);

    frame.render_widget(Clear, dialog_area);

    let rows: Vec<Row> = records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let year = record
                .year
                .map(|y| y.to_string())
                .unwrap_or_else(|| "?".to_string());

            Row::new(vec![
                Cell::from(format!("{:>2}", i + 1)).style(Style::default().fg(Color::DarkGray)),
                Cell::from(record.title.clone()),
                Cell::from(year).style(Style::default().fg(Color::Yellow)),
                Cell::from(imdb_url(&record.external_id)).style(Style::default().fg(Color::Blue)),
            ])
        })
        .collect();

    let title = format!("{} matches - choose one", records.len());
    let table = Table::new(
        rows,
        [
            Constraint::Length(3),
            Constraint::Min(20),
            Constraint::Length(5),
            Constraint::Length(40),
        ],
    )
    .header(
        Row::new(vec!["", "Title", "Year", "IMDb"]).style(
            Style::default()
                .add_modifier(Modifier::BOLD)
                .fg(accent),
        ),
    )
    .block(titled_block(&title, accent))
    .row_highlight_style(
        Style::default()
            .bg(accent)
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("▶ ");

    frame.render_stateful_widget(table, dialog_area, table_state);
}

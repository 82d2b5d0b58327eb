//! Master-detail screen: main table on top, related tabs and the selected
//! record below.

use crate::controller::{main_table, related_table};
use crate::state::{App, Focus};
use crate::table::TableStyle;
use crate::widgets::DetailPanel;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::Line,
    widgets::{Block, Borders, Paragraph, Tabs, Wrap},
    Frame,
};

pub fn render(f: &mut Frame<'_>, app: &App, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    render_main(f, app, rows[0]);

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(rows[1]);

    render_related(f, app, bottom[0]);
    render_selected(f, app, bottom[1]);
}

fn table_style(app: &App, focused: bool) -> TableStyle {
    TableStyle {
        border: app.theme.border_style(focused),
        header: app.theme.header_style(),
        highlight: app.theme.highlight_style(),
    }
}

fn render_main(f: &mut Frame<'_>, app: &App, area: Rect) {
    let schema = app.view.schema();
    let mut title = format!("{} View", schema.name);
    if !app.view.is_loaded() {
        title.push_str(" (loading)");
    }
    if let Some(err) = app.view.main_error() {
        title.push_str(&format!(" (error: {})", err));
    }
    let focused = app.focus == Focus::Main;
    main_table(app.view.main_collection(), schema).render(
        f,
        area,
        &title,
        app.main_cursor.filter(|_| focused),
        &table_style(app, focused),
    );
}

fn render_related(f: &mut Frame<'_>, app: &App, area: Rect) {
    let schema = app.view.schema();
    let nested: Vec<_> = schema.nested_collections().collect();
    let focused = app.focus == Focus::Related;

    if nested.is_empty() {
        let empty = Paragraph::new(format!("{} has no related collections.", schema.name))
            .style(Style::default().fg(app.theme.text_dim))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(app.theme.border_style(false)),
            );
        f.render_widget(empty, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let active = app.view.active_tab();
    let selected_tab = nested
        .iter()
        .position(|r| Some(r.name().as_str()) == active)
        .unwrap_or(0);
    let titles: Vec<Line> = nested
        .iter()
        .map(|r| Line::from(format!("{}s", r.target)))
        .collect();
    let tabs = Tabs::new(titles)
        .select(selected_tab)
        .block(
            Block::default()
                .title("Related")
                .borders(Borders::ALL)
                .border_style(app.theme.border_style(focused)),
        )
        .style(Style::default().fg(app.theme.text_dim))
        .highlight_style(app.theme.header_style());
    f.render_widget(tabs, chunks[0]);

    let rel = nested[selected_tab];
    let relationship = rel.name();
    let collection = app.view.related(&relationship);
    let target_schema = app.registry.get_schema(&rel.target).ok();

    match (app.view.selected(), collection, target_schema) {
        (Some(_), Some(records), Some(target_schema)) => {
            let title = format!("{}s", rel.target);
            related_table(records, &target_schema, &relationship).render(
                f,
                chunks[1],
                &title,
                app.related_cursor.filter(|_| focused),
                &table_style(app, focused),
            );
        }
        _ => {
            let prompt = Paragraph::new(format!(
                "Select an item from the main table to view related {}s.",
                rel.target
            ))
            .style(Style::default().fg(app.theme.text_dim))
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(app.theme.border_style(focused)),
            );
            f.render_widget(prompt, chunks[1]);
        }
    }
}

fn render_selected(f: &mut Frame<'_>, app: &App, area: Rect) {
    let fields = app
        .view
        .selected()
        .map(|record| {
            record
                .fields()
                .iter()
                .filter(|(_, value)| !value.is_array() && !value.is_object())
                .map(|(key, _)| (key.clone(), record.display_value(key)))
                .collect()
        })
        .unwrap_or_default();

    let detail = DetailPanel {
        title: "Selected",
        fields,
        style: Style::default().fg(app.theme.secondary),
        border: app.theme.border_style(false),
    };
    detail.render(f, area);
}

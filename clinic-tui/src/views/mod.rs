//! View rendering dispatch.

pub mod form;
pub mod helpers;
pub mod master_detail;

use crate::notifications::NotificationLevel;
use crate::state::App;
use crate::widgets::Dialog;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Tabs},
    Frame,
};
use std::time::Duration;

const NOTICE_TTL: Duration = Duration::from_secs(6);

pub fn render_view(f: &mut Frame<'_>, app: &App) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.size());

    f.render_widget(
        Block::default().style(Style::default().bg(app.theme.bg).fg(app.theme.text)),
        f.size(),
    );
    render_header(f, app, layout[0]);
    master_detail::render(f, app, layout[1]);
    render_footer(f, app, layout[2]);

    render_overlays(f, app);
}

fn render_header(f: &mut Frame<'_>, app: &App, area: Rect) {
    let titles: Vec<Line> = (0..app.nav.all().len())
        .filter_map(|i| app.nav.title(i))
        .enumerate()
        .map(|(i, title)| Line::from(format!("{} {}", i + 1, title)))
        .collect();
    let tabs = Tabs::new(titles)
        .select(app.nav.index())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(app.theme.border_style(false))
                .title(Span::styled(
                    format!("Clinic Admin | {}", app.config.api_base_url),
                    app.theme.header_style(),
                )),
        )
        .style(Style::default().fg(app.theme.text_dim))
        .highlight_style(app.theme.header_style());
    f.render_widget(tabs, area);
}

fn render_footer(f: &mut Frame<'_>, app: &App, area: Rect) {
    let help = "Tab switch view • j/k move • Space focus • Enter select • n new • e edit • d delete • ? help • q quit";
    let (text, style) = if let Some(note) = app
        .notifications
        .last()
        .filter(|n| n.created_at.elapsed() < NOTICE_TTL)
    {
        let color = match note.level {
            NotificationLevel::Info => app.theme.info,
            NotificationLevel::Warning => app.theme.warning,
            NotificationLevel::Error => app.theme.error,
            NotificationLevel::Success => app.theme.success,
        };
        (
            format!("{}: {}", note.level.label(), note.message),
            Style::default().fg(color),
        )
    } else {
        (help.to_string(), Style::default().fg(app.theme.text_dim))
    };
    let footer = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(app.theme.border_style(false)),
        )
        .style(style);
    f.render_widget(footer, area);
}

fn render_overlays(f: &mut Frame<'_>, app: &App) {
    let area = f.size();

    if let Some(confirm) = app.view.delete_confirm() {
        let mut lines = vec![Line::from(format!(
            "Delete {} {}?",
            app.view.schema().name,
            confirm.id
        ))];
        if confirm.in_flight {
            lines.push(Line::from(Span::styled(
                "Deleting...",
                Style::default().fg(app.theme.text_dim),
            )));
        }
        if let Some(err) = &confirm.error {
            lines.push(Line::from(Span::styled(
                err.to_string(),
                Style::default().fg(app.theme.error),
            )));
        }
        lines.push(Line::from(Span::styled(
            "[y/Enter] delete  [n/Esc] cancel",
            Style::default().fg(app.theme.text_dim),
        )));
        Dialog {
            title: "Confirm delete",
            body: Text::from(lines),
            border: Style::default().fg(app.theme.warning),
            width_percent: 50,
            height: 7,
        }
        .render(f, area);
    }

    if let Some(form) = app.view.main_form() {
        form::render(f, app, form, area);
    }
    if let Some(related) = app.view.related_form() {
        form::render(f, app, &related.form, area);
    }

    if let Some(modal) = &app.modal {
        Dialog {
            title: &modal.title,
            body: Text::from(modal.message.as_str()),
            border: app.theme.border_style(true),
            width_percent: 70,
            height: 8,
        }
        .render(f, area);
    }

    if let Some(palette) = &app.command_palette {
        let popup = Rect {
            x: area.x,
            y: area.bottom().saturating_sub(3),
            width: area.width,
            height: 3u16.min(area.height),
        };
        f.render_widget(Clear, popup);
        let input = Paragraph::new(format!(":{}", palette.input)).block(
            Block::default()
                .title("Command")
                .borders(Borders::ALL)
                .border_style(app.theme.border_style(true)),
        );
        f.render_widget(input, popup);
    }
}

//! Form overlay.

use crate::form::{FormInput, FormPhase, FormState};
use crate::state::App;
use crate::views::helpers::centered_rect;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

const FIELD_HEIGHT: u16 = 3;

pub fn render(f: &mut Frame<'_>, app: &App, form: &FormState, area: Rect) {
    let inputs = form.inputs();
    let height = (inputs.len() as u16) * FIELD_HEIGHT + 5;
    let popup = centered_rect(60, height, area);
    f.render_widget(Clear, popup);

    let outer = Block::default()
        .title(form.title())
        .borders(Borders::ALL)
        .border_style(app.theme.border_style(true));
    let inner = outer.inner(popup);
    f.render_widget(outer, popup);

    match form.phase() {
        FormPhase::Loading => {
            render_message(f, inner, "Loading...", Style::default().fg(app.theme.text_dim));
            return;
        }
        FormPhase::LoadFailed(err) => {
            render_message(
                f,
                inner,
                &format!("Could not load record: {}\n\n[Esc] close", err),
                Style::default().fg(app.theme.error),
            );
            return;
        }
        FormPhase::Ready | FormPhase::Submitting => {}
    }

    let mut constraints: Vec<Constraint> = inputs
        .iter()
        .map(|_| Constraint::Length(FIELD_HEIGHT))
        .collect();
    constraints.push(Constraint::Min(1));
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(inner);

    for (index, input) in inputs.iter().enumerate() {
        let focused = index == form.focus();
        let title = match input {
            FormInput::Scalar(scalar) if scalar.is_dirty() => format!("{} *", input.key()),
            _ => input.key().to_string(),
        };
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(app.theme.border_style(focused));
        let area = rows[index];
        match input {
            FormInput::Scalar(scalar) => {
                let editor_area = block.inner(area);
                f.render_widget(block, area);
                f.render_widget(scalar.editor(), editor_area);
            }
            FormInput::Parent(parent) => {
                let options = app.view.resolver().options(&parent.relationship.target);
                let text = if app.view.resolver().is_loading(&parent.relationship.target) {
                    "loading options...".to_string()
                } else {
                    parent
                        .selected_label(options)
                        .unwrap_or_else(|| "(none)".to_string())
                };
                let line = Line::from(vec![
                    Span::raw("< "),
                    Span::styled(text, Style::default().add_modifier(Modifier::BOLD)),
                    Span::raw(" >"),
                ]);
                f.render_widget(Paragraph::new(line).block(block), area);
            }
        }
    }

    let mut status = Vec::new();
    if form.phase() == &FormPhase::Submitting {
        status.push(Line::from(Span::styled(
            "Saving...",
            Style::default().fg(app.theme.text_dim),
        )));
    }
    if let Some(err) = form.submit_error() {
        status.push(Line::from(Span::styled(
            err.to_string(),
            Style::default().fg(app.theme.error),
        )));
    }
    status.push(Line::from(Span::styled(
        "[Enter] save  [Esc] cancel",
        Style::default().fg(app.theme.text_dim),
    )));
    if let Some(area) = rows.last() {
        f.render_widget(Paragraph::new(status).wrap(Wrap { trim: true }), *area);
    }
}

fn render_message(f: &mut Frame<'_>, area: Rect, message: &str, style: Style) {
    let widget = Paragraph::new(message.to_string())
        .style(style)
        .wrap(Wrap { trim: false });
    f.render_widget(widget, area);
}

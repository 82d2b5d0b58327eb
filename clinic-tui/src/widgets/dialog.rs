//! Centered popup with a message body.

use crate::views::helpers::centered_rect;
use ratatui::{
    layout::Rect,
    style::Style,
    text::Text,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

pub struct Dialog<'a> {
    pub title: &'a str,
    pub body: Text<'a>,
    pub border: Style,
    pub width_percent: u16,
    pub height: u16,
}

impl<'a> Dialog<'a> {
    pub fn render(self, f: &mut Frame<'_>, area: Rect) {
        let popup = centered_rect(self.width_percent, self.height, area);
        f.render_widget(Clear, popup);
        let widget = Paragraph::new(self.body)
            .block(
                Block::default()
                    .title(self.title)
                    .borders(Borders::ALL)
                    .border_style(self.border),
            )
            .wrap(Wrap { trim: false });
        f.render_widget(widget, popup);
    }
}

//! Color palettes.

use ratatui::style::{Color, Modifier, Style};

#[derive(Debug, Clone)]
pub struct Theme {
    pub bg: Color,
    pub bg_highlight: Color,
    pub primary: Color,
    pub secondary: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,
    pub text: Color,
    pub text_dim: Color,
    pub border: Color,
    pub border_focus: Color,
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            bg: Color::Rgb(16, 18, 22),
            bg_highlight: Color::Rgb(44, 50, 60),
            primary: Color::Rgb(97, 175, 239),
            secondary: Color::Rgb(198, 120, 221),
            success: Color::Rgb(152, 195, 121),
            warning: Color::Rgb(229, 192, 123),
            error: Color::Rgb(224, 108, 117),
            info: Color::Rgb(86, 182, 194),
            text: Color::Rgb(220, 223, 228),
            text_dim: Color::Rgb(127, 132, 142),
            border: Color::Rgb(62, 68, 81),
            border_focus: Color::Rgb(97, 175, 239),
        }
    }

    pub fn light() -> Self {
        Self {
            bg: Color::Rgb(250, 250, 250),
            bg_highlight: Color::Rgb(222, 226, 232),
            primary: Color::Rgb(64, 120, 242),
            secondary: Color::Rgb(166, 38, 164),
            success: Color::Rgb(80, 161, 79),
            warning: Color::Rgb(193, 132, 1),
            error: Color::Rgb(228, 86, 73),
            info: Color::Rgb(1, 132, 188),
            text: Color::Rgb(56, 58, 66),
            text_dim: Color::Rgb(120, 122, 130),
            border: Color::Rgb(190, 193, 199),
            border_focus: Color::Rgb(64, 120, 242),
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "dark" => Some(Self::dark()),
            "light" => Some(Self::light()),
            _ => None,
        }
    }

    pub fn border_style(&self, focused: bool) -> Style {
        if focused {
            Style::default().fg(self.border_focus)
        } else {
            Style::default().fg(self.border)
        }
    }

    pub fn header_style(&self) -> Style {
        Style::default()
            .fg(self.primary)
            .add_modifier(Modifier::BOLD)
    }

    pub fn highlight_style(&self) -> Style {
        Style::default().bg(self.bg_highlight).fg(self.text)
    }
}

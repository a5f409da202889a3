use ratatui::style::{Color, Modifier, Style};

use analytix_core::{RunStatus, StageState};

/// Color theme for the TUI.
pub struct Theme {
    pub done: Color,
    pub active: Color,
    pub pending: Color,
    pub error: Color,

    pub header_fg: Color,
    pub header_bg: Color,
    pub border: Color,
    pub focus_border: Color,
    pub text: Color,
    pub dim: Color,
    pub highlight_bg: Color,
    pub gauge: Color,
    pub spinner: Color,
    pub footer_fg: Color,
    pub footer_bg: Color,
}

impl Theme {
    /// Slate-and-indigo theme matching the hub's web palette.
    pub fn hub() -> Self {
        Self {
            done: Color::Green,
            active: Color::Cyan,
            pending: Color::DarkGray,
            error: Color::Red,

            header_fg: Color::White,
            header_bg: Color::Indexed(61),
            border: Color::DarkGray,
            focus_border: Color::Indexed(111),
            text: Color::White,
            dim: Color::DarkGray,
            highlight_bg: Color::Rgb(40, 44, 70),
            gauge: Color::Indexed(69),
            spinner: Color::Cyan,
            footer_fg: Color::DarkGray,
            footer_bg: Color::Reset,
        }
    }

    pub fn stage_style(&self, state: StageState) -> Style {
        match state {
            StageState::Pending => Style::default().fg(self.pending),
            StageState::Active => Style::default().fg(self.active).add_modifier(Modifier::BOLD),
            StageState::Done => Style::default().fg(self.done),
        }
    }

    pub fn status_color(&self, status: RunStatus) -> Color {
        match status {
            RunStatus::Idle => self.dim,
            RunStatus::Uploading | RunStatus::Running | RunStatus::Analyzing => self.active,
            RunStatus::Done => self.done,
        }
    }

    pub fn header_style(&self) -> Style {
        Style::default()
            .fg(self.header_fg)
            .bg(self.header_bg)
            .add_modifier(Modifier::BOLD)
    }

    pub fn highlight_style(&self) -> Style {
        Style::default().bg(self.highlight_bg).add_modifier(Modifier::BOLD)
    }

    /// Border of a panel, brighter when it holds focus.
    pub fn border_style(&self, focused: bool) -> Style {
        if focused {
            Style::default().fg(self.focus_border)
        } else {
            Style::default().fg(self.border)
        }
    }

    pub fn footer_style(&self) -> Style {
        Style::default().fg(self.footer_fg).bg(self.footer_bg)
    }
}

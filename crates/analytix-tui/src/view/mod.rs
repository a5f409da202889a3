pub mod analysis;
pub mod help;
pub mod landing;
pub mod login;

use ratatui::Frame;
use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::app::Notice;
use crate::theme::Theme;

/// Spinner frames for animated progress indication.
const SPINNER_FRAMES: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

/// Get the current spinner character based on a tick counter.
pub fn spinner_char(tick: usize) -> char {
    SPINNER_FRAMES[tick % SPINNER_FRAMES.len()]
}

/// Truncate a string to fit in `max_width` columns, appending "…" if truncated.
pub fn truncate(s: &str, max_width: usize) -> String {
    if max_width == 0 {
        return String::new();
    }
    if s.chars().count() <= max_width {
        return s.to_string();
    }
    let mut truncated: String = s.chars().take(max_width.saturating_sub(1)).collect();
    truncated.push('…');
    truncated
}

/// One-line title bar with the product badge and a screen title.
pub fn render_header(f: &mut Frame, area: Rect, theme: &Theme, title: &str) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ANALYTIX HUB ", theme.header_style()),
        Span::styled(
            format!(" {title}"),
            Style::default().fg(theme.text).add_modifier(Modifier::BOLD),
        ),
    ]));
    f.render_widget(header, area);
}

/// Key hints, or the latest notice when there is one.
pub fn render_footer(
    f: &mut Frame,
    area: Rect,
    theme: &Theme,
    notice: Option<&Notice>,
    hints: &str,
) {
    let line = match notice {
        Some(n) => {
            let color = if n.is_error { theme.error } else { theme.done };
            Line::from(Span::styled(format!(" {}", n.text), Style::default().fg(color)))
        }
        None => Line::from(Span::raw(format!(" {hints}"))),
    };
    f.render_widget(Paragraph::new(line).style(theme.footer_style()), area);
}

/// A labelled input line with a cursor when focused.
pub fn field_line<'a>(label: &'a str, value: String, focused: bool, theme: &Theme) -> Line<'a> {
    let cursor = if focused { "▏" } else { "" };
    let value_style = if focused {
        Style::default().fg(theme.text)
    } else {
        Style::default().fg(theme.dim)
    };
    Line::from(vec![
        Span::styled(format!("{label:<10}"), Style::default().fg(theme.dim)),
        Span::styled(format!("{value}{cursor}"), value_style),
    ])
}

/// Create a centered rectangle of the given width (columns) and height (rows).
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let vertical = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .split(area);
    Layout::horizontal([Constraint::Length(width)])
        .flex(Flex::Center)
        .split(vertical[0])[0]
}

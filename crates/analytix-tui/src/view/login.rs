use ratatui::Frame;
use ratatui::layout::{Constraint, Layout};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::app::App;
use crate::model::form::LoginField;
use crate::view::{centered_rect, field_line, render_footer, render_header};

/// Render the Login screen.
pub fn render(f: &mut Frame, app: &App) {
    let theme = &app.theme;
    let chunks = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(10),
        Constraint::Length(1),
    ])
    .split(f.area());

    render_header(f, chunks[0], theme, "Sign in");

    let form = &app.login;
    let lines = vec![
        Line::from(Span::styled(
            "Welcome to AnalytiX Hub",
            Style::default().fg(theme.text).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "Sign in to continue your analyses",
            Style::default().fg(theme.dim),
        )),
        Line::from(""),
        field_line(
            "Username",
            form.username.display(),
            form.focus == LoginField::Username,
            theme,
        ),
        field_line(
            "Password",
            form.password.display(),
            form.focus == LoginField::Password,
            theme,
        ),
        Line::from(""),
        Line::from(Span::styled(
            "[F2] Continue with Google   [F3] Continue with GitHub",
            Style::default().fg(theme.active),
        )),
    ];

    let card = centered_rect(58, 11, chunks[1]);
    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border_style(true))
            .title(" Login "),
    );
    f.render_widget(paragraph, card);

    render_footer(
        f,
        chunks[2],
        theme,
        app.notice.as_ref(),
        "Enter sign in · Tab switch field · Esc quit",
    );
}

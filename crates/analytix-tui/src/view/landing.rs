use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState};

use crate::app::App;
use crate::model::landing::LandingFocus;
use crate::view::{field_line, render_footer, render_header, truncate};

/// Render the Landing screen.
pub fn render(f: &mut Frame, app: &App) {
    let theme = &app.theme;
    let chunks = Layout::vertical([
        Constraint::Length(1), // header
        Constraint::Length(8), // create + overview
        Constraint::Min(5),    // recent analyses
        Constraint::Length(1), // footer
    ])
    .split(f.area());

    let user = app
        .landing
        .overview
        .current_user
        .as_deref()
        .unwrap_or("guest");
    render_header(f, chunks[0], theme, &format!("Welcome, {user}"));

    let top = Layout::horizontal([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(chunks[1]);
    render_create(f, top[0], app);
    render_overview(f, top[1], app);
    render_recent(f, chunks[2], app);

    let hints = match app.landing.focus {
        LandingFocus::Name => "Enter create · Tab recent · Esc sign out",
        LandingFocus::Recent => "Enter open · j/k move · Tab new · ? help · q quit",
    };
    render_footer(f, chunks[3], theme, app.notice.as_ref(), hints);
}

fn render_create(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let focused = app.landing.focus == LandingFocus::Name;
    let lines = vec![
        Line::from(Span::styled(
            "Start a new analysis",
            Style::default().fg(theme.text).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        field_line("Name", app.landing.name.display(), focused, theme),
        Line::from(""),
        Line::from(Span::styled(
            "Give it a name and press Enter",
            Style::default().fg(theme.dim),
        )),
    ];
    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border_style(focused))
            .title(" Create new analysis "),
    );
    f.render_widget(paragraph, area);
}

fn render_overview(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let overview = &app.landing.overview;
    let last_login = overview
        .last_login
        .map(|t| {
            t.with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M")
                .to_string()
        })
        .unwrap_or_else(|| "-".to_string());

    let row = |label: &'static str, value: String| {
        Line::from(vec![
            Span::styled(format!("{label:<18}"), Style::default().fg(theme.dim)),
            Span::styled(value, Style::default().fg(theme.text)),
        ])
    };
    let lines = vec![
        row("Total logins", overview.login_count.to_string()),
        row("Projects created", overview.projects_created.to_string()),
        row("Last login", last_login),
        Line::from(vec![
            Span::styled(format!("{:<18}", "Status"), Style::default().fg(theme.dim)),
            Span::styled("All systems normal", Style::default().fg(theme.done)),
        ]),
    ];
    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border_style(false))
            .title(" Overview "),
    );
    f.render_widget(paragraph, area);
}

fn render_recent(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let focused = app.landing.focus == LandingFocus::Recent;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border_style(focused))
        .title(" Recent analyses ");

    if app.landing.recent.is_empty() {
        let empty = Paragraph::new(Span::styled(
            "No analyses yet. Create one above.",
            Style::default().fg(theme.dim),
        ))
        .block(block);
        f.render_widget(empty, area);
        return;
    }

    let header = Row::new(
        ["Name", "Created"]
            .map(|h| Cell::from(h).style(Style::default().fg(theme.text).add_modifier(Modifier::BOLD))),
    );
    let name_width = (area.width as usize).saturating_sub(24);
    let rows: Vec<Row> = app
        .landing
        .recent
        .iter()
        .map(|meta| {
            let created = meta
                .created()
                .map(|t| {
                    t.with_timezone(&chrono::Local)
                        .format("%Y-%m-%d %H:%M")
                        .to_string()
                })
                .unwrap_or_default();
            Row::new(vec![
                Cell::from(truncate(&meta.name, name_width)),
                Cell::from(created).style(Style::default().fg(theme.dim)),
            ])
        })
        .collect();

    let table = Table::new(rows, [Constraint::Min(10), Constraint::Length(18)])
        .header(header)
        .block(block)
        .row_highlight_style(theme.highlight_style());

    let mut state = TableState::default();
    if focused {
        state.select(Some(app.landing.cursor));
    }
    f.render_stateful_widget(table, area, &mut state);
}

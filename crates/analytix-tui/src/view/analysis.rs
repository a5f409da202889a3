use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Gauge, List, ListItem, Paragraph, Row, Table, Wrap};

use analytix_core::{ALLOWED_EXTENSIONS, RunStatus, stage_badges};

use crate::app::App;
use crate::model::analysis::AnalysisFocus;
use crate::view::{field_line, render_footer, render_header, spinner_char, truncate};

/// Render the Analysis screen.
pub fn render(f: &mut Frame, app: &App) {
    let theme = &app.theme;
    let chunks = Layout::vertical([
        Constraint::Length(1), // header
        Constraint::Length(7), // input
        Constraint::Length(5), // progress + stages
        Constraint::Min(6),    // output + log
        Constraint::Length(1), // footer
    ])
    .split(f.area());

    render_header(f, chunks[0], theme, &format!("Analysis · {}", app.analysis.name));
    render_input(f, chunks[1], app);
    render_progress(f, chunks[2], app);

    let bottom = Layout::horizontal([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(chunks[3]);
    render_output(f, bottom[0], app);
    render_log(f, bottom[1], app);

    let hints = match app.analysis.focus {
        AnalysisFocus::Path => "Enter select file · Tab controls · Esc controls",
        AnalysisFocus::Controls => "s start · r reset · e export · Tab file · Esc back · ? help",
    };
    render_footer(f, chunks[4], theme, app.notice.as_ref(), hints);
}

fn render_input(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let focused = app.analysis.focus == AnalysisFocus::Path;
    let selected = match &app.snapshot.input {
        Some(input) => Line::from(vec![
            Span::styled(format!("{:<10}", "Selected"), Style::default().fg(theme.dim)),
            Span::styled(
                format!("{} ({} KB)", input.name, input.size_kb()),
                Style::default().fg(theme.text),
            ),
        ]),
        None => Line::from(Span::styled(
            "No file selected",
            Style::default().fg(theme.dim),
        )),
    };
    let lines = vec![
        field_line("File", app.analysis.path.display(), focused, theme),
        selected,
        Line::from(""),
        Line::from(Span::styled(
            format!("Accepted: {}", ALLOWED_EXTENSIONS.join(" ")),
            Style::default().fg(theme.dim),
        )),
    ];
    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border_style(focused))
            .title(" Input "),
    );
    f.render_widget(paragraph, area);
}

fn render_progress(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let snap = &app.snapshot;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border_style(app.analysis.focus == AnalysisFocus::Controls))
        .title(" Output bar ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .split(inner);

    let label = if snap.status.is_in_flight() {
        format!("{} {}%  {}", spinner_char(app.tick), snap.progress, snap.status.label())
    } else {
        format!("{}%  {}", snap.progress, snap.status.label())
    };
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(theme.gauge))
        .percent(u16::from(snap.progress.min(100)))
        .label(label);
    f.render_widget(gauge, rows[0]);

    let mut spans = Vec::new();
    for (i, badge) in stage_badges(snap.status).iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" › ", Style::default().fg(theme.dim)));
        }
        spans.push(Span::styled(badge.label, theme.stage_style(badge.state)));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), rows[2]);
}

fn render_output(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border_style(false))
        .title(format!(" Output ({}) ", app.snapshot.results.len()));

    if app.snapshot.results.is_empty() {
        let empty = Paragraph::new(Span::styled(
            "No output yet. Upload a file to begin.",
            Style::default().fg(theme.dim),
        ))
        .block(block);
        f.render_widget(empty, area);
        return;
    }

    let header = Row::new(
        ["S.No", "File name", "Type", "Description", "Key findings / insights"]
            .map(|h| Cell::from(h).style(Style::default().fg(theme.text).add_modifier(Modifier::BOLD))),
    );
    let name_width = (area.width as usize / 4).max(8);
    let rows: Vec<Row> = app
        .snapshot
        .results
        .iter()
        .map(|r| {
            Row::new(vec![
                Cell::from(r.ordinal.to_string()),
                Cell::from(truncate(&r.file_name, name_width)),
                Cell::from(r.file_type.clone()).style(Style::default().fg(theme.active)),
                Cell::from(r.description.clone()),
                Cell::from(r.insights.clone()).style(Style::default().fg(theme.dim)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(5),
        Constraint::Min(10),
        Constraint::Length(6),
        Constraint::Length(26),
        Constraint::Min(20),
    ];
    let table = Table::new(rows, widths).header(header).block(block);
    f.render_widget(table, area);
}

fn render_log(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border_style(false))
        .title(" Verbose log ");

    if app.snapshot.log.is_empty() {
        let waiting = Paragraph::new(Span::styled(
            "Waiting for input...",
            Style::default().fg(theme.dim),
        ))
        .wrap(Wrap { trim: true })
        .block(block);
        f.render_widget(waiting, area);
        return;
    }

    let visible = area.height.saturating_sub(2) as usize;
    let skip = app.snapshot.log.len().saturating_sub(visible);
    let done = app.snapshot.status == RunStatus::Done;
    let last = app.snapshot.log.len().saturating_sub(1);
    let items: Vec<ListItem> = app
        .snapshot
        .log
        .iter()
        .enumerate()
        .skip(skip)
        .map(|(i, line)| {
            let style = if i == last && !done {
                Style::default().fg(theme.active)
            } else {
                Style::default().fg(theme.text)
            };
            ListItem::new(Line::from(vec![
                Span::styled("• ", Style::default().fg(theme.status_color(app.snapshot.status))),
                Span::styled(line.clone(), style),
            ]))
        })
        .collect();
    f.render_widget(List::new(items).block(block), area);
}

//! UI rendering for the TUI.

mod card;
mod form;

use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, InputMode};

/// Accent for focused elements
const FOCUS: Color = Color::Rgb(139, 117, 255);
/// Dim gray for secondary text
const DIM: Color = Color::Rgb(128, 128, 128);
/// Border color for the notice modal
const BORDER_NOTICE: Color = Color::Rgb(220, 80, 80);

/// Render the application UI.
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Layout: header, body, prompt, footer
    let chunks = Layout::vertical([
        Constraint::Length(3), // Header
        Constraint::Min(10),   // Form + preview
        Constraint::Length(prompt_height(app)),
        Constraint::Length(1), // Footer
    ])
    .split(area);

    render_header(frame, app, chunks[0]);

    // A 9:16 card in cells roughly twice as tall as wide.
    let body = chunks[1];
    let preview_width = (body.height as u32 * 9 / 8).min(body.width as u32 / 2) as u16;
    let columns =
        Layout::horizontal([Constraint::Min(30), Constraint::Length(preview_width + 2)])
            .split(body);

    form::render_form(frame, app, columns[0]);
    card::render_preview(frame, &app.card(), columns[1]);

    render_prompt(frame, app, chunks[2]);
    render_footer(frame, app, chunks[3]);

    if let Some(notice) = &app.notice {
        render_notice(frame, &notice.title, &notice.message, area);
    }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let data = app.data();
    let title = Line::from(vec![
        Span::styled(
            " wrapcard ",
            Style::default().fg(FOCUS).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("│ {} │ {}", data.year, data.language.native_name()),
            Style::default().fg(DIM),
        ),
    ]);
    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(DIM));
    frame.render_widget(Paragraph::new(title).block(block), area);
}

fn prompt_height(app: &App) -> u16 {
    match app.mode {
        InputMode::PhotoPath(_) | InputMode::Persona(_) => 3,
        _ => 0,
    }
}

/// Input line for the photo path and persona prompts.
fn render_prompt(frame: &mut Frame, app: &App, area: Rect) {
    let (title, buffer) = match &app.mode {
        InputMode::PhotoPath(buffer) => (" Photo file (Enter load, Esc cancel) ", buffer),
        InputMode::Persona(buffer) => (" Persona for autofill (Enter generate, Esc cancel) ", buffer),
        _ => return,
    };

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(FOCUS));
    let line = Line::from(vec![
        Span::raw(buffer.as_str()),
        Span::styled("█", Style::default().fg(FOCUS)),
    ]);
    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Yellow));
    let mut spans = match app.mode {
        InputMode::EditField => vec![
            key(" type"),
            Span::raw(" edit  "),
            key("Enter/Esc"),
            Span::raw(" done  "),
            key("↑/↓"),
            Span::raw(" move  "),
        ],
        _ => vec![
            key(" ↑/↓"),
            Span::raw(" select  "),
            key("Enter"),
            Span::raw(" edit  "),
            key("←/→"),
            Span::raw(" language  "),
            key("p"),
            Span::raw(" photo  "),
            key("a"),
            Span::raw(" autofill  "),
            key("e"),
            Span::raw(" export  "),
            key("q"),
            Span::raw(" quit  "),
        ],
    };

    let status = if app.autofilling {
        Some("Generating...".to_string())
    } else if app.is_exporting() {
        Some("Exporting...".to_string())
    } else {
        app.status.clone()
    };
    if let Some(status) = status {
        spans.push(Span::raw("│ "));
        spans.push(Span::styled(status, Style::default().fg(DIM)));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Centered modal with a failure message.
fn render_notice(frame: &mut Frame, title: &str, message: &str, area: Rect) {
    let modal = centered_rect(60, 7, area);
    frame.render_widget(Clear, modal);

    let block = Block::default()
        .title(format!(" {} ", title))
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(BORDER_NOTICE));
    let text = vec![
        Line::from(message.to_string()),
        Line::from(""),
        Line::from(Span::styled("press any key", Style::default().fg(DIM))),
    ];
    frame.render_widget(
        Paragraph::new(text)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        modal,
    );
}

/// A rect of `percent_x`% width and `height` rows centered in `area`.
fn centered_rect(percent_x: u16, height: u16, area: Rect) -> Rect {
    let width = area.width * percent_x / 100;
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

/// Truncate a string to at most `max_len` characters, ending in "...".
fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}

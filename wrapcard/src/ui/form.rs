use super::*;

use crate::app::FormField;

/// Width of the label column
const LABEL_WIDTH: usize = 22;

/// Render the field list.
pub(super) fn render_form(frame: &mut Frame, app: &App, area: Rect) {
    let data = app.data();
    let editing = app.mode == InputMode::EditField;
    let value_width = (area.width as usize).saturating_sub(LABEL_WIDTH + 5);

    let mut lines = Vec::with_capacity(app.fields().len() + 2);
    for (i, field) in app.fields().iter().enumerate() {
        if matches!(field, FormField::Artist(0) | FormField::Song(0)) {
            lines.push(Line::from(""));
        }

        let selected = i == app.selected;
        let marker = if selected { "▶ " } else { "  " };
        let label = truncate_string(&field.label(data), LABEL_WIDTH);
        let mut value = truncate_string(&field.value(data), value_width);
        if selected && editing {
            value.push('█');
        }

        let label_style = if selected {
            Style::default().fg(FOCUS).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(DIM)
        };
        let value_style = match field {
            FormField::AccentColor => Style::default().fg(accent(data)),
            _ if selected => Style::default().add_modifier(Modifier::BOLD),
            _ => Style::default(),
        };

        lines.push(Line::from(vec![
            Span::styled(marker, Style::default().fg(FOCUS)),
            Span::styled(format!("{:<width$}", label, width = LABEL_WIDTH), label_style),
            Span::raw(" "),
            Span::styled(value, value_style),
        ]));
    }

    let border = if editing { FOCUS } else { DIM };
    let block = Block::default()
        .title(" Card ")
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(border));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn accent(data: &wrapcard_core::WrappedData) -> Color {
    let c = wrapcard_core::card::accent_color(data);
    Color::Rgb(c.r, c.g, c.b)
}

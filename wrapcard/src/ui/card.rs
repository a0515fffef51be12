use ratatui::buffer::Buffer;
use ratatui::layout::Margin;

use super::*;

use wrapcard_core::card::{Bounds, Card, Node, Overflow, Rgba, Rotation, TextNode};

/// Below this alpha a fill is treated as invisible in the terminal.
const MIN_FILL_ALPHA: u8 = 0x80;

/// Maps logical card units onto terminal cells.
struct CellMap {
    card_width: u32,
    card_height: u32,
    area: Rect,
}

impl CellMap {
    fn x(&self, units: u32) -> u16 {
        self.area.x + (units.min(self.card_width) * self.area.width as u32 / self.card_width) as u16
    }

    fn y(&self, units: u32) -> u16 {
        self.area.y
            + (units.min(self.card_height) * self.area.height as u32 / self.card_height) as u16
    }

    /// Cell rect covering `bounds`; never empty, never outside the area.
    fn rect(&self, bounds: Bounds) -> Rect {
        let x0 = self.x(bounds.x).min(self.area.right().saturating_sub(1));
        let y0 = self.y(bounds.y).min(self.area.bottom().saturating_sub(1));
        let x1 = self.x(bounds.right()).max(x0 + 1);
        let y1 = self.y(bounds.bottom()).max(y0 + 1);
        Rect::new(x0, y0, x1 - x0, y1 - y0)
    }
}

fn rgb(color: Rgba) -> Color {
    Color::Rgb(color.r, color.g, color.b)
}

/// Render a cell approximation of the card.
pub(super) fn render_preview(frame: &mut Frame, card: &Card, area: Rect) {
    let block = Block::default()
        .title(" Preview ")
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(DIM));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.width < 4 || inner.height < 4 || card.width == 0 || card.height == 0 {
        return;
    }

    let map = CellMap {
        card_width: card.width,
        card_height: card.height,
        area: inner,
    };
    let buf = frame.buffer_mut();

    for node in &card.nodes {
        match node {
            Node::Fill { bounds, color } if color.a >= MIN_FILL_ALPHA => {
                buf.set_style(map.rect(*bounds), Style::default().bg(rgb(*color)));
            }
            Node::Photo {
                bounds,
                border_color,
                source,
                placeholder,
                ..
            } => draw_photo(buf, map.rect(*bounds), *border_color, *placeholder, source),
            Node::Checkerboard {
                bounds, light, dark, ..
            } => {
                let rect = map.rect(*bounds);
                for x in rect.left()..rect.right() {
                    let (top, bottom) = if (x - rect.left()) % 2 == 0 {
                        (*light, *dark)
                    } else {
                        (*dark, *light)
                    };
                    buf.set_string(
                        x,
                        rect.top(),
                        "▀",
                        Style::default().fg(rgb(top)).bg(rgb(bottom)),
                    );
                }
            }
            Node::Text(text) => draw_text(buf, map.rect(text.bounds), text),
            Node::Fill { .. } | Node::Glow { .. } => {}
        }
    }
}

fn draw_photo(buf: &mut Buffer, rect: Rect, border: Rgba, placeholder: Rgba, source: &str) {
    buf.set_style(rect, Style::default().bg(rgb(border)));
    let inner = rect.inner(Margin::new(1, 1));
    if inner.width == 0 || inner.height == 0 {
        return;
    }
    buf.set_style(inner, Style::default().bg(rgb(placeholder)));

    let label = if source.starts_with("data:") {
        "♪ photo"
    } else if source.is_empty() {
        "no photo"
    } else {
        "♪ linked photo"
    };
    let label = truncate_string(label, inner.width as usize);
    let x = inner.x + (inner.width - label.chars().count() as u16) / 2;
    let y = inner.y + inner.height / 2;
    buf.set_string(x, y, label, Style::default().fg(Color::White));
}

fn draw_text(buf: &mut Buffer, rect: Rect, node: &TextNode) {
    let text = node.display_text();
    let style = Style::default()
        .fg(rgb(node.color))
        .add_modifier(Modifier::BOLD);

    match (node.rotation, node.overflow) {
        (Rotation::Ccw90, _) => {
            // Bottom-to-top, one character per row.
            let chars: Vec<char> = text.chars().take(rect.height as usize).collect();
            let x = rect.x + rect.width / 2;
            let start = rect.bottom() - 1 - (rect.height - chars.len() as u16) / 2;
            for (i, ch) in chars.iter().enumerate() {
                buf.set_string(x, start - i as u16, ch.to_string(), style);
            }
        }
        (Rotation::None, Overflow::Ellipsis) => {
            let y = rect.y + (rect.height - 1) / 2;
            buf.set_string(rect.x, y, truncate_string(&text, rect.width as usize), style);
        }
        (Rotation::None, Overflow::Wrap) => {
            let lines = wrap_words(&text, rect.width as usize);
            let rows = rect.height as usize;
            for (i, line) in lines.iter().take(rows).enumerate() {
                let line = if i + 1 == rows && lines.len() > rows {
                    truncate_string(&format!("{} ...", line), rect.width as usize)
                } else {
                    line.clone()
                };
                buf.set_string(rect.x, rect.y + i as u16, line, style);
            }
        }
    }
}

/// Greedy word wrap by character count.
fn wrap_words(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};
    use wrapcard_core::{render_card, WrappedData};

    #[test]
    fn test_cell_map_stays_in_area() {
        let map = CellMap {
            card_width: 400,
            card_height: 711,
            area: Rect::new(10, 5, 40, 36),
        };
        assert_eq!(map.rect(Bounds::new(0, 0, 400, 711)), Rect::new(10, 5, 40, 36));
        let thin = map.rect(Bounds::new(20, 664, 360, 1));
        assert_eq!(thin.height, 1);
        assert!(thin.bottom() <= 41);
    }

    #[test]
    fn test_wrap_words() {
        assert_eq!(wrap_words("Deutscher Hip Hop", 10), vec!["Deutscher", "Hip Hop"]);
        assert!(wrap_words("", 10).is_empty());
    }

    #[test]
    fn test_preview_shows_headings_and_entries() {
        let mut data = WrappedData::sample();
        data.language = wrapcard_core::Language::En;
        let card = render_card(&data);

        let mut terminal = Terminal::new(TestBackend::new(50, 44)).unwrap();
        terminal
            .draw(|frame| render_preview(frame, &card, frame.area()))
            .unwrap();

        let buffer = terminal.backend().buffer().clone();
        let mut screen = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                screen.push_str(buffer[(x, y)].symbol());
            }
            screen.push('\n');
        }
        assert!(screen.contains("TOP ARTISTS"), "{}", screen);
        assert!(screen.contains("BERGSTEIGEN"), "{}", screen);
    }
}

//! Card renderer.
//!
//! [`render_card`] turns a [`WrappedData`] into a [`Card`]: a flat list of
//! positioned nodes in a fixed 400x711 logical frame (9:16). The tree is a
//! plain value, so identical input always produces an equal card, and the
//! same value is what the terminal preview draws and what export rasterizes.

use crate::types::{WrappedData, DEFAULT_ACCENT, RANK_SLOTS};

/// Logical card width.
pub const CARD_WIDTH: u32 = 400;
/// Logical card height.
pub const CARD_HEIGHT: u32 = 711;

/// Height of the photo/year region.
const TOP_HEIGHT: u32 = 390;
/// Width of the rotated-year strip on the left.
const YEAR_STRIP_WIDTH: u32 = 85;
/// Checkerboard divider geometry.
const CHECKER_CELL: u32 = 10;
const CHECKER_ROWS: u32 = 2;

const PADDING: u32 = 20;
const COLUMN_GAP: u32 = 24;
const COLUMN_WIDTH: u32 = (CARD_WIDTH - 2 * PADDING - COLUMN_GAP) / 2;
const LIST_TOP: u32 = TOP_HEIGHT + CHECKER_ROWS * CHECKER_CELL + 24;
const ROW_HEIGHT: u32 = 21;
const RANK_WIDTH: u32 = 20;
const STATS_TOP: u32 = 574;
const FOOTER_TOP: u32 = 664;

const BACKGROUND: Rgba = Rgba::rgb(0x19, 0x19, 0x19);
const HEADING: Rgba = Rgba::rgb(0xb3, 0xb3, 0xb3);
const WHITE: Rgba = Rgba::rgb(0xff, 0xff, 0xff);
const HAIRLINE: Rgba = Rgba::new(0xff, 0xff, 0xff, 0x1a);

const FOOTER_TEXT: &str = "YOUR YEAR IN MUSIC";

/// An RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 0xff)
    }

    /// Parse `#RRGGBB`, `#RGB` or the same without the leading `#`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.trim().trim_start_matches('#');
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match digits.len() {
            6 => Some(Self::rgb(
                channel(&digits[0..2])?,
                channel(&digits[2..4])?,
                channel(&digits[4..6])?,
            )),
            3 => {
                let expand = |i: usize| channel(&digits[i..i + 1]).map(|v| v * 17);
                Some(Self::rgb(expand(0)?, expand(1)?, expand(2)?))
            }
            _ => None,
        }
    }

    /// Same color with a different alpha.
    pub const fn with_alpha(self, a: u8) -> Self {
        Self::new(self.r, self.g, self.b, a)
    }
}

/// Axis-aligned rectangle in logical card units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bounds {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Bounds {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub const fn right(&self) -> u32 {
        self.x + self.width
    }

    pub const fn bottom(&self) -> u32 {
        self.y + self.height
    }
}

/// Which list a ranked row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Artists,
    Songs,
    Minutes,
    Genre,
}

/// What a text node shows. Lets callers find nodes without depending on geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextRole {
    Year,
    Heading(Section),
    /// 1-based rank number of a list row
    Rank(Section, usize),
    /// Entry text of a list row (1-based rank)
    Entry(Section, usize),
    Minutes,
    Genre,
    Footer,
}

/// How text that does not fit its bounds behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Overflow {
    /// Single line, cut with an ellipsis
    Ellipsis,
    /// Wrap on word boundaries, never cut
    Wrap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Weight {
    Bold,
    ExtraBold,
    Black,
}

/// Text rotation. `Ccw90` reads bottom-to-top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rotation {
    None,
    Ccw90,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextNode {
    pub role: TextRole,
    pub content: String,
    pub bounds: Bounds,
    /// Font size in logical pixels
    pub size: f32,
    pub weight: Weight,
    pub color: Rgba,
    pub overflow: Overflow,
    pub rotation: Rotation,
    pub uppercase: bool,
}

impl TextNode {
    /// Text as it should be drawn (case applied).
    pub fn display_text(&self) -> String {
        if self.uppercase {
            self.content.to_uppercase()
        } else {
            self.content.clone()
        }
    }
}

/// One element of the card.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Solid rectangle
    Fill { bounds: Bounds, color: Rgba },
    /// Soft radial highlight, purely decorative
    Glow {
        center: (u32, u32),
        radius: u32,
        color: Rgba,
        opacity: f32,
    },
    /// Photo cropped to fill `bounds`, inside a border of `border` units
    Photo {
        bounds: Bounds,
        border: u32,
        border_color: Rgba,
        source: String,
        placeholder: Rgba,
    },
    /// Alternating light/dark cells
    Checkerboard {
        bounds: Bounds,
        cell: u32,
        light: Rgba,
        dark: Rgba,
    },
    Text(TextNode),
}

/// A rendered card. Nodes are in paint order.
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub width: u32,
    pub height: u32,
    pub nodes: Vec<Node>,
}

impl Card {
    /// All text nodes, in paint order.
    pub fn texts(&self) -> impl Iterator<Item = &TextNode> {
        self.nodes.iter().filter_map(|node| match node {
            Node::Text(text) => Some(text),
            _ => None,
        })
    }

    /// The text node with the given role, if present.
    pub fn text(&self, role: TextRole) -> Option<&TextNode> {
        self.texts().find(|t| t.role == role)
    }

    /// Entries of a ranked section as `(rank, text)` pairs.
    pub fn ranked(&self, section: Section) -> Vec<(usize, &str)> {
        self.texts()
            .filter_map(|t| match t.role {
                TextRole::Entry(s, rank) if s == section => Some((rank, t.content.as_str())),
                _ => None,
            })
            .collect()
    }

    /// The photo node.
    pub fn photo(&self) -> Option<&Node> {
        self.nodes.iter().find(|n| matches!(n, Node::Photo { .. }))
    }
}

/// Resolve the accent color, falling back to the sample accent.
pub fn accent_color(data: &WrappedData) -> Rgba {
    Rgba::from_hex(&data.accent_color)
        .or_else(|| Rgba::from_hex(DEFAULT_ACCENT))
        .unwrap_or(WHITE)
}

/// Render a card.
pub fn render_card(data: &WrappedData) -> Card {
    let accent = accent_color(data);
    let labels = data.labels();
    let mut nodes = Vec::new();

    nodes.push(Node::Fill {
        bounds: Bounds::new(0, 0, CARD_WIDTH, CARD_HEIGHT),
        color: BACKGROUND,
    });

    // Top region: rotated year on the left, framed photo on the right.
    nodes.push(Node::Text(TextNode {
        role: TextRole::Year,
        content: data.year.clone(),
        bounds: Bounds::new(0, 0, YEAR_STRIP_WIDTH, TOP_HEIGHT),
        size: 150.0,
        weight: Weight::Black,
        color: accent.with_alpha(0xe6),
        overflow: Overflow::Ellipsis,
        rotation: Rotation::Ccw90,
        uppercase: false,
    }));
    nodes.push(Node::Fill {
        bounds: Bounds::new(YEAR_STRIP_WIDTH - 1, 0, 1, TOP_HEIGHT),
        color: HAIRLINE,
    });
    nodes.push(Node::Glow {
        center: (CARD_WIDTH - 64, 104),
        radius: 64,
        color: accent,
        opacity: 0.2,
    });

    let photo_left = YEAR_STRIP_WIDTH + 8;
    let photo_size = CARD_WIDTH - photo_left - 16;
    nodes.push(Node::Photo {
        bounds: Bounds::new(photo_left, (TOP_HEIGHT - photo_size) / 2, photo_size, photo_size),
        border: 5,
        border_color: WHITE,
        source: data.image_src.clone(),
        placeholder: accent,
    });

    nodes.push(Node::Checkerboard {
        bounds: Bounds::new(0, TOP_HEIGHT, CARD_WIDTH, CHECKER_ROWS * CHECKER_CELL),
        cell: CHECKER_CELL,
        light: WHITE,
        dark: Rgba::rgb(0, 0, 0),
    });

    // Bottom region.
    nodes.push(Node::Glow {
        center: (CARD_WIDTH - 64, CARD_HEIGHT - 64),
        radius: 128,
        color: WHITE,
        opacity: 0.05,
    });

    let left = PADDING;
    let right = PADDING + COLUMN_WIDTH + COLUMN_GAP;
    push_ranked(&mut nodes, Section::Artists, labels.artists, &data.top_artists, left);
    push_ranked(&mut nodes, Section::Songs, labels.songs, &data.top_songs, right);

    nodes.push(heading(Section::Minutes, labels.minutes, left, STATS_TOP));
    nodes.push(Node::Text(TextNode {
        role: TextRole::Minutes,
        content: data.minutes_listened.clone(),
        bounds: Bounds::new(left, STATS_TOP + 18, COLUMN_WIDTH, 40),
        size: 32.0,
        weight: Weight::Black,
        color: WHITE,
        overflow: Overflow::Ellipsis,
        rotation: Rotation::None,
        uppercase: false,
    }));
    nodes.push(heading(Section::Genre, labels.genre, right, STATS_TOP));
    nodes.push(Node::Text(TextNode {
        role: TextRole::Genre,
        content: data.top_genre.clone(),
        bounds: Bounds::new(right, STATS_TOP + 18, COLUMN_WIDTH, FOOTER_TOP - STATS_TOP - 26),
        size: 26.0,
        weight: Weight::Black,
        color: WHITE,
        overflow: Overflow::Wrap,
        rotation: Rotation::None,
        uppercase: false,
    }));

    nodes.push(Node::Fill {
        bounds: Bounds::new(PADDING, FOOTER_TOP, CARD_WIDTH - 2 * PADDING, 1),
        color: HAIRLINE,
    });
    nodes.push(Node::Text(TextNode {
        role: TextRole::Footer,
        content: FOOTER_TEXT.to_string(),
        bounds: Bounds::new(PADDING, FOOTER_TOP + 16, CARD_WIDTH - 2 * PADDING, 18),
        size: 13.0,
        weight: Weight::Black,
        color: WHITE.with_alpha(0xe6),
        overflow: Overflow::Ellipsis,
        rotation: Rotation::None,
        uppercase: true,
    }));

    Card {
        width: CARD_WIDTH,
        height: CARD_HEIGHT,
        nodes,
    }
}

fn heading(section: Section, label: &str, x: u32, y: u32) -> Node {
    Node::Text(TextNode {
        role: TextRole::Heading(section),
        content: label.to_string(),
        bounds: Bounds::new(x, y, COLUMN_WIDTH, 16),
        size: 11.0,
        weight: Weight::Bold,
        color: HEADING,
        overflow: Overflow::Ellipsis,
        rotation: Rotation::None,
        uppercase: true,
    })
}

fn push_ranked(nodes: &mut Vec<Node>, section: Section, label: &str, entries: &[String], x: u32) {
    nodes.push(heading(section, label, x, LIST_TOP));

    for (i, entry) in entries.iter().take(RANK_SLOTS).enumerate() {
        let rank = i + 1;
        let y = LIST_TOP + 20 + i as u32 * ROW_HEIGHT;
        nodes.push(Node::Text(TextNode {
            role: TextRole::Rank(section, rank),
            content: rank.to_string(),
            bounds: Bounds::new(x, y, RANK_WIDTH, ROW_HEIGHT),
            size: 14.0,
            weight: Weight::Bold,
            color: WHITE,
            overflow: Overflow::Ellipsis,
            rotation: Rotation::None,
            uppercase: false,
        }));
        nodes.push(Node::Text(TextNode {
            role: TextRole::Entry(section, rank),
            content: entry.clone(),
            bounds: Bounds::new(x + RANK_WIDTH, y, COLUMN_WIDTH - RANK_WIDTH, ROW_HEIGHT),
            size: 15.0,
            weight: Weight::ExtraBold,
            color: WHITE,
            overflow: Overflow::Ellipsis,
            rotation: Rotation::None,
            uppercase: false,
        }));
    }
}

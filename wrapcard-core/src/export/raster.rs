//! Software rasterizer for [`Card`] trees.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ab_glyph::{Font, FontRef, PxScale, ScaleFont};
use image::imageops::{self, FilterType};
use image::{Pixel, Rgba as Px, RgbaImage};
use imageproc::drawing::draw_text_mut;

use super::{load_photo, RasterizeCard};
use crate::card::{Bounds, Card, Node, Overflow, Rgba, Rotation, TextNode, Weight};
use crate::config::ExportConfig;
use crate::error::{Error, Result};

/// Well-known bold sans-serif faces, probed in order.
const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSansBold.ttf",
    "/System/Library/Fonts/SFNS.ttf",
    "/System/Library/Fonts/Helvetica.ttc",
    "/Library/Fonts/Arial Bold.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
];

/// Smallest font size wrapped text may shrink to, in logical pixels.
const MIN_WRAP_SIZE: f32 = 8.0;

const ELLIPSIS: &str = "...";

/// First existing path from the list of well-known system fonts.
pub fn find_system_font() -> Option<PathBuf> {
    FONT_CANDIDATES
        .iter()
        .map(Path::new)
        .find(|p| p.is_file())
        .map(Path::to_path_buf)
}

/// Draws cards with a single TrueType face.
pub struct Rasterizer {
    font: Vec<u8>,
    pixel_ratio: u32,
    fetch_timeout: Duration,
}

impl Rasterizer {
    /// Build from raw font bytes. Fails if the bytes are not a usable font.
    pub fn new(font: Vec<u8>, pixel_ratio: u32, fetch_timeout: Duration) -> Result<Self> {
        FontRef::try_from_slice(&font)
            .map_err(|_| Error::Export("font data is not a usable font".to_string()))?;
        Ok(Self {
            font,
            pixel_ratio: pixel_ratio.max(1),
            fetch_timeout,
        })
    }

    /// Build from `[export]` settings, probing system fonts when no
    /// `font_path` is configured.
    pub fn from_config(config: &ExportConfig) -> Result<Self> {
        let path = match &config.font_path {
            Some(path) => path.clone(),
            None => find_system_font().ok_or_else(|| {
                Error::Export(
                    "no usable font found; set export.font_path in config.toml".to_string(),
                )
            })?,
        };
        let font = std::fs::read(&path).map_err(|e| {
            Error::Export(format!("cannot read font {}: {}", path.display(), e))
        })?;
        tracing::debug!(font = %path.display(), "Loaded export font");

        Self::new(
            font,
            config.pixel_ratio,
            Duration::from_secs(config.fetch_timeout_secs),
        )
    }

    pub fn pixel_ratio(&self) -> u32 {
        self.pixel_ratio
    }

    fn scaled(&self, bounds: Bounds) -> Bounds {
        let r = self.pixel_ratio;
        Bounds::new(bounds.x * r, bounds.y * r, bounds.width * r, bounds.height * r)
    }

    fn draw_photo(
        &self,
        canvas: &mut RgbaImage,
        bounds: Bounds,
        border: u32,
        border_color: Rgba,
        source: &str,
        placeholder: Rgba,
    ) {
        let outer = self.scaled(bounds);
        fill(canvas, outer, border_color);

        let inset = border * self.pixel_ratio;
        let inner = Bounds::new(
            outer.x + inset,
            outer.y + inset,
            outer.width.saturating_sub(2 * inset),
            outer.height.saturating_sub(2 * inset),
        );
        if inner.width == 0 || inner.height == 0 {
            return;
        }

        match load_photo(source, self.fetch_timeout) {
            Ok(photo) => {
                let cropped = photo
                    .resize_to_fill(inner.width, inner.height, FilterType::Lanczos3)
                    .to_rgba8();
                imageops::overlay(canvas, &cropped, inner.x as i64, inner.y as i64);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Photo unavailable, drawing placeholder");
                fill(canvas, inner, placeholder);
            }
        }
    }

    fn draw_text(&self, canvas: &mut RgbaImage, font: &FontRef<'_>, node: &TextNode) {
        let text = node.display_text();
        if text.trim().is_empty() {
            return;
        }

        let target = self.scaled(node.bounds);
        // Layout happens in an unrotated frame; rotated text swaps the axes.
        let (frame_w, frame_h) = match node.rotation {
            Rotation::None => (target.width, target.height),
            Rotation::Ccw90 => (target.height, target.width),
        };
        if frame_w == 0 || frame_h == 0 {
            return;
        }

        let mut px = node.size * self.pixel_ratio as f32;
        let fit = frame_h as f32 / line_height(font, PxScale::from(px));
        if fit < 1.0 {
            px *= fit;
        }

        let lines = match node.overflow {
            Overflow::Ellipsis => vec![truncate_text(font, PxScale::from(px), &text, frame_w as f32)],
            Overflow::Wrap => {
                let min = MIN_WRAP_SIZE * self.pixel_ratio as f32;
                loop {
                    let lines = wrap_text(font, PxScale::from(px), &text, frame_w as f32);
                    let needed = lines.len() as f32 * line_height(font, PxScale::from(px));
                    if needed <= frame_h as f32 || px <= min {
                        break lines;
                    }
                    px = (px * 0.9).max(min);
                }
            }
        };

        let scale = PxScale::from(px);
        let lh = line_height(font, scale);
        let color = Px([node.color.r, node.color.g, node.color.b, node.color.a]);
        // Transparent pixels carry the text color so edges blend without a dark fringe.
        let mut layer =
            RgbaImage::from_pixel(frame_w, frame_h, Px([node.color.r, node.color.g, node.color.b, 0]));

        let top = match node.overflow {
            Overflow::Ellipsis => ((frame_h as f32 - lh) / 2.0).max(0.0),
            Overflow::Wrap => 0.0,
        };
        let passes = match node.weight {
            Weight::Bold => 1,
            Weight::ExtraBold | Weight::Black => 2,
        };

        for (i, line) in lines.iter().enumerate() {
            let x = match node.rotation {
                Rotation::Ccw90 => ((frame_w as f32 - text_width(font, scale, line)) / 2.0).max(0.0),
                Rotation::None => 0.0,
            };
            let y = top + i as f32 * lh;
            for pass in 0..passes {
                draw_text_mut(
                    &mut layer,
                    color,
                    x as i32 + pass,
                    y as i32,
                    scale,
                    font,
                    line,
                );
            }
        }

        let layer = match node.rotation {
            Rotation::None => layer,
            Rotation::Ccw90 => imageops::rotate270(&layer),
        };
        imageops::overlay(canvas, &layer, target.x as i64, target.y as i64);
    }
}

impl RasterizeCard for Rasterizer {
    fn rasterize(&self, card: &Card) -> Result<RgbaImage> {
        let font = FontRef::try_from_slice(&self.font)
            .map_err(|_| Error::Export("font data is not a usable font".to_string()))?;
        let r = self.pixel_ratio;
        let mut canvas = RgbaImage::new(card.width * r, card.height * r);

        for node in &card.nodes {
            match node {
                Node::Fill { bounds, color } => fill(&mut canvas, self.scaled(*bounds), *color),
                Node::Glow {
                    center,
                    radius,
                    color,
                    opacity,
                } => glow(
                    &mut canvas,
                    (center.0 * r, center.1 * r),
                    radius * r,
                    *color,
                    *opacity,
                ),
                Node::Photo {
                    bounds,
                    border,
                    border_color,
                    source,
                    placeholder,
                } => self.draw_photo(&mut canvas, *bounds, *border, *border_color, source, *placeholder),
                Node::Checkerboard {
                    bounds,
                    cell,
                    light,
                    dark,
                } => checkerboard(&mut canvas, self.scaled(*bounds), cell * r, *light, *dark),
                Node::Text(text) => self.draw_text(&mut canvas, &font, text),
            }
        }

        tracing::debug!(
            width = canvas.width(),
            height = canvas.height(),
            nodes = card.nodes.len(),
            "Rasterized card"
        );
        Ok(canvas)
    }
}

fn to_px(color: Rgba) -> Px<u8> {
    Px([color.r, color.g, color.b, color.a])
}

/// Alpha-blend a rectangle onto the canvas, clipped to its edges.
fn fill(canvas: &mut RgbaImage, bounds: Bounds, color: Rgba) {
    let px = to_px(color);
    let right = bounds.right().min(canvas.width());
    let bottom = bounds.bottom().min(canvas.height());
    for y in bounds.y..bottom {
        for x in bounds.x..right {
            canvas.get_pixel_mut(x, y).blend(&px);
        }
    }
}

/// Radial highlight with quadratic falloff.
fn glow(canvas: &mut RgbaImage, center: (u32, u32), radius: u32, color: Rgba, opacity: f32) {
    if radius == 0 {
        return;
    }
    let (cx, cy) = (center.0 as i64, center.1 as i64);
    let r = radius as i64;
    let (w, h) = (canvas.width() as i64, canvas.height() as i64);

    for y in (cy - r).max(0)..(cy + r).min(h) {
        for x in (cx - r).max(0)..(cx + r).min(w) {
            let d = (((x - cx).pow(2) + (y - cy).pow(2)) as f32).sqrt() / radius as f32;
            if d >= 1.0 {
                continue;
            }
            let strength = opacity.clamp(0.0, 1.0) * (1.0 - d).powi(2);
            let alpha = (strength * 255.0).round() as u8;
            canvas
                .get_pixel_mut(x as u32, y as u32)
                .blend(&Px([color.r, color.g, color.b, alpha]));
        }
    }
}

fn checkerboard(canvas: &mut RgbaImage, bounds: Bounds, cell: u32, light: Rgba, dark: Rgba) {
    if cell == 0 {
        return;
    }
    let right = bounds.right().min(canvas.width());
    let bottom = bounds.bottom().min(canvas.height());
    for y in bounds.y..bottom {
        for x in bounds.x..right {
            let parity = ((x - bounds.x) / cell + (y - bounds.y) / cell) % 2;
            let color = if parity == 0 { light } else { dark };
            canvas.get_pixel_mut(x, y).blend(&to_px(color));
        }
    }
}

fn line_height(font: &FontRef<'_>, scale: PxScale) -> f32 {
    let scaled = font.as_scaled(scale);
    scaled.ascent() - scaled.descent()
}

/// Measure the width of text in pixels
fn text_width(font: &FontRef<'_>, scale: PxScale, text: &str) -> f32 {
    let scaled = font.as_scaled(scale);
    text.chars()
        .map(|ch| scaled.h_advance(font.glyph_id(ch)))
        .sum()
}

/// Truncate text to fit within `max_width`, ending in an ellipsis.
fn truncate_text(font: &FontRef<'_>, scale: PxScale, text: &str, max_width: f32) -> String {
    if text_width(font, scale, text) <= max_width {
        return text.to_string();
    }

    let available = max_width - text_width(font, scale, ELLIPSIS);
    let mut truncated = String::new();
    let mut width = 0.0;
    for ch in text.chars() {
        let advance = text_width(font, scale, ch.encode_utf8(&mut [0; 4]));
        if width + advance > available {
            break;
        }
        width += advance;
        truncated.push(ch);
    }

    format!("{}{}", truncated.trim_end(), ELLIPSIS)
}

/// Greedy word wrap. Words wider than a line are split by character.
fn wrap_text(font: &FontRef<'_>, scale: PxScale, text: &str, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };
        if text_width(font, scale, &candidate) <= max_width {
            current = candidate;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        for ch in word.chars() {
            current.push(ch);
            if current.chars().count() > 1 && text_width(font, scale, &current) > max_width {
                current.pop();
                lines.push(std::mem::take(&mut current));
                current.push(ch);
            }
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

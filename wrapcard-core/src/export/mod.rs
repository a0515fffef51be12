//! PNG export of rendered cards.
//!
//! Rasterization sits behind [`RasterizeCard`] so the save path can be driven
//! without fonts or network access; [`Rasterizer`] is the real implementation.

mod raster;
mod source;

use std::path::{Path, PathBuf};

use image::RgbaImage;

use crate::card::Card;
use crate::error::{Error, Result};

pub use raster::{find_system_font, Rasterizer};
pub use source::load_photo;

/// Turns a [`Card`] into pixels.
pub trait RasterizeCard: Send + Sync {
    fn rasterize(&self, card: &Card) -> Result<RgbaImage>;
}

/// File name for an exported card: `my-wrapped-<year>.png`.
///
/// Path separators and other characters that are unsafe in file names are
/// replaced with `-`.
pub fn export_file_name(year: &str) -> String {
    let year: String = year
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            c if c.is_control() => '-',
            c => c,
        })
        .collect();
    format!("my-wrapped-{}.png", year)
}

/// Encode image as PNG bytes
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    use image::codecs::png::PngEncoder;
    use image::ImageEncoder;

    let mut buffer = Vec::new();
    let encoder = PngEncoder::new(&mut buffer);

    encoder.write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        image::ExtendedColorType::Rgba8,
    )?;

    Ok(buffer)
}

/// Rasterize `card`, encode it and write `dir/file_name`.
///
/// The file only appears once it is complete; a failure at any step leaves
/// nothing behind in `dir`.
pub fn save_png(
    rasterizer: &dyn RasterizeCard,
    card: &Card,
    dir: &Path,
    file_name: &str,
) -> Result<PathBuf> {
    let image = rasterizer.rasterize(card)?;
    let bytes = encode_png(&image)?;

    std::fs::create_dir_all(dir)
        .map_err(|e| Error::Export(format!("cannot create {}: {}", dir.display(), e)))?;

    let target = dir.join(file_name);
    let partial = dir.join(format!(".{}.part", file_name));
    if let Err(e) = std::fs::write(&partial, &bytes) {
        let _ = std::fs::remove_file(&partial);
        return Err(Error::Export(format!(
            "cannot write {}: {}",
            target.display(),
            e
        )));
    }
    if let Err(e) = std::fs::rename(&partial, &target) {
        let _ = std::fs::remove_file(&partial);
        return Err(Error::Export(format!(
            "cannot write {}: {}",
            target.display(),
            e
        )));
    }

    tracing::debug!(path = %target.display(), bytes = bytes.len(), "Wrote PNG");
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::render_card;
    use crate::types::WrappedData;
    use image::Rgba;
    use tempfile::TempDir;

    struct SolidRasterizer;

    impl RasterizeCard for SolidRasterizer {
        fn rasterize(&self, card: &Card) -> Result<RgbaImage> {
            Ok(RgbaImage::from_pixel(
                card.width * 2,
                card.height * 2,
                Rgba([25, 25, 25, 255]),
            ))
        }
    }

    #[test]
    fn test_export_file_name() {
        assert_eq!(export_file_name("2024"), "my-wrapped-2024.png");
        assert_eq!(export_file_name(" 2023 "), "my-wrapped-2023.png");
        assert_eq!(export_file_name("2023/24"), "my-wrapped-2023-24.png");
    }

    #[test]
    fn test_save_png_writes_decodable_file() {
        let dir = TempDir::new().unwrap();
        let card = render_card(&WrappedData::sample());

        let path = save_png(&SolidRasterizer, &card, dir.path(), "my-wrapped-2023.png").unwrap();
        let decoded = image::open(&path).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (800, 1422));

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".part"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_save_png_into_file_path_fails_cleanly() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"x").unwrap();
        let card = render_card(&WrappedData::sample());

        let result = save_png(&SolidRasterizer, &card, &blocker, "my-wrapped-2023.png");
        assert!(matches!(result, Err(Error::Export(_))));
    }
}

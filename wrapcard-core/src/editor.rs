//! Form editor operations.
//!
//! The editor owns no state. It is built around the current [`WrappedData`]
//! and a change callback, and every operation hands the callback a complete
//! replacement record. Build a fresh [`Editor`] after each change: the record
//! it was built from is stale once the callback has fired.

use std::path::Path;

use base64::Engine;

use crate::error::Result;
use crate::types::{Language, WrappedData};

/// A single-field change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    TopArtists(Vec<String>),
    TopSongs(Vec<String>),
    MinutesListened(String),
    TopGenre(String),
    Year(String),
    ImageSrc(String),
    AccentColor(String),
    Language(Language),
}

/// One of the two ranked lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankedList {
    TopArtists,
    TopSongs,
}

impl RankedList {
    /// Borrow the list from a record.
    pub fn entries<'a>(&self, data: &'a WrappedData) -> &'a [String] {
        match self {
            RankedList::TopArtists => &data.top_artists,
            RankedList::TopSongs => &data.top_songs,
        }
    }

    fn edit(&self, entries: Vec<String>) -> Edit {
        match self {
            RankedList::TopArtists => Edit::TopArtists(entries),
            RankedList::TopSongs => Edit::TopSongs(entries),
        }
    }
}

impl WrappedData {
    /// Copy of `self` with one field replaced.
    pub fn with_edit(&self, edit: Edit) -> WrappedData {
        let mut next = self.clone();
        match edit {
            Edit::TopArtists(v) => next.top_artists = v,
            Edit::TopSongs(v) => next.top_songs = v,
            Edit::MinutesListened(v) => next.minutes_listened = v,
            Edit::TopGenre(v) => next.top_genre = v,
            Edit::Year(v) => next.year = v,
            Edit::ImageSrc(v) => next.image_src = v,
            Edit::AccentColor(v) => next.accent_color = v,
            Edit::Language(v) => next.language = v,
        }
        next
    }
}

/// Controlled editor over one [`WrappedData`].
pub struct Editor<'a, F>
where
    F: FnMut(WrappedData),
{
    data: &'a WrappedData,
    on_change: F,
}

impl<'a, F> Editor<'a, F>
where
    F: FnMut(WrappedData),
{
    pub fn new(data: &'a WrappedData, on_change: F) -> Self {
        Self { data, on_change }
    }

    /// The record this editor projects.
    pub fn data(&self) -> &WrappedData {
        self.data
    }

    /// Replace one field and emit the new record.
    pub fn update(&mut self, edit: Edit) {
        let next = self.data.with_edit(edit);
        (self.on_change)(next);
    }

    /// Replace one slot of a ranked list and emit the new record.
    ///
    /// The list keeps its length. An index past the end emits nothing.
    pub fn update_ranked(&mut self, list: RankedList, index: usize, value: impl Into<String>) {
        let current = list.entries(self.data);
        if index >= current.len() {
            tracing::warn!(?list, index, len = current.len(), "Ranked update out of range");
            return;
        }
        let mut entries = current.to_vec();
        entries[index] = value.into();
        self.update(list.edit(entries));
    }

    /// Decode the chosen image file and emit it as `imageSrc`.
    ///
    /// No file, or a file that does not decode as an image, emits nothing.
    pub fn select_image(&mut self, path: Option<&Path>) {
        let Some(path) = path else {
            return;
        };
        self.image_decoded(decode_image_file(path));
    }

    /// Apply the outcome of a background [`decode_image_file`] call.
    pub fn image_decoded(&mut self, decoded: Result<String>) {
        match decoded {
            Ok(data_uri) => self.update(Edit::ImageSrc(data_uri)),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring unusable image");
            }
        }
    }
}

/// Read an image file and encode it as a `data:` URI.
///
/// The bytes must decode as an image; the MIME type comes from the detected
/// format rather than the file extension.
pub fn decode_image_file(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    let format = image::guess_format(&bytes)?;
    image::load_from_memory_with_format(&bytes, format)?;

    let mime = format.to_mime_type();
    let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
    tracing::debug!(path = %path.display(), mime, bytes = bytes.len(), "Decoded image file");
    Ok(format!("data:{};base64,{}", mime, encoded))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use tempfile::TempDir;

    fn capture(data: &WrappedData, f: impl FnOnce(&mut Editor<'_, &mut dyn FnMut(WrappedData)>)) -> Vec<WrappedData> {
        let mut emitted = Vec::new();
        {
            let mut sink = |d: WrappedData| emitted.push(d);
            let mut editor = Editor::new(data, &mut sink as &mut dyn FnMut(WrappedData));
            f(&mut editor);
        }
        emitted
    }

    fn changed_fields(a: &WrappedData, b: &WrappedData) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if a.top_artists != b.top_artists {
            fields.push("topArtists");
        }
        if a.top_songs != b.top_songs {
            fields.push("topSongs");
        }
        if a.minutes_listened != b.minutes_listened {
            fields.push("minutesListened");
        }
        if a.top_genre != b.top_genre {
            fields.push("topGenre");
        }
        if a.year != b.year {
            fields.push("year");
        }
        if a.image_src != b.image_src {
            fields.push("imageSrc");
        }
        if a.accent_color != b.accent_color {
            fields.push("accentColor");
        }
        if a.language != b.language {
            fields.push("language");
        }
        fields
    }

    fn write_png(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("photo.png");
        let img = RgbaImage::from_pixel(4, 4, Rgba([10, 20, 30, 255]));
        img.save_with_format(&path, ImageFormat::Png).unwrap();
        path
    }

    #[test]
    fn test_each_field_update_changes_exactly_one_field() {
        let original = WrappedData::sample();
        let edits = vec![
            (Edit::TopArtists(vec!["X".into(); 5]), "topArtists"),
            (Edit::TopSongs(vec!["Y".into(); 5]), "topSongs"),
            (Edit::MinutesListened("1.234".into()), "minutesListened"),
            (Edit::TopGenre("Jazz".into()), "topGenre"),
            (Edit::Year("2024".into()), "year"),
            (Edit::ImageSrc("https://example.com/a.png".into()), "imageSrc"),
            (Edit::AccentColor("#00FF00".into()), "accentColor"),
            (Edit::Language(Language::Fr), "language"),
        ];

        for (edit, field) in edits {
            let emitted = capture(&original, |editor| editor.update(edit));
            assert_eq!(emitted.len(), 1);
            assert_eq!(changed_fields(&original, &emitted[0]), vec![field]);
        }
        assert_eq!(original, WrappedData::sample(), "input must not be mutated");
    }

    #[test]
    fn test_ranked_update_touches_only_one_slot() {
        let original = WrappedData::sample();
        for index in 0..5 {
            let emitted = capture(&original, |editor| {
                editor.update_ranked(RankedList::TopSongs, index, "New Song")
            });
            let next = &emitted[0].top_songs;
            assert_eq!(next.len(), 5);
            for (i, (before, after)) in original.top_songs.iter().zip(next).enumerate() {
                if i == index {
                    assert_eq!(after, "New Song");
                } else {
                    assert_eq!(before, after);
                }
            }
            assert_eq!(changed_fields(&original, &emitted[0]), vec!["topSongs"]);
        }
    }

    #[test]
    fn test_ranked_update_out_of_range_emits_nothing() {
        let mut data = WrappedData::sample();
        data.top_artists = vec!["A".into(), "B".into()];
        let emitted = capture(&data, |editor| {
            editor.update_ranked(RankedList::TopArtists, 3, "C")
        });
        assert!(emitted.is_empty());
    }

    #[test]
    fn test_select_image_emits_data_uri() {
        let dir = TempDir::new().unwrap();
        let path = write_png(&dir);
        let original = WrappedData::sample();

        let emitted = capture(&original, |editor| editor.select_image(Some(&path)));
        assert_eq!(emitted.len(), 1);
        assert!(emitted[0].image_src.starts_with("data:image/png;base64,"));
        assert_eq!(changed_fields(&original, &emitted[0]), vec!["imageSrc"]);
    }

    #[test]
    fn test_select_image_without_file_is_noop() {
        let original = WrappedData::sample();
        let emitted = capture(&original, |editor| editor.select_image(None));
        assert!(emitted.is_empty());
    }

    #[test]
    fn test_select_image_ignores_non_images() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "definitely not a picture").unwrap();

        let original = WrappedData::sample();
        let emitted = capture(&original, |editor| editor.select_image(Some(&path)));
        assert!(emitted.is_empty());

        let missing = dir.path().join("missing.png");
        let emitted = capture(&original, |editor| editor.select_image(Some(&missing)));
        assert!(emitted.is_empty());
    }

    #[test]
    fn test_decode_image_file_detects_format_from_bytes() {
        let dir = TempDir::new().unwrap();
        let png = write_png(&dir);
        let renamed = dir.path().join("photo.jpg");
        std::fs::rename(&png, &renamed).unwrap();

        let uri = decode_image_file(&renamed).unwrap();
        assert!(uri.starts_with("data:image/png;base64,"));
    }
}

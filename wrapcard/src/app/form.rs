//! Form fields shown in the editor pane.

use wrapcard_core::editor::{Edit, Editor, RankedList};
use wrapcard_core::{WrappedData, RANK_SLOTS};

/// One editable row of the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Language,
    Year,
    Photo,
    AccentColor,
    Minutes,
    Genre,
    /// 0-based slot in `topArtists`
    Artist(usize),
    /// 0-based slot in `topSongs`
    Song(usize),
}

impl FormField {
    /// All rows, top to bottom.
    pub fn all() -> Vec<FormField> {
        let mut fields = vec![
            FormField::Language,
            FormField::Year,
            FormField::Photo,
            FormField::AccentColor,
            FormField::Minutes,
            FormField::Genre,
        ];
        fields.extend((0..RANK_SLOTS).map(FormField::Artist));
        fields.extend((0..RANK_SLOTS).map(FormField::Song));
        fields
    }

    pub fn label(&self, data: &WrappedData) -> String {
        let labels = data.labels();
        match self {
            FormField::Language => "Language".to_string(),
            FormField::Year => "Year".to_string(),
            FormField::Photo => "Photo".to_string(),
            FormField::AccentColor => "Accent".to_string(),
            FormField::Minutes => labels.minutes.to_string(),
            FormField::Genre => labels.genre.to_string(),
            FormField::Artist(i) => format!("{} #{}", labels.artists, i + 1),
            FormField::Song(i) => format!("{} #{}", labels.songs, i + 1),
        }
    }

    /// Current value as shown in the form.
    pub fn value(&self, data: &WrappedData) -> String {
        match self {
            FormField::Language => data.language.native_name().to_string(),
            FormField::Year => data.year.clone(),
            FormField::Photo => describe_photo(&data.image_src),
            FormField::AccentColor => data.accent_color.clone(),
            FormField::Minutes => data.minutes_listened.clone(),
            FormField::Genre => data.top_genre.clone(),
            FormField::Artist(i) => data.top_artists.get(*i).cloned().unwrap_or_default(),
            FormField::Song(i) => data.top_songs.get(*i).cloned().unwrap_or_default(),
        }
    }

    /// Whether the field is edited as free text.
    pub fn is_text(&self) -> bool {
        !matches!(self, FormField::Language | FormField::Photo)
    }

    /// Emit a replacement value for a text field through the editor.
    pub fn set_text<F: FnMut(WrappedData)>(&self, editor: &mut Editor<'_, F>, value: String) {
        match self {
            FormField::Year => editor.update(Edit::Year(value)),
            FormField::AccentColor => editor.update(Edit::AccentColor(value)),
            FormField::Minutes => editor.update(Edit::MinutesListened(value)),
            FormField::Genre => editor.update(Edit::TopGenre(value)),
            FormField::Artist(i) => editor.update_ranked(RankedList::TopArtists, *i, value),
            FormField::Song(i) => editor.update_ranked(RankedList::TopSongs, *i, value),
            FormField::Language | FormField::Photo => {}
        }
    }
}

/// Short form of `imageSrc`; data URIs are far too long to show.
fn describe_photo(src: &str) -> String {
    if let Some(rest) = src.strip_prefix("data:") {
        let mime = rest.split(';').next().unwrap_or("image");
        format!("embedded {} ({} KB)", mime, src.len() / 1024)
    } else if src.is_empty() {
        "(none)".to_string()
    } else {
        src.to_string()
    }
}

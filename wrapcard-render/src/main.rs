//! wrapcard-render - headless year-in-music card renderer
//!
//! Builds a card from sample or seed data plus field flags, optionally fills
//! the stats from a persona, then writes a PNG or prints the result.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use wrapcard_core::autofill;
use wrapcard_core::card::{Section, TextRole};
use wrapcard_core::editor::{decode_image_file, Edit, Editor, RankedList};
use wrapcard_core::export::Rasterizer;
use wrapcard_core::{Card, Config, Language, Session, WrappedData, RANK_SLOTS};

#[derive(Parser, Debug)]
#[command(name = "wrapcard-render")]
#[command(about = "Render a year-in-music card")]
#[command(version)]
struct Args {
    /// Seed the card from a (possibly partial) WrappedData JSON file
    #[arg(long, value_name = "FILE")]
    data: Option<PathBuf>,

    /// Year shown on the card and used in the file name
    #[arg(long)]
    year: Option<String>,

    /// Heading language (de, en, es, fr, pt; anything else falls back to de)
    #[arg(long)]
    language: Option<String>,

    /// Accent color as hex, e.g. #8B75FF
    #[arg(long)]
    accent: Option<String>,

    /// Photo: local image file, http(s) URL or data URI
    #[arg(long)]
    photo: Option<String>,

    /// Top genre
    #[arg(long)]
    genre: Option<String>,

    /// Minutes listened, e.g. 27.031
    #[arg(long)]
    minutes: Option<String>,

    /// Top artist, in rank order (repeat up to 5 times)
    #[arg(long = "artist", value_name = "NAME")]
    artists: Vec<String>,

    /// Top song, in rank order (repeat up to 5 times)
    #[arg(long = "song", value_name = "TITLE")]
    songs: Vec<String>,

    /// Generate the stats from a listener description
    #[arg(long)]
    persona: Option<String>,

    /// What to produce
    #[arg(long, value_enum, default_value_t = ExportFormat::Png)]
    export: ExportFormat,

    /// Output directory for PNG export (default: config, then Downloads)
    #[arg(long, value_name = "DIR")]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ExportFormat {
    /// Write my-wrapped-<year>.png
    Png,
    /// Print the final card data as JSON
    Json,
    /// Print the card text as it appears on the card
    Summary,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load().context("failed to load configuration")?;
    let _log_guard = wrapcard_core::logging::init(&config.logging).ok();

    if args.artists.len() > RANK_SLOTS {
        anyhow::bail!("at most {} --artist values are allowed", RANK_SLOTS);
    }
    if args.songs.len() > RANK_SLOTS {
        anyhow::bail!("at most {} --song values are allowed", RANK_SLOTS);
    }

    let data = match &args.data {
        Some(path) => WrappedData::load_json(path)
            .with_context(|| format!("failed to load card data from {}", path.display()))?,
        None => WrappedData::sample(),
    };
    let mut session = Session::new(data);

    apply_flags(&mut session, &args)?;

    if let Some(persona) = &args.persona {
        let pb = spinner("Generating stats...");
        let result = autofill::generate(persona, &config.autofill);
        pb.finish_and_clear();
        let patch = result.context("autofill failed")?;
        session.merge_autofill(patch);
    }

    match args.export {
        ExportFormat::Json => {
            println!("{}", serde_json::to_string_pretty(session.data())?);
        }
        ExportFormat::Summary => print_summary(&session.card()),
        ExportFormat::Png => {
            let dir = args
                .output
                .clone()
                .unwrap_or_else(|| config.export.resolved_output_dir());
            let path = export_png(&session, &config, &dir)?;
            println!("Saved {}", path.display());
        }
    }

    Ok(())
}

/// Apply one edit through the editor.
fn apply(session: &mut Session, f: impl FnOnce(&mut Editor<'_, &mut dyn FnMut(WrappedData)>)) {
    let current = session.data().clone();
    let mut on_change = |next: WrappedData| session.apply_change(next);
    let mut editor = Editor::new(&current, &mut on_change as &mut dyn FnMut(WrappedData));
    f(&mut editor);
}

fn apply_flags(session: &mut Session, args: &Args) -> Result<()> {
    if let Some(year) = &args.year {
        apply(session, |e| e.update(Edit::Year(year.clone())));
    }
    if let Some(accent) = &args.accent {
        apply(session, |e| e.update(Edit::AccentColor(accent.clone())));
    }
    if let Some(genre) = &args.genre {
        apply(session, |e| e.update(Edit::TopGenre(genre.clone())));
    }
    if let Some(minutes) = &args.minutes {
        apply(session, |e| e.update(Edit::MinutesListened(minutes.clone())));
    }

    if let Some(code) = &args.language {
        let language = Language::from_code(code);
        if language.code() != code.trim().to_ascii_lowercase() {
            tracing::warn!(code = %code, "Unknown language code, using {}", language);
        }
        apply(session, |e| e.update(Edit::Language(language)));
    }

    if let Some(photo) = &args.photo {
        let src = photo_source(photo)?;
        apply(session, |e| e.update(Edit::ImageSrc(src)));
    }

    for (list, values) in [
        (RankedList::TopArtists, &args.artists),
        (RankedList::TopSongs, &args.songs),
    ] {
        for (index, value) in values.iter().enumerate() {
            if index >= list.entries(session.data()).len() {
                anyhow::bail!("{:?} has no slot {}", list, index + 1);
            }
            apply(session, |e| e.update_ranked(list, index, value.clone()));
        }
    }

    Ok(())
}

/// Local files are embedded as data URIs; URLs and data URIs pass through.
fn photo_source(photo: &str) -> Result<String> {
    if photo.starts_with("data:") || photo.starts_with("http://") || photo.starts_with("https://")
    {
        return Ok(photo.to_string());
    }
    decode_image_file(Path::new(photo))
        .with_context(|| format!("failed to read photo {}", photo))
}

fn export_png(session: &Session, config: &Config, dir: &Path) -> Result<PathBuf> {
    let rasterizer = Rasterizer::from_config(&config.export).context("export failed")?;
    let job = session.prepare_export().context("export failed")?;

    let pb = spinner(&format!("Exporting {}...", job.file_name()));
    let result = job.run(&rasterizer, dir);
    pb.finish_and_clear();

    result.context("export failed")
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Print the card's text, section by section.
fn print_summary(card: &Card) {
    let text = |role: TextRole| {
        card.text(role)
            .map(|t| t.display_text())
            .unwrap_or_default()
    };

    println!();
    println!("  {}  {}", text(TextRole::Year), text(TextRole::Footer));
    println!();
    for section in [Section::Artists, Section::Songs] {
        println!("  {}", text(TextRole::Heading(section)));
        for (rank, entry) in card.ranked(section) {
            println!("   {}. {}", rank, entry);
        }
        println!();
    }
    println!(
        "  {:<24} {}",
        text(TextRole::Heading(Section::Minutes)),
        text(TextRole::Minutes)
    );
    println!(
        "  {:<24} {}",
        text(TextRole::Heading(Section::Genre)),
        text(TextRole::Genre)
    );
    println!();
}

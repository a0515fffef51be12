//! wrapcard - year-in-music card editor
//!
//! Terminal UI with the card form on the left and a live preview on the right.

mod app;
mod ui;

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use wrapcard_core::{Config, WrappedData};

use crate::app::App;

#[derive(Parser, Debug)]
#[command(name = "wrapcard")]
#[command(about = "Build a shareable year-in-music card in the terminal")]
#[command(version)]
struct Args {
    /// Seed the card from a (possibly partial) WrappedData JSON file
    #[arg(long, value_name = "FILE")]
    data: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Initialize logging (to file, not stdout since we have a TUI)
    let _log_guard =
        wrapcard_core::logging::init(&config.logging).context("failed to initialize logging")?;

    tracing::info!("wrapcard TUI starting up");

    let data = match &args.data {
        Some(path) => WrappedData::load_json(path)
            .with_context(|| format!("failed to load card data from {}", path.display()))?,
        None => WrappedData::sample(),
    };

    let mut app = App::new(data, config);

    // Setup terminal
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal")?;

    // Run the main loop
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;

    tracing::info!("wrapcard TUI shutting down");

    result
}

/// Run the main application loop.
fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        // Apply finished background work
        app.drain_events();

        // Render
        terminal.draw(|frame| ui::render(frame, app))?;

        // Handle events
        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

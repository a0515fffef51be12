//! # wrapcard-core
//!
//! Core library for wrapcard - a "year in music" card builder.
//!
//! This library provides:
//! - The card record ([`WrappedData`]) and its localization table
//! - A controlled form editor that emits whole replacement records
//! - A deterministic card renderer producing a positioned node tree
//! - PNG export and Gemini-backed autofill
//! - Configuration management and logging infrastructure
//!
//! ## Data flow
//!
//! Editor and autofill produce new records, the [`Session`] swaps them in,
//! and the renderer projects the current record into a [`Card`]. Export
//! rasterizes that same card.
//!
//! ## Example
//!
//! ```rust,no_run
//! use wrapcard_core::editor::{Edit, Editor};
//! use wrapcard_core::{Session, WrappedData};
//!
//! let mut session = Session::new(WrappedData::sample());
//! let current = session.data().clone();
//! Editor::new(&current, |next| session.apply_change(next)).update(Edit::Year("2024".into()));
//!
//! let job = session.prepare_export().expect("no export running");
//! assert_eq!(job.file_name(), "my-wrapped-2024.png");
//! ```

// Re-export commonly used items at the crate root
pub use card::{render_card, Card};
pub use config::Config;
pub use error::{Error, Result};
pub use session::{ExportJob, Session};
pub use types::*;

// Public modules
pub mod autofill;
pub mod card;
pub mod config;
pub mod editor;
pub mod error;
pub mod export;
pub mod logging;
pub mod session;
pub mod types;

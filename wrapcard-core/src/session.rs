//! Session state: the authoritative card record and the export flag.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::card::{render_card, Card};
use crate::error::{Error, Result};
use crate::export::{export_file_name, RasterizeCard};
use crate::types::{StatsPatch, WrappedData};

/// Owns the single authoritative [`WrappedData`] for one editing session.
///
/// Every change replaces the whole record, so readers always see a
/// consistent instance.
#[derive(Debug, Default)]
pub struct Session {
    data: WrappedData,
    exporting: Arc<AtomicBool>,
}

impl Session {
    pub fn new(data: WrappedData) -> Self {
        Self {
            data,
            exporting: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Current record.
    pub fn data(&self) -> &WrappedData {
        &self.data
    }

    /// Replace the record with one produced by the editor or autofill.
    pub fn apply_change(&mut self, next: WrappedData) {
        tracing::trace!(year = %next.year, language = %next.language, "Applying change");
        self.data = next;
    }

    /// Merge a successful autofill result, keeping every non-stats field.
    pub fn merge_autofill(&mut self, patch: StatsPatch) {
        tracing::info!(
            artists = patch.top_artists.len(),
            songs = patch.top_songs.len(),
            "Merging autofill stats"
        );
        let next = self.data.merge_stats(patch);
        self.apply_change(next);
    }

    /// Render the current record.
    pub fn card(&self) -> Card {
        render_card(&self.data)
    }

    /// True while an export job is alive.
    pub fn is_exporting(&self) -> bool {
        self.exporting.load(Ordering::Acquire)
    }

    /// Claim the export slot and snapshot everything the export needs.
    ///
    /// Fails with [`Error::ExportInProgress`] while another job holds the slot.
    pub fn prepare_export(&self) -> Result<ExportJob> {
        let ticket = ExportTicket::acquire(&self.exporting).ok_or(Error::ExportInProgress)?;
        Ok(ExportJob {
            card: self.card(),
            file_name: export_file_name(&self.data.year),
            _ticket: ticket,
        })
    }
}

/// Holds the export slot; releases it on drop, whatever the outcome.
#[derive(Debug)]
pub struct ExportTicket {
    flag: Arc<AtomicBool>,
}

impl ExportTicket {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag: flag.clone() })
    }
}

impl Drop for ExportTicket {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// A snapshot of the card waiting to be exported.
///
/// The job can be moved to a worker thread; the session stays editable
/// meanwhile and reports `is_exporting() == true` until the job is dropped.
#[derive(Debug)]
pub struct ExportJob {
    card: Card,
    file_name: String,
    _ticket: ExportTicket,
}

impl ExportJob {
    /// Suggested file name, `my-wrapped-<year>.png`.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn card(&self) -> &Card {
        &self.card
    }

    /// Rasterize, encode and save into `dir`. Consumes the job, freeing the slot.
    pub fn run(self, rasterizer: &dyn RasterizeCard, dir: &Path) -> Result<PathBuf> {
        tracing::info!(file = %self.file_name, dir = %dir.display(), "Exporting card");
        let result = crate::export::save_png(rasterizer, &self.card, dir, &self.file_name);
        match &result {
            Ok(path) => tracing::info!(path = %path.display(), "Export complete"),
            Err(e) => tracing::error!(error = %e, "Export failed"),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::{Edit, Editor};
    use image::{Rgba as Pixel, RgbaImage};
    use tempfile::TempDir;

    struct BlankRasterizer;

    impl RasterizeCard for BlankRasterizer {
        fn rasterize(&self, card: &Card) -> Result<RgbaImage> {
            Ok(RgbaImage::from_pixel(
                card.width * 2,
                card.height * 2,
                Pixel([0, 0, 0, 255]),
            ))
        }
    }

    struct FailingRasterizer;

    impl RasterizeCard for FailingRasterizer {
        fn rasterize(&self, _card: &Card) -> Result<RgbaImage> {
            Err(Error::Export("no usable font".to_string()))
        }
    }

    #[test]
    fn test_apply_change_replaces_record() {
        let mut session = Session::default();
        let current = session.data().clone();
        Editor::new(&current, |next| session.apply_change(next)).update(Edit::Year("2024".into()));
        assert_eq!(session.data().year, "2024");
        assert_eq!(current.year, "2023");
    }

    #[test]
    fn test_second_export_is_rejected_while_first_runs() {
        let session = Session::default();
        let first = session.prepare_export().expect("first export should start");
        assert!(session.is_exporting());

        assert!(matches!(
            session.prepare_export(),
            Err(Error::ExportInProgress)
        ));
        assert!(session.is_exporting(), "rejection must not reset the flag");

        drop(first);
        assert!(!session.is_exporting());
        assert!(session.prepare_export().is_ok());
    }

    #[test]
    fn test_failed_export_clears_flag_and_can_retry() {
        let dir = TempDir::new().unwrap();
        let session = Session::default();

        let job = session.prepare_export().unwrap();
        assert!(job.run(&FailingRasterizer, dir.path()).is_err());
        assert!(!session.is_exporting());
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());

        let job = session.prepare_export().unwrap();
        let path = job.run(&BlankRasterizer, dir.path()).unwrap();
        assert!(path.exists());
        assert!(!session.is_exporting());
    }

    #[test]
    fn test_export_runs_on_worker_thread() {
        let dir = TempDir::new().unwrap();
        let session = Session::default();
        let job = session.prepare_export().unwrap();
        let out = dir.path().to_path_buf();

        let handle = std::thread::spawn(move || job.run(&BlankRasterizer, &out));
        let path = handle.join().unwrap().unwrap();

        assert_eq!(path.file_name().unwrap(), "my-wrapped-2023.png");
        assert!(!session.is_exporting());
    }

    #[test]
    fn test_export_snapshot_ignores_later_edits() {
        let mut session = Session::default();
        let job = session.prepare_export().unwrap();
        let next = session.data().with_edit(Edit::Year("2030".into()));
        session.apply_change(next);
        assert_eq!(job.file_name(), "my-wrapped-2023.png");
    }
}

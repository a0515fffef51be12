//! Background work: image decoding, export and autofill.
//!
//! Each task runs on its own thread and reports back over the app's channel;
//! the UI loop applies the result on its next tick.

use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::thread;

use wrapcard_core::autofill;
use wrapcard_core::config::{AutofillConfig, ExportConfig};
use wrapcard_core::editor::decode_image_file;
use wrapcard_core::export::Rasterizer;
use wrapcard_core::{ExportJob, StatsPatch};

/// Result of a background task.
#[derive(Debug)]
pub enum TaskEvent {
    ImageDecoded(wrapcard_core::Result<String>),
    Exported(wrapcard_core::Result<PathBuf>),
    Autofilled(wrapcard_core::Result<StatsPatch>),
}

fn send(tx: &Sender<TaskEvent>, event: TaskEvent) {
    if tx.send(event).is_err() {
        tracing::debug!("UI loop gone, dropping task result");
    }
}

pub fn spawn_decode(tx: Sender<TaskEvent>, path: PathBuf) {
    thread::spawn(move || {
        tracing::debug!(path = %path.display(), "Decoding image");
        send(&tx, TaskEvent::ImageDecoded(decode_image_file(&path)));
    });
}

/// Rasterize and save `job`. The job's export slot is released when the
/// thread finishes, before the result is delivered.
pub fn spawn_export(tx: Sender<TaskEvent>, job: ExportJob, config: ExportConfig) {
    thread::spawn(move || {
        let dir = config.resolved_output_dir();
        let result = Rasterizer::from_config(&config).and_then(|r| job.run(&r, &dir));
        send(&tx, TaskEvent::Exported(result));
    });
}

pub fn spawn_autofill(tx: Sender<TaskEvent>, persona: String, config: AutofillConfig) {
    thread::spawn(move || {
        let result = autofill::generate(&persona, &config);
        send(&tx, TaskEvent::Autofilled(result));
    });
}

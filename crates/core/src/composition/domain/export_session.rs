use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};

use crate::composition::domain::composition::Composition;
use crate::composition::domain::exporter::Exporter;
use crate::shared::media_time::TimeRange;

#[derive(Clone, Debug, PartialEq)]
pub enum ExportStatus {
    Exporting,
    Completed,
    Failed(String),
}

/// An export running on its own thread.
///
/// Progress is published through an atomic the caller samples on its own
/// cadence; completion arrives once over a channel.
pub struct ExportSession {
    progress: Arc<AtomicU32>,
    done_rx: Receiver<Result<(), String>>,
    handle: Option<JoinHandle<()>>,
    status: ExportStatus,
}

impl ExportSession {
    pub fn start(
        exporter: Box<dyn Exporter>,
        composition: Composition,
        range: TimeRange,
        output: PathBuf,
    ) -> Self {
        let progress = Arc::new(AtomicU32::new(0f32.to_bits()));
        let (done_tx, done_rx) = crossbeam_channel::bounded(1);
        let shared = progress.clone();

        let handle = thread::spawn(move || {
            log::debug!("Export of {range} to {} started", output.display());
            let result = exporter
                .export(&composition, range, &output, &mut |fraction| {
                    store(&shared, fraction);
                })
                .map_err(|e| e.to_string());
            if result.is_ok() {
                store(&shared, 1.0);
            }
            let _ = done_tx.send(result);
        });

        Self {
            progress,
            done_rx,
            handle: Some(handle),
            status: ExportStatus::Exporting,
        }
    }

    /// Latest reported fraction in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        f32::from_bits(self.progress.load(Ordering::Relaxed))
    }

    pub fn status(&self) -> &ExportStatus {
        &self.status
    }

    /// Blocks until the export ends, sampling progress every
    /// `poll_interval` and forwarding it to `on_progress`.
    pub fn wait(
        &mut self,
        poll_interval: Duration,
        on_progress: &mut dyn FnMut(f32),
    ) -> ExportStatus {
        if self.status != ExportStatus::Exporting {
            return self.status.clone();
        }

        let status = loop {
            match self.done_rx.recv_timeout(poll_interval) {
                Ok(Ok(())) => {
                    on_progress(1.0);
                    break ExportStatus::Completed;
                }
                Ok(Err(e)) => break ExportStatus::Failed(e),
                Err(RecvTimeoutError::Timeout) => on_progress(self.progress()),
                Err(RecvTimeoutError::Disconnected) => {
                    break ExportStatus::Failed("export thread terminated unexpectedly".into())
                }
            }
        };

        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("Export thread panicked");
            }
        }
        self.status = status.clone();
        status
    }
}

fn store(progress: &AtomicU32, fraction: f32) {
    let clamped = if fraction.is_nan() {
        0.0
    } else {
        fraction.clamp(0.0, 1.0)
    };
    progress.store(clamped.to_bits(), Ordering::Relaxed);
}

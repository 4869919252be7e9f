use std::path::{Path, PathBuf};

use crate::composition::domain::composition::Composition;
use crate::composition::domain::exporter::Exporter;
use crate::composition::domain::trim_policy;
use crate::shared::error::ExportError;
use crate::shared::media_time::{MediaTime, TimeRange};
use crate::video::domain::source_reader::SourceReader;

use super::compose_movie_use_case::{ensure_input_preserved, export};
use super::job_config::JobConfig;
use super::output_locks::OutputLocks;

/// Cuts `[start, end)` out of a movie without re-encoding it.
///
/// Single-use, like [`super::compose_movie_use_case::ComposeMovieUseCase`].
pub struct TrimMovieUseCase {
    reader: Option<Box<dyn SourceReader>>,
    exporter: Option<Box<dyn Exporter>>,
    locks: OutputLocks,
}

impl TrimMovieUseCase {
    pub fn new(
        reader: Box<dyn SourceReader>,
        exporter: Box<dyn Exporter>,
        locks: OutputLocks,
    ) -> Self {
        Self {
            reader: Some(reader),
            exporter: Some(exporter),
            locks,
        }
    }

    /// Missing bounds default to the start and the end of the movie. Only
    /// the export poll interval is read from `config`.
    pub fn execute(
        &mut self,
        input: &Path,
        output: &Path,
        start_seconds: Option<f64>,
        end_seconds: Option<f64>,
        config: &JobConfig,
        on_progress: &mut dyn FnMut(f32),
    ) -> Result<PathBuf, ExportError> {
        let mut reader = self.reader.take().ok_or(ExportError::AlreadyExecuted)?;
        let exporter = self.exporter.take().ok_or(ExportError::AlreadyExecuted)?;

        ensure_input_preserved(input, &[output])?;
        let asset = reader
            .open(input)
            .map_err(|e| ExportError::source_unavailable(input, e))?;
        reader.close();

        let range = trim_policy::explicit_range(start_seconds, end_seconds, asset.duration)?;
        let _lock = self.locks.acquire(output)?;

        let full = TimeRange::from_zero(asset.duration)
            .ok_or_else(|| ExportError::source_unavailable(input, "movie has no duration"))?;
        let mut composition = Composition::new();
        composition
            .insert_video(&asset, full, MediaTime::ZERO)
            .map_err(|e| ExportError::source_unavailable(input, e))?;
        if asset.tracks.audio.is_some() {
            composition
                .insert_audio(&asset, full, MediaTime::ZERO)
                .map_err(|e| ExportError::CompositionFailure(e.to_string()))?;
        }

        log::info!(
            "Trimming {} to {range} into {}",
            input.display(),
            output.display()
        );
        export(exporter, composition, range, output, config, on_progress)?;
        Ok(output.to_path_buf())
    }
}

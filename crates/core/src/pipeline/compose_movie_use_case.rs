use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::composition::domain::composition::{Composition, CompositionError};
use crate::composition::domain::export_session::{ExportSession, ExportStatus};
use crate::composition::domain::exporter::Exporter;
use crate::composition::domain::trim_policy::TrimPolicy;
use crate::compositing::domain::frame_compositor::FrameCompositor;
use crate::overlay::infrastructure::render_context::RenderContext;
use crate::shared::error::ExportError;
use crate::shared::media_asset::MediaAsset;
use crate::shared::media_time::{MediaTime, TimeRange};
use crate::shared::output_file;
use crate::shared::overlay_image::OverlayImage;
use crate::video::domain::frame_encoder::FrameEncoder;
use crate::video::domain::source_reader::SourceReader;
use crate::video::domain::video_settings::VideoSettings;

use super::job_config::JobConfig;
use super::output_locks::{same_location, OutputLocks};
use super::pipeline_executor::{FrameLoopConfig, PipelineExecutor};
use super::pipeline_logger::PipelineLogger;

/// Share of the overall progress taken by the frame loop; the export
/// covers the rest.
const FRAME_LOOP_SHARE: f32 = 0.8;

/// One compose request: which movie to read and how to write it.
#[derive(Clone, Debug)]
pub struct ExportJob {
    pub input: PathBuf,
    pub config: JobConfig,
}

impl ExportJob {
    pub fn new(input: impl Into<PathBuf>, config: JobConfig) -> Self {
        Self {
            input: input.into(),
            config,
        }
    }
}

/// Burns the overlay into every frame of a movie, then trims it and puts
/// the original audio back.
///
/// Runs as a fixed sequence of stages: open the source, render the
/// overlay, write the composited frames to a video-only intermediate,
/// compose that with the source audio and export the trim range. This is
/// a single-use struct: `execute` consumes the owned components, so
/// calling it twice fails with [`ExportError::AlreadyExecuted`].
pub struct ComposeMovieUseCase {
    reader: Option<Box<dyn SourceReader>>,
    encoder: Option<Box<dyn FrameEncoder>>,
    compositor: Option<Box<dyn FrameCompositor>>,
    exporter: Option<Box<dyn Exporter>>,
    render_context: Arc<RenderContext>,
    executor: Box<dyn PipelineExecutor>,
    logger: Box<dyn PipelineLogger>,
    locks: OutputLocks,
}

impl ComposeMovieUseCase {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        reader: Box<dyn SourceReader>,
        encoder: Box<dyn FrameEncoder>,
        compositor: Box<dyn FrameCompositor>,
        exporter: Box<dyn Exporter>,
        render_context: Arc<RenderContext>,
        executor: Box<dyn PipelineExecutor>,
        logger: Box<dyn PipelineLogger>,
        locks: OutputLocks,
    ) -> Self {
        Self {
            reader: Some(reader),
            encoder: Some(encoder),
            compositor: Some(compositor),
            exporter: Some(exporter),
            render_context,
            executor,
            logger,
            locks,
        }
    }

    /// Runs the job and returns the path of the finished movie.
    ///
    /// Nothing on disk is touched before the source is known to be
    /// readable and long enough to trim.
    pub fn execute(
        &mut self,
        job: &ExportJob,
        on_progress: &mut dyn FnMut(f32),
    ) -> Result<PathBuf, ExportError> {
        let mut reader = self.reader.take().ok_or(ExportError::AlreadyExecuted)?;
        let encoder = self.encoder.take().ok_or(ExportError::AlreadyExecuted)?;
        let compositor = self.compositor.take().ok_or(ExportError::AlreadyExecuted)?;
        let exporter = self.exporter.take().ok_or(ExportError::AlreadyExecuted)?;
        let config = &job.config;

        ensure_input_preserved(
            &job.input,
            &[&config.output_path, &config.intermediate_path],
        )?;
        let source = open_source(reader.as_mut(), &job.input)?;
        let _output_lock = self.locks.acquire(&config.output_path)?;
        let _intermediate_lock = self.locks.acquire(&config.intermediate_path)?;

        let trim = config.trim.unwrap_or_else(TrimPolicy::none);
        let range = trim.range_for(source.duration)?;
        log::info!(
            "Composing {} ({}) into {}, keeping {range}",
            job.input.display(),
            source.duration,
            config.output_path.display()
        );

        let video = source
            .tracks
            .video
            .as_ref()
            .ok_or_else(|| ExportError::source_unavailable(&job.input, "No video stream found"))?;
        let overlay = self.render_overlay(video.natural_size())?;
        let settings = VideoSettings::for_track(video, &config.video);

        self.write_intermediate(
            reader.as_mut(),
            encoder,
            compositor.as_ref(),
            &overlay,
            &settings,
            &source,
            config,
            &mut |p| on_progress(p * FRAME_LOOP_SHARE),
        )?;
        reader.close();

        let result = self.export_final(reader.as_mut(), exporter, &source, range, config, on_progress);

        if !config.keep_intermediate {
            output_file::discard(&config.intermediate_path);
        }
        self.logger.summary();
        result
    }

    /// Asks the render thread for the overlay and fits it to the frame.
    fn render_overlay(&self, size: (u32, u32)) -> Result<OverlayImage, ExportError> {
        let (width, height) = size;
        let rendered = self
            .render_context
            .request(size)
            .map_err(|e| ExportError::OverlayFailure(e.to_string()))?;
        if rendered.size() == size {
            return Ok(rendered);
        }
        log::debug!(
            "Scaling {}x{} overlay to {width}x{height}",
            rendered.width(),
            rendered.height()
        );
        Ok(rendered.scaled_to(width, height))
    }

    /// Frame loop into the intermediate file. A failed loop leaves no
    /// intermediate behind.
    #[allow(clippy::too_many_arguments)]
    fn write_intermediate(
        &mut self,
        reader: &mut dyn SourceReader,
        encoder: Box<dyn FrameEncoder>,
        compositor: &dyn FrameCompositor,
        overlay: &OverlayImage,
        settings: &VideoSettings,
        source: &MediaAsset,
        config: &JobConfig,
        on_progress: &mut dyn FnMut(f32),
    ) -> Result<(), ExportError> {
        let path = &config.intermediate_path;
        output_file::clear(path).map_err(|e| ExportError::io_failure(path, e))?;
        output_file::ensure_parent_dir(path)
            .map_err(|e| ExportError::sink_unavailable(path, e))?;

        let total_frames = source
            .tracks
            .video
            .as_ref()
            .map(|v| v.total_frames)
            .unwrap_or(0);
        let loop_config = FrameLoopConfig {
            poll_interval: config.writer_poll_interval(),
            duration: source.duration,
            total_frames,
            on_progress: Some(on_progress),
        };

        let result = self.executor.execute(
            reader,
            encoder,
            compositor,
            overlay,
            settings,
            path,
            self.logger.as_mut(),
            loop_config,
        );
        match result {
            Ok(report) => {
                if report.composite_failures > 0 {
                    log::warn!(
                        "{} frames were written without the overlay",
                        report.composite_failures
                    );
                }
                Ok(())
            }
            Err(e) => {
                output_file::discard(path);
                Err(e)
            }
        }
    }

    /// Composes the intermediate video with the source audio and exports
    /// `range` of it to the output path.
    fn export_final(
        &mut self,
        reader: &mut dyn SourceReader,
        exporter: Box<dyn Exporter>,
        source: &MediaAsset,
        range: TimeRange,
        config: &JobConfig,
        on_progress: &mut dyn FnMut(f32),
    ) -> Result<PathBuf, ExportError> {
        let intermediate = reader
            .open(&config.intermediate_path)
            .map_err(|e| {
                ExportError::CompositionFailure(format!(
                    "cannot reopen {}: {e}",
                    config.intermediate_path.display()
                ))
            })?;
        reader.close();

        let composition = build_composition(&intermediate, source)?;
        let range = composition
            .export_range(Some(range))
            .map_err(|e| ExportError::CompositionFailure(e.to_string()))?;

        export(
            exporter,
            composition,
            range,
            &config.output_path,
            config,
            &mut |p| on_progress(FRAME_LOOP_SHARE + p * (1.0 - FRAME_LOOP_SHARE)),
        )?;
        self.logger.info(&format!(
            "Exported {range} to {}",
            config.output_path.display()
        ));
        Ok(config.output_path.clone())
    }
}

/// Opens the source and makes sure it has a video track to decode.
fn open_source(reader: &mut dyn SourceReader, path: &Path) -> Result<MediaAsset, ExportError> {
    let asset = reader
        .open(path)
        .map_err(|e| ExportError::source_unavailable(path, e))?;
    if asset.tracks.video.is_none() {
        reader.close();
        return Err(ExportError::source_unavailable(path, "No video stream found"));
    }
    Ok(asset)
}

/// Fails when writing any of `targets`, or the partial file next to it,
/// would overwrite the source movie.
pub(crate) fn ensure_input_preserved(input: &Path, targets: &[&Path]) -> Result<(), ExportError> {
    for target in targets {
        let partial = output_file::partial_path(target);
        if same_location(input, target) || same_location(input, &partial) {
            return Err(ExportError::sink_unavailable(
                *target,
                format!("writing it would overwrite the input {}", input.display()),
            ));
        }
    }
    Ok(())
}

/// The intermediate's video at time zero, plus the source audio cut to
/// the same length when the source has any.
fn build_composition(
    intermediate: &MediaAsset,
    source: &MediaAsset,
) -> Result<Composition, ExportError> {
    let failure = |e: CompositionError| ExportError::CompositionFailure(e.to_string());
    let full = TimeRange::from_zero(intermediate.duration).ok_or_else(|| {
        ExportError::CompositionFailure(format!(
            "{} has no duration",
            intermediate.path.display()
        ))
    })?;

    let mut composition = Composition::new();
    composition
        .insert_video(intermediate, full, MediaTime::ZERO)
        .map_err(failure)?;
    if source.tracks.audio.is_some() {
        composition
            .insert_audio(source, full, MediaTime::ZERO)
            .map_err(failure)?;
    } else {
        log::info!("{} has no audio, exporting video only", source.path.display());
    }
    Ok(composition)
}

/// Runs an export session into a partial file and moves it over the
/// destination once it completes.
pub(crate) fn export(
    exporter: Box<dyn Exporter>,
    composition: Composition,
    range: TimeRange,
    destination: &Path,
    config: &JobConfig,
    on_progress: &mut dyn FnMut(f32),
) -> Result<(), ExportError> {
    output_file::ensure_parent_dir(destination)
        .map_err(|e| ExportError::sink_unavailable(destination, e))?;
    let partial = output_file::partial_path(destination);
    output_file::clear(&partial).map_err(|e| ExportError::io_failure(&partial, e))?;

    let mut session = ExportSession::start(exporter, composition, range, partial.clone());
    let mut last_logged = None;
    let status = session.wait(config.export_poll_interval(), &mut |p| {
        let percent = (p * 100.0) as u32;
        if last_logged != Some(percent) {
            log::debug!("Export progress: {percent}%");
            last_logged = Some(percent);
        }
        on_progress(p);
    });

    match status {
        ExportStatus::Completed => {
            output_file::clear(destination)
                .and_then(|()| output_file::commit(&partial, destination))
                .map_err(|e| {
                    output_file::discard(&partial);
                    ExportError::io_failure(destination, e)
                })
        }
        ExportStatus::Failed(reason) => {
            output_file::discard(&partial);
            Err(ExportError::CompositionFailure(reason))
        }
        ExportStatus::Exporting => {
            output_file::discard(&partial);
            Err(ExportError::CompositionFailure(
                "export ended without a final status".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositing::infrastructure::alpha_over_compositor::AlphaOverCompositor;
    use crate::composition::domain::trim_policy::TrimError;
    use crate::composition::infrastructure::ffmpeg_exporter::FfmpegExporter;
    use crate::overlay::domain::overlay_renderer::OverlayRenderer;
    use crate::pipeline::infrastructure::sequential_pipeline_executor::SequentialPipelineExecutor;
    use crate::pipeline::pipeline_logger::{LogPipelineLogger, NullPipelineLogger};
    use crate::test_support::{create_test_video, probe, TestVideo};
    use crate::video::domain::video_settings::{EncoderConfig, VideoCodec};
    use crate::video::infrastructure::ffmpeg_frame_encoder::FfmpegFrameEncoder;
    use crate::video::infrastructure::ffmpeg_source_reader::FfmpegSourceReader;
    use approx::assert_relative_eq;
    use std::fs;

    /// Opaque red square in the top-left quarter.
    struct RedBoxRenderer;

    impl OverlayRenderer for RedBoxRenderer {
        fn render(&self, target: (u32, u32)) -> Result<OverlayImage, Box<dyn std::error::Error>> {
            let (w, h) = target;
            let mut image = OverlayImage::transparent(w, h);
            for y in 0..h / 2 {
                for x in 0..w / 2 {
                    image.put_pixel(x, y, [255, 0, 0, 255]);
                }
            }
            Ok(image)
        }
    }

    struct FailingRenderer;

    impl OverlayRenderer for FailingRenderer {
        fn render(&self, _target: (u32, u32)) -> Result<OverlayImage, Box<dyn std::error::Error>> {
            Err("no font".into())
        }
    }

    fn config_in(dir: &Path) -> JobConfig {
        JobConfig {
            output_path: dir.join("movie.mov"),
            intermediate_path: dir.join("movie_maker_temp.mp4"),
            video: EncoderConfig {
                codec: VideoCodec::Mpeg4,
                ..EncoderConfig::default()
            },
            writer_poll_interval_ms: 1,
            export_poll_interval_ms: 10,
            ..JobConfig::default()
        }
    }

    fn use_case_with(renderer: Box<dyn OverlayRenderer>, locks: OutputLocks) -> ComposeMovieUseCase {
        ComposeMovieUseCase::new(
            Box::new(FfmpegSourceReader::new()),
            Box::new(FfmpegFrameEncoder::new(4)),
            Box::new(AlphaOverCompositor::new()),
            Box::new(FfmpegExporter::new()),
            Arc::new(RenderContext::spawn(renderer).unwrap()),
            Box::new(SequentialPipelineExecutor::new()),
            Box::new(LogPipelineLogger::default()),
            locks,
        )
    }

    fn use_case() -> ComposeMovieUseCase {
        use_case_with(Box::new(RedBoxRenderer), OutputLocks::new())
    }

    #[test]
    fn test_ten_second_movie_with_audio_is_trimmed_to_eight() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("source.mp4");
        create_test_video(&input, &TestVideo::new(300, 30).with_audio());
        let job = ExportJob::new(&input, config_in(dir.path()));

        let mut progress = Vec::new();
        let output = use_case()
            .execute(&job, &mut |p| progress.push(p))
            .unwrap();

        assert_eq!(output, job.config.output_path);
        let exported = probe(&output);
        assert_relative_eq!(exported.duration_seconds(), 8.0, epsilon = 1.0 / 30.0 + 0.05);
        assert_eq!(exported.tracks.count(), 2);

        assert!(progress.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(*progress.last().unwrap(), 1.0);
        assert!(!job.config.intermediate_path.exists());
        assert!(!output_file::partial_path(&output).exists());
    }

    #[test]
    fn test_overlay_is_burned_into_the_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("source.mp4");
        create_test_video(&input, &TestVideo::new(90, 30));
        let mut config = config_in(dir.path());
        config.trim = None;
        let job = ExportJob::new(&input, config);

        let output = use_case().execute(&job, &mut |_| {}).unwrap();

        let mut reader = FfmpegSourceReader::new();
        reader.open(&output).unwrap();
        let frame = reader.frames().next().unwrap().unwrap();
        let pixel = frame.as_ndarray();
        assert!(pixel[[4, 4, 0]] > 150, "red channel {}", pixel[[4, 4, 0]]);
        assert!(pixel[[4, 4, 1]] < 100, "green channel {}", pixel[[4, 4, 1]]);
    }

    #[test]
    fn test_movie_without_audio_exports_video_only() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("silent.mp4");
        create_test_video(&input, &TestVideo::new(120, 30));
        let job = ExportJob::new(&input, config_in(dir.path()));

        let output = use_case().execute(&job, &mut |_| {}).unwrap();

        let exported = probe(&output);
        assert!(exported.tracks.video.is_some());
        assert!(exported.tracks.audio.is_none());
        assert_relative_eq!(exported.duration_seconds(), 2.0, epsilon = 1.0 / 30.0 + 0.05);
    }

    #[test]
    fn test_without_trim_duration_matches_source() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("source.mp4");
        create_test_video(&input, &TestVideo::new(90, 30).with_audio());
        let mut config = config_in(dir.path());
        config.trim = None;
        let job = ExportJob::new(&input, config);

        let output = use_case().execute(&job, &mut |_| {}).unwrap();

        let source = probe(&input);
        let exported = probe(&output);
        assert_relative_eq!(
            exported.duration_seconds(),
            source.duration_seconds(),
            epsilon = 1.0 / 30.0 + 0.05
        );
    }

    #[test]
    fn test_running_twice_replaces_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("source.mp4");
        create_test_video(&input, &TestVideo::new(120, 30).with_audio());
        let job = ExportJob::new(&input, config_in(dir.path()));

        let first = probe(&use_case().execute(&job, &mut |_| {}).unwrap());
        let second = probe(&use_case().execute(&job, &mut |_| {}).unwrap());

        assert_relative_eq!(first.duration_seconds(), second.duration_seconds(), epsilon = 1e-3);
        assert_eq!(first.tracks.count(), second.tracks.count());
    }

    #[test]
    fn test_keep_intermediate_leaves_it_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("source.mp4");
        create_test_video(&input, &TestVideo::new(90, 30));
        let mut config = config_in(dir.path());
        config.keep_intermediate = true;
        let job = ExportJob::new(&input, config);

        use_case().execute(&job, &mut |_| {}).unwrap();

        let intermediate = probe(&job.config.intermediate_path);
        assert!(intermediate.tracks.audio.is_none());
        assert_relative_eq!(intermediate.duration_seconds(), 3.0, epsilon = 1.0 / 30.0 + 0.05);
    }

    #[test]
    fn test_unreadable_source_leaves_output_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("notes.txt");
        fs::write(&input, b"not a movie").unwrap();
        let config = config_in(dir.path());
        fs::write(&config.output_path, b"previous export").unwrap();
        let job = ExportJob::new(&input, config);

        let err = use_case().execute(&job, &mut |_| {}).unwrap_err();

        assert!(matches!(err, ExportError::SourceUnavailable { .. }));
        assert_eq!(fs::read(&job.config.output_path).unwrap(), b"previous export");
        assert!(!job.config.intermediate_path.exists());
    }

    #[test]
    fn test_short_movie_fails_before_touching_files() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("short.mp4");
        create_test_video(&input, &TestVideo::new(45, 30));
        let config = config_in(dir.path());
        fs::write(&config.output_path, b"previous export").unwrap();
        let job = ExportJob::new(&input, config);

        let err = use_case().execute(&job, &mut |_| {}).unwrap_err();

        assert!(matches!(err, ExportError::Trim(TrimError::TooShort { .. })));
        assert_eq!(fs::read(&job.config.output_path).unwrap(), b"previous export");
        assert!(!job.config.intermediate_path.exists());
    }

    #[test]
    fn test_overlay_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("source.mp4");
        create_test_video(&input, &TestVideo::new(90, 30));
        let job = ExportJob::new(&input, config_in(dir.path()));

        let err = use_case_with(Box::new(FailingRenderer), OutputLocks::new())
            .execute(&job, &mut |_| {})
            .unwrap_err();

        assert!(matches!(err, ExportError::OverlayFailure(m) if m.contains("no font")));
        assert!(!job.config.output_path.exists());
    }

    #[test]
    fn test_busy_output_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("source.mp4");
        create_test_video(&input, &TestVideo::new(90, 30));
        let job = ExportJob::new(&input, config_in(dir.path()));
        let locks = OutputLocks::new();
        let _held = locks.acquire(&job.config.output_path).unwrap();

        let err = use_case_with(Box::new(RedBoxRenderer), locks)
            .execute(&job, &mut |_| {})
            .unwrap_err();

        assert!(matches!(err, ExportError::OutputBusy(_)));
    }

    #[test]
    fn test_second_execute_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let job = ExportJob::new(dir.path().join("missing.mp4"), config_in(dir.path()));
        let mut use_case = use_case();

        let first = use_case.execute(&job, &mut |_| {});
        assert!(matches!(first, Err(ExportError::SourceUnavailable { .. })));
        let second = use_case.execute(&job, &mut |_| {});
        assert!(matches!(second, Err(ExportError::AlreadyExecuted)));
    }

    #[test]
    fn test_locks_are_released_after_the_job() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("source.mp4");
        create_test_video(&input, &TestVideo::new(90, 30));
        let job = ExportJob::new(&input, config_in(dir.path()));
        let locks = OutputLocks::new();

        use_case_with(Box::new(RedBoxRenderer), locks.clone())
            .execute(&job, &mut |_| {})
            .unwrap();

        assert!(!locks.is_held(&job.config.output_path));
        assert!(!locks.is_held(&job.config.intermediate_path));
    }

    #[test]
    fn test_null_logger_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("source.mp4");
        create_test_video(&input, &TestVideo::new(90, 30));
        let job = ExportJob::new(&input, config_in(dir.path()));

        let mut use_case = ComposeMovieUseCase::new(
            Box::new(FfmpegSourceReader::new()),
            Box::new(FfmpegFrameEncoder::default()),
            Box::new(AlphaOverCompositor::new()),
            Box::new(FfmpegExporter::new()),
            Arc::new(RenderContext::spawn(Box::new(RedBoxRenderer)).unwrap()),
            Box::new(SequentialPipelineExecutor::new()),
            Box::new(NullPipelineLogger),
            OutputLocks::new(),
        );
        assert!(use_case.execute(&job, &mut |_| {}).is_ok());
    }

    #[test]
    fn test_source_without_video_fails_before_touching_files() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("tone.mp4");
        create_test_video(&input, &TestVideo::audio_only(300, 30));
        let config = config_in(dir.path());
        fs::write(&config.output_path, b"previous export").unwrap();
        let job = ExportJob::new(&input, config);

        let err = use_case().execute(&job, &mut |_| {}).unwrap_err();

        assert!(matches!(err, ExportError::SourceUnavailable { .. }));
        assert_eq!(fs::read(&job.config.output_path).unwrap(), b"previous export");
        assert!(!job.config.intermediate_path.exists());
    }

    #[test]
    fn test_scene_cut_before_trim_point_keeps_exact_duration() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("source.mp4");
        create_test_video(&input, &TestVideo::new(300, 30).with_scene_cut(20));
        let mut config = config_in(dir.path());
        config.video.codec = VideoCodec::H264;
        let job = ExportJob::new(&input, config);

        let output = use_case().execute(&job, &mut |_| {}).unwrap();

        assert_relative_eq!(probe(&output).duration_seconds(), 8.0, epsilon = 1.0 / 30.0 + 1e-3);
    }

    #[test]
    fn test_output_equal_to_input_is_rejected_and_input_kept() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("movie.mov");
        create_test_video(&input, &TestVideo::new(90, 30));
        let before = fs::read(&input).unwrap();
        let mut config = config_in(dir.path());
        config.output_path = input.clone();
        let job = ExportJob::new(&input, config);

        let err = use_case().execute(&job, &mut |_| {}).unwrap_err();

        assert!(matches!(err, ExportError::SinkUnavailable { .. }));
        assert_eq!(fs::read(&input).unwrap(), before);
    }

    #[test]
    fn test_intermediate_equal_to_input_is_rejected_and_input_kept() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("source.mp4");
        create_test_video(&input, &TestVideo::new(90, 30));
        let before = fs::read(&input).unwrap();
        let mut config = config_in(dir.path());
        config.intermediate_path = dir.path().join(".").join("source.mp4");
        let job = ExportJob::new(&input, config);

        let err = use_case().execute(&job, &mut |_| {}).unwrap_err();

        assert!(matches!(err, ExportError::SinkUnavailable { .. }));
        assert_eq!(fs::read(&input).unwrap(), before);
        assert!(!job.config.output_path.exists());
    }

    #[test]
    fn test_failed_export_keeps_previous_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("source.mp4");
        create_test_video(&input, &TestVideo::new(90, 30));
        let mut config = config_in(dir.path());
        // No muxer matches this extension, so only the final export fails.
        config.output_path = dir.path().join("movie.notacontainer");
        fs::write(&config.output_path, b"previous export").unwrap();
        let job = ExportJob::new(&input, config);

        let err = use_case().execute(&job, &mut |_| {}).unwrap_err();

        assert!(matches!(err, ExportError::CompositionFailure(_)));
        assert_eq!(fs::read(&job.config.output_path).unwrap(), b"previous export");
    }
}

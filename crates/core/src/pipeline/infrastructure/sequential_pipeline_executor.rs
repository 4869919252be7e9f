use std::path::Path;
use std::time::Instant;

use crate::compositing::domain::frame_compositor::FrameCompositor;
use crate::pipeline::pipeline_executor::{FrameLoopConfig, FrameLoopReport, PipelineExecutor};
use crate::pipeline::pipeline_logger::{metric, stage, PipelineLogger};
use crate::shared::error::ExportError;
use crate::shared::media_time::TimeRange;
use crate::shared::overlay_image::OverlayImage;
use crate::video::domain::frame_encoder::FrameEncoder;
use crate::video::domain::sink_writer::{SinkWriter, WriterError};
use crate::video::domain::source_reader::SourceReader;
use crate::video::domain::video_settings::VideoSettings;

/// Runs the frame loop on the calling thread.
///
/// Each frame is decoded, composited in place and pushed to the sink
/// writer before the next one is pulled, so at most one decoded frame is
/// alive in the loop. Encoding overlaps through the encoder's own queue.
pub struct SequentialPipelineExecutor;

impl SequentialPipelineExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SequentialPipelineExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineExecutor for SequentialPipelineExecutor {
    fn execute(
        &self,
        reader: &mut dyn SourceReader,
        encoder: Box<dyn FrameEncoder>,
        compositor: &dyn FrameCompositor,
        overlay: &OverlayImage,
        settings: &VideoSettings,
        output_path: &Path,
        logger: &mut dyn PipelineLogger,
        mut config: FrameLoopConfig<'_>,
    ) -> Result<FrameLoopReport, ExportError> {
        let mut writer = SinkWriter::new(encoder, config.poll_interval);
        writer.start(output_path, settings).map_err(|e| match e {
            WriterError::Unavailable { path, reason } => ExportError::SinkUnavailable { path, reason },
            other => ExportError::sink_unavailable(output_path, other),
        })?;

        let timeline = TimeRange::from_zero(config.duration);
        let mut report = FrameLoopReport::default();
        let mut frames = reader.frames();

        loop {
            let decode_start = Instant::now();
            let Some(next) = frames.next() else {
                break;
            };
            logger.timing(stage::DECODE, elapsed_ms(decode_start));

            let mut frame = next.map_err(|e| ExportError::DecodeFailure(e.to_string()))?;

            let composite_start = Instant::now();
            if let Err(e) = compositor.composite(&mut frame, overlay) {
                log::warn!(
                    "Overlay failed on frame {} ({}), writing it unmodified: {e}",
                    frame.index(),
                    frame.presentation_time()
                );
                report.composite_failures += 1;
            }
            logger.timing(stage::COMPOSITE, elapsed_ms(composite_start));

            let time = frame.presentation_time();
            let encode_start = Instant::now();
            match writer.push_frame(frame) {
                Ok(waited) => {
                    report.writer_wait += waited;
                    logger.metric(metric::WRITER_WAIT_MS, waited.as_secs_f64() * 1000.0);
                }
                Err(e @ WriterError::OutOfOrder { .. }) => {
                    log::warn!("Skipping frame: {e}");
                    report.frames_skipped += 1;
                    continue;
                }
                Err(e) => return Err(ExportError::EncodingFailure(e.to_string())),
            }
            logger.timing(stage::ENCODE, elapsed_ms(encode_start));

            report.frames_written += 1;
            logger.progress(report.frames_written, config.total_frames);
            if let (Some(range), Some(on_progress)) =
                (timeline, config.on_progress.as_deref_mut())
            {
                on_progress(range.progress_at(time));
            }
        }
        drop(frames);

        logger.metric(metric::COMPOSITE_FAILURES, report.composite_failures as f64);

        if report.frames_written == 0 {
            return Err(ExportError::DecodeFailure(
                "source produced no decodable frames".to_string(),
            ));
        }

        writer
            .finish()
            .map_err(|e| ExportError::EncodingFailure(e.to_string()))?;

        if let Some(on_progress) = config.on_progress.as_deref_mut() {
            on_progress(1.0);
        }
        logger.info(&format!(
            "Wrote {} frames to {} (waited {:.0}ms for the encoder)",
            report.frames_written,
            output_path.display(),
            report.writer_wait.as_secs_f64() * 1000.0
        ));
        Ok(report)
    }
}

fn elapsed_ms(since: Instant) -> f64 {
    since.elapsed().as_secs_f64() * 1000.0
}

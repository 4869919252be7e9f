use std::path::Path;
use std::time::Duration;

use crate::compositing::domain::frame_compositor::FrameCompositor;
use crate::shared::error::ExportError;
use crate::shared::media_time::MediaTime;
use crate::shared::overlay_image::OverlayImage;
use crate::video::domain::frame_encoder::FrameEncoder;
use crate::video::domain::source_reader::SourceReader;
use crate::video::domain::video_settings::VideoSettings;

use super::pipeline_logger::PipelineLogger;

/// Knobs for one run of the read → composite → write loop.
pub struct FrameLoopConfig<'a> {
    /// Sleep between encoder readiness checks.
    pub poll_interval: Duration,
    /// Expected length of the source, used to turn timestamps into progress.
    pub duration: MediaTime,
    /// Expected frame count for the logger; 0 when unknown.
    pub total_frames: usize,
    /// Receives the fraction of the source written so far.
    pub on_progress: Option<&'a mut dyn FnMut(f32)>,
}

/// What a finished frame loop did.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameLoopReport {
    pub frames_written: usize,
    pub composite_failures: usize,
    pub frames_skipped: usize,
    pub writer_wait: Duration,
}

/// Abstracts how the read → composite → write loop is executed.
///
/// This is a port (application-layer interface). Infrastructure provides
/// the concrete loop.
pub trait PipelineExecutor: Send {
    #[allow(clippy::too_many_arguments)]
    fn execute(
        &self,
        reader: &mut dyn SourceReader,
        encoder: Box<dyn FrameEncoder>,
        compositor: &dyn FrameCompositor,
        overlay: &OverlayImage,
        settings: &VideoSettings,
        output_path: &Path,
        logger: &mut dyn PipelineLogger,
        config: FrameLoopConfig<'_>,
    ) -> Result<FrameLoopReport, ExportError>;
}

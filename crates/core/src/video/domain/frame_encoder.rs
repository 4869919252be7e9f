use std::path::Path;

use crate::shared::frame::VideoFrame;
use crate::video::domain::video_settings::VideoSettings;

/// Abstracts video encoding so the pipeline can write output without
/// depending on a specific codec library.
///
/// Appending is asynchronous relative to encoding: `append` queues the
/// frame and `is_ready_for_more_data` reports whether the queue has room.
pub trait FrameEncoder: Send {
    fn open(
        &mut self,
        path: &Path,
        settings: &VideoSettings,
    ) -> Result<(), Box<dyn std::error::Error>>;

    fn is_ready_for_more_data(&self) -> bool;

    fn append(&mut self, frame: VideoFrame) -> Result<(), Box<dyn std::error::Error>>;

    /// Flushes queued frames and finalizes the container.
    fn finish(&mut self) -> Result<(), Box<dyn std::error::Error>>;
}

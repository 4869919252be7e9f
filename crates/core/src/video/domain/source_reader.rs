use std::path::Path;

use crate::shared::frame::VideoFrame;
use crate::shared::media_asset::MediaAsset;

/// Reads decoded frames from a media file.
///
/// Implementations handle I/O details (codec, container format, etc.)
/// while the pipeline works with the abstract `VideoFrame` and
/// `MediaAsset` types.
pub trait SourceReader: Send {
    /// Opens a media file and describes its tracks and duration.
    ///
    /// Fails when the file cannot be opened or carries no video track.
    fn open(&mut self, path: &Path) -> Result<MediaAsset, Box<dyn std::error::Error>>;

    /// Returns a lazy iterator over frames in strictly increasing
    /// presentation time.
    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<VideoFrame, Box<dyn std::error::Error>>> + '_>;

    /// Releases any resources held by the reader.
    fn close(&mut self);
}

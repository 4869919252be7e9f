use crate::shared::frame::VideoFrame;
use crate::shared::overlay_image::OverlayImage;

/// Domain interface for drawing an overlay onto a decoded frame.
///
/// Implementations modify the frame in-place (`&mut VideoFrame`); width,
/// height and pixel format never change.
pub trait FrameCompositor: Send {
    fn composite(
        &self,
        frame: &mut VideoFrame,
        overlay: &OverlayImage,
    ) -> Result<(), Box<dyn std::error::Error>>;
}

use crate::shared::overlay_image::OverlayImage;

/// Produces the overlay layer for a given frame size.
///
/// Implementations must be deterministic: the same target size yields the
/// same image, so one render can be reused for every frame of a job.
pub trait OverlayRenderer: Send {
    fn render(&self, target: (u32, u32)) -> Result<OverlayImage, Box<dyn std::error::Error>>;
}

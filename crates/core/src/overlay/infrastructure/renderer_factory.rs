use crate::overlay::domain::overlay_renderer::OverlayRenderer;
use crate::overlay::domain::overlay_spec::OverlaySpec;

use super::font_resolver;
use super::image_overlay_renderer::ImageOverlayRenderer;
use super::text_overlay_renderer::TextOverlayRenderer;

/// Builds the renderer an [`OverlaySpec`] asks for: the image when one is
/// given, otherwise the text label in the resolved font.
pub fn create_renderer(
    spec: &OverlaySpec,
) -> Result<Box<dyn OverlayRenderer>, Box<dyn std::error::Error>> {
    if let Some(image_path) = &spec.image_path {
        log::info!("Using image overlay {}", image_path.display());
        return Ok(Box::new(ImageOverlayRenderer::open(image_path)?));
    }

    let font_path = font_resolver::resolve(spec.font_path.as_deref())?;
    log::info!(
        "Using text overlay {:?} in {} at {}px",
        spec.text,
        font_path.display(),
        spec.font_size
    );
    Ok(Box::new(TextOverlayRenderer::from_file(
        &font_path,
        &spec.text,
        spec.font_size,
        spec.color,
    )?))
}

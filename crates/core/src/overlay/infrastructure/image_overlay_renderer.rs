use std::path::Path;

use crate::overlay::domain::overlay_renderer::OverlayRenderer;
use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::overlay_image::OverlayImage;

/// Uses a still image (PNG, JPEG, ...) as the overlay, stretched to the
/// target size on each axis.
pub struct ImageOverlayRenderer {
    image: OverlayImage,
}

impl ImageOverlayRenderer {
    pub fn new(image: OverlayImage) -> Self {
        Self { image }
    }

    pub fn open(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        if !IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            return Err(format!("unsupported overlay image: {}", path.display()).into());
        }
        let image = image::open(path)?.to_rgba8();
        Ok(Self::new(OverlayImage::from_rgba(image)))
    }
}

impl OverlayRenderer for ImageOverlayRenderer {
    fn render(&self, target: (u32, u32)) -> Result<OverlayImage, Box<dyn std::error::Error>> {
        if target.0 == 0 || target.1 == 0 {
            return Err(format!("cannot render overlay at {}x{}", target.0, target.1).into());
        }
        Ok(self.image.scaled_to(target.0, target.1))
    }
}

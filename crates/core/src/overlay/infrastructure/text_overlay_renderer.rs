use std::path::Path;

use fontdue::{Font, FontSettings};

use crate::overlay::domain::overlay_renderer::OverlayRenderer;
use crate::overlay::domain::text_layout::{self, GlyphBox};
use crate::overlay::infrastructure::font_resolver;
use crate::shared::overlay_image::OverlayImage;

/// Rasterizes a single line of text with fontdue, centered on a
/// transparent canvas of the requested size.
pub struct TextOverlayRenderer {
    font: Font,
    text: String,
    font_size: f32,
    color: [u8; 4],
}

impl TextOverlayRenderer {
    pub fn new(font: Font, text: &str, font_size: f32, color: [u8; 4]) -> Self {
        Self {
            font,
            text: text.to_string(),
            font_size,
            color,
        }
    }

    pub fn from_file(
        path: &Path,
        text: &str,
        font_size: f32,
        color: [u8; 4],
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let bytes = font_resolver::load(path)?;
        let font = Font::from_bytes(bytes, FontSettings::default())
            .map_err(|e| format!("failed to parse font {}: {e}", path.display()))?;
        log::debug!("Loaded font {}", path.display());
        Ok(Self::new(font, text, font_size, color))
    }
}

impl OverlayRenderer for TextOverlayRenderer {
    fn render(&self, target: (u32, u32)) -> Result<OverlayImage, Box<dyn std::error::Error>> {
        let (width, height) = target;
        if width == 0 || height == 0 {
            return Err(format!("cannot render overlay at {width}x{height}").into());
        }

        let glyphs: Vec<(GlyphBox, Vec<u8>)> = self
            .text
            .chars()
            .map(|ch| {
                let (metrics, bitmap) = self.font.rasterize(ch, self.font_size);
                let glyph = GlyphBox {
                    advance: metrics.advance_width,
                    xmin: metrics.xmin,
                    ymin: metrics.ymin,
                    width: metrics.width,
                    height: metrics.height,
                };
                (glyph, bitmap)
            })
            .collect();

        let boxes: Vec<GlyphBox> = glyphs.iter().map(|(g, _)| *g).collect();
        let positions = text_layout::centered_positions(&boxes, target);

        let mut canvas = OverlayImage::transparent(width, height);
        let [r, g, b, a] = self.color;
        for ((glyph, bitmap), (left, top)) in glyphs.iter().zip(positions) {
            for gy in 0..glyph.height {
                for gx in 0..glyph.width {
                    let coverage = bitmap[gy * glyph.width + gx];
                    if coverage == 0 {
                        continue;
                    }
                    let px = left + gx as i32;
                    let py = top + gy as i32;
                    if px < 0 || py < 0 || px >= width as i32 || py >= height as i32 {
                        continue;
                    }
                    let alpha = ((coverage as u32 * a as u32 + 127) / 255) as u8;
                    // Overlapping glyph edges keep the stronger coverage.
                    let existing = canvas.pixel(px as u32, py as u32)[3];
                    if alpha > existing {
                        canvas.put_pixel(px as u32, py as u32, [r, g, b, alpha]);
                    }
                }
            }
        }

        Ok(canvas)
    }
}

//! Placement of a single line of text, independent of the rasterizer.

/// Metrics of one rasterized glyph, in pixels. `ymin` is the offset of
/// the bitmap's bottom edge from the baseline (negative for descenders).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlyphBox {
    pub advance: f32,
    pub xmin: i32,
    pub ymin: i32,
    pub width: usize,
    pub height: usize,
}

/// Extent of a laid-out line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineExtent {
    pub width: u32,
    pub ascent: i32,
    pub descent: i32,
}

impl LineExtent {
    pub fn height(&self) -> u32 {
        (self.ascent + self.descent).max(0) as u32
    }
}

pub fn measure(glyphs: &[GlyphBox]) -> LineExtent {
    let mut width = 0.0f32;
    let mut ascent = 0;
    let mut descent = 0;
    for glyph in glyphs {
        ascent = ascent.max(glyph.height as i32 + glyph.ymin);
        descent = descent.max(-glyph.ymin);
        width += glyph.advance;
    }
    LineExtent {
        width: width.round().max(0.0) as u32,
        ascent,
        descent,
    }
}

/// Top-left corner of each glyph bitmap when the line is centered on both
/// axes of a `target` canvas. Positions may be negative when the line is
/// larger than the canvas.
pub fn centered_positions(glyphs: &[GlyphBox], target: (u32, u32)) -> Vec<(i32, i32)> {
    let extent = measure(glyphs);
    let left = (target.0 as i32 - extent.width as i32) / 2;
    let top = (target.1 as i32 - extent.height() as i32) / 2;

    let mut cursor = 0.0f32;
    glyphs
        .iter()
        .map(|glyph| {
            let x = left + cursor.round() as i32 + glyph.xmin;
            let y = top + extent.ascent - (glyph.height as i32 + glyph.ymin);
            cursor += glyph.advance;
            (x, y)
        })
        .collect()
}

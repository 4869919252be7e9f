use crate::compositing::domain::frame_compositor::FrameCompositor;
use crate::shared::frame::{PixelFormat, VideoFrame};
use crate::shared::overlay_image::OverlayImage;

/// CPU "over" operator for straight-alpha overlays.
///
/// The overlay is sampled nearest-neighbour, each axis mapped on its own,
/// so an overlay of any size covers the whole frame. Callers that want a
/// smooth stretch scale the overlay to the frame size beforehand.
pub struct AlphaOverCompositor;

impl AlphaOverCompositor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AlphaOverCompositor {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameCompositor for AlphaOverCompositor {
    fn composite(
        &self,
        frame: &mut VideoFrame,
        overlay: &OverlayImage,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let fw = frame.width() as usize;
        let fh = frame.height() as usize;
        let ow = overlay.width() as usize;
        let oh = overlay.height() as usize;
        if ow == 0 || oh == 0 {
            return Err("overlay has no pixels".into());
        }
        let has_alpha = frame.format() == PixelFormat::Rgba8;

        let src = overlay.as_ndarray();
        let mut dst = frame.as_ndarray_mut();
        let columns: Vec<usize> = (0..fw).map(|x| x * ow / fw).collect();

        for y in 0..fh {
            let sy = y * oh / fh;
            for (x, &sx) in columns.iter().enumerate() {
                let alpha = src[[sy, sx, 3]] as u32;
                if alpha == 0 {
                    continue;
                }
                for c in 0..3 {
                    dst[[y, x, c]] = blend(src[[sy, sx, c]] as u32, dst[[y, x, c]] as u32, alpha);
                }
                if has_alpha {
                    let below = dst[[y, x, 3]] as u32;
                    dst[[y, x, 3]] = (alpha + (below * (255 - alpha) + 127) / 255) as u8;
                }
            }
        }
        Ok(())
    }
}

/// `src * a + dst * (1 - a)` in 8-bit fixed point, rounded.
fn blend(src: u32, dst: u32, alpha: u32) -> u8 {
    ((src * alpha + dst * (255 - alpha) + 127) / 255) as u8
}

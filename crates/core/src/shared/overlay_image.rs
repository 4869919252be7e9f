use image::imageops::{self, FilterType};
use image::RgbaImage;
use ndarray::ArrayView3;

/// A rasterized overlay layer: straight (non-premultiplied) RGBA, row-major.
///
/// Rendered once per job and shared read-only by every frame iteration.
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayImage {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl OverlayImage {
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * 4,
            "data length must equal width * height * 4"
        );
        Self {
            data,
            width,
            height,
        }
    }

    /// Fully transparent canvas.
    pub fn transparent(width: u32, height: u32) -> Self {
        Self::new(vec![0; (width as usize) * (height as usize) * 4], width, height)
    }

    pub fn from_rgba(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self::new(image.into_raw(), width, height)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = ((y as usize) * (self.width as usize) + x as usize) * 4;
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }

    pub fn put_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        let i = ((y as usize) * (self.width as usize) + x as usize) * 4;
        self.data[i..i + 4].copy_from_slice(&rgba);
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(
            (self.height as usize, self.width as usize, 4),
            &self.data,
        )
        .expect("Overlay data length must match dimensions")
    }

    /// Scales each axis independently so the result is exactly
    /// `width x height`. Returns a clone when the size already matches.
    pub fn scaled_to(&self, width: u32, height: u32) -> OverlayImage {
        if self.size() == (width, height) {
            return self.clone();
        }
        match RgbaImage::from_raw(self.width, self.height, self.data.clone()) {
            Some(image) => {
                OverlayImage::from_rgba(imageops::resize(&image, width, height, FilterType::Triangle))
            }
            None => OverlayImage::transparent(width, height),
        }
    }

    /// True when every pixel has zero alpha.
    pub fn is_fully_transparent(&self) -> bool {
        self.data.chunks_exact(4).all(|px| px[3] == 0)
    }
}

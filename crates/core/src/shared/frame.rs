use ndarray::{ArrayView3, ArrayViewMut3};

use crate::shared::media_time::MediaTime;

/// Packed 8-bit pixel layouts a [`VideoFrame`] may carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    Rgb24,
    Rgba8,
}

impl PixelFormat {
    pub fn channels(&self) -> u8 {
        match self {
            PixelFormat::Rgb24 => 3,
            PixelFormat::Rgba8 => 4,
        }
    }
}

/// A single decoded video frame: contiguous packed pixels in row-major
/// order, tagged with its presentation time.
///
/// Format conversion happens at I/O boundaries only. A frame is moved from
/// stage to stage; nothing keeps a copy after handing it on.
#[derive(Clone, Debug)]
pub struct VideoFrame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    format: PixelFormat,
    index: usize,
    presentation_time: MediaTime,
}

impl VideoFrame {
    pub fn new(
        data: Vec<u8>,
        width: u32,
        height: u32,
        format: PixelFormat,
        index: usize,
        presentation_time: MediaTime,
    ) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (format.channels() as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            format,
            index,
            presentation_time,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn channels(&self) -> u8 {
        self.format.channels()
    }

    /// Position of the frame in decode output order.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn presentation_time(&self) -> MediaTime {
        self.presentation_time
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    pub fn as_ndarray_mut(&mut self) -> ArrayViewMut3<'_, u8> {
        let shape = self.shape();
        ArrayViewMut3::from_shape(shape, &mut self.data)
            .expect("Frame data length must match dimensions")
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels() as usize,
        )
    }
}

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::shared::constants::{DEFAULT_FONT_SIZE, DEFAULT_OVERLAY_COLOR, DEFAULT_OVERLAY_TEXT};

/// What to draw over every frame.
///
/// When `image_path` is set the image replaces the text label.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlaySpec {
    pub text: String,
    /// Glyph height in pixels of the target frame.
    pub font_size: f32,
    /// Straight RGBA.
    pub color: [u8; 4],
    pub font_path: Option<PathBuf>,
    pub image_path: Option<PathBuf>,
}

impl Default for OverlaySpec {
    fn default() -> Self {
        Self {
            text: DEFAULT_OVERLAY_TEXT.to_string(),
            font_size: DEFAULT_FONT_SIZE,
            color: DEFAULT_OVERLAY_COLOR,
            font_path: None,
            image_path: None,
        }
    }
}

use std::time::Duration;

/// Seconds removed from the head and the tail of the re-encoded movie.
pub const DEFAULT_TRIM_SECONDS: f64 = 1.0;

/// How long the frame loop sleeps while the encoder is not ready (~one
/// frame at 60 Hz).
pub const WRITER_POLL_INTERVAL: Duration = Duration::from_millis(16);

/// Export progress sampling cadence.
pub const EXPORT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Frames that may sit between the frame loop and the encoder thread.
pub const ENCODER_QUEUE_CAPACITY: usize = 8;

/// Encoders reject time bases finer than this (MPEG-4 part 2 limit).
pub const MAX_ENCODER_TIMESCALE: i32 = 65_535;

pub const INTERMEDIATE_FILE_NAME: &str = "movie_maker_temp.mp4";
pub const OUTPUT_FILE_NAME: &str = "movie.mov";
pub const APP_DIR_NAME: &str = "MovieMaker";

pub const DEFAULT_OVERLAY_TEXT: &str = "Title";
pub const DEFAULT_FONT_SIZE: f32 = 64.0;
/// Opaque red, the title label colour.
pub const DEFAULT_OVERLAY_COLOR: [u8; 4] = [255, 0, 0, 255];

pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "webp", "tif", "tiff"];
pub const FONT_EXTENSIONS: &[&str] = &["ttf", "otf"];

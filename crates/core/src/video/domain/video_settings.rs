use serde::{Deserialize, Serialize};

use crate::shared::constants::MAX_ENCODER_TIMESCALE;
use crate::shared::media_asset::VideoTrack;

pub const DEFAULT_CRF: u32 = 18;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoCodec {
    /// H.264 through libx264; falls back to MPEG-4 part 2 when the
    /// ffmpeg build lacks it.
    H264,
    Mpeg4,
}

impl std::fmt::Display for VideoCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VideoCodec::H264 => write!(f, "h264"),
            VideoCodec::Mpeg4 => write!(f, "mpeg4"),
        }
    }
}

impl std::str::FromStr for VideoCodec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "h264" | "avc" => Ok(VideoCodec::H264),
            "mpeg4" => Ok(VideoCodec::Mpeg4),
            other => Err(format!("unknown codec '{other}', expected h264 or mpeg4")),
        }
    }
}

/// User-facing encoder preferences.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    pub codec: VideoCodec,
    /// H.264 constant rate factor (0 = lossless, 51 = worst).
    pub crf: u32,
    /// Distance between forced keyframes, so trims land on one.
    pub keyframe_interval_seconds: f64,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            codec: VideoCodec::H264,
            crf: DEFAULT_CRF,
            keyframe_interval_seconds: 1.0,
        }
    }
}

/// Everything an encoder needs to open an output stream.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoSettings {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    /// Encoder ticks per second; frame timestamps are rescaled to it.
    pub timescale: i32,
    pub codec: VideoCodec,
    pub crf: u32,
    pub gop_size: u32,
}

impl VideoSettings {
    /// Settings that reproduce `track`'s geometry and timing.
    pub fn for_track(track: &VideoTrack, config: &EncoderConfig) -> Self {
        let fps = if track.fps > 0.0 { track.fps } else { 30.0 };
        let (num, den) = track.time_base;
        let timescale = if num == 1 && den > 0 && den <= MAX_ENCODER_TIMESCALE {
            den
        } else {
            ((fps.round() as i32).max(1) * 1000).min(MAX_ENCODER_TIMESCALE)
        };
        let gop_size = (fps * config.keyframe_interval_seconds).round().max(1.0) as u32;

        Self {
            width: track.width,
            height: track.height,
            fps,
            timescale,
            codec: config.codec,
            crf: config.crf.min(51),
            gop_size,
        }
    }

    /// Spacing of forced keyframes in encoder ticks.
    pub fn keyframe_interval_ticks(&self) -> i64 {
        let seconds = self.gop_size as f64 / self.fps;
        ((seconds * self.timescale as f64).round() as i64).max(1)
    }
}

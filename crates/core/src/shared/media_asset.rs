use std::path::PathBuf;

use crate::shared::media_time::MediaTime;

/// Properties of the video track chosen for decoding.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoTrack {
    pub stream_index: usize,
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    /// Stream time base as `(num, den)` seconds per tick.
    pub time_base: (i32, i32),
    pub total_frames: usize,
    pub codec: String,
}

impl VideoTrack {
    /// Pixel dimensions the frames decode to.
    pub fn natural_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// One frame interval, falling back to 1/30s when the rate is unknown.
    pub fn frame_duration(&self) -> MediaTime {
        if self.fps > 0.0 {
            MediaTime::from_seconds(1.0 / self.fps, 90_000)
        } else {
            MediaTime::new(1, 30)
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AudioTrack {
    pub stream_index: usize,
    pub sample_rate: u32,
    pub channels: u16,
    pub time_base: (i32, i32),
    pub codec: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrackSet {
    pub video: Option<VideoTrack>,
    pub audio: Option<AudioTrack>,
}

impl TrackSet {
    pub fn count(&self) -> usize {
        self.video.is_some() as usize + self.audio.is_some() as usize
    }
}

/// An opened media file: where it lives, how long it runs, which tracks it
/// carries. Immutable once produced by a reader.
#[derive(Clone, Debug, PartialEq)]
pub struct MediaAsset {
    pub path: PathBuf,
    pub duration: MediaTime,
    pub tracks: TrackSet,
}

impl MediaAsset {
    pub fn duration_seconds(&self) -> f64 {
        self.duration.seconds()
    }

    pub fn natural_size(&self) -> Option<(u32, u32)> {
        self.tracks.video.as_ref().map(VideoTrack::natural_size)
    }
}

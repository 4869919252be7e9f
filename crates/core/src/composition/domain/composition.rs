use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shared::media_asset::MediaAsset;
use crate::shared::media_time::{MediaTime, TimeRange};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackKind {
    Video,
    Audio,
}

impl std::fmt::Display for TrackKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackKind::Video => write!(f, "video"),
            TrackKind::Audio => write!(f, "audio"),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum CompositionError {
    #[error("{path} has no {kind} track")]
    MissingTrack { kind: TrackKind, path: PathBuf },
    #[error("nothing of the {kind} track of {path} falls inside {requested}")]
    EmptyInsert {
        kind: TrackKind,
        path: PathBuf,
        requested: TimeRange,
    },
    #[error("composition already has a {0} track")]
    DuplicateTrack(TrackKind),
    #[error("composition has no video track")]
    NoVideo,
    #[error("export range {requested} lies outside the composition (duration {duration})")]
    RangeOutside {
        requested: TimeRange,
        duration: MediaTime,
    },
}

/// One source stream placed on the composition timeline.
#[derive(Clone, Debug, PartialEq)]
pub struct CompositionTrack {
    pub kind: TrackKind,
    pub source: PathBuf,
    pub stream_index: usize,
    /// Portion of the source stream that is inserted.
    pub source_range: TimeRange,
    /// Composition time at which `source_range.start` plays.
    pub at: MediaTime,
}

impl CompositionTrack {
    /// Where this track sits on the composition timeline.
    pub fn timeline_range(&self) -> TimeRange {
        TimeRange {
            start: self.at,
            end: self.at + self.source_range.duration(),
        }
    }

    /// Maps a source timestamp onto the composition timeline.
    pub fn to_timeline(&self, source_time: MediaTime) -> MediaTime {
        source_time - self.source_range.start + self.at
    }
}

/// A timeline assembled from tracks of one or more assets, independent of
/// any container, ready to be handed to an exporter.
///
/// Holds at most one video and one audio track.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Composition {
    tracks: Vec<CompositionTrack>,
}

impl Composition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `range` of the asset's video track at composition time `at`.
    ///
    /// The range is clipped to the asset's duration; inserting nothing is
    /// an error rather than a silent no-op.
    pub fn insert_video(
        &mut self,
        asset: &MediaAsset,
        range: TimeRange,
        at: MediaTime,
    ) -> Result<(), CompositionError> {
        let stream_index = asset
            .tracks
            .video
            .as_ref()
            .map(|t| t.stream_index)
            .ok_or_else(|| CompositionError::MissingTrack {
                kind: TrackKind::Video,
                path: asset.path.clone(),
            })?;
        self.insert(TrackKind::Video, asset, stream_index, range, at)
    }

    /// Audio counterpart of [`Composition::insert_video`].
    pub fn insert_audio(
        &mut self,
        asset: &MediaAsset,
        range: TimeRange,
        at: MediaTime,
    ) -> Result<(), CompositionError> {
        let stream_index = asset
            .tracks
            .audio
            .as_ref()
            .map(|t| t.stream_index)
            .ok_or_else(|| CompositionError::MissingTrack {
                kind: TrackKind::Audio,
                path: asset.path.clone(),
            })?;
        self.insert(TrackKind::Audio, asset, stream_index, range, at)
    }

    fn insert(
        &mut self,
        kind: TrackKind,
        asset: &MediaAsset,
        stream_index: usize,
        range: TimeRange,
        at: MediaTime,
    ) -> Result<(), CompositionError> {
        if self.track(kind).is_some() {
            return Err(CompositionError::DuplicateTrack(kind));
        }
        let available = TimeRange::from_zero(asset.duration);
        let source_range = available
            .and_then(|full| full.intersection(&range))
            .ok_or_else(|| CompositionError::EmptyInsert {
                kind,
                path: asset.path.clone(),
                requested: range,
            })?;
        self.tracks.push(CompositionTrack {
            kind,
            source: asset.path.clone(),
            stream_index,
            source_range,
            at,
        });
        Ok(())
    }

    pub fn tracks(&self) -> &[CompositionTrack] {
        &self.tracks
    }

    pub fn track(&self, kind: TrackKind) -> Option<&CompositionTrack> {
        self.tracks.iter().find(|t| t.kind == kind)
    }

    pub fn video_track(&self) -> Option<&CompositionTrack> {
        self.track(TrackKind::Video)
    }

    pub fn audio_track(&self) -> Option<&CompositionTrack> {
        self.track(TrackKind::Audio)
    }

    /// End of the latest track on the timeline.
    pub fn duration(&self) -> MediaTime {
        self.tracks
            .iter()
            .map(|t| t.timeline_range().end)
            .max()
            .unwrap_or(MediaTime::ZERO)
    }

    /// Distinct source files, the video track's source first.
    pub fn sources(&self) -> Vec<&Path> {
        let mut sources: Vec<&Path> = Vec::new();
        let ordered = self
            .video_track()
            .into_iter()
            .chain(self.tracks.iter().filter(|t| t.kind != TrackKind::Video));
        for track in ordered {
            if !sources.contains(&track.source.as_path()) {
                sources.push(&track.source);
            }
        }
        sources
    }

    /// Resolves the range to export: the whole timeline when `requested`
    /// is `None`, otherwise `requested` clipped to the timeline.
    pub fn export_range(&self, requested: Option<TimeRange>) -> Result<TimeRange, CompositionError> {
        if self.video_track().is_none() {
            return Err(CompositionError::NoVideo);
        }
        let duration = self.duration();
        let full = TimeRange::from_zero(duration).ok_or(CompositionError::NoVideo)?;
        match requested {
            None => Ok(full),
            Some(range) => full
                .intersection(&range)
                .ok_or(CompositionError::RangeOutside {
                    requested: range,
                    duration,
                }),
        }
    }
}

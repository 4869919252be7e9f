use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use crate::shared::frame::VideoFrame;
use crate::shared::media_time::MediaTime;
use crate::video::domain::frame_encoder::FrameEncoder;
use crate::video::domain::video_settings::VideoSettings;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriterState {
    Idle,
    Writing,
    Finished,
    Failed,
}

#[derive(Debug, thiserror::Error)]
pub enum WriterError {
    #[error("cannot write {path}: {reason}")]
    Unavailable { path: PathBuf, reason: String },
    #[error("writer is {actual:?}, expected {expected:?}")]
    InvalidState {
        expected: WriterState,
        actual: WriterState,
    },
    #[error("frame at {current} does not come after frame at {previous}")]
    OutOfOrder {
        previous: MediaTime,
        current: MediaTime,
    },
    #[error("encoder failed: {0}")]
    Encoder(String),
}

/// Drives a [`FrameEncoder`] through `Idle -> Writing -> Finished | Failed`.
///
/// Frames are handed over in strictly increasing presentation time. When
/// the encoder's queue is full the writer sleeps for `poll_interval` and
/// asks again, so a slow encoder throttles the frame loop instead of
/// growing memory.
pub struct SinkWriter {
    encoder: Box<dyn FrameEncoder>,
    state: WriterState,
    poll_interval: Duration,
    last_time: Option<MediaTime>,
    frames_written: usize,
}

impl SinkWriter {
    pub fn new(encoder: Box<dyn FrameEncoder>, poll_interval: Duration) -> Self {
        Self {
            encoder,
            state: WriterState::Idle,
            poll_interval,
            last_time: None,
            frames_written: 0,
        }
    }

    pub fn state(&self) -> WriterState {
        self.state
    }

    pub fn frames_written(&self) -> usize {
        self.frames_written
    }

    pub fn start(&mut self, path: &Path, settings: &VideoSettings) -> Result<(), WriterError> {
        self.expect_state(WriterState::Idle)?;
        if let Err(e) = self.encoder.open(path, settings) {
            self.state = WriterState::Failed;
            return Err(WriterError::Unavailable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            });
        }
        log::debug!(
            "Writing {}x{} @ {:.2} fps to {}",
            settings.width,
            settings.height,
            settings.fps,
            path.display()
        );
        self.state = WriterState::Writing;
        Ok(())
    }

    /// Hands `frame` to the encoder once it has room.
    ///
    /// Returns how long the call waited for readiness. An out-of-order
    /// frame is rejected and the writer stays usable.
    pub fn push_frame(&mut self, frame: VideoFrame) -> Result<Duration, WriterError> {
        self.expect_state(WriterState::Writing)?;

        let current = frame.presentation_time();
        if let Some(previous) = self.last_time {
            if current <= previous {
                return Err(WriterError::OutOfOrder { previous, current });
            }
        }

        let started = Instant::now();
        while !self.encoder.is_ready_for_more_data() {
            thread::sleep(self.poll_interval);
        }
        let waited = started.elapsed();

        if let Err(e) = self.encoder.append(frame) {
            self.state = WriterState::Failed;
            return Err(WriterError::Encoder(e.to_string()));
        }
        self.last_time = Some(current);
        self.frames_written += 1;
        Ok(waited)
    }

    /// Flushes the encoder and closes the output.
    pub fn finish(&mut self) -> Result<(), WriterError> {
        self.expect_state(WriterState::Writing)?;
        match self.encoder.finish() {
            Ok(()) => {
                self.state = WriterState::Finished;
                Ok(())
            }
            Err(e) => {
                self.state = WriterState::Failed;
                Err(WriterError::Encoder(e.to_string()))
            }
        }
    }

    fn expect_state(&self, expected: WriterState) -> Result<(), WriterError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(WriterError::InvalidState {
                expected,
                actual: self.state,
            })
        }
    }
}

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::constants::DEFAULT_TRIM_SECONDS;
use crate::shared::media_time::{MediaTime, TimeRange};

#[derive(Error, Debug, PartialEq)]
pub enum TrimError {
    #[error("movie of {duration} is too short to trim {required} from it")]
    TooShort {
        duration: MediaTime,
        required: MediaTime,
    },
    #[error("trim amounts must be finite and non-negative (head {head}, tail {tail})")]
    InvalidAmount { head: f64, tail: f64 },
    #[error("trim range {start:.3}s..{end:.3}s is empty or outside a movie of {duration}")]
    InvalidRange {
        start: f64,
        end: f64,
        duration: MediaTime,
    },
}

/// How much to cut from each end of the re-encoded movie.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrimPolicy {
    pub head_seconds: f64,
    pub tail_seconds: f64,
}

impl Default for TrimPolicy {
    fn default() -> Self {
        Self {
            head_seconds: DEFAULT_TRIM_SECONDS,
            tail_seconds: DEFAULT_TRIM_SECONDS,
        }
    }
}

impl TrimPolicy {
    pub fn new(head_seconds: f64, tail_seconds: f64) -> Self {
        Self {
            head_seconds,
            tail_seconds,
        }
    }

    /// Keeps the whole movie.
    pub fn none() -> Self {
        Self::new(0.0, 0.0)
    }

    /// Range `[head, duration - tail)` expressed in the duration's timescale.
    ///
    /// Fails when nothing would be left, including the exact-fit case.
    pub fn range_for(&self, duration: MediaTime) -> Result<TimeRange, TrimError> {
        self.validate()?;
        let timescale = duration.timescale();
        let head = MediaTime::from_seconds(self.head_seconds, timescale);
        let tail = MediaTime::from_seconds(self.tail_seconds, timescale);
        TimeRange::new(head, duration - tail).ok_or(TrimError::TooShort {
            duration,
            required: head + tail,
        })
    }

    pub fn validate(&self) -> Result<(), TrimError> {
        let ok = |v: f64| v.is_finite() && v >= 0.0;
        if ok(self.head_seconds) && ok(self.tail_seconds) {
            Ok(())
        } else {
            Err(TrimError::InvalidAmount {
                head: self.head_seconds,
                tail: self.tail_seconds,
            })
        }
    }
}

/// Range `[start, end)` given in seconds, each end defaulting to the
/// movie's bounds. The end is clipped to `duration`.
pub fn explicit_range(
    start_seconds: Option<f64>,
    end_seconds: Option<f64>,
    duration: MediaTime,
) -> Result<TimeRange, TrimError> {
    // At least millisecond resolution for user-typed seconds.
    let timescale = duration.timescale().max(1000);
    let start_s = start_seconds.unwrap_or(0.0);
    let end_s = end_seconds.unwrap_or_else(|| duration.seconds());
    let invalid = || TrimError::InvalidRange {
        start: start_s,
        end: end_s,
        duration,
    };
    if !start_s.is_finite() || !end_s.is_finite() || start_s < 0.0 {
        return Err(invalid());
    }

    let start = MediaTime::from_seconds(start_s, timescale);
    let end = MediaTime::from_seconds(end_s, timescale).min(duration);
    TimeRange::new(start, end).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_default_trims_one_second_each_end() {
        let range = TrimPolicy::default()
            .range_for(MediaTime::new(10, 1))
            .unwrap();
        assert_eq!(range.start, MediaTime::new(1, 1));
        assert_eq!(range.end, MediaTime::new(9, 1));
        assert_relative_eq!(range.duration().seconds(), 8.0);
    }

    #[test]
    fn test_range_uses_duration_timescale() {
        let range = TrimPolicy::default()
            .range_for(MediaTime::new(153_600, 15360))
            .unwrap();
        assert_eq!(range.start.timescale(), 15360);
        assert_eq!(range.start.value(), 15360);
        assert_eq!(range.end.value(), 138_240);
    }

    #[test]
    fn test_none_keeps_everything() {
        let d = MediaTime::new(301, 30);
        let range = TrimPolicy::none().range_for(d).unwrap();
        assert_eq!(range.start, MediaTime::ZERO);
        assert_eq!(range.end, d);
    }

    #[rstest]
    #[case::exact_fit(MediaTime::new(2, 1))]
    #[case::shorter(MediaTime::new(3, 2))]
    #[case::empty(MediaTime::ZERO)]
    fn test_too_short_for_default_trim(#[case] duration: MediaTime) {
        let err = TrimPolicy::default().range_for(duration).unwrap_err();
        assert!(matches!(err, TrimError::TooShort { .. }));
    }

    #[test]
    fn test_just_over_two_seconds_is_allowed() {
        let range = TrimPolicy::default()
            .range_for(MediaTime::new(61, 30))
            .unwrap();
        assert_eq!(range.duration(), MediaTime::new(1, 30));
    }

    #[rstest]
    #[case::negative_head(-1.0, 1.0)]
    #[case::nan_tail(1.0, f64::NAN)]
    #[case::infinite(f64::INFINITY, 0.0)]
    fn test_invalid_amounts(#[case] head: f64, #[case] tail: f64) {
        let err = TrimPolicy::new(head, tail)
            .range_for(MediaTime::new(10, 1))
            .unwrap_err();
        assert!(matches!(err, TrimError::InvalidAmount { .. }));
    }

    #[test]
    fn test_explicit_range_defaults_to_whole_movie() {
        let d = MediaTime::new(90, 30);
        let range = explicit_range(None, None, d).unwrap();
        assert_eq!(range.start, MediaTime::ZERO);
        assert_eq!(range.end, d);
    }

    #[test]
    fn test_explicit_range_clips_end() {
        let range = explicit_range(Some(0.5), Some(60.0), MediaTime::new(3, 1)).unwrap();
        assert_eq!(range.start, MediaTime::new(1, 2));
        assert_eq!(range.end, MediaTime::new(3, 1));
    }

    #[rstest]
    #[case::inverted(Some(2.0), Some(1.0))]
    #[case::negative(Some(-1.0), None)]
    #[case::past_end(Some(5.0), None)]
    #[case::nan(None, Some(f64::NAN))]
    fn test_explicit_range_rejects(#[case] start: Option<f64>, #[case] end: Option<f64>) {
        let err = explicit_range(start, end, MediaTime::new(3, 1)).unwrap_err();
        assert!(matches!(err, TrimError::InvalidRange { .. }));
    }
}

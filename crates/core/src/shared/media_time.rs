use std::cmp::Ordering;
use std::fmt;

/// A rational timestamp: `value / timescale` seconds.
///
/// Mirrors container time bases so timestamps read from a stream can be
/// carried through the pipeline without rounding. Comparison is exact
/// (cross-multiplied), so `1/30` and `512/15360` compare equal.
#[derive(Clone, Copy, Debug)]
pub struct MediaTime {
    value: i64,
    timescale: i32,
}

impl MediaTime {
    pub const ZERO: MediaTime = MediaTime {
        value: 0,
        timescale: 1,
    };

    pub fn new(value: i64, timescale: i32) -> Self {
        debug_assert!(timescale > 0, "timescale must be positive");
        Self { value, timescale }
    }

    /// Builds a timestamp from a tick count in an ffmpeg-style time base
    /// (`num/den` seconds per tick).
    pub fn from_ticks(ticks: i64, time_base: (i32, i32)) -> Self {
        let (num, den) = time_base;
        if num <= 0 || den <= 0 {
            return Self::new(ticks, 1);
        }
        Self::new(ticks * num as i64, den)
    }

    pub fn from_seconds(seconds: f64, timescale: i32) -> Self {
        Self::new((seconds * timescale as f64).round() as i64, timescale)
    }

    pub fn value(&self) -> i64 {
        self.value
    }

    pub fn timescale(&self) -> i32 {
        self.timescale
    }

    pub fn seconds(&self) -> f64 {
        self.value as f64 / self.timescale as f64
    }

    /// Converts to another timescale, rounding half away from zero.
    pub fn rescale(&self, timescale: i32) -> Self {
        if timescale == self.timescale {
            return *self;
        }
        let num = self.value as i128 * timescale as i128;
        let den = self.timescale as i128;
        let rounded = if num >= 0 {
            (num + den / 2) / den
        } else {
            (num - den / 2) / den
        };
        Self::new(rounded as i64, timescale)
    }

    /// Tick count in an ffmpeg-style time base (`num/den` seconds per tick).
    pub fn to_ticks(&self, time_base: (i32, i32)) -> i64 {
        let (num, den) = time_base;
        if num <= 0 || den <= 0 {
            return self.value;
        }
        let scaled = self.value as i128 * den as i128;
        let per_tick = self.timescale as i128 * num as i128;
        let rounded = if scaled >= 0 {
            (scaled + per_tick / 2) / per_tick
        } else {
            (scaled - per_tick / 2) / per_tick
        };
        rounded as i64
    }

    pub fn is_zero(&self) -> bool {
        self.value == 0
    }

    /// The finer of the two timescales, so arithmetic stays exact for the
    /// common case of timestamps from the same stream.
    fn common_timescale(&self, other: &MediaTime) -> i32 {
        self.timescale.max(other.timescale)
    }
}

impl Default for MediaTime {
    fn default() -> Self {
        Self::ZERO
    }
}

impl PartialEq for MediaTime {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MediaTime {}

impl PartialOrd for MediaTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MediaTime {
    fn cmp(&self, other: &Self) -> Ordering {
        let lhs = self.value as i128 * other.timescale as i128;
        let rhs = other.value as i128 * self.timescale as i128;
        lhs.cmp(&rhs)
    }
}

impl std::ops::Add for MediaTime {
    type Output = MediaTime;

    fn add(self, rhs: MediaTime) -> MediaTime {
        let ts = self.common_timescale(&rhs);
        MediaTime::new(self.rescale(ts).value + rhs.rescale(ts).value, ts)
    }
}

impl std::ops::Sub for MediaTime {
    type Output = MediaTime;

    fn sub(self, rhs: MediaTime) -> MediaTime {
        let ts = self.common_timescale(&rhs);
        MediaTime::new(self.rescale(ts).value - rhs.rescale(ts).value, ts)
    }
}

impl fmt::Display for MediaTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}s", self.seconds())
    }
}

/// Half-open interval `[start, end)` on a media timeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeRange {
    pub start: MediaTime,
    pub end: MediaTime,
}

impl TimeRange {
    /// Returns `None` when `end` does not lie strictly after `start`.
    pub fn new(start: MediaTime, end: MediaTime) -> Option<Self> {
        if end > start {
            Some(Self { start, end })
        } else {
            None
        }
    }

    /// `[0, duration)`. Returns `None` for a non-positive duration.
    pub fn from_zero(duration: MediaTime) -> Option<Self> {
        Self::new(MediaTime::ZERO, duration)
    }

    pub fn duration(&self) -> MediaTime {
        self.end - self.start
    }

    pub fn contains(&self, time: MediaTime) -> bool {
        time >= self.start && time < self.end
    }

    /// Overlap of two ranges, `None` when they are disjoint.
    pub fn intersection(&self, other: &TimeRange) -> Option<TimeRange> {
        TimeRange::new(self.start.max(other.start), self.end.min(other.end))
    }

    /// Fraction of the range covered up to `time`, clamped to `[0, 1]`.
    pub fn progress_at(&self, time: MediaTime) -> f32 {
        let total = self.duration().seconds();
        if total <= 0.0 {
            return 1.0;
        }
        ((time - self.start).seconds() / total).clamp(0.0, 1.0) as f32
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

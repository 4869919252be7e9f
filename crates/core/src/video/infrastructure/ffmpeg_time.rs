//! Conversions between ffmpeg rationals and [`MediaTime`].

use crate::shared::media_time::MediaTime;

/// Microsecond base ffmpeg uses for container-level timestamps.
const AV_TIME_BASE: i32 = 1_000_000;

pub fn time_base(rational: ffmpeg_next::Rational) -> (i32, i32) {
    (rational.numerator(), rational.denominator())
}

pub fn to_media_time(ticks: i64, rational: ffmpeg_next::Rational) -> MediaTime {
    MediaTime::from_ticks(ticks, time_base(rational))
}

pub fn to_ticks(time: MediaTime, rational: ffmpeg_next::Rational) -> i64 {
    time.to_ticks(time_base(rational))
}

/// ffmpeg's `AV_NOPTS_VALUE`.
const NO_PTS: i64 = i64::MIN;

/// Where a stream's timeline begins. Streams without a recorded start
/// begin at zero.
pub fn stream_start(start_time: i64, rational: ffmpeg_next::Rational) -> MediaTime {
    if start_time == NO_PTS {
        MediaTime::ZERO
    } else {
        to_media_time(start_time, rational)
    }
}

/// Start of the input's best video stream; every stream of the input is
/// measured from it so audio stays in sync with the first frame.
pub fn input_origin(ictx: &ffmpeg_next::format::context::Input) -> MediaTime {
    ictx.streams()
        .best(ffmpeg_next::media::Type::Video)
        .map(|s| stream_start(s.start_time(), s.time_base()))
        .unwrap_or(MediaTime::ZERO)
}

/// Container duration, which ffmpeg reports in `AV_TIME_BASE` units.
pub fn container_duration(duration: i64) -> Option<MediaTime> {
    if duration > 0 {
        Some(MediaTime::new(duration, AV_TIME_BASE))
    } else {
        None
    }
}

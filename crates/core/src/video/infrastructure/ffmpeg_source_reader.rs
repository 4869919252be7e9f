use std::path::Path;

use crate::shared::frame::{PixelFormat, VideoFrame};
use crate::shared::media_asset::{AudioTrack, MediaAsset, TrackSet, VideoTrack};
use crate::shared::media_time::MediaTime;
use crate::video::domain::source_reader::SourceReader;
use crate::video::infrastructure::ffmpeg_time;

/// Decodes video frames via ffmpeg-next (libavformat + libavcodec).
///
/// Converts each decoded frame to RGB24 and tags it with its presentation
/// time in the stream's time base, measured from the stream start so the
/// first frame sits at zero.
pub struct FfmpegSourceReader {
    input_ctx: Option<ffmpeg_next::format::context::Input>,
    video: Option<VideoTrack>,
}

// Safety: FfmpegSourceReader is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegSourceReader {}

impl FfmpegSourceReader {
    pub fn new() -> Self {
        Self {
            input_ctx: None,
            video: None,
        }
    }
}

impl Default for FfmpegSourceReader {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceReader for FfmpegSourceReader {
    fn open(&mut self, path: &Path) -> Result<MediaAsset, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let ictx = ffmpeg_next::format::input(path)?;

        let video_stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or("No video stream found")?;
        let video = describe_video(&video_stream)?;

        let audio = match ictx.streams().best(ffmpeg_next::media::Type::Audio) {
            Some(stream) => Some(describe_audio(&stream)?),
            None => None,
        };

        let duration = ffmpeg_time::container_duration(ictx.duration())
            .or_else(|| {
                let stream_duration = video_stream.duration();
                (stream_duration > 0)
                    .then(|| ffmpeg_time::to_media_time(stream_duration, video_stream.time_base()))
            })
            .unwrap_or(MediaTime::ZERO);

        log::debug!(
            "Opened {}: {}x{} {} @ {:.2} fps, {duration}, audio: {}",
            path.display(),
            video.width,
            video.height,
            video.codec,
            video.fps,
            audio.as_ref().map_or("none", |a| a.codec.as_str())
        );

        let asset = MediaAsset {
            path: path.to_path_buf(),
            duration,
            tracks: TrackSet {
                video: Some(video.clone()),
                audio,
            },
        };

        self.video = Some(video);
        self.input_ctx = Some(ictx);

        Ok(asset)
    }

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<VideoFrame, Box<dyn std::error::Error>>> + '_> {
        let (Some(ictx), Some(video)) = (self.input_ctx.as_mut(), self.video.as_ref()) else {
            return Box::new(std::iter::once(Err(
                "FfmpegSourceReader: not opened".into()
            )));
        };

        match FfmpegFrameIter::new(ictx, video) {
            Ok(iter) => Box::new(iter),
            Err(e) => Box::new(std::iter::once(Err(e))),
        }
    }

    fn close(&mut self) {
        self.input_ctx = None;
        self.video = None;
    }
}

fn describe_video(
    stream: &ffmpeg_next::format::stream::Stream,
) -> Result<VideoTrack, Box<dyn std::error::Error>> {
    let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
    let decoder = codec_ctx.decoder().video()?;

    let rate = stream.avg_frame_rate();
    let rate = if rate.denominator() != 0 && rate.numerator() != 0 {
        rate
    } else {
        stream.rate()
    };
    let fps = if rate.denominator() != 0 {
        rate.numerator() as f64 / rate.denominator() as f64
    } else {
        0.0
    };

    Ok(VideoTrack {
        stream_index: stream.index(),
        width: decoder.width(),
        height: decoder.height(),
        fps,
        time_base: ffmpeg_time::time_base(stream.time_base()),
        total_frames: stream.frames().max(0) as usize,
        codec: decoder
            .codec()
            .map(|c| c.name().to_string())
            .unwrap_or_default(),
    })
}

fn describe_audio(
    stream: &ffmpeg_next::format::stream::Stream,
) -> Result<AudioTrack, Box<dyn std::error::Error>> {
    let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
    let decoder = codec_ctx.decoder().audio()?;

    Ok(AudioTrack {
        stream_index: stream.index(),
        sample_rate: decoder.rate(),
        channels: decoder.channels() as u16,
        time_base: ffmpeg_time::time_base(stream.time_base()),
        codec: decoder
            .codec()
            .map(|c| c.name().to_string())
            .unwrap_or_default(),
    })
}

/// Lazy iterator that decodes video frames one at a time, avoiding the need
/// to buffer the entire video in memory.
struct FfmpegFrameIter<'a> {
    ictx: &'a mut ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: ffmpeg_next::software::scaling::Context,
    width: u32,
    height: u32,
    video_stream_index: usize,
    time_base: ffmpeg_next::Rational,
    origin: MediaTime,
    frame_duration: MediaTime,
    frame_index: usize,
    last_time: Option<MediaTime>,
    flushing: bool,
    done: bool,
}

impl<'a> FfmpegFrameIter<'a> {
    fn new(
        ictx: &'a mut ffmpeg_next::format::context::Input,
        video: &VideoTrack,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let stream = ictx
            .stream(video.stream_index)
            .ok_or("video stream vanished after open")?;
        let time_base = stream.time_base();
        let origin = ffmpeg_time::stream_start(stream.start_time(), time_base);
        let codec_ctx =
            ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let decoder = codec_ctx.decoder().video()?;

        let width = decoder.width();
        let height = decoder.height();

        let scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        Ok(Self {
            ictx,
            decoder,
            scaler,
            width,
            height,
            video_stream_index: video.stream_index,
            time_base,
            origin,
            frame_duration: video.frame_duration(),
            frame_index: 0,
            last_time: None,
            flushing: false,
            done: false,
        })
    }

    /// Presentation time of a decoded frame. Falls back to the frame index
    /// when the container carries no usable timestamps.
    fn presentation_time(&self, decoded: &ffmpeg_next::util::frame::video::Video) -> MediaTime {
        match decoded.timestamp().or(decoded.pts()) {
            Some(ticks) => ffmpeg_time::to_media_time(ticks, self.time_base) - self.origin,
            None => {
                let step = self.frame_duration;
                MediaTime::new(step.value() * self.frame_index as i64, step.timescale())
            }
        }
    }

    fn try_receive(&mut self) -> Option<Result<VideoFrame, Box<dyn std::error::Error>>> {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        while self.decoder.receive_frame(&mut decoded).is_ok() {
            let time = self.presentation_time(&decoded);
            if let Some(previous) = self.last_time {
                if time <= previous {
                    log::warn!("Dropping frame at {time}: not after previous frame at {previous}");
                    continue;
                }
            }

            let mut rgb_frame = ffmpeg_next::util::frame::video::Video::empty();
            if let Err(e) = self.scaler.run(&decoded, &mut rgb_frame) {
                return Some(Err(Box::new(e)));
            }

            let pixels = extract_rgb_pixels(&rgb_frame, self.width, self.height);
            let frame = VideoFrame::new(
                pixels,
                self.width,
                self.height,
                PixelFormat::Rgb24,
                self.frame_index,
                time,
            );
            self.frame_index += 1;
            self.last_time = Some(time);
            return Some(Ok(frame));
        }
        None
    }
}

impl Iterator for FfmpegFrameIter<'_> {
    type Item = Result<VideoFrame, Box<dyn std::error::Error>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        if let Some(result) = self.try_receive() {
            return Some(result);
        }

        if self.flushing {
            self.done = true;
            return None;
        }

        loop {
            let Some((stream, packet)) = self.ictx.packets().next() else {
                let _ = self.decoder.send_eof();
                self.flushing = true;
                if let Some(result) = self.try_receive() {
                    return Some(result);
                }
                self.done = true;
                return None;
            };

            if stream.index() != self.video_stream_index {
                continue;
            }

            if let Err(e) = self.decoder.send_packet(&packet) {
                log::debug!("Skipping undecodable packet: {e}");
                continue;
            }

            if let Some(result) = self.try_receive() {
                return Some(result);
            }
        }
    }
}

/// Copies pixel data from an ffmpeg frame into a contiguous RGB buffer,
/// dropping the per-row stride padding.
fn extract_rgb_pixels(
    rgb_frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let w = width as usize;
    let h = height as usize;

    let mut pixels = Vec::with_capacity(w * h * 3);
    for row in 0..h {
        let row_start = row * stride;
        pixels.extend_from_slice(&data[row_start..row_start + w * 3]);
    }
    pixels
}

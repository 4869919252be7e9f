//! Fixture movies synthesized with ffmpeg-next for tests.

use std::f32::consts::TAU;
use std::path::Path;

use crate::shared::media_asset::MediaAsset;
use crate::video::domain::source_reader::SourceReader;
use crate::video::infrastructure::ffmpeg_source_reader::FfmpegSourceReader;

const AUDIO_SAMPLE_RATE: i32 = 44_100;
const TONE_HZ: f32 = 440.0;

/// Shape of a fixture movie. MPEG-4 video with one keyframe per second,
/// optionally with a mono AAC sine tone of the same length.
#[derive(Clone, Debug)]
pub struct TestVideo {
    pub frames: usize,
    pub fps: i32,
    pub width: u32,
    pub height: u32,
    pub audio: bool,
    pub video: bool,
    /// First frame of a second, unrelated shot. Frames are static before
    /// and after it.
    pub scene_cut: Option<usize>,
    /// Timestamp of the first frame, in frames.
    pub start_offset: usize,
}

impl TestVideo {
    pub fn new(frames: usize, fps: i32) -> Self {
        Self {
            frames,
            fps,
            width: 64,
            height: 48,
            audio: false,
            video: true,
            scene_cut: None,
            start_offset: 0,
        }
    }

    /// A tone of `frames / fps` seconds and no video stream.
    pub fn audio_only(frames: usize, fps: i32) -> Self {
        Self {
            video: false,
            audio: true,
            ..Self::new(frames, fps)
        }
    }

    pub fn with_scene_cut(mut self, frame: usize) -> Self {
        self.scene_cut = Some(frame);
        self
    }

    pub fn with_start_offset(mut self, frames: usize) -> Self {
        self.start_offset = frames;
        self
    }

    pub fn with_audio(mut self) -> Self {
        self.audio = true;
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    fn duration_seconds(&self) -> f64 {
        self.frames as f64 / self.fps as f64
    }

    /// Gray level of pixel `(x, y)` in frame `i`.
    fn pixel(&self, i: usize, x: usize, y: usize) -> u8 {
        match self.scene_cut {
            None => ((i * 40) % 256) as u8,
            Some(cut) if i < cut => (x * 255 / self.width as usize) as u8,
            Some(_) => {
                if (x / 8 + y / 8) % 2 == 0 {
                    255
                } else {
                    0
                }
            }
        }
    }
}

pub fn create_test_video(path: &Path, fixture: &TestVideo) {
    ffmpeg_next::init().unwrap();

    let mut octx = ffmpeg_next::format::output(path).unwrap();
    let global_header = octx
        .format()
        .flags()
        .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

    let mut video = fixture.video.then(|| {
        let codec = ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::MPEG4).unwrap();
        let mut video_ost = octx.add_stream(Some(codec)).unwrap();
        let video_index = video_ost.index();

        let mut encoder_ctx = ffmpeg_next::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()
            .unwrap();
        encoder_ctx.set_width(fixture.width);
        encoder_ctx.set_height(fixture.height);
        encoder_ctx.set_format(ffmpeg_next::format::Pixel::YUV420P);
        encoder_ctx.set_time_base(ffmpeg_next::Rational(1, fixture.fps));
        encoder_ctx.set_frame_rate(Some(ffmpeg_next::Rational(fixture.fps, 1)));
        encoder_ctx.set_gop(fixture.fps as u32);
        encoder_ctx.set_max_b_frames(0);
        if global_header {
            encoder_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }
        let video_encoder = encoder_ctx
            .open_with(ffmpeg_next::Dictionary::new())
            .unwrap();
        video_ost.set_parameters(&video_encoder);
        video_ost.set_time_base(ffmpeg_next::Rational(1, fixture.fps));
        (video_index, video_encoder)
    });

    let mut audio = if fixture.audio {
        let aac = ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::AAC).unwrap();
        let mut audio_ost = octx.add_stream(Some(aac)).unwrap();
        let mut audio_ctx = ffmpeg_next::codec::context::Context::new_with_codec(aac)
            .encoder()
            .audio()
            .unwrap();
        audio_ctx.set_rate(AUDIO_SAMPLE_RATE);
        audio_ctx.set_channel_layout(ffmpeg_next::ChannelLayout::MONO);
        audio_ctx.set_format(ffmpeg_next::format::Sample::F32(
            ffmpeg_next::format::sample::Type::Planar,
        ));
        audio_ctx.set_time_base(ffmpeg_next::Rational(1, AUDIO_SAMPLE_RATE));
        if global_header {
            audio_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }
        let audio_encoder = audio_ctx.open_as(aac).unwrap();
        audio_ost.set_parameters(&audio_encoder);
        Some((audio_ost.index(), audio_encoder))
    } else {
        None
    };

    octx.write_header().unwrap();

    if let Some((video_index, video_encoder)) = video.as_mut() {
        write_frames(video_encoder, &mut octx, *video_index, fixture);
    }

    if let Some((audio_index, encoder)) = audio.as_mut() {
        write_tone(encoder, &mut octx, *audio_index, fixture.duration_seconds());
    }

    octx.write_trailer().unwrap();
}

/// Encodes the fixture's frames into the video stream.
fn write_frames(
    encoder: &mut ffmpeg_next::codec::encoder::video::Encoder,
    octx: &mut ffmpeg_next::format::context::Output,
    stream_index: usize,
    fixture: &TestVideo,
) {
    let encoder_tb = ffmpeg_next::Rational(1, fixture.fps);
    let stream_tb = octx.stream(stream_index).unwrap().time_base();
    let mut scaler = ffmpeg_next::software::scaling::Context::get(
        ffmpeg_next::format::Pixel::RGB24,
        fixture.width,
        fixture.height,
        ffmpeg_next::format::Pixel::YUV420P,
        fixture.width,
        fixture.height,
        ffmpeg_next::software::scaling::Flags::BILINEAR,
    )
    .unwrap();

    for i in 0..fixture.frames {
        let mut rgb = ffmpeg_next::util::frame::video::Video::new(
            ffmpeg_next::format::Pixel::RGB24,
            fixture.width,
            fixture.height,
        );
        let stride = rgb.stride(0);
        let data = rgb.data_mut(0);
        for y in 0..fixture.height as usize {
            for x in 0..fixture.width as usize {
                let start = y * stride + x * 3;
                data[start..start + 3].fill(fixture.pixel(i, x, y));
            }
        }

        let mut yuv = ffmpeg_next::util::frame::video::Video::empty();
        scaler.run(&rgb, &mut yuv).unwrap();
        yuv.set_pts(Some((i + fixture.start_offset) as i64));
        encoder.send_frame(&yuv).unwrap();
        drain(encoder, octx, stream_index, encoder_tb, stream_tb);
    }
    encoder.send_eof().unwrap();
    drain(encoder, octx, stream_index, encoder_tb, stream_tb);
}

/// Encodes a sine tone of `seconds` into the audio stream.
fn write_tone(
    encoder: &mut ffmpeg_next::codec::encoder::audio::Encoder,
    octx: &mut ffmpeg_next::format::context::Output,
    stream_index: usize,
    seconds: f64,
) {
    let total = (seconds * AUDIO_SAMPLE_RATE as f64).round() as usize;
    let frame_size = match encoder.frame_size() as usize {
        0 => 1024,
        n => n,
    };
    let encoder_tb = encoder.time_base();
    let stream_tb = octx.stream(stream_index).unwrap().time_base();

    let samples: Vec<f32> = (0..total)
        .map(|n| 0.3 * (TAU * TONE_HZ * n as f32 / AUDIO_SAMPLE_RATE as f32).sin())
        .collect();

    let mut pts = 0i64;
    for chunk in samples.chunks(frame_size) {
        let mut frame = ffmpeg_next::util::frame::audio::Audio::new(
            ffmpeg_next::format::Sample::F32(ffmpeg_next::format::sample::Type::Planar),
            chunk.len(),
            ffmpeg_next::ChannelLayout::MONO,
        );
        frame.set_rate(AUDIO_SAMPLE_RATE as u32);
        frame.set_pts(Some(pts));
        frame.plane_mut::<f32>(0)[..chunk.len()].copy_from_slice(chunk);

        encoder.send_frame(&frame).unwrap();
        drain(encoder, octx, stream_index, encoder_tb, stream_tb);
        pts += chunk.len() as i64;
    }
    encoder.send_eof().unwrap();
    drain(encoder, octx, stream_index, encoder_tb, stream_tb);
}

fn drain(
    encoder: &mut ffmpeg_next::encoder::Encoder,
    octx: &mut ffmpeg_next::format::context::Output,
    stream_index: usize,
    from: ffmpeg_next::Rational,
    to: ffmpeg_next::Rational,
) {
    let mut packet = ffmpeg_next::Packet::empty();
    while encoder.receive_packet(&mut packet).is_ok() {
        packet.set_stream(stream_index);
        packet.rescale_ts(from, to);
        packet.write_interleaved(octx).unwrap();
    }
}

/// Opens `path` with the production reader.
pub fn probe(path: &Path) -> MediaAsset {
    let mut reader = FfmpegSourceReader::new();
    let asset = reader.open(path).unwrap();
    reader.close();
    asset
}

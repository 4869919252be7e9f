use std::path::Path;
use std::thread::JoinHandle;

use crossbeam_channel::Sender;

use crate::shared::frame::{PixelFormat, VideoFrame};
use crate::video::domain::frame_encoder::FrameEncoder;
use crate::video::domain::video_settings::{VideoCodec, VideoSettings};

type SendError = Box<dyn std::error::Error + Send + Sync>;

/// Bits per pixel per frame for encoders without a rate-factor mode.
const MPEG4_BITS_PER_PIXEL: f64 = 0.2;

/// Scene-change threshold no real frame reaches.
const MPEG4_SCENE_CUT_OFF: &str = "1000000000";

/// Encodes frames on a dedicated thread via ffmpeg-next.
///
/// `append` places the frame on a bounded queue; the encoder thread
/// converts it to YUV420P, encodes it and muxes the packets. Readiness is
/// reported while the queue has room, so the caller's frame loop is paced
/// by the encoder.
pub struct FfmpegFrameEncoder {
    capacity: usize,
    frame_tx: Option<Sender<VideoFrame>>,
    handle: Option<JoinHandle<Result<(), SendError>>>,
}

impl FfmpegFrameEncoder {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            frame_tx: None,
            handle: None,
        }
    }

    fn join(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let handle = self
            .handle
            .take()
            .ok_or("FfmpegFrameEncoder: not opened")?;
        match handle.join() {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(e.to_string().into()),
            Err(_) => Err("encoder thread panicked".into()),
        }
    }
}

impl Default for FfmpegFrameEncoder {
    fn default() -> Self {
        Self::new(crate::shared::constants::ENCODER_QUEUE_CAPACITY)
    }
}

impl FrameEncoder for FfmpegFrameEncoder {
    fn open(
        &mut self,
        path: &Path,
        settings: &VideoSettings,
    ) -> Result<(), Box<dyn std::error::Error>> {
        if self.handle.is_some() {
            return Err("FfmpegFrameEncoder: already opened".into());
        }

        let (ready_tx, ready_rx) = crossbeam_channel::bounded::<Result<(), String>>(1);
        let (frame_tx, frame_rx) = crossbeam_channel::bounded::<VideoFrame>(self.capacity);
        let path = path.to_path_buf();
        let settings = settings.clone();

        let handle = std::thread::Builder::new()
            .name("frame-encoder".to_string())
            .spawn(move || -> Result<(), SendError> {
                let mut state = match EncoderState::open(&path, &settings) {
                    Ok(state) => {
                        let _ = ready_tx.send(Ok(()));
                        state
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e.to_string()));
                        return Err(e);
                    }
                };
                for frame in frame_rx.iter() {
                    state.encode(&frame)?;
                }
                state.finish()
            })?;

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(reason)) => {
                let _ = handle.join();
                return Err(reason.into());
            }
            Err(_) => {
                let _ = handle.join();
                return Err("encoder thread exited during setup".into());
            }
        }

        self.frame_tx = Some(frame_tx);
        self.handle = Some(handle);
        Ok(())
    }

    fn is_ready_for_more_data(&self) -> bool {
        // A dead encoder thread reports ready so the next append surfaces
        // its error instead of the caller polling forever.
        let stopped = self.handle.as_ref().map_or(true, |h| h.is_finished());
        stopped || self.frame_tx.as_ref().map_or(true, |tx| !tx.is_full())
    }

    fn append(&mut self, frame: VideoFrame) -> Result<(), Box<dyn std::error::Error>> {
        let tx = self
            .frame_tx
            .as_ref()
            .ok_or("FfmpegFrameEncoder: not opened")?;
        if tx.send(frame).is_err() {
            self.frame_tx = None;
            return Err(self
                .join()
                .err()
                .unwrap_or_else(|| "encoder stopped accepting frames".into()));
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        // Closing the queue ends the encoder thread's receive loop.
        self.frame_tx = None;
        self.join()
    }
}

impl Drop for FfmpegFrameEncoder {
    fn drop(&mut self) {
        self.frame_tx = None;
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// ffmpeg state owned by the encoder thread.
struct EncoderState {
    octx: ffmpeg_next::format::context::Output,
    encoder: ffmpeg_next::codec::encoder::video::Encoder,
    scaler: Option<(PixelFormat, ffmpeg_next::software::scaling::Context)>,
    width: u32,
    height: u32,
    timescale: i32,
    stream_time_base: ffmpeg_next::Rational,
    keyframe_ticks: i64,
    next_keyframe: i64,
}

impl EncoderState {
    fn open(path: &Path, settings: &VideoSettings) -> Result<Self, SendError> {
        ffmpeg_next::init()?;

        let mut octx = ffmpeg_next::format::output(path)?;

        let global_header = octx
            .format()
            .flags()
            .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

        let (codec, rate_factor) = find_codec(settings.codec)?;
        let mut ost = octx.add_stream(Some(codec))?;

        let mut encoder_ctx = ffmpeg_next::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()?;

        encoder_ctx.set_width(settings.width);
        encoder_ctx.set_height(settings.height);
        encoder_ctx.set_format(ffmpeg_next::format::Pixel::YUV420P);
        encoder_ctx.set_time_base(ffmpeg_next::Rational(1, settings.timescale));
        encoder_ctx.set_frame_rate(Some(ffmpeg_next::Rational(
            (settings.fps * 1000.0).round() as i32,
            1000,
        )));
        encoder_ctx.set_gop(settings.gop_size);
        // No B-frames: packet order equals presentation order, which keeps
        // later stream-copy cuts simple.
        encoder_ctx.set_max_b_frames(0);

        if global_header {
            encoder_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }

        // Keyframes come only from the forced ones in `encode`, so a trim
        // point on an interval boundary always lands on a keyframe.
        let mut options = ffmpeg_next::Dictionary::new();
        options.set("keyint_min", &settings.gop_size.to_string());
        if rate_factor {
            options.set("crf", &settings.crf.to_string());
            options.set("preset", "medium");
            options.set("forced-idr", "1");
            options.set("x264-params", "scenecut=0");
        } else {
            options.set("sc_threshold", MPEG4_SCENE_CUT_OFF);
            let pixels = settings.width as f64 * settings.height as f64;
            let bit_rate = pixels * settings.fps * MPEG4_BITS_PER_PIXEL;
            encoder_ctx.set_bit_rate(bit_rate.round() as usize);
        }

        let encoder = encoder_ctx.open_with(options)?;
        ost.set_parameters(&encoder);

        octx.write_header()?;
        let stream_time_base = octx
            .stream(0)
            .ok_or("output stream missing after header")?
            .time_base();

        log::debug!(
            "Encoder opened: {} {}x{}, time base 1/{}, gop {}",
            codec.name(),
            settings.width,
            settings.height,
            settings.timescale,
            settings.gop_size
        );

        Ok(Self {
            octx,
            encoder,
            scaler: None,
            width: settings.width,
            height: settings.height,
            timescale: settings.timescale,
            stream_time_base,
            keyframe_ticks: settings.keyframe_interval_ticks(),
            next_keyframe: 0,
        })
    }

    fn encode(&mut self, frame: &VideoFrame) -> Result<(), SendError> {
        if frame.width() != self.width || frame.height() != self.height {
            return Err(format!(
                "frame is {}x{}, encoder expects {}x{}",
                frame.width(),
                frame.height(),
                self.width,
                self.height
            )
            .into());
        }

        let pixel = ffmpeg_pixel(frame.format());
        let mut packed = ffmpeg_next::util::frame::video::Video::new(pixel, self.width, self.height);
        let row_bytes = self.width as usize * frame.channels() as usize;
        let stride = packed.stride(0);
        let dst = packed.data_mut(0);
        for (row, src) in frame.data().chunks_exact(row_bytes).enumerate() {
            let start = row * stride;
            dst[start..start + row_bytes].copy_from_slice(src);
        }

        let scaler = self.scaler_for(frame.format())?;
        let mut yuv_frame = ffmpeg_next::util::frame::video::Video::empty();
        scaler.run(&packed, &mut yuv_frame)?;

        let pts = frame.presentation_time().rescale(self.timescale).value();
        yuv_frame.set_pts(Some(pts));
        if pts >= self.next_keyframe {
            yuv_frame.set_kind(ffmpeg_next::picture::Type::I);
            self.next_keyframe = (pts.div_euclid(self.keyframe_ticks) + 1) * self.keyframe_ticks;
        }

        self.encoder.send_frame(&yuv_frame)?;
        self.drain()
    }

    fn scaler_for(
        &mut self,
        format: PixelFormat,
    ) -> Result<&mut ffmpeg_next::software::scaling::Context, SendError> {
        let stale = self.scaler.as_ref().map_or(true, |(f, _)| *f != format);
        if stale {
            let context = ffmpeg_next::software::scaling::Context::get(
                ffmpeg_pixel(format),
                self.width,
                self.height,
                ffmpeg_next::format::Pixel::YUV420P,
                self.width,
                self.height,
                ffmpeg_next::software::scaling::Flags::BILINEAR,
            )?;
            self.scaler = Some((format, context));
        }
        match self.scaler.as_mut() {
            Some((_, context)) => Ok(context),
            None => Err("scaler unavailable".into()),
        }
    }

    fn drain(&mut self) -> Result<(), SendError> {
        let mut encoded = ffmpeg_next::Packet::empty();
        while self.encoder.receive_packet(&mut encoded).is_ok() {
            encoded.set_stream(0);
            encoded.rescale_ts(
                ffmpeg_next::Rational(1, self.timescale),
                self.stream_time_base,
            );
            encoded.write_interleaved(&mut self.octx)?;
        }
        Ok(())
    }

    fn finish(mut self) -> Result<(), SendError> {
        self.encoder.send_eof()?;
        self.drain()?;
        self.octx.write_trailer()?;
        Ok(())
    }
}

/// Returns the encoder and whether it understands `crf`.
fn find_codec(codec: VideoCodec) -> Result<(ffmpeg_next::Codec, bool), SendError> {
    if codec == VideoCodec::H264 {
        if let Some(found) = ffmpeg_next::encoder::find_by_name("libx264") {
            return Ok((found, true));
        }
        log::warn!("libx264 is not available, encoding MPEG-4 part 2 instead");
    }
    let found = ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::MPEG4)
        .ok_or("MPEG4 encoder not found")?;
    Ok((found, false))
}

fn ffmpeg_pixel(format: PixelFormat) -> ffmpeg_next::format::Pixel {
    match format {
        PixelFormat::Rgb24 => ffmpeg_next::format::Pixel::RGB24,
        PixelFormat::Rgba8 => ffmpeg_next::format::Pixel::RGBA,
    }
}

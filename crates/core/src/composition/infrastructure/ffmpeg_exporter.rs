use std::path::{Path, PathBuf};

use crate::composition::domain::composition::{Composition, CompositionTrack, TrackKind};
use crate::composition::domain::exporter::Exporter;
use crate::shared::media_time::{MediaTime, TimeRange};
use crate::video::infrastructure::ffmpeg_time;

/// Exports a composition by stream copy via ffmpeg-next (libavformat).
///
/// No stream is re-encoded. The output starts at the first video keyframe
/// at or after the range start so it decodes cleanly; audio is cut to the
/// same origin so both tracks stay in sync. The container is inferred from
/// the output extension (`.mp4`, `.mov`, ...).
pub struct FfmpegExporter;

impl FfmpegExporter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FfmpegExporter {
    fn default() -> Self {
        Self::new()
    }
}

/// A composition track bound to its opened input and output stream.
struct MappedTrack<'a> {
    track: &'a CompositionTrack,
    input: usize,
    in_time_base: ffmpeg_next::Rational,
    out_index: usize,
}

impl Exporter for FfmpegExporter {
    fn export(
        &self,
        composition: &Composition,
        range: TimeRange,
        output: &Path,
        on_progress: &mut dyn FnMut(f32),
    ) -> Result<(), Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let video = composition
            .video_track()
            .ok_or("composition has no video track")?;
        let origin = first_keyframe_in_range(video, range)?;
        if origin > range.start {
            log::warn!(
                "Export starts at keyframe {origin}, after requested start {}",
                range.start
            );
        }
        let kept = TimeRange::new(origin, range.end)
            .ok_or("no video keyframe inside the export range")?;

        let sources: Vec<PathBuf> = composition
            .sources()
            .into_iter()
            .map(Path::to_path_buf)
            .collect();
        let mut inputs = Vec::with_capacity(sources.len());
        for source in &sources {
            inputs.push(ffmpeg_next::format::input(source)?);
        }

        let mut octx = ffmpeg_next::format::output(output)?;

        let mut mapped: Vec<MappedTrack> = Vec::new();
        let ordered = composition
            .video_track()
            .into_iter()
            .chain(composition.audio_track());
        for track in ordered {
            let input = sources
                .iter()
                .position(|s| s == &track.source)
                .ok_or("composition source was not opened")?;
            let stream = inputs[input].stream(track.stream_index).ok_or_else(|| {
                format!(
                    "{} has no stream {}",
                    track.source.display(),
                    track.stream_index
                )
            })?;

            let mut ost =
                octx.add_stream(ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::None))?;
            ost.set_parameters(stream.parameters());
            // Let the muxer pick a tag valid for the target container.
            unsafe {
                (*ost.parameters().as_mut_ptr()).codec_tag = 0;
            }
            mapped.push(MappedTrack {
                track,
                input,
                in_time_base: stream.time_base(),
                out_index: ost.index(),
            });
        }

        octx.write_header()?;

        let origins: Vec<MediaTime> = inputs.iter().map(ffmpeg_time::input_origin).collect();
        let mut heads = Vec::with_capacity(inputs.len());
        for (input_index, ictx) in inputs.iter_mut().enumerate() {
            heads.push(next_kept(ictx, input_index, origins[input_index], &mapped, kept));
        }

        // Inputs are merged by decode time so the muxer never has to buffer
        // one track while another is drained.
        while let Some(next) = earliest(&heads) {
            let Some(staged) = heads[next].take() else {
                break;
            };
            heads[next] = next_kept(&mut inputs[next], next, origins[next], &mapped, kept);

            let mapping = &mapped[staged.mapping];
            let mut packet = staged.packet;
            let out_time_base = octx
                .stream(mapping.out_index)
                .ok_or("output stream vanished")?
                .time_base();
            let shift = |t: i64| {
                let source_time =
                    ffmpeg_time::to_media_time(t, mapping.in_time_base) - origins[next];
                ffmpeg_time::to_ticks(mapping.track.to_timeline(source_time) - origin, out_time_base)
            };

            packet.set_pts(packet.pts().map(&shift));
            packet.set_dts(packet.dts().map(&shift));
            let duration = ffmpeg_time::to_media_time(packet.duration(), mapping.in_time_base);
            packet.set_duration(ffmpeg_time::to_ticks(duration, out_time_base));
            packet.set_position(-1);
            packet.set_stream(mapping.out_index);
            packet.write_interleaved(&mut octx)?;

            if mapping.track.kind == TrackKind::Video {
                on_progress(kept.progress_at(staged.timeline));
            }
        }
        on_progress(1.0);

        octx.write_trailer()?;
        Ok(())
    }
}

/// A packet read ahead from one input, waiting to be muxed.
struct StagedPacket {
    mapping: usize,
    packet: ffmpeg_next::Packet,
    timeline: MediaTime,
    decode_time: MediaTime,
}

/// Reads `ictx` up to its next packet that belongs to a mapped track and
/// falls inside `kept`.
fn next_kept(
    ictx: &mut ffmpeg_next::format::context::Input,
    input_index: usize,
    input_origin: MediaTime,
    mapped: &[MappedTrack],
    kept: TimeRange,
) -> Option<StagedPacket> {
    for (stream, packet) in ictx.packets() {
        let Some(mapping) = mapped
            .iter()
            .position(|m| m.input == input_index && m.track.stream_index == stream.index())
        else {
            continue;
        };
        let track = &mapped[mapping];
        let Some(ticks) = packet.pts().or(packet.dts()) else {
            continue;
        };

        let source_time = ffmpeg_time::to_media_time(ticks, track.in_time_base) - input_origin;
        if !track.track.source_range.contains(source_time) {
            continue;
        }
        let timeline = track.track.to_timeline(source_time);
        if !kept.contains(timeline) {
            continue;
        }

        let decode_ticks = packet.dts().unwrap_or(ticks);
        let decode_time = track.track.to_timeline(
            ffmpeg_time::to_media_time(decode_ticks, track.in_time_base) - input_origin,
        );
        return Some(StagedPacket {
            mapping,
            packet,
            timeline,
            decode_time,
        });
    }
    None
}

/// Index of the staged packet that decodes first.
fn earliest(heads: &[Option<StagedPacket>]) -> Option<usize> {
    heads
        .iter()
        .enumerate()
        .filter_map(|(i, head)| head.as_ref().map(|staged| (i, staged.decode_time)))
        .min_by_key(|(_, time)| *time)
        .map(|(i, _)| i)
}

/// Timeline position of the first video keyframe inside `range`.
fn first_keyframe_in_range(
    video: &CompositionTrack,
    range: TimeRange,
) -> Result<MediaTime, Box<dyn std::error::Error>> {
    let mut ictx = ffmpeg_next::format::input(&video.source)?;
    let input_origin = ffmpeg_time::input_origin(&ictx);
    let time_base = ictx
        .stream(video.stream_index)
        .ok_or("video stream not found")?
        .time_base();

    for (stream, packet) in ictx.packets() {
        if stream.index() != video.stream_index || !packet.is_key() {
            continue;
        }
        let Some(ticks) = packet.pts().or(packet.dts()) else {
            continue;
        };
        let source_time = ffmpeg_time::to_media_time(ticks, time_base) - input_origin;
        if !video.source_range.contains(source_time) {
            continue;
        }
        let timeline = video.to_timeline(source_time);
        if timeline >= range.end {
            break;
        }
        if timeline >= range.start {
            return Ok(timeline);
        }
    }

    Err(format!("no video keyframe inside export range {range}").into())
}

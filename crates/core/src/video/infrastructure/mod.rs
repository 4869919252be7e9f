pub mod ffmpeg_frame_encoder;
pub mod ffmpeg_source_reader;
pub mod ffmpeg_time;

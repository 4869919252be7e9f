pub mod ffmpeg_exporter;

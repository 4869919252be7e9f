use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand};

use moviemaker_core::composition::domain::trim_policy::TrimPolicy;
use moviemaker_core::pipeline::compose_movie_use_case::ExportJob;
use moviemaker_core::pipeline::job_config::JobConfig;
use moviemaker_core::pipeline::job_worker::{self, JobRequest};
use moviemaker_core::video::domain::source_reader::SourceReader;
use moviemaker_core::video::domain::video_settings::VideoCodec;
use moviemaker_core::video::infrastructure::ffmpeg_source_reader::FfmpegSourceReader;

/// Burns a title overlay into movies and trims them.
#[derive(Parser)]
#[command(name = "moviemaker")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Overlay a title on every frame, drop the first and last second and
    /// keep the original audio.
    Compose(ComposeArgs),
    /// Cut a range out of a movie without re-encoding.
    Trim(TrimArgs),
    /// Print duration, size and tracks of a movie.
    Probe {
        /// Input video file.
        input: PathBuf,
    },
}

#[derive(Args)]
struct ComposeArgs {
    /// Input video file.
    input: PathBuf,

    /// Final movie (.mov or .mp4).
    #[arg(long)]
    output: Option<PathBuf>,

    /// Re-encoded video-only file written before the final export.
    #[arg(long)]
    intermediate: Option<PathBuf>,

    /// Keep the intermediate file after a successful export.
    #[arg(long)]
    keep_intermediate: bool,

    /// Overlay text.
    #[arg(long)]
    text: Option<String>,

    /// TrueType/OpenType font for the text.
    #[arg(long)]
    font: Option<PathBuf>,

    /// Glyph height in pixels.
    #[arg(long)]
    font_size: Option<f32>,

    /// Image drawn instead of the text (scaled to the frame).
    #[arg(long)]
    overlay_image: Option<PathBuf>,

    /// Export the whole movie.
    #[arg(long, conflicts_with_all = ["head", "tail"])]
    no_trim: bool,

    /// Seconds cut from the start.
    #[arg(long)]
    head: Option<f64>,

    /// Seconds cut from the end.
    #[arg(long)]
    tail: Option<f64>,

    /// Video codec: h264 or mpeg4.
    #[arg(long)]
    codec: Option<VideoCodec>,

    /// H.264 CRF quality (0=lossless, 51=worst, default 18).
    #[arg(long)]
    crf: Option<u32>,

    /// JSON job config; flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args)]
struct TrimArgs {
    /// Input video file.
    input: PathBuf,

    /// Output file (.mov or .mp4).
    output: PathBuf,

    /// Start of the kept range in seconds (default: 0).
    #[arg(long)]
    start: Option<f64>,

    /// End of the kept range in seconds (default: end of the movie).
    #[arg(long)]
    end: Option<f64>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Compose(args) => run_compose(args),
        Command::Trim(args) => run_trim(args),
        Command::Probe { input } => run_probe(&input),
    }
}

fn run_compose(args: ComposeArgs) -> Result<(), Box<dyn std::error::Error>> {
    require_input(&args.input)?;
    let config = build_config(&args)?;
    log::info!("Writing {}", config.output_path.display());

    let events = job_worker::spawn(JobRequest::Compose(ExportJob::new(&args.input, config)));
    let output = job_worker::wait(&events, &mut |p| report_progress("Composing", p))?;
    eprintln!();
    log::info!("Output written to {}", output.display());
    Ok(())
}

fn run_trim(args: TrimArgs) -> Result<(), Box<dyn std::error::Error>> {
    require_input(&args.input)?;
    let events = job_worker::spawn(JobRequest::Trim {
        input: args.input,
        output: args.output,
        start_seconds: args.start,
        end_seconds: args.end,
        config: JobConfig::load_or_default(),
    });
    let output = job_worker::wait(&events, &mut |p| report_progress("Trimming", p))?;
    eprintln!();
    log::info!("Output written to {}", output.display());
    Ok(())
}

fn run_probe(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    require_input(input)?;
    let mut reader = FfmpegSourceReader::new();
    let asset = reader.open(input)?;
    reader.close();

    println!("duration: {:.3}s", asset.duration_seconds());
    if let Some(video) = &asset.tracks.video {
        let (width, height) = video.natural_size();
        println!("size: {width}x{height}");
        println!(
            "video: {} @ {:.2} fps, {} frames",
            video.codec, video.fps, video.total_frames
        );
    }
    match &asset.tracks.audio {
        Some(audio) => println!(
            "audio: {} {} Hz, {} channel(s)",
            audio.codec, audio.sample_rate, audio.channels
        ),
        None => println!("audio: none"),
    }
    Ok(())
}

/// Config file (or the user config, or defaults) with flags applied on top.
fn build_config(args: &ComposeArgs) -> Result<JobConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => JobConfig::load(path)?,
        None => JobConfig::load_or_default(),
    };

    if let Some(output) = &args.output {
        config.output_path = output.clone();
    }
    if let Some(intermediate) = &args.intermediate {
        config.intermediate_path = intermediate.clone();
    }
    if args.keep_intermediate {
        config.keep_intermediate = true;
    }
    if let Some(text) = &args.text {
        config.overlay.text = text.clone();
    }
    if let Some(font) = &args.font {
        config.overlay.font_path = Some(font.clone());
    }
    if let Some(size) = args.font_size {
        config.overlay.font_size = size;
    }
    if let Some(image) = &args.overlay_image {
        config.overlay.image_path = Some(image.clone());
    }
    if args.no_trim {
        config.trim = None;
    } else if args.head.is_some() || args.tail.is_some() {
        let base = config.trim.unwrap_or_default();
        config.trim = Some(TrimPolicy::new(
            args.head.unwrap_or(base.head_seconds),
            args.tail.unwrap_or(base.tail_seconds),
        ));
    }
    if let Some(codec) = args.codec {
        config.video.codec = codec;
    }
    if let Some(crf) = args.crf {
        if crf > 51 {
            return Err(format!("CRF must be between 0 and 51, got {crf}").into());
        }
        config.video.crf = crf;
    }

    config.validate()?;
    Ok(config)
}

fn require_input(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if !input.exists() {
        return Err(format!("Input file not found: {}", input.display()).into());
    }
    Ok(())
}

fn report_progress(label: &str, fraction: f32) {
    eprint!("\r{label}... {:.0}%", fraction * 100.0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use moviemaker_core::shared::constants::DEFAULT_TRIM_SECONDS;

    fn compose_args(extra: &[&str]) -> ComposeArgs {
        let mut argv = vec!["moviemaker", "compose", "in.mp4"];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Command::Compose(args) => args,
            _ => panic!("expected compose"),
        }
    }

    #[test]
    fn test_flags_override_config() {
        let args = compose_args(&[
            "--output",
            "/tmp/out.mp4",
            "--text",
            "Holiday",
            "--codec",
            "mpeg4",
            "--head",
            "0.5",
        ]);
        let config = build_config(&args).unwrap();
        assert_eq!(config.output_path, PathBuf::from("/tmp/out.mp4"));
        assert_eq!(config.overlay.text, "Holiday");
        assert_eq!(config.video.codec, VideoCodec::Mpeg4);
        let trim = config.trim.unwrap();
        assert_eq!(trim.head_seconds, 0.5);
        assert_eq!(trim.tail_seconds, DEFAULT_TRIM_SECONDS);
    }

    #[test]
    fn test_no_trim_disables_trimming() {
        let config = build_config(&compose_args(&["--no-trim"])).unwrap();
        assert!(config.trim.is_none());
    }

    #[test]
    fn test_no_trim_conflicts_with_head() {
        let argv = ["moviemaker", "compose", "in.mp4", "--no-trim", "--head", "1"];
        assert!(Cli::try_parse_from(argv).is_err());
    }

    #[test]
    fn test_crf_out_of_range_is_rejected() {
        assert!(build_config(&compose_args(&["--crf", "60"])).is_err());
    }

    #[test]
    fn test_negative_head_is_rejected() {
        assert!(build_config(&compose_args(&["--head=-1"])).is_err());
    }

    #[test]
    fn test_unknown_codec_fails_to_parse() {
        let argv = ["moviemaker", "compose", "in.mp4", "--codec", "vp9"];
        assert!(Cli::try_parse_from(argv).is_err());
    }

    #[test]
    fn test_trim_bounds_are_optional() {
        let cli = Cli::parse_from(["moviemaker", "trim", "in.mp4", "out.mov", "--end", "4"]);
        match cli.command {
            Command::Trim(args) => {
                assert_eq!(args.start, None);
                assert_eq!(args.end, Some(4.0));
            }
            _ => panic!("expected trim"),
        }
    }
}

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{Receiver, Sender};

use crate::compositing::infrastructure::alpha_over_compositor::AlphaOverCompositor;
use crate::composition::infrastructure::ffmpeg_exporter::FfmpegExporter;
use crate::overlay::infrastructure::render_context::RenderContext;
use crate::overlay::infrastructure::renderer_factory;
use crate::shared::error::ExportError;
use crate::video::infrastructure::ffmpeg_frame_encoder::FfmpegFrameEncoder;
use crate::video::infrastructure::ffmpeg_source_reader::FfmpegSourceReader;

use super::compose_movie_use_case::{ComposeMovieUseCase, ExportJob};
use super::infrastructure::sequential_pipeline_executor::SequentialPipelineExecutor;
use super::job_config::JobConfig;
use super::output_locks::OutputLocks;
use super::pipeline_logger::LogPipelineLogger;
use super::trim_movie_use_case::TrimMovieUseCase;

const WORKER_THREAD_NAME: &str = "export-job";

/// Messages sent from the worker thread to whoever started the job.
#[derive(Debug, Clone, PartialEq)]
pub enum JobEvent {
    Progress(f32),
    Completed(PathBuf),
    Failed(String),
}

/// Work a background job can run.
#[derive(Debug, Clone)]
pub enum JobRequest {
    Compose(ExportJob),
    Trim {
        input: PathBuf,
        output: PathBuf,
        start_seconds: Option<f64>,
        end_seconds: Option<f64>,
        config: JobConfig,
    },
}

/// Spawns one worker thread for the job. Events arrive on the returned
/// receiver; the last one is always `Completed` or `Failed`.
pub fn spawn(request: JobRequest) -> Receiver<JobEvent> {
    spawn_with_locks(request, OutputLocks::global())
}

pub fn spawn_with_locks(request: JobRequest, locks: OutputLocks) -> Receiver<JobEvent> {
    let (tx, rx) = crossbeam_channel::unbounded::<JobEvent>();
    let fail_tx = tx.clone();

    let spawned = thread::Builder::new()
        .name(WORKER_THREAD_NAME.to_string())
        .spawn(move || {
            let event = match run_job(&tx, request, locks) {
                Ok(path) => JobEvent::Completed(path),
                Err(e) => {
                    log::error!("Job failed: {e}");
                    JobEvent::Failed(e.to_string())
                }
            };
            let _ = tx.send(event);
        });
    if let Err(e) = spawned {
        let _ = fail_tx.send(JobEvent::Failed(format!("cannot start worker thread: {e}")));
    }

    rx
}

/// Blocks until the job ends, forwarding progress. Returns the output
/// path on completion and the error text on failure.
pub fn wait(
    events: &Receiver<JobEvent>,
    on_progress: &mut dyn FnMut(f32),
) -> Result<PathBuf, String> {
    for event in events.iter() {
        match event {
            JobEvent::Progress(p) => on_progress(p),
            JobEvent::Completed(path) => return Ok(path),
            JobEvent::Failed(reason) => return Err(reason),
        }
    }
    Err("worker exited without reporting a result".to_string())
}

fn run_job(
    tx: &Sender<JobEvent>,
    request: JobRequest,
    locks: OutputLocks,
) -> Result<PathBuf, ExportError> {
    let mut on_progress = |p: f32| {
        let _ = tx.send(JobEvent::Progress(p));
    };

    match request {
        JobRequest::Compose(job) => {
            let renderer = renderer_factory::create_renderer(&job.config.overlay)
                .map_err(|e| ExportError::OverlayFailure(e.to_string()))?;
            let render_context = RenderContext::spawn(renderer)
                .map_err(|e| ExportError::OverlayFailure(e.to_string()))?;

            let mut use_case = ComposeMovieUseCase::new(
                Box::new(FfmpegSourceReader::new()),
                Box::new(FfmpegFrameEncoder::new(job.config.encoder_queue_capacity)),
                Box::new(AlphaOverCompositor::new()),
                Box::new(FfmpegExporter::new()),
                Arc::new(render_context),
                Box::new(SequentialPipelineExecutor::new()),
                Box::new(LogPipelineLogger::default()),
                locks,
            );
            use_case.execute(&job, &mut on_progress)
        }
        JobRequest::Trim {
            input,
            output,
            start_seconds,
            end_seconds,
            config,
        } => {
            let mut use_case = TrimMovieUseCase::new(
                Box::new(FfmpegSourceReader::new()),
                Box::new(FfmpegExporter::new()),
                locks,
            );
            use_case.execute(
                &input,
                &output,
                start_seconds,
                end_seconds,
                &config,
                &mut on_progress,
            )
        }
    }
}

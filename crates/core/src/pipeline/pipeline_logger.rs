use std::collections::BTreeMap;
use std::time::Instant;

/// Stage names used by the frame loop.
pub mod stage {
    pub const DECODE: &str = "decode";
    pub const COMPOSITE: &str = "composite";
    pub const ENCODE: &str = "encode";
}

/// Metric names used by the frame loop.
pub mod metric {
    pub const WRITER_WAIT_MS: &str = "writer_wait_ms";
    pub const COMPOSITE_FAILURES: &str = "composite_failures";
}

/// Observer for frame-loop events.
///
/// Keeps the use cases free of output concerns: the CLI logs a summary,
/// tests and embedding callers stay silent.
pub trait PipelineLogger: Send {
    /// Frames written so far out of the expected total (0 when unknown).
    fn progress(&mut self, current: usize, total: usize);

    /// How long one stage took for one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// A sampled value such as the time spent waiting for the encoder.
    fn metric(&mut self, name: &str, value: f64);

    fn info(&mut self, message: &str);

    /// End-of-job report. Default: nothing.
    fn summary(&self) {}
}

pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Accumulates samples in memory and reports through the `log` facade.
///
/// Progress lines are emitted every `every_percent` percent so long movies
/// do not flood the log.
pub struct LogPipelineLogger {
    every_percent: usize,
    last_reported: Option<usize>,
    timings: BTreeMap<String, Vec<f64>>,
    metrics: BTreeMap<String, Vec<f64>>,
    started: Instant,
    frames: usize,
}

impl LogPipelineLogger {
    pub fn new(every_percent: usize) -> Self {
        Self {
            every_percent: every_percent.clamp(1, 100),
            last_reported: None,
            timings: BTreeMap::new(),
            metrics: BTreeMap::new(),
            started: Instant::now(),
            frames: 0,
        }
    }

    /// Formatted report, or `None` before anything was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_ms = self.started.elapsed().as_secs_f64() * 1000.0;
        let mut lines = vec![format!(
            "Frame loop summary ({} frames, {:.1}s):",
            self.frames,
            elapsed_ms / 1000.0
        )];

        for (stage, samples) in &self.timings {
            let total_ms: f64 = samples.iter().sum();
            let avg_ms = mean(samples);
            let share = if elapsed_ms > 0.0 {
                total_ms / elapsed_ms * 100.0
            } else {
                0.0
            };
            lines.push(format!(
                "  {stage:10}: avg {avg_ms:6.2}ms  total {total_ms:7.0}ms  ({share:4.1}%)"
            ));
        }

        for (name, samples) in &self.metrics {
            let total: f64 = samples.iter().sum();
            lines.push(format!("  {name}: avg {:.1}, total {total:.0}", mean(samples)));
        }

        if self.frames > 0 && elapsed_ms > 0.0 {
            let fps = self.frames as f64 / (elapsed_ms / 1000.0);
            lines.push(format!("  Throughput: {fps:.1} fps"));
        }

        Some(lines.join("\n"))
    }

    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(Vec::as_slice)
    }

    pub fn metrics_for(&self, name: &str) -> Option<&[f64]> {
        self.metrics.get(name).map(Vec::as_slice)
    }
}

impl Default for LogPipelineLogger {
    fn default() -> Self {
        Self::new(10)
    }
}

impl PipelineLogger for LogPipelineLogger {
    fn progress(&mut self, current: usize, total: usize) {
        self.frames = current;
        if total == 0 {
            return;
        }
        let percent = (current * 100 / total).min(100);
        let bucket = percent / self.every_percent;
        if self.last_reported != Some(bucket) {
            self.last_reported = Some(bucket);
            log::info!("Encoding: {current}/{total} frames ({percent}%)");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics.entry(name.to_string()).or_default().push(value);
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n{text}");
        }
    }
}

fn mean(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        0.0
    } else {
        samples.iter().sum::<f64>() / samples.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_null_logger_accepts_everything() {
        let mut logger = NullPipelineLogger;
        logger.progress(1, 10);
        logger.timing(stage::DECODE, 5.0);
        logger.metric(metric::WRITER_WAIT_MS, 3.0);
        logger.info("hello");
        logger.summary();
    }

    #[test]
    fn test_timings_are_recorded_per_stage() {
        let mut logger = LogPipelineLogger::default();
        logger.timing(stage::DECODE, 2.0);
        logger.timing(stage::DECODE, 4.0);
        logger.timing(stage::ENCODE, 1.0);

        assert_eq!(logger.timings_for(stage::DECODE).unwrap(), &[2.0, 4.0]);
        assert_eq!(logger.timings_for(stage::ENCODE).unwrap(), &[1.0]);
        assert!(logger.timings_for(stage::COMPOSITE).is_none());
    }

    #[test]
    fn test_summary_lists_stages_and_metrics() {
        let mut logger = LogPipelineLogger::default();
        logger.progress(30, 30);
        logger.timing(stage::COMPOSITE, 1.5);
        logger.metric(metric::WRITER_WAIT_MS, 16.0);
        logger.metric(metric::WRITER_WAIT_MS, 0.0);
        logger.metric(metric::COMPOSITE_FAILURES, 2.0);

        let summary = logger.summary_string().unwrap();
        assert!(summary.contains("30 frames"));
        assert!(summary.contains("composite"));
        assert!(summary.contains("writer_wait_ms: avg 8.0, total 16"));
        assert!(summary.contains("composite_failures: avg 2.0, total 2"));
        assert!(summary.contains("fps"));
    }

    #[test]
    fn test_empty_summary_is_none() {
        assert!(LogPipelineLogger::default().summary_string().is_none());
    }

    #[test]
    fn test_progress_reports_once_per_bucket() {
        let mut logger = LogPipelineLogger::new(25);
        let mut buckets = Vec::new();
        for i in 1..=100 {
            logger.progress(i, 100);
            if buckets.last() != logger.last_reported.as_ref() {
                buckets.push(logger.last_reported.unwrap());
            }
        }
        assert_eq!(buckets, vec![0, 1, 2, 3, 4]);
        assert_eq!(logger.frames, 100);
    }

    #[test]
    fn test_progress_with_unknown_total() {
        let mut logger = LogPipelineLogger::default();
        logger.progress(5, 0);
        assert_eq!(logger.frames, 5);
        assert!(logger.last_reported.is_none());
    }

    #[test]
    fn test_mean() {
        assert_relative_eq!(mean(&[1.0, 2.0, 3.0]), 2.0);
        assert_relative_eq!(mean(&[]), 0.0);
    }
}

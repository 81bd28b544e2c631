//! Running a compiled graph through ffmpeg.
//!
//! [`FfmpegEncoder::submit`] spawns ffmpeg and returns a [`JobHandle`]
//! immediately. Progress is published on a watch channel and the job ends
//! in exactly one [`JobOutcome`]. A cancelled or failed job never leaves
//! its output file behind.

use crate::error::{RenderError, Result};
use crate::graph::{RenderGraph, AUDIO_SAMPLE_RATE, OUTPUT_FPS};
use reelcut_core::project::ExportSettings;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, Command};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Stderr lines kept for the failure reason.
const STDERR_TAIL: usize = 5;

/// Progress update during encoding.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EncodeProgress {
    pub processed_seconds: f64,
    pub percent: f64,
    pub frame: u64,
    pub fps: f64,
    pub speed: String,
    pub eta_seconds: Option<f64>,
}

/// How an encode job ended.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Completed,
    Failed(String),
    Cancelled,
}

impl JobOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, JobOutcome::Completed)
    }
}

/// A running encode job.
#[derive(Debug)]
pub struct JobHandle {
    id: Uuid,
    output: PathBuf,
    cancel: CancellationToken,
    progress: watch::Receiver<EncodeProgress>,
    task: JoinHandle<JobOutcome>,
}

impl JobHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Ask the job to stop. The outcome will be [`JobOutcome::Cancelled`]
    /// unless it already finished.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// A token that cancels this job, e.g. for a Ctrl-C handler.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn progress(&self) -> watch::Receiver<EncodeProgress> {
        self.progress.clone()
    }

    /// Wait for the job to end.
    pub async fn wait(self) -> JobOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) => JobOutcome::Failed(format!("encode task aborted: {e}")),
        }
    }
}

/// Something that can execute render graphs.
pub trait RenderService: Send + Sync {
    /// Start rendering `graph` into `output`.
    fn submit(&self, graph: &RenderGraph, output: &Path) -> Result<JobHandle>;

    fn cancel(&self, handle: &JobHandle) {
        handle.cancel();
    }

    /// Check if this service can run on this system.
    fn is_available(&self) -> bool;

    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// ffmpeg
// ---------------------------------------------------------------------------

/// Build ffmpeg args for rendering `graph` into `output`.
pub fn build_ffmpeg_args(graph: &RenderGraph, output: &Path, settings: &ExportSettings) -> Vec<String> {
    let mut args = vec!["-y".to_string(), "-hide_banner".to_string()];

    for input in &graph.inputs {
        args.push("-i".to_string());
        args.push(input.path.to_string_lossy().to_string());
    }

    args.push("-filter_complex".to_string());
    args.push(graph.filter_complex());

    args.extend([
        "-map".to_string(),
        format!("[{}]", graph.output_video_label),
        "-map".to_string(),
        format!("[{}]", graph.output_audio_label),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-preset".to_string(),
        settings.preset.clone(),
        "-crf".to_string(),
        settings.crf.to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-r".to_string(),
        OUTPUT_FPS.to_string(),
        "-c:a".to_string(),
        "aac".to_string(),
        "-b:a".to_string(),
        settings.audio_bitrate.clone(),
        "-ar".to_string(),
        AUDIO_SAMPLE_RATE.to_string(),
        "-movflags".to_string(),
        "+faststart".to_string(),
    ]);

    args.push(output.to_string_lossy().to_string());

    args
}

#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    program: PathBuf,
    settings: ExportSettings,
}

impl FfmpegEncoder {
    pub fn new(settings: ExportSettings) -> Self {
        Self {
            program: PathBuf::from("ffmpeg"),
            settings,
        }
    }

    /// Use a specific ffmpeg binary instead of the one on `PATH`.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }
}

impl RenderService for FfmpegEncoder {
    /// Spawn ffmpeg. Must be called from within a Tokio runtime.
    fn submit(&self, graph: &RenderGraph, output: &Path) -> Result<JobHandle> {
        let args = build_ffmpeg_args(graph, output, &self.settings);

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    RenderError::FfmpegNotFound
                } else {
                    RenderError::Io(e)
                }
            })?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| RenderError::FfmpegFailed("stderr was not captured".to_string()))?;

        let id = Uuid::new_v4();
        let (progress_tx, progress_rx) = watch::channel(EncodeProgress::default());
        let cancel = CancellationToken::new();

        tracing::info!(
            job = %id,
            output = %output.display(),
            inputs = graph.inputs.len(),
            total_duration = graph.total_duration,
            "starting encode"
        );

        let task = tokio::spawn(run_job(
            id,
            child,
            stderr,
            progress_tx,
            cancel.clone(),
            output.to_path_buf(),
            graph.total_duration,
        ));

        Ok(JobHandle {
            id,
            output: output.to_path_buf(),
            cancel,
            progress: progress_rx,
            task,
        })
    }

    fn is_available(&self) -> bool {
        std::process::Command::new(&self.program)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}

async fn run_job(
    id: Uuid,
    mut child: Child,
    stderr: ChildStderr,
    progress_tx: watch::Sender<EncodeProgress>,
    cancel: CancellationToken,
    output: PathBuf,
    total_secs: f64,
) -> JobOutcome {
    // ffmpeg terminates its stats lines with '\r', so split on that and
    // then on newlines.
    let mut reader = BufReader::new(stderr);
    let mut chunk = Vec::new();
    let mut tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL);

    let outcome = loop {
        chunk.clear();
        tokio::select! {
            _ = cancel.cancelled() => {
                if let Err(e) = child.kill().await {
                    tracing::warn!(job = %id, error = %e, "failed to kill ffmpeg");
                }
                break JobOutcome::Cancelled;
            }
            read = reader.read_until(b'\r', &mut chunk) => match read {
                Ok(0) => {
                    break match child.wait().await {
                        Ok(status) if status.success() => JobOutcome::Completed,
                        Ok(status) => JobOutcome::Failed(failure_reason(status, &tail)),
                        Err(e) => JobOutcome::Failed(e.to_string()),
                    };
                }
                Ok(_) => {
                    for line in String::from_utf8_lossy(&chunk).lines() {
                        if let Some(progress) = parse_progress(line, total_secs) {
                            let _ = progress_tx.send(progress);
                        } else if !line.trim().is_empty() {
                            if tail.len() == STDERR_TAIL {
                                tail.pop_front();
                            }
                            tail.push_back(line.trim().to_string());
                        }
                    }
                }
                Err(e) => break JobOutcome::Failed(format!("reading ffmpeg output: {e}")),
            },
        }
    };

    match &outcome {
        JobOutcome::Completed => {
            progress_tx.send_modify(|p| {
                p.processed_seconds = total_secs;
                p.percent = 100.0;
                p.eta_seconds = Some(0.0);
            });
            tracing::info!(job = %id, output = %output.display(), "encode finished");
        }
        JobOutcome::Failed(reason) => {
            tracing::warn!(job = %id, %reason, "encode failed");
            remove_partial_output(&output).await;
        }
        JobOutcome::Cancelled => {
            tracing::info!(job = %id, "encode cancelled");
            remove_partial_output(&output).await;
        }
    }

    outcome
}

fn failure_reason(status: ExitStatus, tail: &VecDeque<String>) -> String {
    if tail.is_empty() {
        format!("ffmpeg exited with {status}")
    } else {
        let lines: Vec<&str> = tail.iter().map(String::as_str).collect();
        format!("ffmpeg exited with {status}: {}", lines.join("; "))
    }
}

async fn remove_partial_output(output: &Path) {
    match tokio::fs::remove_file(output).await {
        Ok(()) => tracing::debug!(output = %output.display(), "removed partial output"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(output = %output.display(), error = %e, "failed to remove partial output")
        }
    }
}

// ---------------------------------------------------------------------------
// Progress parsing
// ---------------------------------------------------------------------------

/// Parse an ffmpeg stderr progress line.
///
/// Example line: `frame=  123 fps= 60 ... time=00:01:02.05 speed=1.50x`
pub fn parse_progress(line: &str, total_secs: f64) -> Option<EncodeProgress> {
    if !line.contains("time=") {
        return None;
    }

    let frame = extract_value(line, "frame=")
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0);

    let fps = extract_value(line, "fps=")
        .and_then(|v| v.parse::<f64>().ok())
        .unwrap_or(0.0);

    let speed = extract_value(line, "speed=").unwrap_or_default();

    let processed_seconds = extract_value(line, "time=")
        .and_then(|v| parse_time_str(&v))
        .unwrap_or(0.0);

    let percent = if total_secs > 0.0 {
        (processed_seconds / total_secs * 100.0).min(100.0)
    } else {
        0.0
    };

    let speed_factor = speed.trim_end_matches('x').parse::<f64>().unwrap_or(0.0);

    let eta_seconds = if speed_factor > 0.0 && total_secs > processed_seconds {
        Some((total_secs - processed_seconds) / speed_factor)
    } else {
        None
    };

    Some(EncodeProgress {
        processed_seconds,
        percent,
        frame,
        fps,
        speed,
        eta_seconds,
    })
}

/// Extract a value from an ffmpeg key=value progress line.
fn extract_value(line: &str, key: &str) -> Option<String> {
    let start = line.find(key)? + key.len();
    let trimmed = line[start..].trim_start();
    let end = trimmed
        .find(|c: char| c.is_whitespace())
        .unwrap_or(trimmed.len());
    let val = &trimmed[..end];
    if val.is_empty() {
        None
    } else {
        Some(val.to_string())
    }
}

/// Parse an ffmpeg time string like "00:01:02.05" into seconds.
/// ffmpeg prints "N/A" before the first frame is muxed.
fn parse_time_str(s: &str) -> Option<f64> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 3 {
        return None;
    }
    let hours: f64 = parts[0].parse().ok()?;
    let mins: f64 = parts[1].parse().ok()?;
    let secs: f64 = parts[2].parse().ok()?;
    Some(hours * 3600.0 + mins * 60.0 + secs)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

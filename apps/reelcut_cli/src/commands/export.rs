//! Render the timeline to a video file.

use std::io::Write;
use std::path::{Path, PathBuf};

use reelcut_core::geometry::format_timecode;
use reelcut_core::project::ensure_extension;
use reelcut_render::encode::{FfmpegEncoder, JobOutcome, RenderService};
use reelcut_render::graph::compile_project;

use super::{export_settings, load_project};
use crate::ExportArgs;

pub async fn run(path: PathBuf, output: Option<PathBuf>, args: ExportArgs) -> anyhow::Result<()> {
    let project = load_project(&path)?;
    let settings = export_settings(&project, &args);
    let graph = compile_project(&project, &settings)?;

    let output_path = output.unwrap_or_else(|| ensure_extension(&path).with_extension("mp4"));

    let encoder = FfmpegEncoder::new(settings.clone());
    ensure_available(&encoder).await?;

    println!("Exporting '{}'", project.name);
    println!("  Output: {}", output_path.display());
    println!(
        "  Canvas: {} ({}), crf {}, preset {}",
        graph.canvas, settings.resolution, settings.crf, settings.preset
    );
    println!("  Duration: {}", format_timecode(graph.total_duration));

    let handle = encoder.submit(&graph, &output_path)?;

    let token = handle.cancellation_token();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, cancelling export");
            token.cancel();
        }
    });

    let mut progress = handle.progress();
    let printer = tokio::spawn(async move {
        while progress.changed().await.is_ok() {
            let p = progress.borrow_and_update().clone();
            let eta = p
                .eta_seconds
                .map(|s| format!("{s:.0}s"))
                .unwrap_or_else(|| "-".to_string());
            print!(
                "\r  Progress: {:5.1}% ({} frames, {} fps, {}, ETA: {eta})  ",
                p.percent, p.frame, p.fps, p.speed
            );
            let _ = std::io::stdout().flush();
        }
    });

    let outcome = handle.wait().await;
    ctrl_c.abort();
    let _ = printer.await;
    println!();

    finish(outcome, &output_path)
}

/// `ffmpeg -version` blocks, so it runs on the blocking pool.
async fn ensure_available(encoder: &FfmpegEncoder) -> anyhow::Result<()> {
    let probe = encoder.clone();
    let available = tokio::task::spawn_blocking(move || probe.is_available()).await?;
    if !available {
        anyhow::bail!("{} not found on PATH", encoder.name());
    }
    Ok(())
}

/// Map the job outcome to the command result. Only a completed job succeeds.
fn finish(outcome: JobOutcome, output_path: &Path) -> anyhow::Result<()> {
    match outcome {
        JobOutcome::Completed => {
            println!("Export complete: {}", output_path.display());
            Ok(())
        }
        JobOutcome::Cancelled => anyhow::bail!("Export cancelled; no output written"),
        JobOutcome::Failed(reason) => anyhow::bail!("Export failed: {reason}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelcut_core::project::ExportSettings;

    #[test]
    fn only_completed_export_succeeds() {
        let out = Path::new("/tmp/out.mp4");
        assert!(finish(JobOutcome::Completed, out).is_ok());

        let cancelled = finish(JobOutcome::Cancelled, out).unwrap_err();
        assert!(cancelled.to_string().contains("cancelled"));

        let failed = finish(JobOutcome::Failed("exit status 1".to_string()), out).unwrap_err();
        assert!(failed.to_string().contains("exit status 1"));
    }

    #[tokio::test]
    async fn missing_encoder_is_reported() {
        let encoder = FfmpegEncoder::new(ExportSettings::default())
            .with_program("/nonexistent/reelcut-ffmpeg");
        let err = ensure_available(&encoder).await.unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}

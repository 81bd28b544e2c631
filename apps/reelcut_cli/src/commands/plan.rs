//! Print the compiled render graph without running ffmpeg.

use std::path::PathBuf;

use reelcut_core::geometry::format_timecode;
use reelcut_render::graph::compile_project;

use super::{export_settings, load_project, short_id};
use crate::ExportArgs;

pub fn run(path: PathBuf, json: bool, args: ExportArgs) -> anyhow::Result<()> {
    let project = load_project(&path)?;
    let settings = export_settings(&project, &args);
    let graph = compile_project(&project, &settings)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&graph)?);
        return Ok(());
    }

    println!(
        "Canvas {} ({}), {} segment(s), {}",
        graph.canvas,
        settings.resolution,
        graph.segments.len(),
        format_timecode(graph.total_duration)
    );

    println!("Inputs:");
    for input in &graph.inputs {
        println!("  [{}] {}", input.index, input.path.display());
    }

    println!("Segments:");
    for (i, segment) in graph.segments.iter().enumerate() {
        println!(
            "  {i}: clip {} from input {} ({:.2}s-{:.2}s, {:.2}s)",
            short_id(segment.clip_id),
            segment.input,
            segment.source_start,
            segment.source_end,
            segment.duration()
        );
        for overlay in &segment.overlays {
            println!(
                "     + overlay {} from input {} (delay {:.2}s, pad after {:.2}s)",
                short_id(overlay.clip_id),
                overlay.input,
                overlay.delay,
                overlay.pad_after
            );
        }
    }

    println!("Filter graph:");
    for op in &graph.operations {
        println!("  {op};");
    }

    Ok(())
}

//! Show project information.

use std::path::PathBuf;

use reelcut_core::geometry::format_timecode;
use reelcut_core::types::TrackId;

use super::{load_project, short_id};

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    let project = load_project(&path)?;
    let timeline = &project.timeline;

    println!("Project: {}", project.name);
    println!("  ID: {}", project.id);
    println!();

    println!("Media ({}):", project.media.len());
    for m in &project.media {
        println!(
            "  {}  {}  {:.2}s  {}x{}",
            short_id(m.id),
            m.name,
            m.duration,
            m.width,
            m.height
        );
    }
    println!();

    println!(
        "Timeline: {} clip(s), ends at {}, playhead {}",
        timeline.clips.len(),
        format_timecode(timeline.timeline_end()),
        format_timecode(timeline.playhead)
    );
    for (track, label) in [(TrackId::BASE, "base"), (TrackId::OVERLAY, "overlay")] {
        let clips = timeline.track_clips(track);
        println!("  {track} ({label}): {} clip(s)", clips.len());
        for c in clips {
            let media = project
                .media_by_id(c.media_id)
                .map(|m| m.name.as_str())
                .unwrap_or("<missing media>");
            println!(
                "    {}  {} - {}  src {:.2}s-{:.2}s  {}",
                short_id(c.id),
                format_timecode(c.start_time),
                format_timecode(c.end_time),
                c.trim_start,
                c.trim_end,
                media
            );
        }
        for (a, b) in timeline.overlapping_pairs(track) {
            println!("    ! {} overlaps {}", short_id(a), short_id(b));
        }
    }
    println!();

    println!("Export:");
    println!("  Resolution: {}", project.export.resolution);
    println!(
        "  Video: libx264 crf {} preset {}",
        project.export.crf, project.export.preset
    );
    println!("  Audio: aac {}", project.export.audio_bitrate);
    println!("  Overlay margin: {}px", project.export.overlay_margin);

    Ok(())
}

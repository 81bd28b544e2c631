//! Timeline edits. Each command loads the project, applies one edit through
//! a `TimelineStore` and saves only if the edit was committed.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use reelcut_core::geometry::format_timecode;
use reelcut_core::store::TimelineStore;
use reelcut_core::types::{MediaItem, MediaLibrary, TrackId};
use uuid::Uuid;

use super::{load_project, resolve_id, save_project, short_id};

/// Outcome message of an edit; `None` when the edit was rejected.
type Edit = anyhow::Result<Option<String>>;

fn with_store<F>(path: &Path, edit: F) -> anyhow::Result<()>
where
    F: FnOnce(&[MediaItem], &mut TimelineStore) -> Edit,
{
    let mut project = load_project(path)?;
    let timeline = std::mem::take(&mut project.timeline);
    let mut store = TimelineStore::new(timeline);

    let dirty = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&dirty);
    store.on_commit(move |clips| {
        tracing::debug!(clips = clips.len(), "timeline committed");
        flag.store(true, Ordering::Relaxed);
    });

    let message = edit(&project.media, &mut store)?;
    project.timeline = store.into_timeline();

    match message {
        Some(message) if dirty.load(Ordering::Relaxed) => {
            save_project(&project, path)?;
            println!("{message}");
        }
        _ => println!("No change: the edit was outside what the timeline allows"),
    }
    Ok(())
}

fn track(number: u32) -> anyhow::Result<TrackId> {
    match TrackId(number) {
        t @ (TrackId::BASE | TrackId::OVERLAY) => Ok(t),
        _ => anyhow::bail!("track must be 1 (base) or 2 (overlay), got {number}"),
    }
}

fn clip_id(store: &TimelineStore, query: &str) -> anyhow::Result<Uuid> {
    resolve_id("clip", query, store.timeline().clips.iter().map(|c| c.id))
}

pub fn add(path: PathBuf, media: String, track_number: u32, at: Option<f64>) -> anyhow::Result<()> {
    let track_id = track(track_number)?;
    with_store(&path, |library, store| {
        let media_id = resolve_id("media", &media, library.iter().map(|m| m.id))?;
        let Some(item) = library.media_by_id(media_id) else {
            anyhow::bail!("media {media} is not in the library");
        };
        let id = match at {
            Some(start) => store.add_clip(item, track_id, start)?,
            None => store.append_clip(item, track_id)?,
        };
        let clip = store
            .timeline()
            .find_clip(id)
            .ok_or_else(|| anyhow::anyhow!("clip vanished after insert"))?;
        Ok(Some(format!(
            "Added clip {} on {} at {} ({})",
            short_id(id),
            track_id,
            format_timecode(clip.start_time),
            item.name
        )))
    })
}

pub fn trim(path: PathBuf, clip: String, start: Option<f64>, end: Option<f64>) -> anyhow::Result<()> {
    if start.is_none() && end.is_none() {
        anyhow::bail!("pass --start and/or --end");
    }
    with_store(&path, |library, store| {
        let id = clip_id(store, &clip)?;
        let media_duration = store
            .timeline()
            .find_clip(id)
            .and_then(|c| library.media_by_id(c.media_id))
            .map(|m| m.duration);

        let mut changed = false;
        if let Some(start) = start {
            changed |= store.ripple_trim_start(id, start, media_duration);
        }
        if let Some(end) = end {
            changed |= store.ripple_trim_end(id, end, media_duration);
        }
        if !changed {
            return Ok(None);
        }

        let c = store
            .timeline()
            .find_clip(id)
            .ok_or_else(|| anyhow::anyhow!("clip vanished after trim"))?;
        Ok(Some(format!(
            "Trimmed clip {}: source {:.2}s-{:.2}s, timeline {} - {}",
            short_id(id),
            c.trim_start,
            c.trim_end,
            format_timecode(c.start_time),
            format_timecode(c.end_time)
        )))
    })
}

pub fn split(path: PathBuf, clip: String, at: f64) -> anyhow::Result<()> {
    with_store(&path, |_, store| {
        let id = clip_id(store, &clip)?;
        Ok(store.split_clip(id, at).map(|(left, right)| {
            format!(
                "Split clip {} at {} into {} and {}",
                short_id(id),
                format_timecode(at),
                short_id(left),
                short_id(right)
            )
        }))
    })
}

pub fn move_clip(path: PathBuf, clip: String, to: f64) -> anyhow::Result<()> {
    with_store(&path, |_, store| {
        let id = clip_id(store, &clip)?;
        if !store.move_clip(id, to) {
            return Ok(None);
        }
        let mut message = format!("Moved clip {} to {}", short_id(id), format_timecode(to.max(0.0)));
        if let Some(c) = store.timeline().find_clip(id) {
            let overlaps = store
                .timeline()
                .overlapping_pairs(c.track_id)
                .into_iter()
                .filter(|(a, b)| *a == id || *b == id)
                .count();
            if overlaps > 0 {
                message.push_str(&format!(" (overlaps {overlaps} clip(s) on {})", c.track_id));
            }
        }
        Ok(Some(message))
    })
}

pub fn remove(path: PathBuf, clip: String) -> anyhow::Result<()> {
    with_store(&path, |_, store| {
        let id = clip_id(store, &clip)?;
        Ok(store
            .remove_clip(id)
            .map(|c| format!("Removed clip {} from {}", short_id(c.id), c.track_id)))
    })
}

pub fn reflow(path: PathBuf, track_number: u32, from: Option<String>) -> anyhow::Result<()> {
    let track_id = track(track_number)?;
    with_store(&path, |_, store| {
        let from = from.as_deref().map(|q| clip_id(store, q)).transpose()?;
        if !store.reflow(track_id, from) {
            return Ok(None);
        }
        Ok(Some(format!(
            "Reflowed {}; timeline now ends at {}",
            track_id,
            format_timecode(store.timeline().timeline_end())
        )))
    })
}

//! Left/right edge trims.
//!
//! Trims are "simple": the opposite edge stays put and neighbours never
//! move. Recovering trimmed material is capped by the gap to the
//! neighbouring clip on the same track so a trim never creates an overlap.

use crate::geometry::{approx_eq, clamp, snap, MIN_CLIP_DURATION, UNKNOWN_MEDIA_DURATION};
use crate::timeline::Timeline;
use crate::types::*;
use uuid::Uuid;

/// The clip immediately before `clip` on its track, in placement order.
fn previous_on_track<'a>(clips: &'a [TimelineClip], clip: &TimelineClip) -> Option<&'a TimelineClip> {
    clips
        .iter()
        .filter(|c| c.track_id == clip.track_id && c.id != clip.id)
        .filter(|c| by_placement(c, clip).is_lt())
        .max_by(|a, b| by_placement(a, b))
}

/// The clip immediately after `clip` on its track, in placement order.
fn next_on_track<'a>(clips: &'a [TimelineClip], clip: &TimelineClip) -> Option<&'a TimelineClip> {
    clips
        .iter()
        .filter(|c| c.track_id == clip.track_id && c.id != clip.id)
        .filter(|c| by_placement(c, clip).is_gt())
        .min_by(|a, b| by_placement(a, b))
}

/// Compute the clip that a left-edge trim to `target_trim_start` would
/// produce, without touching the collection.
///
/// Returns `None` when the clip is missing or the trim changes nothing.
pub fn propose_trim_start(
    clips: &[TimelineClip],
    clip_id: Uuid,
    target_trim_start: f64,
    media_duration: Option<f64>,
) -> Option<TimelineClip> {
    let clip = clips.iter().find(|c| c.id == clip_id)?;
    let media_duration = media_duration.unwrap_or(UNKNOWN_MEDIA_DURATION);

    let upper = (clip.trim_end - MIN_CLIP_DURATION).min(media_duration - MIN_CLIP_DURATION);
    let mut trim_start = clamp(snap(target_trim_start), 0.0, upper);

    if trim_start < clip.trim_start {
        let previous_end = previous_on_track(clips, clip)
            .map(|p| p.end_time)
            .unwrap_or(0.0);
        let gap = (clip.start_time - previous_end).max(0.0);
        let recovered = (clip.trim_start - trim_start).min(gap);
        trim_start = clip.trim_start - recovered;
    }

    if approx_eq(trim_start, clip.trim_start) {
        return None;
    }

    let mut trimmed = clip.clone();
    trimmed.trim_start = trim_start;
    trimmed.start_time = clip.end_time - (clip.trim_end - trim_start);
    Some(trimmed)
}

/// Compute the clip that a right-edge trim to `target_trim_end` would
/// produce, without touching the collection.
///
/// Returns `None` when the clip is missing or the trim changes nothing.
pub fn propose_trim_end(
    clips: &[TimelineClip],
    clip_id: Uuid,
    target_trim_end: f64,
    media_duration: Option<f64>,
) -> Option<TimelineClip> {
    let clip = clips.iter().find(|c| c.id == clip_id)?;
    let media_duration = media_duration.unwrap_or(UNKNOWN_MEDIA_DURATION);

    let mut trim_end = clamp(
        snap(target_trim_end),
        clip.trim_start + MIN_CLIP_DURATION,
        media_duration,
    );

    if trim_end > clip.trim_end {
        if let Some(next) = next_on_track(clips, clip) {
            let gap = (next.start_time - clip.end_time).max(0.0);
            let extension = (trim_end - clip.trim_end).min(gap);
            trim_end = clip.trim_end + extension;
        }
    }

    if approx_eq(trim_end, clip.trim_end) {
        return None;
    }

    let mut trimmed = clip.clone();
    trimmed.trim_end = trim_end;
    trimmed.end_time = clip.start_time + (trim_end - clip.trim_start);
    Some(trimmed)
}

impl Timeline {
    /// Drag the left edge so the clip shows source from `target_trim_start`.
    /// The right edge stays fixed. Returns whether the clip changed.
    pub fn ripple_trim_start(
        &mut self,
        clip_id: Uuid,
        target_trim_start: f64,
        media_duration: Option<f64>,
    ) -> bool {
        match propose_trim_start(&self.clips, clip_id, target_trim_start, media_duration) {
            Some(clip) => {
                tracing::debug!(%clip_id, trim_start = clip.trim_start, start = clip.start_time, "trim start");
                self.replace_clip(clip)
            }
            None => {
                tracing::debug!(%clip_id, target_trim_start, "trim start rejected");
                false
            }
        }
    }

    /// Drag the right edge so the clip shows source up to `target_trim_end`.
    /// The left edge stays fixed. Returns whether the clip changed.
    pub fn ripple_trim_end(
        &mut self,
        clip_id: Uuid,
        target_trim_end: f64,
        media_duration: Option<f64>,
    ) -> bool {
        match propose_trim_end(&self.clips, clip_id, target_trim_end, media_duration) {
            Some(clip) => {
                tracing::debug!(%clip_id, trim_end = clip.trim_end, end = clip.end_time, "trim end");
                self.replace_clip(clip)
            }
            None => {
                tracing::debug!(%clip_id, target_trim_end, "trim end rejected");
                false
            }
        }
    }
}

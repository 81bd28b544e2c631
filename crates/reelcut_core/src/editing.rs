use crate::error::{CoreError, Result};
use crate::geometry::{approx_eq, EPSILON, MIN_CLIP_DURATION};
use crate::timeline::Timeline;
use crate::types::*;
use uuid::Uuid;

impl Timeline {
    /// Drop `media` onto `track_id` at `start_time`. The new clip shows the
    /// whole source. Returns the new clip's id.
    pub fn add_clip(&mut self, media: &MediaItem, track_id: TrackId, start_time: f64) -> Result<Uuid> {
        if !(media.duration >= MIN_CLIP_DURATION) {
            return Err(CoreError::InvalidOperation(format!(
                "media {} is shorter than the minimum clip duration",
                media.id
            )));
        }

        if !start_time.is_finite() {
            return Err(CoreError::InvalidOperation(format!(
                "clip start {start_time} is not a finite time"
            )));
        }

        let clip = TimelineClip::new(media.id, track_id, start_time.max(0.0), media.duration);
        let id = clip.id;
        tracing::debug!(clip_id = %id, media_id = %media.id, %track_id, start = clip.start_time, "add clip");
        self.clips.push(clip);
        Ok(id)
    }

    /// Append `media` after the last clip on `track_id`.
    pub fn append_clip(&mut self, media: &MediaItem, track_id: TrackId) -> Result<Uuid> {
        let start = self
            .clips
            .iter()
            .filter(|c| c.track_id == track_id)
            .map(|c| c.end_time)
            .fold(0.0, f64::max);
        self.add_clip(media, track_id, start)
    }

    /// Remove a clip by id. Returns the removed clip.
    pub fn remove_clip(&mut self, clip_id: Uuid) -> Option<TimelineClip> {
        let idx = self.clip_index(clip_id)?;
        let removed = self.clips.remove(idx);
        self.clamp_playhead();
        tracing::debug!(%clip_id, "remove clip");
        Some(removed)
    }

    /// Move a clip so it starts at `new_start` (clamped to ≥ 0), keeping
    /// its duration and trim window. Overlaps are permitted.
    pub fn move_clip(&mut self, clip_id: Uuid, new_start: f64) -> bool {
        let Some(clip) = self.find_clip(clip_id) else {
            return false;
        };
        if !new_start.is_finite() {
            tracing::debug!(%clip_id, new_start, "move rejected");
            return false;
        }
        let new_start = new_start.max(0.0);
        if approx_eq(new_start, clip.start_time) {
            return false;
        }

        let mut moved = clip.clone();
        let duration = moved.duration();
        moved.start_time = new_start;
        moved.end_time = new_start + duration;
        tracing::debug!(%clip_id, new_start, "move clip");
        self.replace_clip(moved)
    }

    /// Split a clip at timeline position `split_time` into two contiguous
    /// clips with fresh ids, replacing the original in place.
    ///
    /// The split point must lie strictly inside
    /// `(start + MIN_CLIP_DURATION, end - MIN_CLIP_DURATION)`; anything else
    /// is a no-op. Returns the `(left, right)` ids.
    pub fn split_clip(&mut self, clip_id: Uuid, split_time: f64) -> Option<(Uuid, Uuid)> {
        let idx = self.clip_index(clip_id)?;
        let clip = &self.clips[idx];

        // NaN must fail this check.
        let inside = split_time - clip.start_time >= MIN_CLIP_DURATION + EPSILON
            && clip.end_time - split_time >= MIN_CLIP_DURATION + EPSILON;
        if !inside || !split_time.is_finite() {
            tracing::debug!(%clip_id, split_time, "split rejected");
            return None;
        }

        let split_source = clip.trim_start + (split_time - clip.start_time);

        let left = TimelineClip {
            id: Uuid::new_v4(),
            media_id: clip.media_id,
            track_id: clip.track_id,
            start_time: clip.start_time,
            end_time: split_time,
            trim_start: clip.trim_start,
            trim_end: split_source,
        };
        let right = TimelineClip {
            id: Uuid::new_v4(),
            media_id: clip.media_id,
            track_id: clip.track_id,
            start_time: split_time,
            end_time: clip.end_time,
            trim_start: split_source,
            trim_end: clip.trim_end,
        };
        let ids = (left.id, right.id);

        self.clips[idx] = left;
        self.clips.insert(idx + 1, right);
        self.clamp_playhead();

        tracing::debug!(%clip_id, split_time, left = %ids.0, right = %ids.1, "split clip");
        Some(ids)
    }
}

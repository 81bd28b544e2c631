//! Read-only views over the timeline: end time, active clip lookup,
//! timeline/media coordinate mapping and playback advance.

use crate::geometry::clamp;
use crate::timeline::Timeline;
use crate::types::*;
use uuid::Uuid;

/// Result of advancing the playhead by one playback step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackStep {
    /// The playhead landed inside a clip.
    Playing(f64),
    /// The playhead skipped a gap and landed on the next clip's start.
    Jumped(f64),
    /// Nothing left to play; the playhead sits at the timeline end.
    Stopped(f64),
}

impl PlaybackStep {
    pub fn time(&self) -> f64 {
        match self {
            PlaybackStep::Playing(t) | PlaybackStep::Jumped(t) | PlaybackStep::Stopped(t) => *t,
        }
    }
}

impl TimelineClip {
    /// Source-media time shown at timeline `time`.
    pub fn media_time_at(&self, time: f64) -> f64 {
        clamp(
            self.trim_start + (time - self.start_time),
            self.trim_start,
            self.trim_end,
        )
    }

    /// Timeline time at which source `media_time` is shown.
    pub fn timeline_time_at(&self, media_time: f64) -> f64 {
        let media_time = clamp(media_time, self.trim_start, self.trim_end);
        self.start_time + (media_time - self.trim_start)
    }
}

impl Timeline {
    /// Latest `end_time` of any clip, or 0 for an empty timeline.
    pub fn timeline_end(&self) -> f64 {
        self.clips
            .iter()
            .map(|c| c.end_time)
            .fold(0.0, f64::max)
    }

    /// The clip playing on `track_id` at `time`.
    ///
    /// Overlapping clips resolve to the earliest `start_time`, then the
    /// lowest id.
    pub fn active_clip(&self, track_id: TrackId, time: f64) -> Option<&TimelineClip> {
        self.clips
            .iter()
            .filter(|c| c.track_id == track_id && c.contains(time))
            .min_by(|a, b| by_placement(a, b))
    }

    /// Earliest clip start at or after `time` on any track.
    pub fn next_clip_start(&self, time: f64) -> Option<f64> {
        self.clips
            .iter()
            .map(|c| c.start_time)
            .filter(|&s| s >= time)
            .min_by(|a, b| a.total_cmp(b))
    }

    fn any_clip_at(&self, time: f64) -> bool {
        self.clips.iter().any(|c| c.contains(time))
    }

    /// Advance the playhead by `dt` seconds, skipping gaps between clips.
    pub fn advance_playhead(&mut self, dt: f64) -> PlaybackStep {
        let end = self.timeline_end();
        let next = self.playhead + dt.max(0.0);

        let step = if next >= end {
            PlaybackStep::Stopped(end)
        } else if self.any_clip_at(next) {
            PlaybackStep::Playing(next)
        } else {
            match self.next_clip_start(next) {
                Some(start) => PlaybackStep::Jumped(start),
                None => PlaybackStep::Stopped(end),
            }
        };

        self.playhead = step.time();
        step
    }

    /// Move the playhead to match a decoder position reported for `clip_id`.
    /// Returns the new playhead, or `None` if the clip no longer exists.
    pub fn sync_playhead_from_media(&mut self, clip_id: Uuid, media_time: f64) -> Option<f64> {
        let time = self.find_clip(clip_id)?.timeline_time_at(media_time);
        self.set_playhead(time);
        Some(self.playhead)
    }

    /// Pairs of clips on `track_id` whose windows intersect, in placement order.
    pub fn overlapping_pairs(&self, track_id: TrackId) -> Vec<(Uuid, Uuid)> {
        let clips = self.track_clips(track_id);
        let mut pairs = Vec::new();
        for (i, a) in clips.iter().enumerate() {
            for b in &clips[i + 1..] {
                if b.start_time >= a.end_time {
                    break;
                }
                if a.overlaps(b) {
                    pairs.push((a.id, b.id));
                }
            }
        }
        pairs
    }
}

use crate::geometry::clamp;
use crate::types::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The committed clip collection plus the shared playhead.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Timeline {
    pub clips: Vec<TimelineClip>,
    #[serde(default)]
    pub playhead: f64,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clips(clips: Vec<TimelineClip>) -> Self {
        Self {
            clips,
            playhead: 0.0,
        }
    }

    pub fn find_clip(&self, clip_id: Uuid) -> Option<&TimelineClip> {
        self.clips.iter().find(|c| c.id == clip_id)
    }

    pub(crate) fn clip_index(&self, clip_id: Uuid) -> Option<usize> {
        self.clips.iter().position(|c| c.id == clip_id)
    }

    /// Clips on one track in placement order.
    pub fn track_clips(&self, track_id: TrackId) -> Vec<&TimelineClip> {
        let mut clips: Vec<&TimelineClip> = self
            .clips
            .iter()
            .filter(|c| c.track_id == track_id)
            .collect();
        clips.sort_by(|a, b| by_placement(a, b));
        clips
    }

    /// Move the playhead, clamped to `[0, timeline_end]`.
    pub fn set_playhead(&mut self, time: f64) {
        self.playhead = clamp(time, 0.0, self.timeline_end());
    }

    /// Pull the playhead back inside the timeline after an edit shortened it.
    pub fn clamp_playhead(&mut self) {
        let end = self.timeline_end();
        if self.playhead > end {
            self.playhead = end;
        }
        if self.playhead < 0.0 {
            self.playhead = 0.0;
        }
    }

    /// Swap in an updated clip with the same id and re-clamp the playhead.
    pub(crate) fn replace_clip(&mut self, clip: TimelineClip) -> bool {
        match self.clip_index(clip.id) {
            Some(idx) => {
                self.clips[idx] = clip;
                self.clamp_playhead();
                true
            }
            None => false,
        }
    }
}

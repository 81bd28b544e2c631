//! Drag gestures on a single clip.
//!
//! A session moves through `Idle -> Dragging -> Committed | Cancelled`.
//! While dragging it only holds a speculative preview of the clip; the
//! timeline is mutated once, on commit.

use crate::snapping::{snap_move_start, DEFAULT_SNAP_THRESHOLD};
use crate::timeline::Timeline;
use crate::trim::{propose_trim_end, propose_trim_start};
use crate::types::*;
use uuid::Uuid;

/// Which part of the clip is being dragged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragGesture {
    /// Left edge; the target is a source `trim_start`.
    TrimStart,
    /// Right edge; the target is a source `trim_end`.
    TrimEnd,
    /// Whole clip; the target is a timeline `start_time`.
    Move,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DragState {
    Idle,
    Dragging {
        clip_id: Uuid,
        gesture: DragGesture,
        media_duration: Option<f64>,
        /// Latest proposed value, already resolved against constraints.
        target: Option<f64>,
        preview: Option<TimelineClip>,
    },
    Committed {
        clip_id: Uuid,
        changed: bool,
    },
    Cancelled {
        clip_id: Uuid,
    },
}

#[derive(Debug, Clone)]
pub struct DragSession {
    state: DragState,
    snap_threshold: f64,
}

impl Default for DragSession {
    fn default() -> Self {
        Self::new()
    }
}

impl DragSession {
    pub fn new() -> Self {
        Self {
            state: DragState::Idle,
            snap_threshold: DEFAULT_SNAP_THRESHOLD,
        }
    }

    pub fn with_snap_threshold(mut self, threshold: f64) -> Self {
        self.snap_threshold = threshold.max(0.0);
        self
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// Start dragging `clip_id`. Fails (returns `false`) if a drag is already
    /// in progress or the clip does not exist.
    pub fn begin(
        &mut self,
        timeline: &Timeline,
        clip_id: Uuid,
        gesture: DragGesture,
        media_duration: Option<f64>,
    ) -> bool {
        if self.is_dragging() || timeline.find_clip(clip_id).is_none() {
            return false;
        }
        self.state = DragState::Dragging {
            clip_id,
            gesture,
            media_duration,
            target: None,
            preview: None,
        };
        true
    }

    /// Feed a pointer position. Returns the clip as it would look if the
    /// drag were committed now, or `None` if it would change nothing.
    pub fn update(&mut self, timeline: &Timeline, value: f64) -> Option<&TimelineClip> {
        let threshold = self.snap_threshold;
        let DragState::Dragging {
            clip_id,
            gesture,
            media_duration,
            target,
            preview,
        } = &mut self.state
        else {
            return None;
        };

        let proposed = match gesture {
            DragGesture::TrimStart => {
                propose_trim_start(&timeline.clips, *clip_id, value, *media_duration)
            }
            DragGesture::TrimEnd => {
                propose_trim_end(&timeline.clips, *clip_id, value, *media_duration)
            }
            DragGesture::Move => timeline.find_clip(*clip_id).and_then(|clip| {
                let start = snap_move_start(timeline, clip, value, threshold);
                if !start.is_finite() || crate::geometry::approx_eq(start, clip.start_time) {
                    return None;
                }
                let mut moved = clip.clone();
                moved.start_time = start;
                moved.end_time = start + clip.duration();
                Some(moved)
            }),
        };

        *target = proposed.as_ref().map(|clip| match gesture {
            DragGesture::TrimStart => clip.trim_start,
            DragGesture::TrimEnd => clip.trim_end,
            DragGesture::Move => clip.start_time,
        });
        *preview = proposed;
        preview.as_ref()
    }

    /// The current speculative clip, if dragging and the drag would change it.
    pub fn preview(&self) -> Option<&TimelineClip> {
        match &self.state {
            DragState::Dragging { preview, .. } => preview.as_ref(),
            _ => None,
        }
    }

    /// Apply the last proposed value to `timeline` in one step.
    /// Returns whether the timeline changed.
    pub fn commit(&mut self, timeline: &mut Timeline) -> bool {
        let DragState::Dragging {
            clip_id,
            gesture,
            media_duration,
            target,
            ..
        } = self.state.clone()
        else {
            return false;
        };

        // Re-run the edit against the committed model so a concurrent delete
        // or neighbour change is respected.
        let changed = match target {
            Some(value) => match gesture {
                DragGesture::TrimStart => timeline.ripple_trim_start(clip_id, value, media_duration),
                DragGesture::TrimEnd => timeline.ripple_trim_end(clip_id, value, media_duration),
                DragGesture::Move => timeline.move_clip(clip_id, value),
            },
            None => false,
        };

        self.state = DragState::Committed { clip_id, changed };
        changed
    }

    /// Abandon the drag; the timeline is untouched.
    pub fn cancel(&mut self) {
        if let DragState::Dragging { clip_id, .. } = self.state {
            self.state = DragState::Cancelled { clip_id };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip(id: u128, start: f64, end: f64, trim_start: f64) -> TimelineClip {
        TimelineClip {
            id: Uuid::from_u128(id),
            media_id: Uuid::from_u128(500),
            track_id: TrackId::BASE,
            start_time: start,
            end_time: end,
            trim_start,
            trim_end: trim_start + (end - start),
        }
    }

    #[test]
    fn preview_does_not_mutate_timeline() {
        let tl = Timeline::with_clips(vec![clip(1, 0.0, 10.0, 0.0)]);
        let before = tl.clone();
        let mut drag = DragSession::new();
        assert!(drag.begin(&tl, Uuid::from_u128(1), DragGesture::TrimEnd, Some(10.0)));

        let preview = drag.update(&tl, 6.0).cloned().unwrap();
        assert_eq!(preview.end_time, 6.0);
        assert_eq!(tl, before);
        assert_eq!(drag.preview(), Some(&preview));
    }

    #[test]
    fn commit_applies_last_preview() {
        let mut tl = Timeline::with_clips(vec![clip(1, 0.0, 10.0, 0.0)]);
        let mut drag = DragSession::new();
        drag.begin(&tl, Uuid::from_u128(1), DragGesture::TrimStart, Some(10.0));
        drag.update(&tl, 1.0);
        drag.update(&tl, 2.5);

        assert!(drag.commit(&mut tl));
        assert_eq!(tl.clips[0].trim_start, 2.5);
        assert_eq!(tl.clips[0].start_time, 2.5);
        assert_eq!(
            drag.state(),
            &DragState::Committed {
                clip_id: Uuid::from_u128(1),
                changed: true
            }
        );
    }

    #[test]
    fn cancel_leaves_timeline_untouched() {
        let mut tl = Timeline::with_clips(vec![clip(1, 0.0, 10.0, 0.0)]);
        let before = tl.clone();
        let mut drag = DragSession::new();
        drag.begin(&tl, Uuid::from_u128(1), DragGesture::TrimEnd, None);
        drag.update(&tl, 4.0);
        drag.cancel();

        assert!(!drag.commit(&mut tl));
        assert_eq!(tl, before);
        assert_eq!(
            drag.state(),
            &DragState::Cancelled {
                clip_id: Uuid::from_u128(1)
            }
        );
    }

    #[test]
    fn commit_without_update_changes_nothing() {
        let mut tl = Timeline::with_clips(vec![clip(1, 0.0, 10.0, 0.0)]);
        let mut drag = DragSession::new();
        drag.begin(&tl, Uuid::from_u128(1), DragGesture::Move, None);
        assert!(!drag.commit(&mut tl));
        assert_eq!(tl.clips[0].start_time, 0.0);
    }

    #[test]
    fn begin_rejects_missing_clip_and_double_begin() {
        let tl = Timeline::with_clips(vec![clip(1, 0.0, 10.0, 0.0)]);
        let mut drag = DragSession::new();
        assert!(!drag.begin(&tl, Uuid::from_u128(9), DragGesture::Move, None));
        assert_eq!(drag.state(), &DragState::Idle);
        assert!(drag.begin(&tl, Uuid::from_u128(1), DragGesture::Move, None));
        assert!(!drag.begin(&tl, Uuid::from_u128(1), DragGesture::TrimEnd, None));
    }

    #[test]
    fn session_can_be_reused_after_commit() {
        let mut tl = Timeline::with_clips(vec![clip(1, 0.0, 4.0, 0.0)]);
        let mut drag = DragSession::new();
        drag.begin(&tl, Uuid::from_u128(1), DragGesture::Move, None);
        drag.update(&tl, 3.0);
        assert!(drag.commit(&mut tl));
        assert!(drag.begin(&tl, Uuid::from_u128(1), DragGesture::Move, None));
    }

    #[test]
    fn move_preview_snaps_to_neighbor_edge() {
        let mut tl = Timeline::with_clips(vec![clip(1, 0.0, 4.0, 0.0), clip(2, 8.0, 10.0, 0.0)]);
        let mut drag = DragSession::new();
        drag.begin(&tl, Uuid::from_u128(2), DragGesture::Move, None);
        let preview = drag.update(&tl, 4.1).cloned().unwrap();
        assert_eq!(preview.start_time, 4.0);
        assert_eq!(preview.end_time, 6.0);

        assert!(drag.commit(&mut tl));
        let moved = tl.find_clip(Uuid::from_u128(2)).unwrap();
        assert_eq!((moved.start_time, moved.end_time), (4.0, 6.0));
    }

    #[test]
    fn move_drag_to_infinity_has_no_preview() {
        let mut tl = Timeline::with_clips(vec![clip(1, 0.0, 4.0, 0.0)]);
        let mut drag = DragSession::new();
        drag.begin(&tl, Uuid::from_u128(1), DragGesture::Move, None);
        assert!(drag.update(&tl, f64::INFINITY).is_none());
        assert!(!drag.commit(&mut tl));
        assert_eq!(tl.clips[0].end_time, 4.0);
    }

    #[test]
    fn trim_drag_respects_neighbor_gap() {
        let tl = Timeline::with_clips(vec![clip(1, 0.0, 4.0, 0.0), clip(2, 5.0, 8.0, 0.0)]);
        let mut drag = DragSession::new();
        drag.begin(&tl, Uuid::from_u128(1), DragGesture::TrimEnd, Some(20.0));
        let preview = drag.update(&tl, 12.0).cloned().unwrap();
        assert!(preview.end_time <= 5.0 + crate::geometry::EPSILON);
    }

    #[test]
    fn commit_after_clip_deleted_is_noop() {
        let mut tl = Timeline::with_clips(vec![clip(1, 0.0, 4.0, 0.0)]);
        let mut drag = DragSession::new();
        drag.begin(&tl, Uuid::from_u128(1), DragGesture::TrimEnd, None);
        drag.update(&tl, 2.0);
        tl.remove_clip(Uuid::from_u128(1));
        assert!(!drag.commit(&mut tl));
        assert!(tl.clips.is_empty());
    }
}

//! Contiguous re-placement of clips on one track.
//!
//! Trim never calls this; callers that want ripple semantics invoke it
//! explicitly after an edit.

use crate::geometry::approx_eq;
use crate::timeline::Timeline;
use crate::types::*;
use uuid::Uuid;

/// Re-place the clips of `track_id` so that, starting at `from` (or the
/// first clip of the track), each clip is as long as its trim window and
/// abuts its predecessor.
///
/// The starting clip keeps its `start_time`. Clips before it, and clips on
/// other tracks, are returned untouched. An unknown `from` id, or one on a
/// different track, leaves the collection unchanged.
pub fn reflow_track(
    clips: &[TimelineClip],
    track_id: TrackId,
    from: Option<Uuid>,
) -> Vec<TimelineClip> {
    let mut order: Vec<usize> = (0..clips.len())
        .filter(|&i| clips[i].track_id == track_id)
        .collect();
    order.sort_by(|&a, &b| by_placement(&clips[a], &clips[b]));

    let first = match from {
        Some(id) => match order.iter().position(|&i| clips[i].id == id) {
            Some(pos) => pos,
            None => return clips.to_vec(),
        },
        None => 0,
    };

    let mut out = clips.to_vec();
    let Some(&head) = order.get(first) else {
        return out;
    };

    let mut cursor = clips[head].start_time;
    for &idx in &order[first..] {
        let clip = &mut out[idx];
        let duration = clip.trimmed_duration();
        clip.start_time = cursor;
        clip.end_time = cursor + duration;
        cursor = clip.end_time;
    }
    out
}

impl Timeline {
    /// Close gaps and overlaps on `track_id` from `from` onward.
    /// Returns whether any clip moved.
    pub fn reflow(&mut self, track_id: TrackId, from: Option<Uuid>) -> bool {
        let reflowed = reflow_track(&self.clips, track_id, from);
        let changed = reflowed.iter().zip(&self.clips).any(|(new, old)| {
            !approx_eq(new.start_time, old.start_time) || !approx_eq(new.end_time, old.end_time)
        });
        if changed {
            tracing::debug!(%track_id, ?from, "reflowed track");
            self.clips = reflowed;
            self.clamp_playhead();
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip(id: u128, track_id: TrackId, start: f64, end: f64, trim: (f64, f64)) -> TimelineClip {
        TimelineClip {
            id: Uuid::from_u128(id),
            media_id: Uuid::from_u128(1000 + id),
            track_id,
            start_time: start,
            end_time: end,
            trim_start: trim.0,
            trim_end: trim.1,
        }
    }

    #[test]
    fn closes_gaps_from_track_start() {
        let clips = vec![
            clip(1, TrackId::BASE, 1.0, 3.0, (0.0, 2.0)),
            clip(2, TrackId::BASE, 5.0, 8.0, (0.0, 3.0)),
            clip(3, TrackId::BASE, 10.0, 11.0, (2.0, 3.0)),
        ];
        let out = reflow_track(&clips, TrackId::BASE, None);

        assert_eq!((out[0].start_time, out[0].end_time), (1.0, 3.0));
        assert_eq!((out[1].start_time, out[1].end_time), (3.0, 6.0));
        assert_eq!((out[2].start_time, out[2].end_time), (6.0, 7.0));
    }

    #[test]
    fn restores_duration_invariant() {
        // Mid-drag state where the timeline window disagrees with the trim.
        let clips = vec![
            clip(1, TrackId::BASE, 0.0, 4.0, (1.0, 3.0)),
            clip(2, TrackId::BASE, 4.0, 6.0, (0.0, 2.0)),
        ];
        let out = reflow_track(&clips, TrackId::BASE, None);
        assert_eq!(out[0].end_time, 2.0);
        assert_eq!((out[1].start_time, out[1].end_time), (2.0, 4.0));
    }

    #[test]
    fn starts_at_given_clip_and_leaves_earlier_clips() {
        let clips = vec![
            clip(1, TrackId::BASE, 0.0, 2.0, (0.0, 2.0)),
            clip(2, TrackId::BASE, 4.0, 5.0, (0.0, 1.0)),
            clip(3, TrackId::BASE, 9.0, 10.0, (0.0, 1.0)),
        ];
        let out = reflow_track(&clips, TrackId::BASE, Some(Uuid::from_u128(2)));
        assert_eq!(out[0], clips[0]);
        assert_eq!((out[1].start_time, out[1].end_time), (4.0, 5.0));
        assert_eq!((out[2].start_time, out[2].end_time), (5.0, 6.0));
    }

    #[test]
    fn resolves_overlaps() {
        let clips = vec![
            clip(1, TrackId::BASE, 0.0, 4.0, (0.0, 4.0)),
            clip(2, TrackId::BASE, 2.0, 5.0, (0.0, 3.0)),
        ];
        let out = reflow_track(&clips, TrackId::BASE, None);
        assert_eq!((out[1].start_time, out[1].end_time), (4.0, 7.0));
        assert!(!out[0].overlaps(&out[1]));
    }

    #[test]
    fn ties_break_by_id() {
        let clips = vec![
            clip(2, TrackId::BASE, 0.0, 1.0, (0.0, 1.0)),
            clip(1, TrackId::BASE, 0.0, 2.0, (0.0, 2.0)),
        ];
        let out = reflow_track(&clips, TrackId::BASE, None);
        // id 1 sorts first and keeps the head position.
        assert_eq!((out[1].start_time, out[1].end_time), (0.0, 2.0));
        assert_eq!((out[0].start_time, out[0].end_time), (2.0, 3.0));
    }

    #[test]
    fn other_tracks_untouched() {
        let clips = vec![
            clip(1, TrackId::BASE, 0.0, 1.0, (0.0, 1.0)),
            clip(2, TrackId::OVERLAY, 5.0, 6.0, (0.0, 1.0)),
            clip(3, TrackId::BASE, 3.0, 4.0, (0.0, 1.0)),
        ];
        let out = reflow_track(&clips, TrackId::BASE, None);
        assert_eq!(out[1], clips[1]);
        assert_eq!(out[2].start_time, 1.0);
    }

    #[test]
    fn missing_start_clip_is_noop() {
        let clips = vec![clip(1, TrackId::BASE, 3.0, 4.0, (0.0, 1.0))];
        let out = reflow_track(&clips, TrackId::BASE, Some(Uuid::from_u128(99)));
        assert_eq!(out, clips);
    }

    #[test]
    fn start_clip_on_other_track_is_noop() {
        let clips = vec![
            clip(1, TrackId::BASE, 3.0, 4.0, (0.0, 1.0)),
            clip(2, TrackId::BASE, 6.0, 7.0, (0.0, 1.0)),
            clip(3, TrackId::OVERLAY, 0.0, 1.0, (0.0, 1.0)),
        ];
        let out = reflow_track(&clips, TrackId::BASE, Some(Uuid::from_u128(3)));
        assert_eq!(out, clips);
    }

    #[test]
    fn timeline_reflow_reports_change() {
        let mut tl = Timeline::with_clips(vec![
            clip(1, TrackId::BASE, 0.0, 1.0, (0.0, 1.0)),
            clip(2, TrackId::BASE, 3.0, 4.0, (0.0, 1.0)),
        ]);
        tl.playhead = 4.0;
        assert!(tl.reflow(TrackId::BASE, None));
        assert_eq!(tl.clips[1].start_time, 1.0);
        assert_eq!(tl.playhead, 2.0);
        assert!(!tl.reflow(TrackId::BASE, None));
    }
}

use crate::geometry::snap;
use crate::timeline::Timeline;
use crate::types::*;
use uuid::Uuid;

/// Default magnet distance for edge snapping, in seconds.
pub const DEFAULT_SNAP_THRESHOLD: f64 = 0.2;

/// Find the nearest snap point within the threshold.
/// Returns `None` if no point is close enough.
pub fn find_snap_point(position: f64, snap_points: &[f64], threshold: f64) -> Option<f64> {
    let mut best: Option<(f64, f64)> = None;

    for &point in snap_points {
        let dist = (position - point).abs();
        if dist <= threshold && best.map_or(true, |(_, d)| dist < d) {
            best = Some((point, dist));
        }
    }

    best.map(|(point, _)| point)
}

/// Collect all snap points from a timeline (zero, playhead, clip edges).
pub fn collect_snap_points(timeline: &Timeline, exclude_clip_id: Option<Uuid>) -> Vec<f64> {
    let mut points = vec![0.0, timeline.playhead];

    for clip in &timeline.clips {
        if Some(clip.id) == exclude_clip_id {
            continue;
        }
        points.push(clip.start_time);
        points.push(clip.end_time);
    }

    points.sort_by(|a, b| a.total_cmp(b));
    points.dedup();
    points
}

/// Resolve where a dragged clip should start.
///
/// Either edge of the clip may latch onto a snap point; the closer latch
/// wins. Without a latch the start is rounded to the 0.1s tick.
pub fn snap_move_start(
    timeline: &Timeline,
    clip: &TimelineClip,
    proposed_start: f64,
    threshold: f64,
) -> f64 {
    let points = collect_snap_points(timeline, Some(clip.id));
    let duration = clip.duration();
    let proposed_end = proposed_start + duration;

    let by_start = find_snap_point(proposed_start, &points, threshold)
        .map(|p| (p, (p - proposed_start).abs()));
    let by_end = find_snap_point(proposed_end, &points, threshold)
        .map(|p| (p - duration, (p - proposed_end).abs()));

    let start = match (by_start, by_end) {
        (Some(s), Some(e)) => {
            if e.1 < s.1 {
                e.0
            } else {
                s.0
            }
        }
        (Some(s), None) => s.0,
        (None, Some(e)) => e.0,
        (None, None) => snap(proposed_start),
    };
    start.max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip(start: f64, end: f64) -> TimelineClip {
        TimelineClip {
            id: Uuid::new_v4(),
            media_id: Uuid::new_v4(),
            track_id: TrackId::BASE,
            start_time: start,
            end_time: end,
            trim_start: 0.0,
            trim_end: end - start,
        }
    }

    fn make_timeline_with_clips() -> Timeline {
        let mut tl = Timeline::with_clips(vec![clip(1.0, 4.0), clip(5.0, 7.0)]);
        tl.playhead = 10.0;
        tl
    }

    #[test]
    fn snap_to_nearest_point() {
        let points = vec![0.0, 1.0, 5.0];
        assert_eq!(find_snap_point(1.1, &points, 0.2), Some(1.0));
    }

    #[test]
    fn no_snap_beyond_threshold() {
        let points = vec![0.0, 1.0, 5.0];
        assert_eq!(find_snap_point(3.0, &points, 0.2), None);
    }

    #[test]
    fn empty_snap_points_returns_none() {
        assert_eq!(find_snap_point(2.0, &[], 0.5), None);
    }

    #[test]
    fn snap_to_closest_of_two() {
        let points = vec![1.0, 2.0];
        assert_eq!(find_snap_point(1.4, &points, 0.6), Some(1.0));
        assert_eq!(find_snap_point(1.7, &points, 0.6), Some(2.0));
    }

    #[test]
    fn collect_snap_points_from_timeline() {
        let tl = make_timeline_with_clips();
        let points = collect_snap_points(&tl, None);
        assert_eq!(points, vec![0.0, 1.0, 4.0, 5.0, 7.0, 10.0]);
    }

    #[test]
    fn collect_excludes_clip() {
        let tl = make_timeline_with_clips();
        let excluded = tl.clips[0].id;
        let points = collect_snap_points(&tl, Some(excluded));
        assert!(!points.contains(&1.0));
        assert!(!points.contains(&4.0));
        assert!(points.contains(&5.0));
        assert!(points.contains(&0.0));
    }

    #[test]
    fn move_latches_start_edge() {
        let tl = make_timeline_with_clips();
        let moving = tl.clips[1].clone();
        // Start lands near the first clip's end.
        assert_eq!(snap_move_start(&tl, &moving, 4.13, 0.2), 4.0);
    }

    #[test]
    fn move_latches_end_edge() {
        let tl = make_timeline_with_clips();
        let moving = tl.clips[0].clone();
        // Duration 3: end at 4.95 is close to the second clip's start.
        let start = snap_move_start(&tl, &moving, 1.95, 0.2);
        assert!((start - 2.0).abs() < 1e-9);
    }

    #[test]
    fn move_without_latch_rounds_to_tick() {
        let tl = make_timeline_with_clips();
        let moving = tl.clips[1].clone();
        assert_eq!(snap_move_start(&tl, &moving, 12.34, 0.2), 12.3);
    }
}

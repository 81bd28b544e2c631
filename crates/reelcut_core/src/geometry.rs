//! Shared time arithmetic for every edit operation.
//!
//! All timeline and trim values are `f64` seconds. Interactive edits are
//! snapped to a 0.1s tick so repeated drags never accumulate drift.

/// Shortest clip any edit may produce, in seconds.
pub const MIN_CLIP_DURATION: f64 = 0.1;

/// Snap resolution in ticks per second (0.1s).
pub const SNAP_TICKS_PER_SECOND: f64 = 10.0;

/// Tolerance for deciding that a mutation changes nothing.
pub const EPSILON: f64 = 1e-6;

/// Upper bound used for trim-end when the source duration is unknown.
pub const UNKNOWN_MEDIA_DURATION: f64 = 1.0e9;

/// Clamp `value` into `[min, max]`.
///
/// Unlike `f64::clamp` this never panics: an empty range (`max < min`)
/// collapses to `min`.
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    if max < min {
        return min;
    }
    value.max(min).min(max)
}

/// Round to the nearest 0.1s tick.
pub fn snap(time: f64) -> f64 {
    (time * SNAP_TICKS_PER_SECOND).round() / SNAP_TICKS_PER_SECOND
}

pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

/// Format seconds as `HH:MM:SS.mmm`.
pub fn format_timecode(seconds: f64) -> String {
    let total_ms = (seconds.abs() * 1_000.0).round() as u64;
    let ms = total_ms % 1_000;
    let total_secs = total_ms / 1_000;
    let secs = total_secs % 60;
    let total_mins = total_secs / 60;
    let mins = total_mins % 60;
    let hours = total_mins / 60;
    let sign = if seconds < 0.0 && total_ms > 0 { "-" } else { "" };
    format!("{sign}{hours:02}:{mins:02}:{secs:02}.{ms:03}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_inside_and_outside_range() {
        assert_eq!(clamp(5.0, 0.0, 10.0), 5.0);
        assert_eq!(clamp(-1.0, 0.0, 10.0), 0.0);
        assert_eq!(clamp(11.0, 0.0, 10.0), 10.0);
    }

    #[test]
    fn clamp_empty_range_collapses_to_min() {
        assert_eq!(clamp(3.0, 2.0, 1.0), 2.0);
    }

    #[test]
    fn snap_rounds_to_tenth() {
        assert_eq!(snap(1.04), 1.0);
        assert_eq!(snap(1.06), 1.1);
        assert_eq!(snap(2.96), 3.0);
        assert_eq!(snap(0.3), 0.3);
        assert_eq!(snap(0.0), 0.0);
    }

    #[test]
    fn snap_is_idempotent() {
        for i in 0..200 {
            let t = i as f64 * 0.037;
            assert_eq!(snap(snap(t)), snap(t));
        }
    }

    #[test]
    fn approx_eq_uses_epsilon() {
        assert!(approx_eq(1.0, 1.0 + 1e-9));
        assert!(!approx_eq(1.0, 1.0 + 1e-3));
    }

    #[test]
    fn timecode_display() {
        assert_eq!(format_timecode(0.0), "00:00:00.000");
        assert_eq!(format_timecode(1.5), "00:00:01.500");
        assert_eq!(format_timecode(3661.5), "01:01:01.500");
        assert_eq!(format_timecode(-2.25), "-00:00:02.250");
    }
}

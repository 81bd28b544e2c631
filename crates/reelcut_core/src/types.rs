use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// TrackId
// ---------------------------------------------------------------------------

/// Integer track identifier. Track 1 is the base track, track 2 the
/// picture-in-picture overlay.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct TrackId(pub u32);

impl TrackId {
    pub const BASE: Self = Self(1);
    pub const OVERLAY: Self = Self(2);
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "track {}", self.0)
    }
}

// ---------------------------------------------------------------------------
// MediaItem
// ---------------------------------------------------------------------------

/// An imported source file. Immutable once imported.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    pub id: Uuid,
    #[serde(default)]
    pub name: String,
    pub path: PathBuf,
    /// Source-native duration in seconds.
    pub duration: f64,
    pub width: u32,
    pub height: u32,
}

// ---------------------------------------------------------------------------
// MediaLibrary
// ---------------------------------------------------------------------------

/// Read-only lookup of media by id.
pub trait MediaLibrary {
    fn media_by_id(&self, id: Uuid) -> Option<&MediaItem>;
}

impl MediaLibrary for [MediaItem] {
    fn media_by_id(&self, id: Uuid) -> Option<&MediaItem> {
        self.iter().find(|m| m.id == id)
    }
}

impl MediaLibrary for Vec<MediaItem> {
    fn media_by_id(&self, id: Uuid) -> Option<&MediaItem> {
        self.as_slice().media_by_id(id)
    }
}

impl MediaLibrary for HashMap<Uuid, MediaItem> {
    fn media_by_id(&self, id: Uuid) -> Option<&MediaItem> {
        self.get(&id)
    }
}

// ---------------------------------------------------------------------------
// TimelineClip
// ---------------------------------------------------------------------------

/// A window of one media item placed on a track.
///
/// `end_time - start_time == trim_end - trim_start` holds for every
/// committed clip.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimelineClip {
    pub id: Uuid,
    pub media_id: Uuid,
    pub track_id: TrackId,
    pub start_time: f64,
    pub end_time: f64,
    pub trim_start: f64,
    pub trim_end: f64,
}

impl TimelineClip {
    /// A fresh clip showing `[0, duration]` of its media at `start_time`.
    pub fn new(media_id: Uuid, track_id: TrackId, start_time: f64, duration: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            media_id,
            track_id,
            start_time,
            end_time: start_time + duration,
            trim_start: 0.0,
            trim_end: duration,
        }
    }

    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    pub fn trimmed_duration(&self) -> f64 {
        self.trim_end - self.trim_start
    }

    /// Whether `time` falls in `[start_time, end_time)`.
    pub fn contains(&self, time: f64) -> bool {
        time >= self.start_time && time < self.end_time
    }

    /// Whether the half-open windows of two clips intersect.
    pub fn overlaps(&self, other: &TimelineClip) -> bool {
        self.start_time < other.end_time && other.start_time < self.end_time
    }
}

/// Placement order: `start_time`, then id.
pub fn by_placement(a: &TimelineClip, b: &TimelineClip) -> std::cmp::Ordering {
    a.start_time
        .total_cmp(&b.start_time)
        .then_with(|| a.id.cmp(&b.id))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_clip_starts_untrimmed() {
        let media_id = Uuid::new_v4();
        let clip = TimelineClip::new(media_id, TrackId::BASE, 2.0, 5.0);
        assert_eq!(clip.media_id, media_id);
        assert_eq!(clip.start_time, 2.0);
        assert_eq!(clip.end_time, 7.0);
        assert_eq!(clip.trim_start, 0.0);
        assert_eq!(clip.trim_end, 5.0);
        assert_eq!(clip.duration(), clip.trimmed_duration());
    }

    #[test]
    fn contains_is_half_open() {
        let clip = TimelineClip::new(Uuid::new_v4(), TrackId::BASE, 1.0, 2.0);
        assert!(clip.contains(1.0));
        assert!(clip.contains(2.9));
        assert!(!clip.contains(3.0));
        assert!(!clip.contains(0.9));
    }

    #[test]
    fn abutting_clips_do_not_overlap() {
        let a = TimelineClip::new(Uuid::new_v4(), TrackId::BASE, 0.0, 5.0);
        let b = TimelineClip::new(Uuid::new_v4(), TrackId::BASE, 5.0, 3.0);
        let c = TimelineClip::new(Uuid::new_v4(), TrackId::BASE, 4.0, 3.0);
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(c.overlaps(&b));
    }

    #[test]
    fn clip_serializes_with_camel_case_fields() {
        let clip = TimelineClip::new(Uuid::new_v4(), TrackId::OVERLAY, 1.5, 2.0);
        let value = serde_json::to_value(&clip).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj["trackId"], serde_json::json!(2));
        assert_eq!(obj["startTime"], serde_json::json!(1.5));
        assert_eq!(obj["endTime"], serde_json::json!(3.5));
        assert_eq!(obj["trimStart"], serde_json::json!(0.0));
        assert_eq!(obj["trimEnd"], serde_json::json!(2.0));
        assert!(obj["id"].is_string());
        assert!(obj["mediaId"].is_string());
    }

    #[test]
    fn clip_deserializes_from_persisted_shape() {
        let json = r#"{
            "id": "6f1c2b9e-0d43-4d8a-9b0e-4b4f3f1f2a10",
            "mediaId": "0b7a4f62-5d0f-4c38-8f57-1d9b9f4d6e21",
            "trackId": 1,
            "startTime": 0.0,
            "endTime": 4.5,
            "trimStart": 1.0,
            "trimEnd": 5.5
        }"#;
        let clip: TimelineClip = serde_json::from_str(json).unwrap();
        assert_eq!(clip.track_id, TrackId::BASE);
        assert_eq!(clip.duration(), clip.trimmed_duration());
    }

    #[test]
    fn media_library_lookup() {
        let item = MediaItem {
            id: Uuid::new_v4(),
            name: "a.mp4".to_string(),
            path: PathBuf::from("/media/a.mp4"),
            duration: 10.0,
            width: 1920,
            height: 1080,
        };
        let id = item.id;
        let list = vec![item.clone()];
        assert_eq!(list.media_by_id(id), Some(&item));
        assert_eq!(list.media_by_id(Uuid::new_v4()), None);

        let mut map = HashMap::new();
        map.insert(id, item.clone());
        assert_eq!(map.media_by_id(id), Some(&item));
    }

    #[test]
    fn placement_order_breaks_ties_by_id() {
        let mut a = TimelineClip::new(Uuid::new_v4(), TrackId::BASE, 1.0, 1.0);
        let mut b = TimelineClip::new(Uuid::new_v4(), TrackId::BASE, 1.0, 1.0);
        a.id = Uuid::from_u128(1);
        b.id = Uuid::from_u128(2);
        assert_eq!(by_placement(&a, &b), std::cmp::Ordering::Less);
        b.start_time = 0.5;
        assert_eq!(by_placement(&a, &b), std::cmp::Ordering::Greater);
    }
}

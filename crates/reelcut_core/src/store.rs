//! Single-writer owner of the timeline.
//!
//! Every edit goes through [`TimelineStore`], which snapshots the clip
//! collection, applies the edit, and, if anything changed, records undo
//! history and notifies the registered on-commit hooks.

use crate::drag::DragSession;
use crate::error::Result;
use crate::history::History;
use crate::timeline::Timeline;
use crate::types::*;
use uuid::Uuid;

/// Called with the full clip collection after each committed change.
pub type CommitHook = Box<dyn FnMut(&[TimelineClip]) + Send>;

pub struct TimelineStore {
    timeline: Timeline,
    history: History,
    hooks: Vec<CommitHook>,
}

impl std::fmt::Debug for TimelineStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimelineStore")
            .field("timeline", &self.timeline)
            .field("history", &self.history)
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

impl TimelineStore {
    pub fn new(timeline: Timeline) -> Self {
        Self::with_history(timeline, History::default())
    }

    pub fn with_history(timeline: Timeline, history: History) -> Self {
        Self {
            timeline,
            history,
            hooks: Vec::new(),
        }
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn into_timeline(self) -> Timeline {
        self.timeline
    }

    /// Register a hook run after every committed change (e.g. autosave).
    pub fn on_commit(&mut self, hook: impl FnMut(&[TimelineClip]) + Send + 'static) {
        self.hooks.push(Box::new(hook));
    }

    fn notify(&mut self) {
        for hook in &mut self.hooks {
            hook(&self.timeline.clips);
        }
    }

    /// Run `edit` against the timeline and commit if the clips changed.
    fn apply<R>(&mut self, description: &str, edit: impl FnOnce(&mut Timeline) -> R) -> R {
        let before = self.timeline.clips.clone();
        let result = edit(&mut self.timeline);
        if self.timeline.clips != before {
            tracing::debug!(description, clips = self.timeline.clips.len(), "commit");
            self.history
                .record(description, before, self.timeline.clips.clone());
            self.notify();
        }
        result
    }

    pub fn add_clip(&mut self, media: &MediaItem, track_id: TrackId, start_time: f64) -> Result<Uuid> {
        self.apply("Add clip", |tl| tl.add_clip(media, track_id, start_time))
    }

    pub fn append_clip(&mut self, media: &MediaItem, track_id: TrackId) -> Result<Uuid> {
        self.apply("Add clip", |tl| tl.append_clip(media, track_id))
    }

    pub fn remove_clip(&mut self, clip_id: Uuid) -> Option<TimelineClip> {
        self.apply("Remove clip", |tl| tl.remove_clip(clip_id))
    }

    pub fn move_clip(&mut self, clip_id: Uuid, new_start: f64) -> bool {
        self.apply("Move clip", |tl| tl.move_clip(clip_id, new_start))
    }

    pub fn ripple_trim_start(&mut self, clip_id: Uuid, target: f64, media_duration: Option<f64>) -> bool {
        self.apply("Trim start", |tl| {
            tl.ripple_trim_start(clip_id, target, media_duration)
        })
    }

    pub fn ripple_trim_end(&mut self, clip_id: Uuid, target: f64, media_duration: Option<f64>) -> bool {
        self.apply("Trim end", |tl| tl.ripple_trim_end(clip_id, target, media_duration))
    }

    pub fn split_clip(&mut self, clip_id: Uuid, split_time: f64) -> Option<(Uuid, Uuid)> {
        self.apply("Split clip", |tl| tl.split_clip(clip_id, split_time))
    }

    pub fn reflow(&mut self, track_id: TrackId, from: Option<Uuid>) -> bool {
        self.apply("Reflow track", |tl| tl.reflow(track_id, from))
    }

    /// Commit a drag session as a single undoable edit.
    pub fn commit_drag(&mut self, session: &mut DragSession) -> bool {
        self.apply("Drag clip", |tl| session.commit(tl))
    }

    /// Playhead moves are not edits: no history, no hooks.
    pub fn set_playhead(&mut self, time: f64) {
        self.timeline.set_playhead(time);
    }

    pub fn undo(&mut self) -> Result<String> {
        let description = self.history.undo(&mut self.timeline)?;
        self.notify();
        Ok(description)
    }

    pub fn redo(&mut self) -> Result<String> {
        let description = self.history.redo(&mut self.timeline)?;
        self.notify();
        Ok(description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drag::DragGesture;
    use crate::error::CoreError;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    fn media(duration: f64) -> MediaItem {
        MediaItem {
            id: Uuid::new_v4(),
            name: "clip.mp4".to_string(),
            path: PathBuf::from("/media/clip.mp4"),
            duration,
            width: 1280,
            height: 720,
        }
    }

    fn counting_store() -> (TimelineStore, Arc<Mutex<Vec<usize>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut store = TimelineStore::new(Timeline::new());
        let sink = Arc::clone(&seen);
        store.on_commit(move |clips| sink.lock().unwrap().push(clips.len()));
        (store, seen)
    }

    #[test]
    fn hooks_fire_on_each_commit() {
        let (mut store, seen) = counting_store();
        let id = store.add_clip(&media(5.0), TrackId::BASE, 0.0).unwrap();
        store.split_clip(id, 2.0).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn rejected_edits_do_not_commit() {
        let (mut store, seen) = counting_store();
        let id = store.add_clip(&media(5.0), TrackId::BASE, 0.0).unwrap();

        assert!(store.split_clip(id, 0.05).is_none());
        assert!(!store.ripple_trim_start(Uuid::new_v4(), 1.0, None));
        assert!(!store.move_clip(id, 0.0));

        assert_eq!(seen.lock().unwrap().len(), 1);
        assert_eq!(store.history().undo_description(), Some("Add clip"));
    }

    #[test]
    fn failed_add_does_not_commit() {
        let (mut store, seen) = counting_store();
        let result = store.add_clip(&media(0.0), TrackId::BASE, 0.0);
        assert!(matches!(result, Err(CoreError::InvalidOperation(_))));
        assert!(seen.lock().unwrap().is_empty());
        assert!(!store.history().can_undo());
    }

    #[test]
    fn undo_redo_round_trip() {
        let (mut store, seen) = counting_store();
        let id = store.add_clip(&media(10.0), TrackId::BASE, 0.0).unwrap();
        assert!(store.ripple_trim_end(id, 4.0, Some(10.0)));

        assert_eq!(store.undo().unwrap(), "Trim end");
        assert_eq!(store.timeline().find_clip(id).unwrap().end_time, 10.0);
        assert_eq!(store.redo().unwrap(), "Trim end");
        assert_eq!(store.timeline().find_clip(id).unwrap().end_time, 4.0);
        assert_eq!(seen.lock().unwrap().len(), 4);
    }

    #[test]
    fn drag_commit_is_one_history_entry() {
        let mut store = TimelineStore::new(Timeline::new());
        let id = store.add_clip(&media(10.0), TrackId::BASE, 0.0).unwrap();

        let mut drag = DragSession::new();
        assert!(drag.begin(store.timeline(), id, DragGesture::TrimEnd, Some(10.0)));
        drag.update(store.timeline(), 8.0);
        drag.update(store.timeline(), 6.0);
        assert!(store.commit_drag(&mut drag));

        assert_eq!(store.timeline().find_clip(id).unwrap().end_time, 6.0);
        assert_eq!(store.undo().unwrap(), "Drag clip");
        assert_eq!(store.timeline().find_clip(id).unwrap().end_time, 10.0);
        assert_eq!(store.undo().unwrap(), "Add clip");
        assert!(store.undo().is_err());
    }

    #[test]
    fn playhead_moves_skip_hooks() {
        let (mut store, seen) = counting_store();
        store.add_clip(&media(10.0), TrackId::BASE, 0.0).unwrap();
        store.set_playhead(4.0);
        assert_eq!(store.timeline().playhead, 4.0);
        assert_eq!(seen.lock().unwrap().len(), 1);
    }
}

use crate::error::{CoreError, Result};
use crate::timeline::Timeline;
use crate::types::TimelineClip;

/// One committed edit: the clip collection before and after.
#[derive(Debug, Clone, PartialEq)]
struct Entry {
    description: String,
    before: Vec<TimelineClip>,
    after: Vec<TimelineClip>,
}

/// Undo/redo history over whole clip-collection snapshots.
///
/// Every edit replaces the collection atomically, so restoring a snapshot
/// is always a valid undo regardless of which operation produced it.
#[derive(Debug, Clone)]
pub struct History {
    undo_stack: Vec<Entry>,
    redo_stack: Vec<Entry>,
    max_size: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(100)
    }
}

impl History {
    pub fn new(max_size: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_size: max_size.max(1),
        }
    }

    /// Record a committed edit. Clears the redo stack.
    pub fn record(
        &mut self,
        description: impl Into<String>,
        before: Vec<TimelineClip>,
        after: Vec<TimelineClip>,
    ) {
        self.redo_stack.clear();
        self.undo_stack.push(Entry {
            description: description.into(),
            before,
            after,
        });
        if self.undo_stack.len() > self.max_size {
            self.undo_stack.remove(0);
        }
    }

    /// Undo the last edit. Returns its description.
    pub fn undo(&mut self, timeline: &mut Timeline) -> Result<String> {
        let entry = self.undo_stack.pop().ok_or(CoreError::NothingToUndo)?;
        timeline.clips = entry.before.clone();
        timeline.clamp_playhead();
        let description = entry.description.clone();
        self.redo_stack.push(entry);
        Ok(description)
    }

    /// Redo the last undone edit. Returns its description.
    pub fn redo(&mut self, timeline: &mut Timeline) -> Result<String> {
        let entry = self.redo_stack.pop().ok_or(CoreError::NothingToRedo)?;
        timeline.clips = entry.after.clone();
        timeline.clamp_playhead();
        let description = entry.description.clone();
        self.undo_stack.push(entry);
        Ok(description)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.last().map(|e| e.description.as_str())
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack.last().map(|e| e.description.as_str())
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

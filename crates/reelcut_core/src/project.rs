use crate::error::{CoreError, Result};
use crate::timeline::Timeline;
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Export canvas size.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Resolution {
    #[default]
    #[serde(rename = "1080p")]
    P1080,
    #[serde(rename = "720p")]
    P720,
    /// Size of the first base clip's media.
    #[serde(rename = "source")]
    Source,
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Resolution::P1080 => "1080p",
            Resolution::P720 => "720p",
            Resolution::Source => "source",
        };
        f.write_str(s)
    }
}

impl FromStr for Resolution {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "1080p" | "1080" => Ok(Resolution::P1080),
            "720p" | "720" => Ok(Resolution::P720),
            "source" => Ok(Resolution::Source),
            other => Err(CoreError::InvalidOperation(format!(
                "unknown resolution '{other}' (expected 1080p, 720p or source)"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// ExportSettings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportSettings {
    pub resolution: Resolution,
    /// x264 constant rate factor.
    pub crf: u8,
    /// x264 speed preset.
    pub preset: String,
    pub audio_bitrate: String,
    /// Gap between the picture-in-picture overlay and the canvas corner, px.
    pub overlay_margin: u32,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            resolution: Resolution::P1080,
            crf: 23,
            preset: "medium".to_string(),
            audio_bitrate: "192k".to_string(),
            overlay_margin: 20,
        }
    }
}

/// 720p preset with a faster encode.
pub fn preset_draft() -> ExportSettings {
    ExportSettings {
        resolution: Resolution::P720,
        crf: 28,
        preset: "veryfast".to_string(),
        ..ExportSettings::default()
    }
}

/// 1080p preset with a slower, higher-quality encode.
pub fn preset_final() -> ExportSettings {
    ExportSettings {
        resolution: Resolution::P1080,
        crf: 18,
        preset: "slow".to_string(),
        ..ExportSettings::default()
    }
}

/// Named encode profiles layered over a project's export settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExportProfile {
    Draft,
    Final,
}

impl ExportProfile {
    pub fn settings(self) -> ExportSettings {
        match self {
            ExportProfile::Draft => preset_draft(),
            ExportProfile::Final => preset_final(),
        }
    }

    /// Replace the canvas and encoder quality of `settings`. Audio bitrate
    /// and overlay margin are kept.
    pub fn apply(self, settings: &mut ExportSettings) {
        let profile = self.settings();
        settings.resolution = profile.resolution;
        settings.crf = profile.crf;
        settings.preset = profile.preset;
    }
}

impl fmt::Display for ExportProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExportProfile::Draft => "draft",
            ExportProfile::Final => "final",
        })
    }
}

impl FromStr for ExportProfile {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "draft" => Ok(ExportProfile::Draft),
            "final" => Ok(ExportProfile::Final),
            other => Err(CoreError::InvalidOperation(format!(
                "unknown export profile '{other}' (expected draft or final)"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Project
// ---------------------------------------------------------------------------

/// Everything persisted for one editing session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub media: Vec<MediaItem>,
    #[serde(default)]
    pub timeline: Timeline,
    #[serde(default)]
    pub export: ExportSettings,
}

impl Project {
    /// Create a new empty project with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            media: vec![],
            timeline: Timeline::new(),
            export: ExportSettings::default(),
        }
    }

    pub fn media_by_id(&self, id: Uuid) -> Option<&MediaItem> {
        self.media.media_by_id(id)
    }

    /// Source duration of the media behind `clip_id`, if both exist.
    pub fn media_duration_for_clip(&self, clip_id: Uuid) -> Option<f64> {
        let clip = self.timeline.find_clip(clip_id)?;
        self.media_by_id(clip.media_id).map(|m| m.duration)
    }

    /// Add media to the library, reusing an existing entry with the same path.
    pub fn add_media(&mut self, item: MediaItem) -> Uuid {
        if let Some(existing) = self.media.iter().find(|m| m.path == item.path) {
            return existing.id;
        }
        let id = item.id;
        self.media.push(item);
        id
    }

    /// Remove media and every clip that references it.
    pub fn remove_media(&mut self, id: Uuid) -> Result<MediaItem> {
        let idx = self
            .media
            .iter()
            .position(|m| m.id == id)
            .ok_or(CoreError::MediaNotFound(id))?;
        self.timeline.clips.retain(|c| c.media_id != id);
        self.timeline.clamp_playhead();
        Ok(self.media.remove(idx))
    }

    /// Save project to a file as pretty-printed JSON.
    /// Automatically appends `.reelcut` extension if not present.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = ensure_extension(path.as_ref());
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;
        tracing::debug!(path = %path.display(), "saved project");
        Ok(())
    }

    /// Load a project from a JSON file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let project: Project = serde_json::from_str(&data)?;
        Ok(project)
    }
}

/// Path a project is actually saved to.
pub fn ensure_extension(path: &Path) -> std::path::PathBuf {
    if path.extension().and_then(|e| e.to_str()) == Some("reelcut") {
        path.to_path_buf()
    } else {
        let mut p = path.to_path_buf();
        let mut name = p.file_name().unwrap_or_default().to_os_string();
        name.push(".reelcut");
        p.set_file_name(name);
        p
    }
}

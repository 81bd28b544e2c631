pub mod edit;
pub mod export;
pub mod import;
pub mod info;
pub mod init;
pub mod plan;

use std::path::Path;

use anyhow::Context;
use reelcut_core::project::{ensure_extension, ExportSettings, Project};
use uuid::Uuid;

use crate::ExportArgs;

/// Load a project; `path` may omit the `.reelcut` extension.
pub fn load_project(path: &Path) -> anyhow::Result<Project> {
    let path = ensure_extension(path);
    Project::load_from_file(&path)
        .with_context(|| format!("Failed to load project {}", path.display()))
}

pub fn save_project(project: &Project, path: &Path) -> anyhow::Result<()> {
    project
        .save_to_file(path)
        .with_context(|| format!("Failed to save project {}", path.display()))
}

/// Resolve a full id or a unique prefix of one.
pub fn resolve_id(kind: &str, query: &str, ids: impl IntoIterator<Item = Uuid>) -> anyhow::Result<Uuid> {
    let query = query.trim().to_ascii_lowercase();
    if query.is_empty() {
        anyhow::bail!("empty {kind} id");
    }
    let matches: Vec<Uuid> = ids
        .into_iter()
        .filter(|id| id.to_string().starts_with(&query))
        .collect();
    match matches.as_slice() {
        [id] => Ok(*id),
        [] => anyhow::bail!("no {kind} matches '{query}'"),
        _ => anyhow::bail!(
            "'{query}' matches {} {kind}s; use a longer prefix",
            matches.len()
        ),
    }
}

/// First eight hex digits, enough to pass back to `resolve_id`.
pub fn short_id(id: Uuid) -> String {
    id.simple().to_string()[..8].to_string()
}

/// Project export settings with command-line overrides applied.
pub fn export_settings(project: &Project, args: &ExportArgs) -> ExportSettings {
    let mut settings = project.export.clone();
    if let Some(profile) = args.profile {
        profile.apply(&mut settings);
    }
    if let Some(resolution) = args.resolution {
        settings.resolution = resolution;
    }
    if let Some(crf) = args.crf {
        settings.crf = crf;
    }
    if let Some(preset) = &args.preset {
        settings.preset = preset.clone();
    }
    if let Some(bitrate) = &args.audio_bitrate {
        settings.audio_bitrate = bitrate.clone();
    }
    if let Some(margin) = args.overlay_margin {
        settings.overlay_margin = margin;
    }
    settings
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelcut_core::project::{ExportProfile, Resolution};

    #[test]
    fn resolve_id_accepts_unique_prefix() {
        let a = Uuid::from_u128(0xaaaa_0000_0000_0000_0000_0000_0000_0001);
        let b = Uuid::from_u128(0xbbbb_0000_0000_0000_0000_0000_0000_0002);
        assert_eq!(resolve_id("clip", "AAAA", [a, b]).unwrap(), a);
        assert_eq!(resolve_id("clip", &b.to_string(), [a, b]).unwrap(), b);
    }

    #[test]
    fn resolve_id_rejects_ambiguous_and_unknown() {
        let a = Uuid::from_u128(0xabcd_0000_0000_0000_0000_0000_0000_0001);
        let b = Uuid::from_u128(0xabce_0000_0000_0000_0000_0000_0000_0002);
        assert!(resolve_id("clip", "abc", [a, b]).is_err());
        assert!(resolve_id("clip", "ffff", [a, b]).is_err());
        assert!(resolve_id("clip", "", [a, b]).is_err());
    }

    #[test]
    fn short_id_round_trips_through_resolve() {
        let id = Uuid::new_v4();
        assert_eq!(resolve_id("media", &short_id(id), [id]).unwrap(), id);
    }

    #[test]
    fn export_args_override_project_settings() {
        let project = Project::new("Overrides");
        let args = ExportArgs {
            resolution: Some(Resolution::P720),
            crf: Some(30),
            ..ExportArgs::default()
        };
        let settings = export_settings(&project, &args);
        assert_eq!(settings.resolution, Resolution::P720);
        assert_eq!(settings.crf, 30);
        assert_eq!(settings.preset, project.export.preset);
    }

    #[test]
    fn explicit_flags_win_over_profile() {
        let project = Project::new("Profile");
        let args = ExportArgs {
            profile: Some(ExportProfile::Final),
            crf: Some(20),
            ..ExportArgs::default()
        };
        let settings = export_settings(&project, &args);
        assert_eq!(settings.resolution, Resolution::P1080);
        assert_eq!(settings.preset, "slow");
        assert_eq!(settings.crf, 20);
    }
}

//! Create a new reelcut project file.

use std::path::PathBuf;

use reelcut_core::project::{ensure_extension, Project};

use super::save_project;

pub fn run(path: PathBuf, name: Option<String>) -> anyhow::Result<()> {
    let path = ensure_extension(&path);
    if path.exists() {
        anyhow::bail!("{} already exists", path.display());
    }

    let name = name.unwrap_or_else(|| {
        path.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Untitled".to_string())
    });
    let project = Project::new(name);
    save_project(&project, &path)?;

    println!("Created project '{}' at {}", project.name, path.display());
    println!("  Resolution: {}", project.export.resolution);
    println!("  CRF: {}  Preset: {}", project.export.crf, project.export.preset);

    Ok(())
}

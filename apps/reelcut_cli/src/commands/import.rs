//! Probe media files and add them to a project's library.

use std::path::PathBuf;

use anyhow::Context;
use reelcut_render::probe::import_media;

use super::{load_project, save_project, short_id};

pub fn run(path: PathBuf, files: Vec<PathBuf>) -> anyhow::Result<()> {
    let mut project = load_project(&path)?;

    for file in files {
        let item = import_media(&file).with_context(|| format!("Failed to import {}", file.display()))?;
        let name = item.name.clone();
        let (duration, width, height) = (item.duration, item.width, item.height);
        let id = project.add_media(item);
        println!(
            "{}  {}  {:.2}s  {}x{}",
            short_id(id),
            name,
            duration,
            width,
            height
        );
    }

    save_project(&project, &path)
}

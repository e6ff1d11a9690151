use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::scanner::Section;

#[derive(Serialize)]
struct PlotsFile<'a> {
    sections: &'a [Section],
}

/// Write `{"sections": [...]}` to `path`, replacing any previous file and
/// creating parent directories. Returns the number of sections written.
pub fn write_sections(path: &Path, sections: &[Section]) -> Result<usize> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("creating output directory {}", dir.display()))?;
    }

    let json = serde_json::to_string_pretty(&PlotsFile { sections })?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;

    info!("Wrote {} sections to {}", sections.len(), path.display());
    Ok(sections.len())
}

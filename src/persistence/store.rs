//! JSON snapshot of the project list.
//!
//! The whole list round-trips through plain structural JSON with the
//! field names the export schema defines (`timeSpent`, `isTracking`,
//! `pomodoroSettings`, ...). Loading defaults missing optional fields
//! and always resets tracking flags, since tracking state is not
//! meaningful across restarts.

use crate::domain::Project;
use crate::persistence::files::{atomic_write, read_file};
use anyhow::{bail, Context, Result};
use std::collections::HashSet;
use std::path::Path;

/// Load the project list from a snapshot file.
///
/// A missing or empty file yields a single default project, matching
/// first launch.
pub fn load_projects<P: AsRef<Path>>(path: P) -> Result<Vec<Project>> {
    let content = read_file(&path)?;
    if content.trim().is_empty() {
        return Ok(vec![Project::new("Project 1".to_string())]);
    }

    let mut projects: Vec<Project> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.as_ref().display()))?;
    for project in &mut projects {
        project.normalize_loaded();
    }
    Ok(projects)
}

/// Save the project list as pretty-printed JSON, atomically
pub fn save_projects<P: AsRef<Path>>(path: P, projects: &[Project]) -> Result<()> {
    let json = serde_json::to_string_pretty(projects).context("Failed to serialize projects")?;
    atomic_write(path, &json)?;
    Ok(())
}

/// Read and validate an imported snapshot. The import replaces the live
/// list, so project names must be unique and tasks well-formed; stale
/// tracking flags are dropped and missing counters default to zero.
pub fn import_projects<P: AsRef<Path>>(path: P) -> Result<Vec<Project>> {
    let path = path.as_ref();
    if !path.exists() {
        bail!("Import file does not exist: {}", path.display());
    }
    let content = read_file(path)?;
    let mut projects: Vec<Project> = serde_json::from_str(&content)
        .with_context(|| format!("Invalid project data in {}", path.display()))?;

    let mut seen = HashSet::new();
    for project in &projects {
        if project.name.is_empty() {
            bail!("Imported project has an empty name");
        }
        if !seen.insert(project.name.as_str()) {
            bail!("Duplicate project name in import: '{}'", project.name);
        }
    }

    for project in &mut projects {
        project.normalize_loaded();
    }
    Ok(projects)
}

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use iconsweep_core::db::{ProjectContext, ProjectLayout};
use iconsweep_core::services::ConsolidationScope;
use iconsweep_core::tree::DocumentTree;
use serde::Serialize;

use crate::{canonicalize_or_current, sha256_file};

/// Open the project rooted at `root` (config, layout and database).
pub fn open_project(root: &str) -> Result<ProjectContext> {
    let root_path = canonicalize_or_current(root)?;
    ProjectContext::from_root(&root_path)
}

/// Pick the document to work on: the explicit argument, else the project's
/// `default_document`. Relative paths resolve against the project root.
pub fn resolve_document(ctx: &ProjectContext, document: Option<&str>) -> Result<PathBuf> {
    let chosen = document.or(ctx.config.default_document.as_deref()).ok_or_else(|| {
        anyhow!("No document given and the project has no default document (use --document)")
    })?;
    let path = Path::new(chosen);
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(ctx.layout.root.join(path))
    }
}

/// A loaded document snapshot together with its content hash.
pub struct LoadedDocument {
    pub path: PathBuf,
    pub hash: String,
    pub tree: DocumentTree,
}

impl LoadedDocument {
    /// Label stored in run history: the path relative to the project root when possible.
    pub fn label(&self, layout: &ProjectLayout) -> String {
        match self.path.strip_prefix(&layout.root) {
            Ok(rel) => rel.to_string_lossy().to_string(),
            Err(_) => self.path.to_string_lossy().to_string(),
        }
    }
}

pub fn load_document(path: &Path) -> Result<LoadedDocument> {
    let body = fs::read_to_string(path)
        .with_context(|| format!("Failed to read document: {}", path.display()))?;
    let tree = DocumentTree::from_json(&body)
        .with_context(|| format!("Failed to load document tree from {}", path.display()))?;
    let hash = sha256_file(path)?;
    Ok(LoadedDocument { path: path.to_path_buf(), hash, tree })
}

/// Write the (possibly rewritten) document back to disk as pretty JSON.
pub fn write_document(path: &Path, tree: &DocumentTree) -> Result<()> {
    let json = serde_json::to_string_pretty(&tree.to_document())
        .context("Failed to serialize document")?;
    fs::write(path, json).with_context(|| format!("Failed to write document: {}", path.display()))
}

/// Write a JSON report under `reports/` and return its path.
pub fn write_report<T: Serialize>(
    layout: &ProjectLayout,
    document: &str,
    kind: &str,
    report: &T,
) -> Result<PathBuf> {
    fs::create_dir_all(&layout.reports_dir).with_context(|| {
        format!("Failed to create reports dir: {}", layout.reports_dir.display())
    })?;
    let path = layout.report_path(document, kind);
    let json = serde_json::to_string_pretty(report)?;
    fs::write(&path, json).with_context(|| format!("Failed to write report: {}", path.display()))?;
    Ok(path)
}

pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

pub fn validate_scope(scope: &str) -> Result<ConsolidationScope> {
    match scope {
        "all-pages" => Ok(ConsolidationScope::AllPages),
        "current-page" => Ok(ConsolidationScope::CurrentPage),
        other => Err(anyhow!("Invalid scope '{}'. Allowed: all-pages, current-page", other)),
    }
}

/// Helper to print whether a directory exists.
pub fn print_dir_status(label: &str, path: &Path) {
    let exists = path.is_dir();
    println!("- {label}: {} ({})", if exists { "OK" } else { "MISSING" }, path.display());
}

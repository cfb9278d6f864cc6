use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::db::{open_project_db, ProjectConfig, ProjectDb, ProjectLayout};
use crate::services::ScanSession;

/// Layout, config, db path and an open ProjectDb for one project root.
#[derive(Debug)]
pub struct ProjectContext {
    pub layout: ProjectLayout,
    pub config: ProjectConfig,
    pub db_path: PathBuf,
    pub db: ProjectDb,
}

impl ProjectContext {
    /// Load project config and open the database for a given root.
    pub fn from_root(root: impl AsRef<Path>) -> Result<Self> {
        let layout = ProjectLayout::new(root);
        let (config, db_path, db) = open_project_db(&layout)?;
        Ok(Self { layout, config, db_path, db })
    }

    /// Scan session using the project's engine settings and stored markings.
    pub fn session(&self) -> Result<ScanSession> {
        let state = self.db.load_marking_state()?;
        Ok(ScanSession::new(self.config.engine.clone()).with_markings(state.ignored, state.markings))
    }
}

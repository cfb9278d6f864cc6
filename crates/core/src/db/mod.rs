//! Project database integration and project layout definitions.
//!
//! The database stores what the engine consumes read-only per scan (which
//! icons are ignored or marked for swap) and the history of scan and
//! consolidation runs.
//!
//! - `ProjectLayout`: computed paths for project directories/files.
//! - `ProjectConfig`: serializable project metadata plus engine settings.
//! - `ProjectDb`: a small SQLite wrapper with versioned migrations.
//! - `ProjectContext`: all of the above opened for one project root.

mod config;
mod context;
mod layout;
mod models;
mod project_db;
mod util;

pub use config::{DbConfig, ProjectConfig};
pub use context::ProjectContext;
pub use layout::ProjectLayout;
pub use models::{ConsolidationRunRecord, MarkingRecord, MarkingState, ScanRunRecord};
pub use project_db::{DbError, DbResult, ProjectDb, CURRENT_SCHEMA_VERSION};
pub use util::{load_project_config, open_project_db, save_project_config};

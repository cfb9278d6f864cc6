use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;

/// Database location, relative to the project root unless absolute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbConfig {
    pub path: String,
}

impl DbConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

/// Serializable configuration describing an iconsweep project.
///
/// Lives at `.iconsweep/project.json` in the project root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Human-friendly project name.
    pub name: String,
    /// Optional description / notes.
    pub description: Option<String>,
    /// Version of the config format.
    pub config_version: String,
    pub db: DbConfig,
    /// Document snapshot used when a command is given none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_document: Option<String>,
    /// Engine thresholds; missing keys fall back to defaults.
    #[serde(default)]
    pub engine: EngineConfig,
}

impl ProjectConfig {
    /// Create a new project configuration using the given name and db path.
    pub fn new(name: impl Into<String>, db_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            config_version: "0.1.0".to_string(),
            db: DbConfig::new(db_path),
            default_document: None,
            engine: EngineConfig::default(),
        }
    }
}

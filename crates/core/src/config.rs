//! Engine tuning parameters.
//!
//! Every threshold the heuristics use lives here. The defaults reproduce the
//! permissive tuning the engine ships with; raising score floors trades missed
//! icons for less noise, lowering them does the opposite.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read engine config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse engine config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Failed to parse engine config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported engine config format '{0}' (expected yaml, yml or json)")]
    UnsupportedFormat(String),
    #[error("Invalid engine config: {0}")]
    Invalid(String),
}

/// Sizes (px) icon sets are conventionally drawn at.
pub const CANONICAL_ICON_SIZES: [f64; 18] = [
    12.0, 14.0, 16.0, 18.0, 20.0, 24.0, 28.0, 32.0, 36.0, 40.0, 44.0, 48.0, 56.0, 64.0, 72.0, 80.0,
    96.0, 128.0,
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub canonical_sizes: Vec<f64>,
    /// Allowed deviation (px) when matching the canonical size table.
    pub size_tolerance: f64,
    pub component_max_size: f64,
    pub component_min_aspect: f64,
    pub component_max_aspect: f64,
    pub component_min_score: f64,
    /// Instances larger than this are rejected unless named like an icon.
    pub instance_max_size: f64,
    pub instance_min_score: f64,
    pub frame_min_aspect: f64,
    pub frame_max_aspect: f64,
    pub frame_max_children: usize,
    pub shape_min_size: f64,
    pub shape_max_size: f64,
    pub shape_min_aspect: f64,
    pub shape_max_aspect: f64,
    /// An ancestor frame at most this large and square-ish claims its shapes.
    pub icon_frame_max_size: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            canonical_sizes: CANONICAL_ICON_SIZES.to_vec(),
            size_tolerance: 2.0,
            component_max_size: 800.0,
            component_min_aspect: 0.05,
            component_max_aspect: 20.0,
            component_min_score: 1.0,
            instance_max_size: 120.0,
            instance_min_score: 1.0,
            frame_min_aspect: 0.75,
            frame_max_aspect: 1.33,
            frame_max_children: 5,
            shape_min_size: 8.0,
            shape_max_size: 200.0,
            shape_min_aspect: 0.5,
            shape_max_aspect: 2.0,
            icon_frame_max_size: 128.0,
        }
    }
}

/// Backpressure caps. Exceeding one truncates input, never aborts a scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub max_pages: usize,
    pub max_candidates: usize,
    pub max_unresolved_per_page: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self { max_pages: 200, max_candidates: 5_000, max_unresolved_per_page: 1_000 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityConfig {
    pub size_weight: f64,
    /// Points lost per pixel of combined width + height difference.
    pub size_penalty_per_px: f64,
    pub aspect_weight: f64,
    pub name_weight: f64,
    /// Flat name score for names from two different icon libraries.
    pub cross_library_bonus: f64,
    pub same_source_bonus: f64,
    pub visual_cap: f64,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            size_weight: 30.0,
            size_penalty_per_px: 2.0,
            aspect_weight: 20.0,
            name_weight: 30.0,
            cross_library_bonus: 5.0,
            same_source_bonus: 20.0,
            visual_cap: 20.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Inclusive similarity needed for a singleton to join a cluster.
    pub merge_threshold: u32,
    /// Grid (px) sizes are rounded to when building exact bucket keys.
    pub size_grid: f64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self { merge_threshold: 70, size_grid: 8.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsolidationConfig {
    /// Page new masters are placed on; created on first use.
    pub library_page_name: String,
    pub grid_columns: usize,
    /// Distance (px) between grid cell origins.
    pub grid_cell: f64,
}

impl Default for ConsolidationConfig {
    fn default() -> Self {
        Self { library_page_name: "Icon Library".into(), grid_columns: 10, grid_cell: 96.0 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub classifier: ClassifierConfig,
    pub discovery: DiscoveryConfig,
    pub similarity: SimilarityConfig,
    pub clustering: ClusterConfig,
    pub consolidation: ConsolidationConfig,
}

impl EngineConfig {
    /// Load from a `.yaml`/`.yml` or `.json` file. Missing keys fall back to defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let body = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
        let config: EngineConfig = match ext {
            "yaml" | "yml" => serde_yaml::from_str(&body)?,
            "json" => serde_json::from_str(&body)?,
            other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let c = &self.classifier;
        if c.canonical_sizes.is_empty() {
            return Err(ConfigError::Invalid("classifier.canonical_sizes must not be empty".into()));
        }
        if c.size_tolerance < 0.0 {
            return Err(ConfigError::Invalid("classifier.size_tolerance must be >= 0".into()));
        }
        for (label, lo, hi) in [
            ("component aspect", c.component_min_aspect, c.component_max_aspect),
            ("frame aspect", c.frame_min_aspect, c.frame_max_aspect),
            ("shape aspect", c.shape_min_aspect, c.shape_max_aspect),
            ("shape size", c.shape_min_size, c.shape_max_size),
        ] {
            if !(lo <= hi) {
                return Err(ConfigError::Invalid(format!(
                    "classifier {label} range is inverted ({lo} > {hi})"
                )));
            }
        }
        if self.clustering.merge_threshold > 100 {
            return Err(ConfigError::Invalid("clustering.merge_threshold must be 0..=100".into()));
        }
        if self.clustering.size_grid <= 0.0 {
            return Err(ConfigError::Invalid("clustering.size_grid must be positive".into()));
        }
        if self.consolidation.grid_columns == 0 {
            return Err(ConfigError::Invalid("consolidation.grid_columns must be positive".into()));
        }
        if self.consolidation.library_page_name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "consolidation.library_page_name is required".into(),
            ));
        }
        Ok(())
    }
}

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use iconsweep_core::config::EngineConfig;
use iconsweep_core::db::{save_project_config, ProjectConfig, ProjectDb, ProjectLayout};
use serde::Serialize;

use crate::commands::{open_project, print_dir_status};
use crate::{canonicalize_or_current, infer_project_name};

#[derive(Serialize)]
pub struct ProjectInfoSnapshot {
    pub name: String,
    pub root: String,
    pub config_file: String,
    pub config_version: String,
    pub db_path: String,
    pub default_document: Option<String>,
    pub layout: ProjectInfoLayout,
    pub markings: usize,
    pub scan_runs: usize,
    pub consolidation_runs: usize,
}

#[derive(Serialize)]
pub struct ProjectInfoLayout {
    pub meta_dir: String,
    pub reports_dir: String,
}

/// Initialize a new project at `root`.
///
/// `engine_config` optionally points at a YAML/JSON file whose settings are
/// embedded into the project config; otherwise the engine defaults are used.
pub fn init_project_command(
    root: &str,
    name: Option<String>,
    document: Option<String>,
    engine_config: Option<&str>,
) -> Result<()> {
    let root_path = canonicalize_or_current(root)?;
    let layout = ProjectLayout::new(&root_path);

    let project_name = match name {
        Some(n) => n,
        None => infer_project_name(&root_path),
    };

    fs::create_dir_all(&layout.meta_dir)
        .with_context(|| format!("Failed to create meta dir: {}", layout.meta_dir.display()))?;
    fs::create_dir_all(&layout.reports_dir).with_context(|| {
        format!("Failed to create reports dir: {}", layout.reports_dir.display())
    })?;

    let mut config = ProjectConfig::new(&project_name, layout.db_path_relative_string());
    config.default_document = document;
    if let Some(path) = engine_config {
        config.engine = EngineConfig::load(Path::new(path))
            .with_context(|| format!("Failed to load engine config from {path}"))?;
    }
    save_project_config(&layout, &config)?;

    ProjectDb::open(&layout.db_path).with_context(|| {
        format!("Failed to initialize project database at {}", layout.db_path.display())
    })?;

    println!("Initialized iconsweep project:");
    println!("  Name: {}", project_name);
    println!("  Root: {}", layout.root.display());
    println!("  Config: {}", layout.project_config_path.display());
    println!("  DB path (relative): {}", config.db.path);
    println!("  Reports dir: {}", layout.reports_dir.display());
    if let Some(doc) = &config.default_document {
        println!("  Default document: {}", doc);
    }

    Ok(())
}

/// Show basic information about an existing project.
pub fn project_info_command(root: &str, json: bool) -> Result<()> {
    let ctx = open_project(root)?;
    let markings = ctx.db.list_markings().context("Failed to list markings")?;
    let scan_runs = ctx.db.list_scan_runs(None).context("Failed to list scan runs")?;
    let consolidation_runs =
        ctx.db.list_consolidation_runs(None).context("Failed to list consolidation runs")?;

    if json {
        let snapshot = ProjectInfoSnapshot {
            name: ctx.config.name.clone(),
            root: ctx.layout.root.display().to_string(),
            config_file: ctx.layout.project_config_path.display().to_string(),
            config_version: ctx.config.config_version.clone(),
            db_path: ctx.config.db.path.clone(),
            default_document: ctx.config.default_document.clone(),
            layout: ProjectInfoLayout {
                meta_dir: ctx.layout.meta_dir.display().to_string(),
                reports_dir: ctx.layout.reports_dir.display().to_string(),
            },
            markings: markings.len(),
            scan_runs: scan_runs.len(),
            consolidation_runs: consolidation_runs.len(),
        };
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    println!("iconsweep Project Info");
    println!("======================");
    println!("Name: {}", ctx.config.name);
    println!("Root: {}", ctx.layout.root.display());
    println!("Config file: {}", ctx.layout.project_config_path.display());
    println!("Config version: {}", ctx.config.config_version);
    println!("DB path (config): {}", ctx.config.db.path);
    if let Some(doc) = &ctx.config.default_document {
        println!("Default document: {}", doc);
    }
    println!();
    println!("Directories:");
    print_dir_status("Meta dir (.iconsweep)", &ctx.layout.meta_dir);
    print_dir_status("Reports dir", &ctx.layout.reports_dir);
    println!();
    println!("Markings: {}", markings.len());
    println!("Scan runs: {}", scan_runs.len());
    println!("Consolidation runs: {}", consolidation_runs.len());
    if let Some(last) = scan_runs.last() {
        println!(
            "Last scan: {} icons, {} inconsistencies ({})",
            last.total_icons, last.inconsistencies, last.finished_at
        );
    }

    Ok(())
}

/// Print the engine settings the project runs with, as JSON or YAML.
///
/// The YAML form can be edited and fed back through `init-project --engine-config`.
pub fn show_config_command(root: &str, yaml: bool) -> Result<()> {
    let ctx = open_project(root)?;
    if yaml {
        print!("{}", serde_yaml::to_string(&ctx.config.engine)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&ctx.config.engine)?);
    }
    Ok(())
}

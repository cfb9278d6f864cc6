use anyhow::{Context, Result};
use iconsweep_core::db::{ConsolidationRunRecord, ScanRunRecord};
use serde::Serialize;

use crate::commands::open_project;

#[derive(Serialize)]
pub struct RunHistory {
    pub scans: Vec<ScanRunRecord>,
    pub consolidations: Vec<ConsolidationRunRecord>,
}

/// List recorded scan and consolidation runs, optionally for one document.
pub fn list_runs_command(root: &str, document: Option<&str>, json: bool) -> Result<()> {
    let ctx = open_project(root)?;
    let history = RunHistory {
        scans: ctx.db.list_scan_runs(document).context("Failed to list scan runs")?,
        consolidations: ctx
            .db
            .list_consolidation_runs(document)
            .context("Failed to list consolidation runs")?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&history)?);
        return Ok(());
    }

    if history.scans.is_empty() && history.consolidations.is_empty() {
        println!("No runs recorded.");
        return Ok(());
    }

    println!("Scan runs:");
    for run in &history.scans {
        println!(
            "- {} {}: {} icons, {} inconsistencies, {} ignored",
            run.finished_at, run.document, run.total_icons, run.inconsistencies, run.ignored_count
        );
    }
    println!("Consolidation runs:");
    for run in &history.consolidations {
        println!(
            "- {} {} [{}]: {} created, {} replaced, {} pages, {} failed",
            run.finished_at,
            run.document,
            run.scope,
            run.components_created,
            run.icons_replaced,
            run.pages_affected,
            run.failed_operations
        );
    }
    Ok(())
}

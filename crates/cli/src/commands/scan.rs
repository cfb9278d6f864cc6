use anyhow::{Context, Result};
use iconsweep_core::db::{ProjectContext, ScanRunRecord};
use iconsweep_core::services::{ScanResult, ScanSession};
use tracing::info;

use crate::commands::{
    load_document, now_rfc3339, open_project, resolve_document, write_report, LoadedDocument,
};

/// Scan a loaded document with the project's session and record the run.
pub fn record_scan(
    ctx: &ProjectContext,
    session: &ScanSession,
    document: &LoadedDocument,
) -> Result<ScanResult> {
    let started_at = now_rfc3339();
    let result = session
        .scan(&document.tree)
        .with_context(|| format!("Scan failed for {}", document.path.display()))?;
    let finished_at = now_rfc3339();

    let label = document.label(&ctx.layout);
    ctx.db
        .insert_scan_run(&ScanRunRecord {
            document: label.clone(),
            document_hash: Some(document.hash.clone()),
            total_icons: result.total_icons as i64,
            inconsistencies: result.inconsistencies as i64,
            ignored_count: result.ignored_count.unwrap_or(0) as i64,
            started_at,
            finished_at,
        })
        .context("Failed to record scan run")?;
    info!(document = %label, icons = result.total_icons, "recorded scan run");
    Ok(result)
}

/// Discover icons in a document, write `reports/<doc>.scan.json` and print a summary.
pub fn scan_command(
    root: &str,
    document: Option<&str>,
    page: Option<String>,
    json: bool,
) -> Result<()> {
    let ctx = open_project(root)?;
    let path = resolve_document(&ctx, document)?;
    let loaded = load_document(&path)?;

    let mut session = ctx.session()?;
    session.set_current_page(page);
    let result = record_scan(&ctx, &session, &loaded)?;
    let report = write_report(&ctx.layout, &loaded.label(&ctx.layout), "scan", &result)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("Scanned {}", loaded.path.display());
    println!("  Icons: {}", result.total_icons);
    println!("  Inconsistencies: {}", result.inconsistencies);
    if let Some(ignored) = result.ignored_count {
        println!("  Ignored: {}", ignored);
    }
    for icon in result.discovered_icons.iter().filter(|c| c.has_inconsistency) {
        println!(
            "  - {} [{}] on {}: {}",
            icon.name,
            icon.node_id,
            icon.page,
            icon.inconsistency_reasons.join("; ")
        );
    }
    println!("Report: {}", report.display());
    Ok(())
}

use std::path::PathBuf;

use anyhow::{Context, Result};
use iconsweep_core::db::ConsolidationRunRecord;
use iconsweep_core::services::{ConsolidationResult, LibraryDuplicatesResult, Progress};
use tracing::info;

use crate::commands::{
    load_document, now_rfc3339, open_project, record_scan, resolve_document, validate_scope,
    write_document, write_report,
};

/// Scan a document, then turn every cluster of unresolved icons into a
/// master on the library page with instances in place of the originals.
///
/// The rewritten document goes to `output`, or back over the input.
pub fn consolidate_command(
    root: &str,
    document: Option<&str>,
    scope: &str,
    page: Option<String>,
    output: Option<&str>,
    json: bool,
) -> Result<()> {
    let scope = validate_scope(scope)?;
    let ctx = open_project(root)?;
    let path = resolve_document(&ctx, document)?;
    let mut loaded = load_document(&path)?;

    let mut session = ctx.session()?;
    session.set_current_page(page.clone());
    let scan = record_scan(&ctx, &session, &loaded)?;

    let started_at = now_rfc3339();
    let mut report_progress = |p: Progress| info!(percentage = p.percentage, "{}", p.message);
    let result = session
        .consolidate(
            &mut loaded.tree,
            &scan.discovered_icons,
            scope,
            page.as_deref(),
            &mut report_progress,
        )
        .context("Consolidation failed")?;
    let finished_at = now_rfc3339();

    let target = output.map(PathBuf::from).unwrap_or_else(|| loaded.path.clone());
    write_document(&target, &loaded.tree)?;

    let label = loaded.label(&ctx.layout);
    ctx.db
        .insert_consolidation_run(&ConsolidationRunRecord {
            document: label.clone(),
            scope: scope.as_str().to_string(),
            components_created: result.components_created as i64,
            icons_replaced: result.icons_replaced as i64,
            pages_affected: result.pages_affected as i64,
            failed_operations: result.failed_operations as i64,
            started_at,
            finished_at,
        })
        .context("Failed to record consolidation run")?;
    let report = write_report(&ctx.layout, &label, "consolidation", &result)?;

    print_consolidation(&result, json)?;
    if !json {
        println!("Document: {}", target.display());
        println!("Report: {}", report.display());
    }
    Ok(())
}

fn print_consolidation(result: &ConsolidationResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }
    println!("{}", result.message);
    println!("  Components created: {}", result.components_created);
    println!("  Icons replaced: {}", result.icons_replaced);
    println!("  Pages affected: {}", result.pages_affected);
    println!("  Failed operations: {}", result.failed_operations);
    Ok(())
}

/// Merge masters on `page` that share a normalized name and size.
pub fn consolidate_library_command(
    root: &str,
    document: Option<&str>,
    page: &str,
    output: Option<&str>,
    json: bool,
) -> Result<()> {
    let ctx = open_project(root)?;
    let path = resolve_document(&ctx, document)?;
    let mut loaded = load_document(&path)?;

    let mut session = ctx.session()?;
    session.set_current_page(Some(page.to_string()));
    let scan = record_scan(&ctx, &session, &loaded)?;
    let started_at = now_rfc3339();
    let result =
        session.consolidate_library_duplicates(&mut loaded.tree, &scan.discovered_icons, page);
    let finished_at = now_rfc3339();

    let target = output.map(PathBuf::from).unwrap_or_else(|| loaded.path.clone());
    write_document(&target, &loaded.tree)?;

    // Removed duplicates are counted as replaced icons; nothing new is created.
    let label = loaded.label(&ctx.layout);
    ctx.db
        .insert_consolidation_run(&ConsolidationRunRecord {
            document: label.clone(),
            scope: "library-duplicates".to_string(),
            components_created: 0,
            icons_replaced: result.duplicates_removed as i64,
            pages_affected: i64::from(result.duplicates_removed > 0),
            failed_operations: result.errors as i64,
            started_at,
            finished_at,
        })
        .context("Failed to record library consolidation run")?;
    write_report(&ctx.layout, &label, "library", &result)?;

    print_library(&result, json)
}

fn print_library(result: &LibraryDuplicatesResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }
    println!("{}", result.message);
    for detail in &result.error_details {
        println!("  ! {}", detail);
    }
    Ok(())
}

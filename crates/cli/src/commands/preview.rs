use std::fs;

use anyhow::{anyhow, Context, Result};
use iconsweep_core::model::NodeId;

use crate::commands::{load_document, open_project, resolve_document};

/// Render the SVG preview of a node to `output`, or to stdout.
pub fn preview_command(
    root: &str,
    document: Option<&str>,
    node_id: &str,
    output: Option<&str>,
) -> Result<()> {
    let ctx = open_project(root)?;
    let path = resolve_document(&ctx, document)?;
    let loaded = load_document(&path)?;
    let session = ctx.session()?;

    let svg = session
        .preview(&loaded.tree, &NodeId::new(node_id))
        .with_context(|| format!("Failed to export preview for {node_id}"))?
        .ok_or_else(|| anyhow!("Node {node_id} has no bounding box to preview"))?;

    match output {
        Some(out) => {
            fs::write(out, &svg).with_context(|| format!("Failed to write preview: {out}"))?;
            println!("Wrote preview for {} to {}", node_id, out);
        }
        None => println!("{}", svg),
    }
    Ok(())
}

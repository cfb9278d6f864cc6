use anyhow::{anyhow, Context, Result};
use iconsweep_core::model::Marking;

use crate::commands::{now_rfc3339, open_project};

/// Set or clear the marking of one node.
///
/// Flags not given keep their stored value; `clear` removes the row.
pub fn mark_command(
    root: &str,
    node_id: &str,
    ignore: Option<bool>,
    swap: Option<bool>,
    clear: bool,
) -> Result<()> {
    let ctx = open_project(root)?;

    if clear {
        let removed = ctx.db.clear_marking(node_id).context("Failed to clear marking")?;
        if removed {
            println!("Cleared marking for {}", node_id);
        } else {
            println!("No marking stored for {}", node_id);
        }
        return Ok(());
    }

    if ignore.is_none() && swap.is_none() {
        return Err(anyhow!("Nothing to mark: pass --ignore, --swap or --clear"));
    }

    let current =
        ctx.db.get_marking(node_id).context("Failed to read marking")?.unwrap_or_default();
    let marking = Marking {
        is_ignored: ignore.unwrap_or(current.is_ignored),
        is_marked_for_swap: swap.unwrap_or(current.is_marked_for_swap),
    };
    ctx.db.set_marking(node_id, marking, &now_rfc3339()).context("Failed to store marking")?;

    println!(
        "Marked {}: ignored={} swap={}",
        node_id, marking.is_ignored, marking.is_marked_for_swap
    );
    Ok(())
}

pub fn list_markings_command(root: &str, json: bool) -> Result<()> {
    let ctx = open_project(root)?;
    let markings = ctx.db.list_markings().context("Failed to list markings")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&markings)?);
        return Ok(());
    }

    if markings.is_empty() {
        println!("No markings.");
        return Ok(());
    }
    println!("Markings:");
    for m in markings {
        let mut flags = Vec::new();
        if m.is_ignored {
            flags.push("ignored");
        }
        if m.is_marked_for_swap {
            flags.push("swap");
        }
        let flags = if flags.is_empty() { "(none)".to_string() } else { flags.join(", ") };
        println!("- {} [{}] updated {}", m.node_id, flags, m.updated_at);
    }
    Ok(())
}

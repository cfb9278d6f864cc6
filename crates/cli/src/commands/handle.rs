use std::fs;
use std::io::Read;

use anyhow::{Context, Result};
use iconsweep_core::services::{Request, Response, ScanSession};
use iconsweep_core::tree::DocumentTree;

use crate::commands::{load_document, open_project, resolve_document, write_document};

/// Run one host request against a tree. Returns every response in emission
/// order; the last one is the final result.
pub fn handle_request(
    session: &mut ScanSession,
    tree: &mut DocumentTree,
    request: &str,
) -> Result<Vec<Response>> {
    let request: Request = serde_json::from_str(request).context("Failed to parse request JSON")?;
    let mut responses = Vec::new();
    let last = session.handle(tree, request, &mut |event| responses.push(event));
    responses.push(last);
    Ok(responses)
}

/// Read a JSON request from `request` (a file, or `-` for stdin), print each
/// response as one JSON line and save the document if the request changed it.
pub fn handle_command(
    root: &str,
    document: Option<&str>,
    request: &str,
    write_back: bool,
) -> Result<()> {
    let ctx = open_project(root)?;
    let path = resolve_document(&ctx, document)?;
    let mut loaded = load_document(&path)?;
    let mut session = ctx.session()?;

    let body = if request == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).context("Failed to read request from stdin")?;
        buf
    } else {
        fs::read_to_string(request)
            .with_context(|| format!("Failed to read request file: {request}"))?
    };
    let mutates = matches!(
        serde_json::from_str::<Request>(&body),
        Ok(Request::Consolidate { .. } | Request::ConsolidateLibraryDuplicates { .. })
    );

    let responses = handle_request(&mut session, &mut loaded.tree, &body)?;
    for response in &responses {
        println!("{}", serde_json::to_string(response)?);
    }

    let failed = responses.last().is_some_and(Response::is_error);
    if mutates && write_back && !failed {
        write_document(&loaded.path, &loaded.tree)?;
    }
    Ok(())
}

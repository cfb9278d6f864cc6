//! Three-phase discovery over every live page.
//!
//! 1. Masters: components and component sets (plus qualifying variants).
//! 2. Instances: accepted only when their main component is a known master.
//! 3. Unresolved: frames, groups and shapes outside any master or instance.
//!
//! Phase 2 starts only after phase 1 has visited every page, since an
//! instance's master may live on a later page.

use std::collections::HashSet;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::analysis::classify::{NodeClassifier, NodeSnapshot};
use crate::analysis::names;
use crate::config::DiscoveryConfig;
use crate::model::{Candidate, CandidateStatus, NodeId, NodeKind, TreeNode};
use crate::tree::{descendants, TreeAccess, TreeError};

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Failed to enumerate pages: {0}")]
    Pages(#[source] TreeError),
}

/// Result of a discovery run.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryOutcome {
    pub candidates: Vec<Candidate>,
    /// Every accepted component, component set and qualifying variant.
    pub master_ids: HashSet<NodeId>,
    pub pages_scanned: usize,
    pub archived_pages: Vec<String>,
    /// Set when any cap cut input short.
    pub truncated: bool,
}

/// Page names that mark archived content.
pub fn is_archive_page(name: &str) -> bool {
    if name.contains('\u{1F5C4}') || name.contains('\u{1F5C3}') {
        return true;
    }
    names::tokens(name).iter().any(|t| {
        matches!(t.as_str(), "archive" | "archived" | "archives" | "old" | "backup" | "backups")
    })
}

/// Folder-style prefixes that group icons without naming a library.
const CATEGORY_PREFIXES: &[&str] =
    &["icon", "icons", "ic", "glyph", "glyphs", "symbol", "symbols"];

fn library_of(name: &str) -> Option<String> {
    let (prefix, _) = names::split_library(name)?;
    let lib = prefix.to_lowercase();
    (!CATEGORY_PREFIXES.contains(&lib.as_str())).then_some(lib)
}

/// Library a node's icon comes from: its own `lib/name` prefix, else its
/// master's, else `local`. `icon/`-style category folders count as local.
pub fn candidate_source(name: &str, master_name: Option<&str>) -> String {
    library_of(name)
        .or_else(|| master_name.and_then(library_of))
        .unwrap_or_else(|| "local".to_string())
}

struct Page {
    id: NodeId,
    name: String,
}

pub struct DiscoveryPipeline<'a> {
    classifier: &'a NodeClassifier,
    caps: &'a DiscoveryConfig,
}

impl<'a> DiscoveryPipeline<'a> {
    pub fn new(classifier: &'a NodeClassifier, caps: &'a DiscoveryConfig) -> Self {
        Self { classifier, caps }
    }

    pub fn run<T>(&self, tree: &T) -> Result<DiscoveryOutcome, ScanError>
    where
        T: TreeAccess + ?Sized,
    {
        let mut outcome = DiscoveryOutcome::default();
        let pages = self.live_pages(tree, &mut outcome)?;
        outcome.pages_scanned = pages.len();

        self.master_phase(tree, &pages, &mut outcome);
        info!(
            masters = outcome.master_ids.len(),
            candidates = outcome.candidates.len(),
            "discovery: master phase complete"
        );

        let before = outcome.candidates.len();
        self.instance_phase(tree, &pages, &mut outcome);
        info!(instances = outcome.candidates.len() - before, "discovery: instance phase complete");

        let before = outcome.candidates.len();
        self.unresolved_phase(tree, &pages, &mut outcome);
        info!(
            unresolved = outcome.candidates.len() - before,
            truncated = outcome.truncated,
            "discovery: unresolved phase complete"
        );

        Ok(outcome)
    }

    fn live_pages<T>(&self, tree: &T, outcome: &mut DiscoveryOutcome) -> Result<Vec<Page>, ScanError>
    where
        T: TreeAccess + ?Sized,
    {
        let ids = tree.pages().map_err(ScanError::Pages)?;
        let mut pages = Vec::new();
        for id in ids {
            let page = match tree.node(&id) {
                Ok(page) => page,
                Err(err) => {
                    warn!(page = %id, error = %err, "skipping unreadable page");
                    continue;
                }
            };
            if is_archive_page(&page.name) {
                debug!(page = %page.name, "skipping archived page");
                outcome.archived_pages.push(page.name.clone());
                continue;
            }
            pages.push(Page { id, name: page.name.clone() });
        }
        if pages.len() > self.caps.max_pages {
            pages.truncate(self.caps.max_pages);
            outcome.truncated = true;
        }
        Ok(pages)
    }

    fn push(&self, outcome: &mut DiscoveryOutcome, candidate: Candidate) {
        if outcome.candidates.len() >= self.caps.max_candidates {
            outcome.truncated = true;
            return;
        }
        outcome.candidates.push(candidate);
    }

    fn master_phase<T>(&self, tree: &T, pages: &[Page], outcome: &mut DiscoveryOutcome)
    where
        T: TreeAccess + ?Sized,
    {
        for page in pages {
            let Ok(ids) = descendants(tree, &page.id) else {
                continue;
            };
            for id in ids {
                let Ok(node) = tree.node(&id) else {
                    continue;
                };
                if !matches!(node.kind, NodeKind::Component | NodeKind::ComponentSet) {
                    continue;
                }
                // Variants are judged through their set.
                let is_variant = node.kind == NodeKind::Component
                    && parent_kind(tree, node) == Some(NodeKind::ComponentSet);
                if is_variant {
                    continue;
                }
                let Ok(snapshot) = NodeSnapshot::capture(tree, &id) else {
                    continue;
                };
                let verdict = self.classifier.classify(&snapshot);
                debug!(
                    node = %id,
                    name = %node.name,
                    score = verdict.score,
                    accepted = verdict.is_icon,
                    "master phase"
                );
                if !verdict.is_icon {
                    continue;
                }
                outcome.master_ids.insert(id.clone());
                if node.kind == NodeKind::ComponentSet {
                    for variant in &snapshot.children {
                        if variant.kind == NodeKind::Component
                            && self.classifier.passes_component_gates(variant.bounds)
                        {
                            outcome.master_ids.insert(variant.id.clone());
                        }
                    }
                }
                let candidate = build_candidate(
                    &snapshot,
                    &page.name,
                    CandidateStatus::Master,
                    None,
                    verdict.score,
                    candidate_source(&node.name, None),
                );
                self.push(outcome, candidate);
            }
        }
    }

    fn instance_phase<T>(&self, tree: &T, pages: &[Page], outcome: &mut DiscoveryOutcome)
    where
        T: TreeAccess + ?Sized,
    {
        for page in pages {
            let Ok(ids) = descendants(tree, &page.id) else {
                continue;
            };
            for id in ids {
                let Ok(node) = tree.node(&id) else {
                    continue;
                };
                if node.kind != NodeKind::Instance {
                    continue;
                }
                let master = match tree.resolve_main_component(&id) {
                    Ok(Some(master)) => master,
                    Ok(None) => continue,
                    Err(err) => {
                        debug!(node = %id, error = %err, "could not resolve main component");
                        continue;
                    }
                };
                if !outcome.master_ids.contains(&master) {
                    continue;
                }
                let Ok(snapshot) = NodeSnapshot::capture(tree, &id) else {
                    continue;
                };
                let verdict = self.classifier.classify(&snapshot);
                let master_name = tree.node(&master).ok().map(|m| m.name.as_str());
                let candidate = build_candidate(
                    &snapshot,
                    &page.name,
                    CandidateStatus::Instance,
                    Some(master.clone()),
                    verdict.score,
                    candidate_source(&node.name, master_name),
                );
                self.push(outcome, candidate);
            }
        }
    }

    fn unresolved_phase<T>(&self, tree: &T, pages: &[Page], outcome: &mut DiscoveryOutcome)
    where
        T: TreeAccess + ?Sized,
    {
        for page in pages {
            let Ok(ids) = descendants(tree, &page.id) else {
                continue;
            };
            let mut pending: Vec<NodeId> = ids
                .into_iter()
                .filter(|id| {
                    tree.node(id).is_ok_and(|n| {
                        matches!(
                            n.kind,
                            NodeKind::Frame
                                | NodeKind::Group
                                | NodeKind::Vector
                                | NodeKind::BooleanOperation
                        )
                    })
                })
                .collect();
            if pending.len() > self.caps.max_unresolved_per_page {
                pending.truncate(self.caps.max_unresolved_per_page);
                outcome.truncated = true;
            }

            let mut accepted: HashSet<NodeId> = HashSet::new();
            for id in pending {
                let Ok(snapshot) = NodeSnapshot::capture(tree, &id) else {
                    continue;
                };
                let enclosed = snapshot.ancestors.iter().any(|a| {
                    a.kind == NodeKind::Instance
                        || outcome.master_ids.contains(&a.id)
                        || accepted.contains(&a.id)
                });
                if enclosed {
                    continue;
                }
                let verdict = self.classifier.classify(&snapshot);
                if !verdict.is_icon {
                    continue;
                }
                debug!(
                    node = %id,
                    name = %snapshot.node.name,
                    score = verdict.score,
                    "unresolved icon"
                );
                accepted.insert(id.clone());
                let candidate = build_candidate(
                    &snapshot,
                    &page.name,
                    CandidateStatus::Unresolved,
                    None,
                    verdict.score,
                    candidate_source(&snapshot.node.name, None),
                );
                self.push(outcome, candidate);
            }
        }
    }
}

fn parent_kind<T>(tree: &T, node: &TreeNode) -> Option<NodeKind>
where
    T: TreeAccess + ?Sized,
{
    node.parent.as_ref().and_then(|p| tree.node(p).ok()).map(|p| p.kind)
}

fn build_candidate(
    snapshot: &NodeSnapshot<'_>,
    page: &str,
    status: CandidateStatus,
    master_id: Option<NodeId>,
    score: f64,
    source: String,
) -> Candidate {
    let node = snapshot.node;
    let (width, height) = node.bounds.map(|b| (b.width, b.height)).unwrap_or((0.0, 0.0));
    let frame_context = snapshot
        .ancestors
        .first()
        .filter(|parent| parent.kind != NodeKind::Page)
        .map(|parent| parent.name.clone());
    Candidate {
        node_id: node.id.clone(),
        name: node.name.clone(),
        kind: node.kind,
        width,
        height,
        page: page.to_string(),
        frame_context,
        source,
        status,
        master_id,
        score,
        has_inconsistency: false,
        inconsistency_reasons: Vec::new(),
        is_marked_for_swap: false,
    }
}

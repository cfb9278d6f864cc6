//! Rewrite duplicate clusters into one master plus reference instances.
//!
//! Per cluster the order is fixed: clone the representative, build the
//! master on the library page, and only then touch the original nodes. Each
//! member rewrite fails independently; a failed member is deleted best-effort
//! and counted, and the batch continues. Members whose node no longer has its
//! scanned kind are counted as failed and never touched.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::analysis::names;
use crate::config::ConsolidationConfig;
use crate::model::{Candidate, CandidateStatus, DuplicateGroup, NodeId, NodeKind, Transform};
use crate::tree::{descendants, expect_kind, sibling_index, TreeAccess, TreeError, TreeResult};

/// Node kinds an unresolved icon can have. Anything else behind a stored id
/// means the node changed after the scan.
const REWRITABLE_KINDS: &[NodeKind] =
    &[NodeKind::Frame, NodeKind::Group, NodeKind::Vector, NodeKind::BooleanOperation];

/// Result of consolidating one cluster.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterOutcome {
    /// At least one member was replaced.
    pub success: bool,
    /// The new master, unless it was never built or was rolled back.
    pub master_id: Option<NodeId>,
    pub icons_replaced: usize,
    pub pages_affected: BTreeSet<String>,
    pub failed_operations: usize,
}

/// Result of merging duplicate masters on one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryOutcome {
    pub duplicates_removed: usize,
    pub instances_rewritten: usize,
    pub error_details: Vec<String>,
}

/// Member that becomes the new master: longest name, with a bonus for
/// names that say `icon`. Ties go to the earliest member.
pub fn choose_representative(members: &[Candidate]) -> Option<&Candidate> {
    let weight = |c: &Candidate| {
        let bonus = if c.name.to_lowercase().contains("icon") { 10 } else { 0 };
        c.name.chars().count() + bonus
    };
    members.iter().fold(None, |best: Option<&Candidate>, c| match best {
        Some(b) if weight(b) >= weight(c) => Some(b),
        _ => Some(c),
    })
}

/// Name for a new master built from `representative`.
pub fn master_name(representative: &Candidate) -> String {
    let cleaned = names::strip_copy_suffix(&representative.name);
    if cleaned.is_empty() {
        "icon".to_string()
    } else {
        cleaned.to_string()
    }
}

pub struct ConsolidationTransaction<'a> {
    config: &'a ConsolidationConfig,
}

impl<'a> ConsolidationTransaction<'a> {
    pub fn new(config: &'a ConsolidationConfig) -> Self {
        Self { config }
    }

    /// Page masters are placed on; created on first use.
    pub fn library_page<T: TreeAccess + ?Sized>(&self, tree: &mut T) -> TreeResult<NodeId> {
        for id in tree.pages()? {
            if tree.node(&id).is_ok_and(|p| p.name == self.config.library_page_name) {
                return Ok(id);
            }
        }
        info!(page = %self.config.library_page_name, "creating library page");
        tree.create_page(&self.config.library_page_name)
    }

    /// Grid origin for the `index`-th master on the library page.
    pub fn grid_position(&self, index: usize) -> (f64, f64) {
        let columns = self.config.grid_columns.max(1);
        let col = index % columns;
        let row = index / columns;
        (col as f64 * self.config.grid_cell, row as f64 * self.config.grid_cell)
    }

    /// Consolidate one cluster. Never fails as a whole: setup errors leave
    /// every member untouched and are reported as failed operations.
    pub fn consolidate<T: TreeAccess + ?Sized>(
        &self,
        tree: &mut T,
        group: &DuplicateGroup,
    ) -> ClusterOutcome {
        let mut outcome = ClusterOutcome::default();
        let mut live = Vec::with_capacity(group.members.len());
        for member in &group.members {
            match check_member(&*tree, member) {
                Ok(()) => live.push(member.clone()),
                Err(err) => {
                    warn!(node = %member.node_id, error = %err, "stale member skipped");
                    outcome.failed_operations += 1;
                }
            }
        }
        let Some(representative) = choose_representative(&live) else {
            return outcome;
        };

        let master = match self.build_master(tree, representative) {
            Ok(master) => master,
            Err(err) => {
                warn!(
                    cluster = %group.key,
                    representative = %representative.node_id,
                    error = %err,
                    "could not build master; cluster left untouched"
                );
                outcome.failed_operations += live.len();
                return outcome;
            }
        };

        for member in &live {
            // Earlier rewrites in this cluster may have changed the tree.
            if let Err(err) = check_member(&*tree, member) {
                warn!(node = %member.node_id, error = %err, "stale member skipped");
                outcome.failed_operations += 1;
                continue;
            }
            let rewritten = if member.node_id == representative.node_id {
                consume_source(tree, &member.node_id)
            } else {
                rewrite_as_instance(tree, &member.node_id, &master)
            };
            match rewritten {
                Ok(()) => {
                    outcome.icons_replaced += 1;
                    outcome.pages_affected.insert(member.page.clone());
                }
                Err(err) => {
                    warn!(node = %member.node_id, error = %err, "member rewrite failed");
                    if let Err(cleanup) = tree.delete_node(&member.node_id) {
                        debug!(node = %member.node_id, error = %cleanup, "fallback delete failed");
                    }
                    outcome.failed_operations += 1;
                }
            }
        }

        outcome.success = outcome.icons_replaced > 0;
        if outcome.success {
            outcome.master_id = Some(master);
        } else {
            warn!(master = %master, cluster = %group.key, "no member replaced; removing master");
            if let Err(err) = tree.delete_node(&master) {
                debug!(master = %master, error = %err, "rollback delete failed");
            }
        }
        outcome
    }

    fn build_master<T: TreeAccess + ?Sized>(
        &self,
        tree: &mut T,
        representative: &Candidate,
    ) -> TreeResult<NodeId> {
        tree.node(&representative.node_id)?;
        let clone = tree.clone_subtree(&representative.node_id)?;
        match self.wrap_clone(tree, &clone, representative) {
            Ok(master) => Ok(master),
            Err(err) => {
                let _ = tree.delete_node(&clone);
                Err(err)
            }
        }
    }

    fn wrap_clone<T: TreeAccess + ?Sized>(
        &self,
        tree: &mut T,
        clone: &NodeId,
        representative: &Candidate,
    ) -> TreeResult<NodeId> {
        let library = self.library_page(tree)?;
        let slot = tree
            .node(&library)?
            .children
            .iter()
            .filter(|id| {
                tree.node(id)
                    .is_ok_and(|n| matches!(n.kind, NodeKind::Component | NodeKind::ComponentSet))
            })
            .count();

        let master = tree.create_master_container(&library, &master_name(representative))?;
        if let Err(err) = self.place_master(tree, &master, clone, slot) {
            let _ = tree.delete_node(&master);
            return Err(err);
        }
        debug!(master = %master, slot, "master created");
        Ok(master)
    }

    /// Size the master to the clone, put the clone at its origin and move
    /// the master into grid slot `slot`.
    fn place_master<T: TreeAccess + ?Sized>(
        &self,
        tree: &mut T,
        master: &NodeId,
        clone: &NodeId,
        slot: usize,
    ) -> TreeResult<()> {
        let cloned = tree.node(clone)?;
        let bounds = cloned.bounds;
        let inner = Transform { x: 0.0, y: 0.0, ..cloned.transform };
        if let Some(bounds) = bounds {
            tree.resize(master, bounds)?;
        }
        tree.insert_at_index(master, 0, clone)?;
        tree.set_transform(clone, inner)?;
        let (x, y) = self.grid_position(slot);
        tree.set_transform(master, Transform { x, y, ..Transform::default() })
    }

    /// Merge duplicate masters on `page`: same normalized name and exact
    /// size. Instances of each duplicate are repointed at the kept master,
    /// then the duplicate is deleted. A duplicate whose instances could not
    /// all be rewritten is kept so those instances stay valid.
    pub fn merge_library_duplicates<T: TreeAccess + ?Sized>(
        &self,
        tree: &mut T,
        icons: &[Candidate],
        page: &str,
    ) -> LibraryOutcome {
        let mut outcome = LibraryOutcome::default();
        let mut order: Vec<String> = Vec::new();
        let mut groups: HashMap<String, Vec<Candidate>> = HashMap::new();
        let mergeable = |c: &&Candidate| {
            c.status == CandidateStatus::Master && c.kind != NodeKind::ComponentSet && c.page == page
        };
        for icon in icons.iter().filter(mergeable) {
            let key = format!(
                "{}|{}x{}",
                names::normalized_pattern(&icon.name),
                (icon.width * 100.0).round() as i64,
                (icon.height * 100.0).round() as i64
            );
            groups
                .entry(key.clone())
                .or_insert_with(|| {
                    order.push(key);
                    Vec::new()
                })
                .push(icon.clone());
        }

        for key in order {
            let Some(members) = groups.remove(&key) else {
                continue;
            };
            if members.len() < 2 {
                continue;
            }
            let Some(keep) = choose_representative(&members).map(|c| c.node_id.clone()) else {
                continue;
            };
            if let Err(err) = expect_kind(&*tree, &keep, &[NodeKind::Component]) {
                outcome.error_details.push(format!("kept master {keep}: {err}"));
                continue;
            }
            for duplicate in members.iter().filter(|m| m.node_id != keep) {
                self.merge_one(tree, &duplicate.node_id, &keep, &mut outcome);
            }
        }
        outcome
    }

    fn merge_one<T: TreeAccess + ?Sized>(
        &self,
        tree: &mut T,
        duplicate: &NodeId,
        keep: &NodeId,
        outcome: &mut LibraryOutcome,
    ) {
        if let Err(err) = expect_kind(&*tree, duplicate, &[NodeKind::Component]) {
            outcome.error_details.push(format!("duplicate {duplicate}: {err}"));
            return;
        }
        let instances = match instances_of(&*tree, duplicate) {
            Ok(instances) => instances,
            Err(err) => {
                outcome.error_details.push(format!("duplicate {duplicate}: {err}"));
                return;
            }
        };
        let mut clean = true;
        for instance in instances {
            match rewrite_as_instance(tree, &instance, keep) {
                Ok(()) => outcome.instances_rewritten += 1,
                Err(err) => {
                    warn!(instance = %instance, error = %err, "instance repoint failed");
                    outcome.error_details.push(format!("instance {instance}: {err}"));
                    clean = false;
                }
            }
        }
        if !clean {
            return;
        }
        match tree.delete_node(duplicate) {
            Ok(()) => outcome.duplicates_removed += 1,
            Err(err) => outcome.error_details.push(format!("duplicate {duplicate}: {err}")),
        }
    }
}

/// The member's node still exists and is still the kind it was scanned as.
fn check_member<T: TreeAccess + ?Sized>(tree: &T, member: &Candidate) -> TreeResult<()> {
    if !REWRITABLE_KINDS.contains(&member.kind) {
        return Err(TreeError::Inaccessible {
            id: member.node_id.clone(),
            reason: format!("{} nodes are not consolidated", member.kind),
        });
    }
    expect_kind(tree, &member.node_id, &[member.kind]).map(|_| ())
}

/// The representative's own node has been cloned into the master.
fn consume_source<T: TreeAccess + ?Sized>(tree: &mut T, id: &NodeId) -> TreeResult<()> {
    tree.node(id)?;
    tree.delete_node(id)
}

/// Replace `original` with a fresh instance of `master` at the same sibling
/// index, carrying over position, rotation, opacity and visibility.
fn rewrite_as_instance<T: TreeAccess + ?Sized>(
    tree: &mut T,
    original: &NodeId,
    master: &NodeId,
) -> TreeResult<()> {
    let transform = tree.node(original)?.transform;
    let (parent, index) = sibling_index(&*tree, original)?;
    expect_kind(&*tree, master, &[NodeKind::Component])?;
    let instance = tree.create_reference_instance(master)?;
    let placed = tree
        .set_transform(&instance, transform)
        .and_then(|_| tree.insert_at_index(&parent, index, &instance));
    if let Err(err) = placed {
        let _ = tree.delete_node(&instance);
        return Err(err);
    }
    tree.delete_node(original)
}

/// Instances anywhere in the document whose main component is `master`.
pub fn instances_of<T: TreeAccess + ?Sized>(tree: &T, master: &NodeId) -> TreeResult<Vec<NodeId>> {
    let mut found = Vec::new();
    for page in tree.pages()? {
        for id in descendants(tree, &page)? {
            let is_instance = tree.node(&id).is_ok_and(|n| n.kind == NodeKind::Instance);
            if is_instance && tree.resolve_main_component(&id).ok().flatten().as_ref() == Some(master)
            {
                found.push(id);
            }
        }
    }
    Ok(found)
}

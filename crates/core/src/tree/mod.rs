//! Document tree access.
//!
//! The engine never owns the document. It talks to it through [`TreeAccess`],
//! the tree mutation interface, which a host implements over its live
//! document. [`DocumentTree`] is the in-process arena implementation used by
//! the CLI and tests.
//!
//! Every stored [`NodeId`] is treated as possibly stale: each call
//! re-validates the ids it is given and reports [`TreeError`] instead of
//! acting on a node that is gone or of the wrong kind.

mod document;
mod preview;

pub use document::{Document, DocumentNode, DocumentTree};
pub use preview::render_preview_svg;

use thiserror::Error;

use crate::model::{BoundingBox, NodeId, NodeKind, Transform, TreeNode};

/// Failure taxonomy for tree access.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TreeError {
    /// The id no longer resolves.
    #[error("node {0} not found")]
    NotFound(NodeId),

    /// The node resolves but its properties cannot be used.
    #[error("node {id} is inaccessible: {reason}")]
    Inaccessible { id: NodeId, reason: String },

    /// The parent is missing or cannot accept children.
    #[error("invalid parent {id}: {reason}")]
    InvalidParent { id: NodeId, reason: String },

    #[error("failed to clone {id}: {reason}")]
    CloneFailure { id: NodeId, reason: String },

    #[error("failed to export preview of {id}: {reason}")]
    ExportFailure { id: NodeId, reason: String },

    /// Raised while loading a document that reuses an id.
    #[error("duplicate node id {0} in document")]
    DuplicateId(NodeId),
}

pub type TreeResult<T> = Result<T, TreeError>;

/// Tree mutation interface consumed by discovery and consolidation.
///
/// All calls are synchronous; the engine is single-threaded and sequences
/// every mutation, so implementations need no locking.
pub trait TreeAccess {
    /// Top-level pages in document order.
    fn pages(&self) -> TreeResult<Vec<NodeId>>;

    /// Look a node up by id.
    fn node(&self, id: &NodeId) -> TreeResult<&TreeNode>;

    /// Resolve an instance to its main component, `None` when the master is
    /// not part of this document.
    fn resolve_main_component(&self, instance: &NodeId) -> TreeResult<Option<NodeId>>;

    /// Render a coarse preview of the node, `None` when it has no extent.
    fn export_preview(&self, id: &NodeId) -> TreeResult<Option<Vec<u8>>>;

    /// Deep-copy a subtree. The copy is detached until inserted somewhere.
    fn clone_subtree(&mut self, id: &NodeId) -> TreeResult<NodeId>;

    /// Append a new empty page.
    fn create_page(&mut self, name: &str) -> TreeResult<NodeId>;

    /// Create an empty component appended to `parent`.
    fn create_master_container(&mut self, parent: &NodeId, name: &str) -> TreeResult<NodeId>;

    /// Create a detached instance referencing `master`.
    fn create_reference_instance(&mut self, master: &NodeId) -> TreeResult<NodeId>;

    /// Move `node` under `parent` at `index` (clamped to the child count).
    fn insert_at_index(&mut self, parent: &NodeId, index: usize, node: &NodeId) -> TreeResult<()>;

    /// Remove a node and its whole subtree.
    fn delete_node(&mut self, id: &NodeId) -> TreeResult<()>;

    fn resize(&mut self, id: &NodeId, bounds: BoundingBox) -> TreeResult<()>;

    fn set_transform(&mut self, id: &NodeId, transform: Transform) -> TreeResult<()>;
}

/// Look a node up and check that it is one of `kinds`.
pub fn expect_kind<'t, T>(tree: &'t T, id: &NodeId, kinds: &[NodeKind]) -> TreeResult<&'t TreeNode>
where
    T: TreeAccess + ?Sized,
{
    let node = tree.node(id)?;
    if kinds.contains(&node.kind) {
        Ok(node)
    } else {
        Err(TreeError::Inaccessible {
            id: id.clone(),
            reason: format!("expected one of {kinds:?}, found {}", node.kind),
        })
    }
}

/// Ancestors of `id`, nearest first, excluding the node itself.
///
/// A parent link that no longer resolves ends the chain.
pub fn ancestors<'t, T>(tree: &'t T, id: &NodeId) -> TreeResult<Vec<&'t TreeNode>>
where
    T: TreeAccess + ?Sized,
{
    let mut chain = Vec::new();
    let mut cursor = tree.node(id)?.parent.clone();
    while let Some(parent_id) = cursor {
        match tree.node(&parent_id) {
            Ok(parent) => {
                cursor = parent.parent.clone();
                chain.push(parent);
            }
            Err(_) => break,
        }
    }
    Ok(chain)
}

/// The page a node lives on, if it is still attached to one.
pub fn page_of<'t, T>(tree: &'t T, id: &NodeId) -> TreeResult<Option<&'t TreeNode>>
where
    T: TreeAccess + ?Sized,
{
    let node = tree.node(id)?;
    if node.kind == NodeKind::Page {
        return Ok(Some(node));
    }
    Ok(ancestors(tree, id)?.into_iter().find(|n| n.kind == NodeKind::Page))
}

/// Position of `id` inside its parent's child list.
pub fn sibling_index<T>(tree: &T, id: &NodeId) -> TreeResult<(NodeId, usize)>
where
    T: TreeAccess + ?Sized,
{
    let node = tree.node(id)?;
    let parent_id = node.parent.clone().ok_or_else(|| TreeError::InvalidParent {
        id: id.clone(),
        reason: "node has no parent".into(),
    })?;
    let parent = tree.node(&parent_id).map_err(|_| TreeError::InvalidParent {
        id: parent_id.clone(),
        reason: "parent no longer exists".into(),
    })?;
    let index = parent.children.iter().position(|c| c == id).ok_or_else(|| {
        TreeError::InvalidParent {
            id: parent_id.clone(),
            reason: format!("{id} is not listed among its children"),
        }
    })?;
    Ok((parent_id, index))
}

/// Depth-first pre-order list of the subtree rooted at `root`, root included.
///
/// Children that fail to resolve are skipped.
pub fn descendants<T>(tree: &T, root: &NodeId) -> TreeResult<Vec<NodeId>>
where
    T: TreeAccess + ?Sized,
{
    tree.node(root)?;
    let mut out = Vec::new();
    let mut stack = vec![root.clone()];
    while let Some(id) = stack.pop() {
        let Ok(node) = tree.node(&id) else {
            continue;
        };
        stack.extend(node.children.iter().rev().cloned());
        out.push(id);
    }
    Ok(out)
}

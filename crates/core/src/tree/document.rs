use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::{BoundingBox, NodeId, NodeKind, Paint, Transform, TreeNode};
use crate::tree::{preview, TreeAccess, TreeError, TreeResult};

/// Nested on-disk form of a document: pages with their node trees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub name: String,
    #[serde(default)]
    pub pages: Vec<DocumentNode>,
}

fn default_opacity() -> f64 {
    1.0
}

fn default_visible() -> bool {
    true
}

fn is_default_opacity(value: &f64) -> bool {
    (*value - 1.0).abs() < f64::EPSILON
}

fn is_true(value: &bool) -> bool {
    *value
}

fn is_zero(value: &f64) -> bool {
    *value == 0.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentNode {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub x: f64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub y: f64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub rotation: f64,
    #[serde(default = "default_opacity", skip_serializing_if = "is_default_opacity")]
    pub opacity: f64,
    #[serde(default = "default_visible", skip_serializing_if = "is_true")]
    pub visible: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fills: Vec<Paint>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub strokes: Vec<Paint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_component_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DocumentNode>,
}

impl DocumentNode {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            width: None,
            height: None,
            x: 0.0,
            y: 0.0,
            rotation: 0.0,
            opacity: 1.0,
            visible: true,
            fills: Vec::new(),
            strokes: Vec::new(),
            main_component_id: None,
            children: Vec::new(),
        }
    }

    pub fn sized(mut self, width: f64, height: f64) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn with_children(mut self, children: Vec<DocumentNode>) -> Self {
        self.children = children;
        self
    }

    pub fn with_fills(mut self, fills: Vec<Paint>) -> Self {
        self.fills = fills;
        self
    }

    pub fn with_strokes(mut self, strokes: Vec<Paint>) -> Self {
        self.strokes = strokes;
        self
    }

    pub fn instance_of(mut self, main_component: impl Into<String>) -> Self {
        self.main_component_id = Some(main_component.into());
        self
    }
}

/// Arena of document nodes keyed by stable id.
///
/// Child lists own ordering; parent links are plain lookups, so cycles cannot
/// be expressed through ownership.
#[derive(Debug, Clone, Default)]
pub struct DocumentTree {
    name: String,
    nodes: HashMap<NodeId, TreeNode>,
    pages: Vec<NodeId>,
    next_id: u64,
}

impl DocumentTree {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Build the arena from the nested document form.
    pub fn from_document(document: &Document) -> TreeResult<Self> {
        let mut tree = Self::new(document.name.clone());
        for page in &document.pages {
            if page.kind != NodeKind::Page {
                return Err(TreeError::InvalidParent {
                    id: NodeId::new(page.id.clone()),
                    reason: format!("top-level node must be a page, found {}", page.kind),
                });
            }
            let id = tree.load_node(page, None)?;
            tree.pages.push(id);
        }
        Ok(tree)
    }

    pub fn from_json(body: &str) -> anyhow::Result<Self> {
        let document: Document = serde_json::from_str(body)?;
        Ok(Self::from_document(&document)?)
    }

    fn load_node(&mut self, source: &DocumentNode, parent: Option<&NodeId>) -> TreeResult<NodeId> {
        let id = NodeId::new(source.id.clone());
        if self.nodes.contains_key(&id) {
            return Err(TreeError::DuplicateId(id));
        }
        let bounds = match (source.width, source.height) {
            (Some(w), Some(h)) => Some(BoundingBox::new(w, h)),
            _ => None,
        };
        let node = TreeNode {
            id: id.clone(),
            name: source.name.clone(),
            kind: source.kind,
            bounds,
            transform: Transform {
                x: source.x,
                y: source.y,
                rotation: source.rotation,
                opacity: source.opacity,
                visible: source.visible,
            },
            fills: source.fills.clone(),
            strokes: source.strokes.clone(),
            parent: parent.cloned(),
            children: Vec::new(),
            main_component: source.main_component_id.clone().map(NodeId::new),
        };
        self.nodes.insert(id.clone(), node);

        let mut children = Vec::with_capacity(source.children.len());
        for child in &source.children {
            children.push(self.load_node(child, Some(&id))?);
        }
        if let Some(node) = self.nodes.get_mut(&id) {
            node.children = children;
        }
        Ok(id)
    }

    /// Write the reachable part of the arena back into nested form.
    pub fn to_document(&self) -> Document {
        Document {
            name: self.name.clone(),
            pages: self.pages.iter().filter_map(|id| self.export_node(id)).collect(),
        }
    }

    fn export_node(&self, id: &NodeId) -> Option<DocumentNode> {
        let node = self.nodes.get(id)?;
        Some(DocumentNode {
            id: node.id.0.clone(),
            name: node.name.clone(),
            kind: node.kind,
            width: node.bounds.map(|b| b.width),
            height: node.bounds.map(|b| b.height),
            x: node.transform.x,
            y: node.transform.y,
            rotation: node.transform.rotation,
            opacity: node.transform.opacity,
            visible: node.transform.visible,
            fills: node.fills.clone(),
            strokes: node.strokes.clone(),
            main_component_id: node.main_component.as_ref().map(|m| m.0.clone()),
            children: node.children.iter().filter_map(|c| self.export_node(c)).collect(),
        })
    }

    /// Append a node under `parent`; used when assembling trees in code.
    pub fn insert_child(&mut self, parent: &NodeId, mut node: TreeNode) -> TreeResult<NodeId> {
        if self.nodes.contains_key(&node.id) {
            return Err(TreeError::DuplicateId(node.id));
        }
        self.container(parent)?;
        let id = node.id.clone();
        node.parent = Some(parent.clone());
        node.children.clear();
        self.nodes.insert(id.clone(), node);
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.push(id.clone());
        }
        Ok(id)
    }

    fn fresh_id(&mut self) -> NodeId {
        loop {
            self.next_id += 1;
            let id = NodeId::new(format!("sweep:{}", self.next_id));
            if !self.nodes.contains_key(&id) {
                return id;
            }
        }
    }

    fn container(&self, id: &NodeId) -> TreeResult<&TreeNode> {
        let node = self.nodes.get(id).ok_or_else(|| TreeError::InvalidParent {
            id: id.clone(),
            reason: "parent does not exist".into(),
        })?;
        if !node.kind.is_container() {
            return Err(TreeError::InvalidParent {
                id: id.clone(),
                reason: format!("{} nodes cannot hold children", node.kind),
            });
        }
        Ok(node)
    }

    fn detach(&mut self, id: &NodeId) {
        let parent = self.nodes.get(id).and_then(|n| n.parent.clone());
        if let Some(parent) = parent {
            if let Some(p) = self.nodes.get_mut(&parent) {
                p.children.retain(|c| c != id);
            }
        }
        self.pages.retain(|p| p != id);
        if let Some(node) = self.nodes.get_mut(id) {
            node.parent = None;
        }
    }

    fn copy_subtree(&mut self, id: &NodeId, parent: Option<NodeId>) -> TreeResult<NodeId> {
        let source = self.nodes.get(id).cloned().ok_or_else(|| TreeError::CloneFailure {
            id: id.clone(),
            reason: "source node vanished while copying".into(),
        })?;
        let new_id = self.fresh_id();
        let mut copy = source.clone();
        copy.id = new_id.clone();
        copy.parent = parent;
        copy.children = Vec::new();
        self.nodes.insert(new_id.clone(), copy);

        let mut children = Vec::with_capacity(source.children.len());
        for child in &source.children {
            children.push(self.copy_subtree(child, Some(new_id.clone()))?);
        }
        if let Some(node) = self.nodes.get_mut(&new_id) {
            node.children = children;
        }
        Ok(new_id)
    }

    fn is_ancestor_or_self(&self, candidate: &NodeId, of: &NodeId) -> bool {
        let mut cursor = Some(of.clone());
        while let Some(id) = cursor {
            if &id == candidate {
                return true;
            }
            cursor = self.nodes.get(&id).and_then(|n| n.parent.clone());
        }
        false
    }
}

impl TreeAccess for DocumentTree {
    fn pages(&self) -> TreeResult<Vec<NodeId>> {
        Ok(self.pages.clone())
    }

    fn node(&self, id: &NodeId) -> TreeResult<&TreeNode> {
        self.nodes.get(id).ok_or_else(|| TreeError::NotFound(id.clone()))
    }

    fn resolve_main_component(&self, instance: &NodeId) -> TreeResult<Option<NodeId>> {
        let node = crate::tree::expect_kind(self, instance, &[NodeKind::Instance])?;
        Ok(node.main_component.as_ref().and_then(|master| match self.nodes.get(master) {
            Some(m) if m.kind == NodeKind::Component => Some(master.clone()),
            _ => None,
        }))
    }

    fn export_preview(&self, id: &NodeId) -> TreeResult<Option<Vec<u8>>> {
        Ok(preview::render_preview_svg(self, id)?.map(String::into_bytes))
    }

    fn clone_subtree(&mut self, id: &NodeId) -> TreeResult<NodeId> {
        let node = self.node(id).map_err(|_| TreeError::CloneFailure {
            id: id.clone(),
            reason: "source node not found".into(),
        })?;
        if node.kind == NodeKind::Page {
            return Err(TreeError::CloneFailure {
                id: id.clone(),
                reason: "pages cannot be cloned".into(),
            });
        }
        self.copy_subtree(id, None)
    }

    fn create_page(&mut self, name: &str) -> TreeResult<NodeId> {
        let id = self.fresh_id();
        self.nodes.insert(id.clone(), TreeNode::new(id.clone(), name, NodeKind::Page));
        self.pages.push(id.clone());
        Ok(id)
    }

    fn create_master_container(&mut self, parent: &NodeId, name: &str) -> TreeResult<NodeId> {
        self.container(parent)?;
        let id = self.fresh_id();
        let mut master = TreeNode::new(id.clone(), name, NodeKind::Component);
        master.bounds = Some(BoundingBox::new(0.0, 0.0));
        self.insert_child(parent, master)
    }

    fn create_reference_instance(&mut self, master: &NodeId) -> TreeResult<NodeId> {
        let source = crate::tree::expect_kind(&*self, master, &[NodeKind::Component])?.clone();
        let id = self.fresh_id();
        let mut instance = TreeNode::new(id.clone(), source.name.clone(), NodeKind::Instance);
        instance.bounds = source.bounds;
        instance.fills = source.fills.clone();
        instance.strokes = source.strokes.clone();
        instance.main_component = Some(master.clone());
        self.nodes.insert(id.clone(), instance);

        let mut children = Vec::with_capacity(source.children.len());
        for child in &source.children {
            children.push(self.copy_subtree(child, Some(id.clone()))?);
        }
        if let Some(node) = self.nodes.get_mut(&id) {
            node.children = children;
        }
        Ok(id)
    }

    fn insert_at_index(&mut self, parent: &NodeId, index: usize, node: &NodeId) -> TreeResult<()> {
        self.container(parent)?;
        let moving = self.node(node)?;
        if moving.kind == NodeKind::Page {
            return Err(TreeError::InvalidParent {
                id: parent.clone(),
                reason: "pages cannot be nested".into(),
            });
        }
        if self.is_ancestor_or_self(node, parent) {
            return Err(TreeError::InvalidParent {
                id: parent.clone(),
                reason: format!("{node} is an ancestor of the target parent"),
            });
        }
        self.detach(node);
        let Some(p) = self.nodes.get_mut(parent) else {
            return Err(TreeError::InvalidParent {
                id: parent.clone(),
                reason: "parent does not exist".into(),
            });
        };
        let index = index.min(p.children.len());
        p.children.insert(index, node.clone());
        if let Some(n) = self.nodes.get_mut(node) {
            n.parent = Some(parent.clone());
        }
        Ok(())
    }

    fn delete_node(&mut self, id: &NodeId) -> TreeResult<()> {
        let doomed = crate::tree::descendants(&*self, id)?;
        self.detach(id);
        for victim in doomed {
            self.nodes.remove(&victim);
        }
        Ok(())
    }

    fn resize(&mut self, id: &NodeId, bounds: BoundingBox) -> TreeResult<()> {
        let node = self.nodes.get_mut(id).ok_or_else(|| TreeError::NotFound(id.clone()))?;
        node.bounds = Some(bounds);
        Ok(())
    }

    fn set_transform(&mut self, id: &NodeId, transform: Transform) -> TreeResult<()> {
        let node = self.nodes.get_mut(id).ok_or_else(|| TreeError::NotFound(id.clone()))?;
        node.transform = transform;
        Ok(())
    }
}

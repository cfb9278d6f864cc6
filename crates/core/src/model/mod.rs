//! Core data model for document nodes, icon candidates, and duplicate groups.
//!
//! Document nodes are owned by the external document; the engine only keeps
//! stable identifiers and read snapshots of them. Candidates and groups are
//! engine-owned and live for the duration of a single scan.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier of a document node.
///
/// Ids are weak references: the node may have been deleted since the id was
/// recorded, so every dereference goes back through the tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Closed set of node kinds the engine knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeKind {
    Page,
    Frame,
    Group,
    Component,
    ComponentSet,
    Instance,
    Vector,
    BooleanOperation,
    Rectangle,
    Ellipse,
    Line,
    Polygon,
    Star,
    Text,
}

impl NodeKind {
    /// Vector-like leaf geometry that makes a container look like an icon.
    pub fn is_shape(self) -> bool {
        matches!(
            self,
            NodeKind::Vector
                | NodeKind::BooleanOperation
                | NodeKind::Rectangle
                | NodeKind::Ellipse
                | NodeKind::Line
                | NodeKind::Polygon
                | NodeKind::Star
        )
    }

    /// Kinds that may hold children.
    pub fn is_container(self) -> bool {
        matches!(
            self,
            NodeKind::Page
                | NodeKind::Frame
                | NodeKind::Group
                | NodeKind::Component
                | NodeKind::ComponentSet
                | NodeKind::Instance
                | NodeKind::BooleanOperation
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Page => "PAGE",
            NodeKind::Frame => "FRAME",
            NodeKind::Group => "GROUP",
            NodeKind::Component => "COMPONENT",
            NodeKind::ComponentSet => "COMPONENT_SET",
            NodeKind::Instance => "INSTANCE",
            NodeKind::Vector => "VECTOR",
            NodeKind::BooleanOperation => "BOOLEAN_OPERATION",
            NodeKind::Rectangle => "RECTANGLE",
            NodeKind::Ellipse => "ELLIPSE",
            NodeKind::Line => "LINE",
            NodeKind::Polygon => "POLYGON",
            NodeKind::Star => "STAR",
            NodeKind::Text => "TEXT",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Axis-aligned extent of a node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Width over height, `None` for degenerate or non-finite boxes.
    pub fn aspect_ratio(&self) -> Option<f64> {
        if !self.width.is_finite() || !self.height.is_finite() || self.height <= 0.0 {
            return None;
        }
        if self.width <= 0.0 {
            return None;
        }
        Some(self.width / self.height)
    }

    pub fn max_side(&self) -> f64 {
        self.width.max(self.height)
    }

    pub fn min_side(&self) -> f64 {
        self.width.min(self.height)
    }
}

/// Paint type of a fill or stroke entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaintKind {
    Solid,
    GradientLinear,
    GradientRadial,
    GradientAngular,
    GradientDiamond,
    Image,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paint {
    #[serde(rename = "type")]
    pub kind: PaintKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Paint {
    pub fn solid(color: impl Into<String>) -> Self {
        Self { kind: PaintKind::Solid, color: Some(color.into()) }
    }
}

/// Position and presentation attributes copied onto replacement instances.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub x: f64,
    pub y: f64,
    pub rotation: f64,
    pub opacity: f64,
    pub visible: bool,
}

impl Default for Transform {
    fn default() -> Self {
        Self { x: 0.0, y: 0.0, rotation: 0.0, opacity: 1.0, visible: true }
    }
}

/// Read snapshot of a document node held in the arena.
///
/// `parent` is a lookup key, never an ownership edge; `children` is the
/// ordered list owned by this node.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub id: NodeId,
    pub name: String,
    pub kind: NodeKind,
    pub bounds: Option<BoundingBox>,
    pub transform: Transform,
    pub fills: Vec<Paint>,
    pub strokes: Vec<Paint>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Only meaningful for instances.
    pub main_component: Option<NodeId>,
}

impl TreeNode {
    pub fn new(id: impl Into<NodeId>, name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            bounds: None,
            transform: Transform::default(),
            fills: Vec::new(),
            strokes: Vec::new(),
            parent: None,
            children: Vec::new(),
            main_component: None,
        }
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// How a candidate is organized in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateStatus {
    /// Not organized as master or instance yet.
    Unresolved,
    /// References an accepted master.
    Instance,
    /// A reusable definition (component or component set).
    Master,
}

impl CandidateStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CandidateStatus::Unresolved => "unresolved",
            CandidateStatus::Instance => "instance",
            CandidateStatus::Master => "master",
        }
    }
}

/// An icon-like node discovered during a scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub node_id: NodeId,
    pub name: String,
    pub kind: NodeKind,
    pub width: f64,
    pub height: f64,
    pub page: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_context: Option<String>,
    pub source: String,
    pub status: CandidateStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_id: Option<NodeId>,
    pub score: f64,
    #[serde(default)]
    pub has_inconsistency: bool,
    #[serde(default)]
    pub inconsistency_reasons: Vec<String>,
    #[serde(default)]
    pub is_marked_for_swap: bool,
}

/// A set of candidates believed to be the same icon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    pub key: String,
    pub members: Vec<Candidate>,
}

impl DuplicateGroup {
    pub fn is_singleton(&self) -> bool {
        self.members.len() == 1
    }

    pub fn representative(&self) -> Option<&Candidate> {
        self.members.first()
    }
}

/// User marking persisted outside the engine, keyed by node id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Marking {
    pub is_ignored: bool,
    pub is_marked_for_swap: bool,
}

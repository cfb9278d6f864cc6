//! Per-node icon classification.
//!
//! Reusable kinds (components, component sets, instances) are scored
//! additively and accepted on weak evidence. Ambiguous kinds (frames and raw
//! shapes) are gated conjunctively: every signal has to agree.

use serde::{Deserialize, Serialize};

use crate::analysis::names;
use crate::config::ClassifierConfig;
use crate::model::{BoundingBox, NodeId, NodeKind, TreeNode};
use crate::tree::{ancestors, TreeAccess, TreeResult};

/// Outcome of classifying one node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub is_icon: bool,
    pub score: f64,
}

impl Classification {
    pub fn rejected() -> Self {
        Self { is_icon: false, score: 0.0 }
    }

    fn scored(score: f64, floor: f64) -> Self {
        Self { is_icon: score >= floor, score }
    }

    fn accepted(score: f64) -> Self {
        Self { is_icon: true, score }
    }
}

/// Everything the classifier reads about a node: the node itself, its direct
/// children and its ancestor chain (nearest first).
#[derive(Debug, Clone)]
pub struct NodeSnapshot<'a> {
    pub node: &'a TreeNode,
    pub children: Vec<&'a TreeNode>,
    pub ancestors: Vec<&'a TreeNode>,
}

impl<'a> NodeSnapshot<'a> {
    /// Read a node and its surroundings from the tree. Children that no
    /// longer resolve are left out.
    pub fn capture<T>(tree: &'a T, id: &NodeId) -> TreeResult<Self>
    where
        T: TreeAccess + ?Sized,
    {
        let node = tree.node(id)?;
        let children = node.children.iter().filter_map(|c| tree.node(c).ok()).collect();
        let ancestors = ancestors(tree, id)?;
        Ok(Self { node, children, ancestors })
    }

    fn has_shape_child(&self) -> bool {
        self.children.iter().any(|c| c.kind.is_shape())
    }
}

/// Pure heuristic classifier; holds only its thresholds.
#[derive(Debug, Clone, Default)]
pub struct NodeClassifier {
    config: ClassifierConfig,
}

fn usable_bounds(bounds: Option<BoundingBox>) -> Option<BoundingBox> {
    bounds.filter(|b| b.width.is_finite() && b.height.is_finite() && b.width > 0.0 && b.height > 0.0)
}

fn in_range(value: f64, lo: f64, hi: f64) -> bool {
    value >= lo && value <= hi
}

impl NodeClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Decide whether a node is an icon. Never fails: anything that cannot
    /// be judged (no bounding box, unsupported kind) is a rejection.
    pub fn classify(&self, snapshot: &NodeSnapshot<'_>) -> Classification {
        let Some(bounds) = usable_bounds(snapshot.node.bounds) else {
            return Classification::rejected();
        };
        match snapshot.node.kind {
            NodeKind::Component | NodeKind::ComponentSet => {
                self.classify_component(snapshot, bounds)
            }
            NodeKind::Instance => self.classify_instance(snapshot, bounds),
            NodeKind::Frame => self.classify_frame(snapshot, bounds),
            NodeKind::Vector | NodeKind::BooleanOperation | NodeKind::Group => {
                self.classify_shape(snapshot, bounds)
            }
            NodeKind::Page
            | NodeKind::Rectangle
            | NodeKind::Ellipse
            | NodeKind::Line
            | NodeKind::Polygon
            | NodeKind::Star
            | NodeKind::Text => Classification::rejected(),
        }
    }

    /// Both sides within tolerance of an entry in the canonical size table.
    pub fn matches_canonical_size(&self, bounds: BoundingBox) -> bool {
        let fits = |v: f64| {
            self.config.canonical_sizes.iter().any(|s| (v - s).abs() <= self.config.size_tolerance)
        };
        fits(bounds.width) && fits(bounds.height)
    }

    /// Size and aspect gate applied to component set variants.
    pub fn passes_component_gates(&self, bounds: Option<BoundingBox>) -> bool {
        let Some(bounds) = usable_bounds(bounds) else {
            return false;
        };
        let Some(aspect) = bounds.aspect_ratio() else {
            return false;
        };
        bounds.max_side() <= self.config.component_max_size
            && in_range(aspect, self.config.component_min_aspect, self.config.component_max_aspect)
    }

    fn classify_component(&self, snapshot: &NodeSnapshot<'_>, bounds: BoundingBox) -> Classification {
        let name = snapshot.node.name.as_str();
        if names::is_non_icon_component_name(name) {
            return Classification::rejected();
        }
        if !self.passes_component_gates(Some(bounds)) {
            return Classification::rejected();
        }

        let mut score: f64 = 0.0;
        if names::looks_like_icon_name(name) {
            score += 3.0;
        }
        let side = bounds.max_side();
        if in_range(side, 12.0, 64.0) {
            score += 2.0;
        } else if in_range(side, 8.0, 128.0) {
            score += 1.0;
        }
        if bounds.aspect_ratio().is_some_and(|a| in_range(a, 0.5, 2.0)) {
            score += 1.0;
        }
        if snapshot.has_shape_child() {
            score += 1.0;
        }
        if self.matches_canonical_size(bounds) {
            score += 1.0;
        }
        if (bounds.width - bounds.height).abs() <= 1.0 {
            score += 1.0;
        }

        if snapshot.node.kind == NodeKind::ComponentSet {
            return Classification::accepted(score.max(1.0));
        }
        Classification::scored(score, self.config.component_min_score)
    }

    fn classify_instance(&self, snapshot: &NodeSnapshot<'_>, bounds: BoundingBox) -> Classification {
        let name = snapshot.node.name.as_str();
        if names::is_ui_component_name(name) {
            return Classification::rejected();
        }
        let library = names::has_library_prefix(name);
        let side = bounds.max_side();
        if side > self.config.instance_max_size && !(names::has_icon_marker(name) || library) {
            return Classification::rejected();
        }

        let mut score = 0.0;
        if names::looks_like_icon_name(name) {
            score += 3.0;
        }
        if library {
            score += 2.0;
        }
        if bounds.aspect_ratio().is_some_and(|a| in_range(a, 0.9, 1.1)) {
            score += 2.0;
        }
        if self.matches_canonical_size(bounds) {
            score += 2.0;
        }
        if side <= 48.0 {
            score += 1.0;
        }
        if side <= 24.0 {
            score += 1.0;
        }
        Classification::scored(score, self.config.instance_min_score)
    }

    fn classify_frame(&self, snapshot: &NodeSnapshot<'_>, bounds: BoundingBox) -> Classification {
        let square = bounds
            .aspect_ratio()
            .is_some_and(|a| in_range(a, self.config.frame_min_aspect, self.config.frame_max_aspect));
        let canonical = self.matches_canonical_size(bounds);
        let has_shape = snapshot.has_shape_child();
        let few_children = snapshot.node.children.len() <= self.config.frame_max_children;

        if square && canonical && has_shape && few_children {
            Classification::accepted(4.0)
        } else {
            Classification::rejected()
        }
    }

    fn is_icon_frame(&self, node: &TreeNode) -> bool {
        if node.kind != NodeKind::Frame {
            return false;
        }
        let Some(bounds) = usable_bounds(node.bounds) else {
            return false;
        };
        let square = bounds
            .aspect_ratio()
            .is_some_and(|a| in_range(a, self.config.frame_min_aspect, self.config.frame_max_aspect));
        square && bounds.max_side() <= self.config.icon_frame_max_size
    }

    fn classify_shape(&self, snapshot: &NodeSnapshot<'_>, bounds: BoundingBox) -> Classification {
        // The enclosing icon-sized frame is reported instead.
        if snapshot.ancestors.iter().any(|a| self.is_icon_frame(a)) {
            return Classification::rejected();
        }
        let name = snapshot.node.name.as_str();
        let sized = in_range(bounds.max_side(), self.config.shape_min_size, self.config.shape_max_size);
        let proportioned = bounds
            .aspect_ratio()
            .is_some_and(|a| in_range(a, self.config.shape_min_aspect, self.config.shape_max_aspect));
        let named = names::looks_like_icon_name(name) || names::has_library_prefix(name);

        if sized && proportioned && named {
            Classification::accepted(3.0)
        } else {
            Classification::rejected()
        }
    }
}

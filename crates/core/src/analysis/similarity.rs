//! Pairwise candidate similarity on a 0..=100 scale.
//!
//! Components (each capped independently):
//! - size closeness: up to `size_weight`, linear penalty on |dw| + |dh|
//! - aspect-ratio closeness: up to `aspect_weight`
//! - name similarity: up to `name_weight`, edit distance, library-prefix aware
//! - same resolved source: flat `same_source_bonus`
//! - visual attributes of the backing nodes: up to `visual_cap`
//!
//! Every component is symmetric in its arguments, so the total is too.

use crate::analysis::names;
use crate::config::SimilarityConfig;
use crate::model::{Candidate, TreeNode};
use crate::tree::TreeAccess;

/// Seam between clustering and scoring.
pub trait Similarity {
    fn similarity(&self, a: &Candidate, b: &Candidate) -> u32;
}

pub struct SimilarityScorer<'a> {
    config: &'a SimilarityConfig,
    tree: Option<&'a dyn TreeAccess>,
}

impl<'a> SimilarityScorer<'a> {
    /// Scorer without access to the document; the visual bonus is skipped.
    pub fn new(config: &'a SimilarityConfig) -> Self {
        Self { config, tree: None }
    }

    pub fn with_tree(config: &'a SimilarityConfig, tree: &'a dyn TreeAccess) -> Self {
        Self { config, tree: Some(tree) }
    }

    fn size_score(&self, a: &Candidate, b: &Candidate) -> f64 {
        let delta = (a.width - b.width).abs() + (a.height - b.height).abs();
        (self.config.size_weight - delta * self.config.size_penalty_per_px).max(0.0)
    }

    fn aspect_score(&self, a: &Candidate, b: &Candidate) -> f64 {
        let ratio = |c: &Candidate| if c.height > 0.0 { c.width / c.height } else { 1.0 };
        let diff = (ratio(a) - ratio(b)).abs();
        (self.config.aspect_weight * (1.0 - diff)).max(0.0)
    }

    fn name_score(&self, a: &Candidate, b: &Candidate) -> f64 {
        let weighted = |x: &str, y: &str| {
            self.config.name_weight
                * names::edit_similarity(&names::comparison_key(x), &names::comparison_key(y))
        };
        match (names::split_library(&a.name), names::split_library(&b.name)) {
            (Some((lib_a, rest_a)), Some((lib_b, rest_b))) => {
                if lib_a.eq_ignore_ascii_case(lib_b) {
                    weighted(rest_a, rest_b)
                } else {
                    self.config.cross_library_bonus.min(self.config.name_weight)
                }
            }
            (Some((_, rest_a)), None) => weighted(rest_a, &b.name),
            (None, Some((_, rest_b))) => weighted(&a.name, rest_b),
            (None, None) => weighted(&a.name, &b.name),
        }
    }

    fn source_score(&self, a: &Candidate, b: &Candidate) -> f64 {
        if a.source == b.source {
            self.config.same_source_bonus
        } else {
            0.0
        }
    }

    fn visual_score(&self, a: &Candidate, b: &Candidate) -> f64 {
        let Some(tree) = self.tree else {
            return 0.0;
        };
        let (Ok(node_a), Ok(node_b)) = (tree.node(&a.node_id), tree.node(&b.node_id)) else {
            return 0.0;
        };
        visual_bonus(node_a, node_b).min(self.config.visual_cap)
    }
}

fn visual_bonus(a: &TreeNode, b: &TreeNode) -> f64 {
    let mut bonus = 0.0;
    if a.kind == b.kind {
        bonus += 10.0;
    }
    if a.fills.len() == b.fills.len() {
        bonus += 5.0;
    }
    if let (Some(fa), Some(fb)) = (a.fills.first(), b.fills.first()) {
        if fa.kind == fb.kind {
            bonus += 5.0;
        }
    }
    if a.strokes.len() == b.strokes.len() {
        bonus += 5.0;
    }
    if let (Some(sa), Some(sb)) = (a.strokes.first(), b.strokes.first()) {
        if sa.kind == sb.kind {
            bonus += 5.0;
        }
    }
    bonus
}

impl Similarity for SimilarityScorer<'_> {
    fn similarity(&self, a: &Candidate, b: &Candidate) -> u32 {
        let total = self.size_score(a, b)
            + self.aspect_score(a, b)
            + self.name_score(a, b)
            + self.source_score(a, b)
            + self.visual_score(a, b);
        total.clamp(0.0, 100.0).round() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CandidateStatus, NodeId, NodeKind, Paint};
    use crate::tree::{Document, DocumentNode, DocumentTree};

    fn candidate(id: &str, name: &str, w: f64, h: f64, source: &str) -> Candidate {
        Candidate {
            node_id: NodeId::new(id),
            name: name.into(),
            kind: NodeKind::Frame,
            width: w,
            height: h,
            page: "Page".into(),
            frame_context: None,
            source: source.into(),
            status: CandidateStatus::Unresolved,
            master_id: None,
            score: 4.0,
            has_inconsistency: false,
            inconsistency_reasons: vec![],
            is_marked_for_swap: false,
        }
    }

    #[test]
    fn identical_candidates_score_full_marks() {
        let config = SimilarityConfig::default();
        let scorer = SimilarityScorer::new(&config);
        let a = candidate("1", "home", 24.0, 24.0, "local");
        let b = candidate("2", "Home copy", 24.0, 24.0, "local");
        assert_eq!(scorer.similarity(&a, &b), 100);
    }

    #[test]
    fn score_is_symmetric() {
        let config = SimilarityConfig::default();
        let scorer = SimilarityScorer::new(&config);
        let pool = [
            candidate("1", "home", 24.0, 24.0, "local"),
            candidate("2", "lucide/home", 24.0, 24.0, "lucide"),
            candidate("3", "phosphor/house", 20.0, 24.0, "phosphor"),
            candidate("4", "settings-gear", 32.0, 32.0, "local"),
            candidate("5", "x", 8.0, 40.0, "local"),
            candidate("6", "", 0.0, 0.0, "local"),
        ];
        for a in &pool {
            for b in &pool {
                assert_eq!(scorer.similarity(a, b), scorer.similarity(b, a), "{} / {}", a.name, b.name);
            }
        }
    }

    #[test]
    fn library_prefixes_are_compared_by_suffix() {
        let config = SimilarityConfig::default();
        let scorer = SimilarityScorer::new(&config);
        let a = candidate("1", "lucide/home", 24.0, 24.0, "x");
        let b = candidate("2", "lucide/home", 24.0, 24.0, "y");
        let c = candidate("3", "phosphor/home", 24.0, 24.0, "z");
        // size 30 + aspect 20 + name 30, no source bonus
        assert_eq!(scorer.similarity(&a, &b), 80);
        // name falls back to the cross-library bonus
        assert_eq!(scorer.similarity(&a, &c), 55);
    }

    #[test]
    fn size_penalty_is_linear_and_floored() {
        let config = SimilarityConfig::default();
        let scorer = SimilarityScorer::new(&config);
        let a = candidate("1", "abc", 24.0, 24.0, "s1");
        let b = candidate("2", "xyz", 28.0, 28.0, "s2");
        // |dw| + |dh| = 8 → 30 - 16 = 14; aspect 20; names share nothing
        assert_eq!(scorer.similarity(&a, &b), 34);
        let far = candidate("3", "xyz", 200.0, 200.0, "s2");
        assert_eq!(scorer.similarity(&a, &far), 20);
    }

    #[test]
    fn visual_bonus_uses_backing_nodes_when_resolvable() {
        let doc = Document {
            name: "Doc".into(),
            pages: vec![DocumentNode::new("0:1", "Page", NodeKind::Page).with_children(vec![
                DocumentNode::new("1", "abc", NodeKind::Vector)
                    .sized(24.0, 24.0)
                    .with_fills(vec![Paint::solid("#000")]),
                DocumentNode::new("2", "xyz", NodeKind::Vector)
                    .sized(24.0, 24.0)
                    .with_fills(vec![Paint::solid("#111")]),
            ])],
        };
        let tree = DocumentTree::from_document(&doc).unwrap();
        let config = SimilarityConfig::default();
        let plain = SimilarityScorer::new(&config);
        let visual = SimilarityScorer::with_tree(&config, &tree);
        let a = candidate("1", "abc", 24.0, 24.0, "s1");
        let b = candidate("2", "xyz", 24.0, 24.0, "s2");
        assert_eq!(plain.similarity(&a, &b), 50);
        // kind 10 + fill count 5 + fill type 5 + stroke count 5, capped at 20
        assert_eq!(visual.similarity(&a, &b), 70);

        let ghost = candidate("missing", "xyz", 24.0, 24.0, "s2");
        assert_eq!(visual.similarity(&a, &ghost), 50);
    }
}

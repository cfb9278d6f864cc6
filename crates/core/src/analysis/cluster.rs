//! Group unresolved candidates into duplicate clusters.
//!
//! Pass 1 buckets by an exact key (normalized name, grid-rounded size,
//! source, page). Pass 2 lets each singleton join the best same-page
//! multi-member cluster whose representative scores at or above the merge
//! threshold. Every input candidate ends up in exactly one cluster.

use std::collections::HashMap;

use tracing::debug;

use crate::analysis::names;
use crate::analysis::similarity::Similarity;
use crate::config::ClusterConfig;
use crate::model::{Candidate, DuplicateGroup};

pub struct DuplicateClusterer<'a, S: Similarity + ?Sized> {
    config: &'a ClusterConfig,
    scorer: &'a S,
}

impl<'a, S: Similarity + ?Sized> DuplicateClusterer<'a, S> {
    pub fn new(config: &'a ClusterConfig, scorer: &'a S) -> Self {
        Self { config, scorer }
    }

    /// Exact bucket key for pass 1.
    pub fn bucket_key(&self, candidate: &Candidate) -> String {
        let grid = if self.config.size_grid > 0.0 { self.config.size_grid } else { 1.0 };
        let snap = |v: f64| ((v / grid).round() * grid) as i64;
        format!(
            "{}|{}x{}|{}|{}",
            names::normalized_pattern(&candidate.name),
            snap(candidate.width),
            snap(candidate.height),
            candidate.source,
            candidate.page
        )
    }

    pub fn cluster(&self, candidates: &[Candidate]) -> Vec<DuplicateGroup> {
        // Pass 1: buckets in first-seen order.
        let mut order: Vec<String> = Vec::new();
        let mut buckets: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, candidate) in candidates.iter().enumerate() {
            let key = self.bucket_key(candidate);
            buckets
                .entry(key.clone())
                .or_insert_with(|| {
                    order.push(key);
                    Vec::new()
                })
                .push(idx);
        }

        let mut clusters: Vec<(String, Vec<usize>)> = Vec::new();
        let mut singletons: Vec<(String, usize)> = Vec::new();
        for key in order {
            let Some(members) = buckets.remove(&key) else {
                continue;
            };
            match members.as_slice() {
                [only] => singletons.push((key, *only)),
                _ => clusters.push((key, members)),
            }
        }
        let multi = clusters.len();

        // Pass 2: singletons against multi-member representatives on the same page.
        for (key, idx) in singletons {
            let candidate = &candidates[idx];
            let mut best: Option<(usize, u32)> = None;
            for (cluster_idx, (_, members)) in clusters.iter().take(multi).enumerate() {
                let representative = &candidates[members[0]];
                if representative.page != candidate.page {
                    continue;
                }
                let score = self.scorer.similarity(candidate, representative);
                if score < self.config.merge_threshold {
                    continue;
                }
                if best.map_or(true, |(_, top)| score > top) {
                    best = Some((cluster_idx, score));
                }
            }
            match best {
                Some((cluster_idx, score)) => {
                    debug!(
                        node = %candidate.node_id,
                        cluster = %clusters[cluster_idx].0,
                        score,
                        "singleton merged by similarity"
                    );
                    clusters[cluster_idx].1.push(idx);
                }
                None => clusters.push((key, vec![idx])),
            }
        }

        // Reconciliation: nothing dropped, nothing doubled.
        let mut seen = vec![false; candidates.len()];
        let mut groups: Vec<DuplicateGroup> = Vec::with_capacity(clusters.len());
        for (key, members) in clusters {
            let members: Vec<Candidate> = members
                .into_iter()
                .filter(|&i| !std::mem::replace(&mut seen[i], true))
                .map(|i| candidates[i].clone())
                .collect();
            if !members.is_empty() {
                groups.push(DuplicateGroup { key, members });
            }
        }
        for (idx, placed) in seen.iter().enumerate() {
            if !placed {
                let candidate = &candidates[idx];
                groups.push(DuplicateGroup {
                    key: self.bucket_key(candidate),
                    members: vec![candidate.clone()],
                });
            }
        }
        debug!(
            input = candidates.len(),
            clusters = groups.len(),
            multi = groups.iter().filter(|g| !g.is_singleton()).count(),
            "clustering complete"
        );
        groups
    }
}

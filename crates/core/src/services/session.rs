//! Engine context for one host session.
//!
//! A [`ScanSession`] owns the engine configuration, the classifier and the
//! marking state handed in by the host (ignored ids, per-icon markings),
//! plus the page the user is currently on. It turns [`Request`]s into
//! [`Response`]s; it never persists anything itself.

use std::collections::{BTreeSet, HashMap, HashSet};

use thiserror::Error;
use tracing::{debug, info};

use crate::analysis::{
    analyze_consistency, DiscoveryPipeline, DuplicateClusterer, NodeClassifier, ScanError,
    SimilarityScorer,
};
use crate::config::EngineConfig;
use crate::model::{Candidate, CandidateStatus, Marking, NodeId};
use crate::services::consolidation::ConsolidationTransaction;
use crate::services::messages::{
    ConsolidationResult, ConsolidationScope, LibraryDuplicatesResult, Progress, Request, Response,
    ScanResult,
};
use crate::tree::{TreeAccess, TreeError};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error("Tree operation failed: {0}")]
    Tree(#[from] TreeError),
    #[error("Scope current-page needs a current page name")]
    MissingCurrentPage,
}

#[derive(Debug, Clone)]
pub struct ScanSession {
    config: EngineConfig,
    classifier: NodeClassifier,
    ignored: HashSet<NodeId>,
    markings: HashMap<NodeId, Marking>,
    current_page: Option<String>,
}

impl ScanSession {
    pub fn new(config: EngineConfig) -> Self {
        let classifier = NodeClassifier::new(config.classifier.clone());
        Self {
            config,
            classifier,
            ignored: HashSet::new(),
            markings: HashMap::new(),
            current_page: None,
        }
    }

    /// Install the host's marking state for this session.
    pub fn with_markings(
        mut self,
        ignored: HashSet<NodeId>,
        markings: HashMap<NodeId, Marking>,
    ) -> Self {
        self.ignored = ignored;
        self.markings = markings;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn current_page(&self) -> Option<&str> {
        self.current_page.as_deref()
    }

    pub fn set_current_page(&mut self, page: Option<String>) {
        self.current_page = page;
    }

    pub fn is_ignored(&self, id: &NodeId) -> bool {
        self.ignored.contains(id) || self.markings.get(id).is_some_and(|m| m.is_ignored)
    }

    /// Discover, drop ignored icons, apply swap marks, then run the
    /// consistency checks.
    pub fn scan<T: TreeAccess + ?Sized>(&self, tree: &T) -> Result<ScanResult, EngineError> {
        let outcome = DiscoveryPipeline::new(&self.classifier, &self.config.discovery).run(tree)?;
        let found = outcome.candidates.len();

        let kept: Vec<Candidate> = outcome
            .candidates
            .into_iter()
            .filter(|c| !self.is_ignored(&c.node_id))
            .map(|mut c| {
                c.is_marked_for_swap =
                    self.markings.get(&c.node_id).is_some_and(|m| m.is_marked_for_swap);
                c
            })
            .collect();
        let ignored_count = found - kept.len();

        let report = analyze_consistency(kept);
        info!(
            pages = outcome.pages_scanned,
            icons = report.candidates.len(),
            ignored = ignored_count,
            inconsistencies = report.inconsistencies,
            truncated = outcome.truncated,
            "scan complete"
        );
        Ok(ScanResult {
            total_icons: report.candidates.len(),
            inconsistencies: report.inconsistencies,
            discovered_icons: report.candidates,
            ignored_count: Some(ignored_count),
            current_page_name: self.current_page.clone(),
        })
    }

    /// Cluster the unresolved icons in scope and rewrite every cluster.
    ///
    /// `progress` receives one event before clustering and one per cluster.
    pub fn consolidate<T: TreeAccess>(
        &self,
        tree: &mut T,
        icons: &[Candidate],
        scope: ConsolidationScope,
        current_page: Option<&str>,
        progress: &mut dyn FnMut(Progress),
    ) -> Result<ConsolidationResult, EngineError> {
        let page_filter = match scope {
            ConsolidationScope::AllPages => None,
            ConsolidationScope::CurrentPage => Some(
                current_page
                    .or(self.current_page.as_deref())
                    .ok_or(EngineError::MissingCurrentPage)?
                    .to_string(),
            ),
        };
        let eligible: Vec<Candidate> = icons
            .iter()
            .filter(|c| c.status == CandidateStatus::Unresolved)
            .filter(|c| !self.is_ignored(&c.node_id))
            .filter(|c| page_filter.as_ref().map_or(true, |p| &c.page == p))
            .cloned()
            .collect();

        progress(Progress { percentage: 0, message: format!("Grouping {} icons", eligible.len()) });
        let clusters = {
            let scorer = SimilarityScorer::with_tree(&self.config.similarity, &*tree);
            DuplicateClusterer::new(&self.config.clustering, &scorer).cluster(&eligible)
        };
        debug!(scope = scope.as_str(), eligible = eligible.len(), clusters = clusters.len(), "clustered");

        let tx = ConsolidationTransaction::new(&self.config.consolidation);
        let mut result = ConsolidationResult::default();
        let mut pages: BTreeSet<String> = BTreeSet::new();
        let total = clusters.len();
        for (done, group) in clusters.iter().enumerate() {
            let outcome = tx.consolidate(tree, group);
            if outcome.success {
                result.components_created += 1;
            }
            result.icons_replaced += outcome.icons_replaced;
            result.failed_operations += outcome.failed_operations;
            pages.extend(outcome.pages_affected);

            let name = group.representative().map(|c| c.name.as_str()).unwrap_or_default();
            progress(Progress {
                percentage: (((done + 1) * 100) / total.max(1)) as u8,
                message: format!("Consolidated \"{name}\" ({}/{total})", done + 1),
            });
        }
        result.pages_affected = pages.len();
        result.message = format!(
            "Created {} components and replaced {} icons across {} pages",
            result.components_created, result.icons_replaced, result.pages_affected
        );
        if result.failed_operations > 0 {
            result.message.push_str(&format!(" ({} operations failed)", result.failed_operations));
        }
        info!(
            components = result.components_created,
            replaced = result.icons_replaced,
            failed = result.failed_operations,
            "consolidation complete"
        );
        Ok(result)
    }

    pub fn consolidate_library_duplicates<T: TreeAccess + ?Sized>(
        &self,
        tree: &mut T,
        icons: &[Candidate],
        page: &str,
    ) -> LibraryDuplicatesResult {
        let outcome = ConsolidationTransaction::new(&self.config.consolidation)
            .merge_library_duplicates(tree, icons, page);
        let errors = outcome.error_details.len();
        let mut message = format!(
            "Removed {} duplicate masters and repointed {} instances",
            outcome.duplicates_removed, outcome.instances_rewritten
        );
        if errors > 0 {
            message.push_str(&format!(" ({errors} errors)"));
        }
        LibraryDuplicatesResult {
            duplicates_removed: outcome.duplicates_removed,
            errors,
            error_details: outcome.error_details,
            message,
        }
    }

    /// SVG preview of a node, or `None` when it has no bounding box.
    pub fn preview<T: TreeAccess + ?Sized>(
        &self,
        tree: &T,
        id: &NodeId,
    ) -> Result<Option<String>, EngineError> {
        let bytes = tree.export_preview(id)?;
        Ok(bytes.map(|b| String::from_utf8_lossy(&b).into_owned()))
    }

    /// Dispatch one host request. Progress events go to `emit`; the final
    /// response is returned. Failures become [`Response::Error`].
    pub fn handle<T: TreeAccess>(
        &mut self,
        tree: &mut T,
        request: Request,
        emit: &mut dyn FnMut(Response),
    ) -> Response {
        match request {
            Request::Scan => match self.scan(&*tree) {
                Ok(result) => Response::ScanResult(result),
                Err(err) => Response::error(err.to_string()),
            },
            Request::Consolidate { icons, scope, current_page_name } => {
                if current_page_name.is_some() {
                    self.current_page = current_page_name;
                }
                let current = self.current_page.clone();
                let mut forward = |p: Progress| emit(Response::Progress(p));
                match self.consolidate(tree, &icons, scope, current.as_deref(), &mut forward) {
                    Ok(result) => Response::ConsolidationResult(result),
                    Err(err) => Response::error(err.to_string()),
                }
            }
            Request::ConsolidateLibraryDuplicates { icons, current_page_name } => {
                let result = self.consolidate_library_duplicates(tree, &icons, &current_page_name);
                self.current_page = Some(current_page_name);
                Response::LibraryDuplicatesResult(result)
            }
            Request::Preview { node_id } => match self.preview(&*tree, &node_id) {
                Ok(svg) => Response::Preview { node_id, svg },
                Err(err) => Response::error(err.to_string()),
            },
        }
    }
}

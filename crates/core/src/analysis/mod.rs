//! Read-only analysis over a document: classification, discovery,
//! consistency checks, similarity and duplicate clustering.
//!
//! Nothing in here mutates the tree; rewriting happens in
//! [`crate::services::consolidation`].

pub mod classify;
pub mod cluster;
pub mod consistency;
pub mod discovery;
pub mod names;
pub mod similarity;

pub use classify::{Classification, NodeClassifier, NodeSnapshot};
pub use cluster::DuplicateClusterer;
pub use consistency::{analyze as analyze_consistency, ConsistencyReport};
pub use discovery::{DiscoveryOutcome, DiscoveryPipeline, ScanError};
pub use similarity::{Similarity, SimilarityScorer};

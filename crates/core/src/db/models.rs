use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::model::{Marking, NodeId};

/// Persisted marking for one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkingRecord {
    pub node_id: String,
    pub is_ignored: bool,
    pub is_marked_for_swap: bool,
    pub updated_at: String,
}

/// Marking state handed to a scan session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkingState {
    pub ignored: HashSet<NodeId>,
    pub markings: HashMap<NodeId, Marking>,
}

/// One recorded scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRunRecord {
    pub document: String,
    /// SHA-256 of the document snapshot.
    pub document_hash: Option<String>,
    pub total_icons: i64,
    pub inconsistencies: i64,
    pub ignored_count: i64,
    pub started_at: String,
    pub finished_at: String,
}

/// One recorded consolidation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsolidationRunRecord {
    pub document: String,
    /// `all-pages`, `current-page` or `library-duplicates`.
    pub scope: String,
    pub components_created: i64,
    pub icons_replaced: i64,
    pub pages_affected: i64,
    pub failed_operations: i64,
    pub started_at: String,
    pub finished_at: String,
}

//! JSON message shapes exchanged with a host.
//!
//! Requests and responses are internally tagged by `type`, kebab-case
//! variant names and camelCase fields.

use serde::{Deserialize, Serialize};

use crate::model::{Candidate, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConsolidationScope {
    #[default]
    AllPages,
    CurrentPage,
}

impl ConsolidationScope {
    pub fn as_str(self) -> &'static str {
        match self {
            ConsolidationScope::AllPages => "all-pages",
            ConsolidationScope::CurrentPage => "current-page",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum Request {
    Scan,
    Consolidate {
        icons: Vec<Candidate>,
        #[serde(default)]
        scope: ConsolidationScope,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        current_page_name: Option<String>,
    },
    ConsolidateLibraryDuplicates {
        icons: Vec<Candidate>,
        current_page_name: String,
    },
    Preview {
        node_id: NodeId,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub total_icons: usize,
    pub inconsistencies: usize,
    pub discovered_icons: Vec<Candidate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignored_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_page_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    /// 0..=100
    pub percentage: u8,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsolidationResult {
    pub components_created: usize,
    pub icons_replaced: usize,
    pub pages_affected: usize,
    pub failed_operations: usize,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryDuplicatesResult {
    pub duplicates_removed: usize,
    pub errors: usize,
    pub error_details: Vec<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum Response {
    ScanResult(ScanResult),
    Progress(Progress),
    ConsolidationResult(ConsolidationResult),
    LibraryDuplicatesResult(LibraryDuplicatesResult),
    Preview { node_id: NodeId, svg: Option<String> },
    Error { message: String },
}

impl Response {
    pub fn error(message: impl Into<String>) -> Self {
        Response::Error { message: message.into() }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_parse_from_host_json() {
        let scan: Request = serde_json::from_str(r#"{"type":"scan"}"#).unwrap();
        assert_eq!(scan, Request::Scan);

        let consolidate: Request = serde_json::from_str(
            r#"{"type":"consolidate","icons":[],"scope":"current-page","currentPageName":"Home"}"#,
        )
        .unwrap();
        assert_eq!(
            consolidate,
            Request::Consolidate {
                icons: vec![],
                scope: ConsolidationScope::CurrentPage,
                current_page_name: Some("Home".into()),
            }
        );

        let preview: Request =
            serde_json::from_str(r#"{"type":"preview","nodeId":"12:4"}"#).unwrap();
        assert_eq!(preview, Request::Preview { node_id: NodeId::new("12:4") });
    }

    #[test]
    fn responses_carry_a_type_tag() {
        let value = serde_json::to_value(Response::ConsolidationResult(ConsolidationResult {
            components_created: 1,
            icons_replaced: 5,
            pages_affected: 1,
            failed_operations: 0,
            message: "done".into(),
        }))
        .unwrap();
        assert_eq!(value["type"], "consolidation-result");
        assert_eq!(value["iconsReplaced"], 5);

        let err = serde_json::to_value(Response::error("boom")).unwrap();
        assert_eq!(err, serde_json::json!({"type": "error", "message": "boom"}));
    }
}

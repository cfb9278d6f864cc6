//! Host-facing services: the scan session, consolidation and message shapes.

pub mod consolidation;
pub mod messages;
pub mod session;

pub use consolidation::{ClusterOutcome, ConsolidationTransaction, LibraryOutcome};
pub use messages::{
    ConsolidationResult, ConsolidationScope, LibraryDuplicatesResult, Progress, Request, Response,
    ScanResult,
};
pub use session::{EngineError, ScanSession};

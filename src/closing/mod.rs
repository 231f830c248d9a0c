//! Closing module
//!
//! Drawer closing submission, persisted records and the service tying
//! them to the reconciliation engine.

mod record;
mod service;
mod submission;

pub use record::{ClosingRecord, ClosingView};
pub use service::{ClosingService, HistoryPage, PreviewRequest, PreviewResult};
pub use submission::ClosingSubmission;

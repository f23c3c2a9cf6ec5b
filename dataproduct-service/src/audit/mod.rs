//! Audit trail for completed writes
//!
//! The audit pipeline stage turns each successful create, update or delete into
//! an [`AuditEntry`] and appends it to an [`AuditSink`]. Whether a sink failure
//! fails the request is decided by the pipeline's side-effect policy, not here.

pub mod event;
pub mod sink;

pub use event::AuditEntry;
pub use sink::{AuditSink, InMemoryAuditSink, TracingAuditSink};

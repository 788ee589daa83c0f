//! Audit logging module
//!
//! Provides the durable, line-oriented audit trail of deidentification runs.

pub mod logger;

pub use logger::{hash_contents, AuditLogger};

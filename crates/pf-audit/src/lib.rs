//! # pf-audit
//!
//! Hash-chained audit trail for Policy Forge.
//!
//! Records the events a compliance reviewer needs: a policy set compiled for
//! a scope, an emergency override taking effect, and deny-rule violations
//! reported by the enforcement point. Events go to an [`AuditSink`]; the
//! file-backed [`AuditLog`] writes JSONL where each line carries the SHA-256
//! of the line before it, so tampering is detectable.
//!
//! ## Quick Example
//!
//! ```rust,no_run
//! use pf_audit::{AuditAction, AuditEvent, AuditLog, AuditSink};
//!
//! let mut log = AuditLog::open(".pf/audit.jsonl").unwrap();
//! log.record(
//!     AuditEvent::new("payments-prod", AuditAction::EmergencyOverrideActivated)
//!         .with_detail("INC-4412 identity provider outage"),
//! )
//! .unwrap();
//! ```

pub mod error;
pub mod event;
pub mod hasher;
pub mod log;
pub mod sink;

pub use error::AuditError;
pub use event::{AuditAction, AuditEvent};
pub use log::AuditLog;
pub use sink::{AuditSink, MemorySink};

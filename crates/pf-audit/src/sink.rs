// sink.rs — The audit sink seam.
//
// Anything that accepts audit events implements `AuditSink`. The sink owns
// the chain: it sets `previous_hash` on every event it records, so callers
// build events without knowing what came before.

use crate::error::AuditError;
use crate::event::AuditEvent;
use crate::hasher;

/// Receives audit events. Recording never drops an event silently.
pub trait AuditSink {
    /// Chain and store `event`, returning it as stored.
    fn record(&mut self, event: AuditEvent) -> Result<AuditEvent, AuditError>;
}

/// In-memory sink, chained the same way as the file log.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Vec<AuditEvent>,
    last_hash: Option<String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[AuditEvent] {
        &self.events
    }

    pub fn last_hash(&self) -> Option<&str> {
        self.last_hash.as_deref()
    }
}

impl AuditSink for MemorySink {
    fn record(&mut self, mut event: AuditEvent) -> Result<AuditEvent, AuditError> {
        event.previous_hash = self.last_hash.clone();
        let line = serde_json::to_string(&event)?;
        self.last_hash = Some(hasher::hash_str(&line));
        self.events.push(event.clone());
        Ok(event)
    }
}

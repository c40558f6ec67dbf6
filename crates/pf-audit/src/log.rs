// log.rs — Append-only JSONL audit log.
//
// One JSON event per line. Each event's `previous_hash` is the SHA-256 of
// the raw previous line, so inserting, deleting, or editing a line breaks
// the chain at that point and `verify_chain` reports where.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::AuditError;
use crate::event::AuditEvent;
use crate::hasher;
use crate::sink::AuditSink;

/// File-backed, hash-chained audit log.
pub struct AuditLog {
    writer: BufWriter<File>,
    path: PathBuf,
    /// Hash of the last line written; the next event links to it.
    last_hash: Option<String>,
}

impl AuditLog {
    /// Open or create the log, recovering the chain head from existing lines.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AuditError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| AuditError::OpenFailed {
                    path: path.clone(),
                    source,
                })?;
            }
        }

        let last_hash = if path.exists() {
            Self::read_last_hash(&path)?
        } else {
            None
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| AuditError::OpenFailed {
                path: path.clone(),
                source,
            })?;

        Ok(Self {
            writer: BufWriter::new(file),
            path,
            last_hash,
        })
    }

    /// Link `event` to the chain head, write it, and flush.
    pub fn append(&mut self, event: &mut AuditEvent) -> Result<(), AuditError> {
        event.previous_hash = self.last_hash.clone();
        let json = serde_json::to_string(event)?;
        self.last_hash = Some(hasher::hash_str(&json));
        writeln!(self.writer, "{}", json)?;
        self.writer.flush()?;
        tracing::debug!(path = %self.path.display(), action = %event.action, scope = %event.scope, "audit event appended");
        Ok(())
    }

    /// Every event in the file, oldest first.
    pub fn read_all(path: impl AsRef<Path>) -> Result<Vec<AuditEvent>, AuditError> {
        let mut events = Vec::new();
        for line in Self::lines(path.as_ref())? {
            events.push(serde_json::from_str(&line)?);
        }
        Ok(events)
    }

    /// The last `n` events, oldest first.
    pub fn tail(path: impl AsRef<Path>, n: usize) -> Result<Vec<AuditEvent>, AuditError> {
        let mut events = Self::read_all(path)?;
        let skip = events.len().saturating_sub(n);
        Ok(events.split_off(skip))
    }

    /// Walk the file and check every link. Returns the number of events.
    pub fn verify_chain(path: impl AsRef<Path>) -> Result<usize, AuditError> {
        let mut previous_hash: Option<String> = None;
        let mut count = 0;
        for (index, line) in Self::lines(path.as_ref())?.into_iter().enumerate() {
            let event: AuditEvent = serde_json::from_str(&line)?;
            if event.previous_hash != previous_hash {
                return Err(AuditError::IntegrityViolation {
                    line: index + 1,
                    expected: previous_hash.unwrap_or_else(|| "none".to_string()),
                    actual: event.previous_hash.unwrap_or_else(|| "none".to_string()),
                });
            }
            // Hash the stored line, not a re-serialization of the event.
            previous_hash = Some(hasher::hash_str(&line));
            count += 1;
        }
        Ok(count)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lines(path: &Path) -> Result<Vec<String>, AuditError> {
        let file = File::open(path).map_err(|source| AuditError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let mut lines = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if !line.trim().is_empty() {
                lines.push(line);
            }
        }
        Ok(lines)
    }

    fn read_last_hash(path: &Path) -> Result<Option<String>, AuditError> {
        Ok(Self::lines(path)?
            .last()
            .map(|line| hasher::hash_str(line)))
    }
}

impl AuditSink for AuditLog {
    fn record(&mut self, mut event: AuditEvent) -> Result<AuditEvent, AuditError> {
        self.append(&mut event)?;
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::AuditAction;
    use tempfile::tempdir;

    #[test]
    fn append_and_read_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        {
            let mut log = AuditLog::open(&path).unwrap();
            let mut compiled = AuditEvent::new("payments-prod", AuditAction::PolicyCompiled);
            let mut denied = AuditEvent::violation(
                "payments-prod",
                "shared-mfa-enforcement",
                "user:eve@x.com",
                "iam.googleapis.com/roles.update",
            );
            log.append(&mut compiled).unwrap();
            log.append(&mut denied).unwrap();
        }
        let events = AuditLog::read_all(&path).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].action, AuditAction::PolicyCompiled);
        assert!(events[0].previous_hash.is_none());
        assert!(events[1].previous_hash.is_some());
    }

    #[test]
    fn chain_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("audit.jsonl");
        for scope in ["alpha-prod", "bravo-prod", "charlie-prod"] {
            let mut log = AuditLog::open(&path).unwrap();
            log.record(AuditEvent::new(scope, AuditAction::PolicyCompiled))
                .unwrap();
        }
        assert_eq!(AuditLog::verify_chain(&path).unwrap(), 3);
    }

    #[test]
    fn edited_line_breaks_chain() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        {
            let mut log = AuditLog::open(&path).unwrap();
            for _ in 0..3 {
                log.record(AuditEvent::new("folders/12", AuditAction::PolicyCompiled))
                    .unwrap();
            }
        }
        let content = std::fs::read_to_string(&path).unwrap();
        let tampered = content.replacen("folders/12", "folders/13", 1);
        std::fs::write(&path, tampered).unwrap();

        match AuditLog::verify_chain(&path) {
            Err(AuditError::IntegrityViolation { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected integrity violation, got {:?}", other),
        }
    }

    #[test]
    fn tail_returns_most_recent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        {
            let mut log = AuditLog::open(&path).unwrap();
            for scope in ["one-scope", "two-scope", "three-scope"] {
                log.record(AuditEvent::new(scope, AuditAction::PolicyCompiled))
                    .unwrap();
            }
        }
        let last_two = AuditLog::tail(&path, 2).unwrap();
        let scopes: Vec<&str> = last_two.iter().map(|e| e.scope.as_str()).collect();
        assert_eq!(scopes, vec!["two-scope", "three-scope"]);
        assert_eq!(AuditLog::tail(&path, 10).unwrap().len(), 3);
    }
}

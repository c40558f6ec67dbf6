// audit.rs — Audit subcommands: verify, tail, violation.

use std::path::PathBuf;

use clap::Subcommand;
use pf_audit::{AuditError, AuditEvent, AuditLog, AuditSink};

use crate::config::ForgeConfig;

#[derive(Subcommand)]
pub enum AuditCommands {
    /// Verify the audit log hash chain.
    Verify {
        /// Path to audit log (defaults to .pf/audit.jsonl).
        #[arg(long)]
        log: Option<PathBuf>,
    },
    /// Show recent audit events.
    Tail {
        /// Path to audit log (defaults to .pf/audit.jsonl).
        #[arg(long)]
        log: Option<PathBuf>,
        /// Number of events to show.
        #[arg(short, default_value = "10")]
        n: usize,
    },
    /// Record a deny-policy violation reported by the enforcement point.
    Violation {
        /// Scope id the denial happened in.
        #[arg(long)]
        scope: String,
        /// Rule that denied the request.
        #[arg(long)]
        rule: String,
        /// Principal that was denied.
        #[arg(long)]
        principal: String,
        /// Permission that was denied.
        #[arg(long)]
        permission: String,
        /// Path to audit log (defaults to .pf/audit.jsonl).
        #[arg(long)]
        log: Option<PathBuf>,
    },
}

pub fn execute(cmd: &AuditCommands, config: &ForgeConfig) -> anyhow::Result<()> {
    match cmd {
        AuditCommands::Verify { log } => {
            let path = log.clone().unwrap_or_else(|| config.audit_log.clone());
            if !path.exists() {
                println!("No audit log found at {}", path.display());
                return Ok(());
            }
            match AuditLog::verify_chain(&path) {
                Ok(count) => {
                    println!("Audit log verified: {} event(s), hash chain intact.", count);
                }
                Err(AuditError::IntegrityViolation {
                    line,
                    expected,
                    actual,
                }) => {
                    println!("INTEGRITY VIOLATION at line {}:", line);
                    println!("  Expected previous_hash: {}", expected);
                    println!("  Actual previous_hash:   {}", actual);
                    println!();
                    println!("The audit log may have been tampered with.");
                    anyhow::bail!("Audit log integrity check failed");
                }
                Err(e) => return Err(e.into()),
            }
        }

        AuditCommands::Tail { log, n } => {
            let path = log.clone().unwrap_or_else(|| config.audit_log.clone());
            if !path.exists() {
                println!("No audit log found at {}", path.display());
                return Ok(());
            }
            let recent = AuditLog::tail(&path, *n)?;
            if recent.is_empty() {
                println!("No audit events.");
                return Ok(());
            }
            println!(
                "{:<20} {:<24} {:<30} DETAIL",
                "TIMESTAMP", "SCOPE", "ACTION"
            );
            println!("{}", "-".repeat(96));
            for event in &recent {
                println!("{}", tail_line(event));
            }
        }

        AuditCommands::Violation {
            scope,
            rule,
            principal,
            permission,
            log,
        } => {
            let path = log.clone().unwrap_or_else(|| config.audit_log.clone());
            let mut audit = AuditLog::open(&path)?;
            let event = audit.record(AuditEvent::violation(scope, rule, principal, permission))?;
            tracing::info!(scope = %scope, rule = %rule, principal = %principal, "deny-policy violation recorded");
            println!("Recorded violation {} in {}", event.event_id, path.display());
        }
    }

    Ok(())
}

fn tail_line(event: &AuditEvent) -> String {
    let detail = match (&event.rule_name, &event.principal, &event.detail) {
        (Some(rule), Some(principal), detail) => format!(
            "{} {} {}",
            rule,
            principal,
            detail.as_deref().unwrap_or("")
        ),
        (_, _, Some(detail)) => detail.clone(),
        _ => "-".to_string(),
    };
    format!(
        "{:<20} {:<24} {:<30} {}",
        event.timestamp.format("%Y-%m-%d %H:%M:%S"),
        event.scope,
        event.action.to_string(),
        detail.trim_end()
    )
}

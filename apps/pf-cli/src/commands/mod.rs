// mod.rs — Subcommand implementations and the helpers they share.

pub mod audit;
pub mod compile;
pub mod level;
pub mod plan;

use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Utc};
use pf_policy::{BreakGlassResolver, CompilationInput};

/// Parse `--at`, or take the current time when it is absent.
pub fn evaluation_time(at: Option<&str>) -> anyhow::Result<DateTime<Utc>> {
    match at {
        Some(raw) => Ok(DateTime::parse_from_rfc3339(raw)
            .with_context(|| format!("--at '{}' is not an RFC 3339 timestamp", raw))?
            .with_timezone(&Utc)),
        None => Ok(Utc::now()),
    }
}

/// Load a scope configuration and inject what the engine needs from outside:
/// the evaluation time (unless the file pins one) and, when the file names
/// no break-glass group, the remote break-glass state.
pub fn load_input(
    path: &Path,
    at: DateTime<Utc>,
    resolver: &dyn BreakGlassResolver,
) -> anyhow::Result<CompilationInput> {
    Ok(CompilationInput::from_file(path)?
        .with_default_evaluation_time(at)
        .with_resolved_fallback(resolver))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pf_policy::RemoteBreakGlass;
    use tempfile::tempdir;

    #[test]
    fn parses_rfc3339_in_any_offset() {
        let at = evaluation_time(Some("2026-03-01T14:00:00+02:00")).unwrap();
        assert_eq!(at.to_rfc3339(), "2026-03-01T12:00:00+00:00");
        assert!(evaluation_time(Some("yesterday")).is_err());
    }

    #[test]
    fn remote_state_injected_only_when_needed() {
        let dir = tempdir().unwrap();
        let with_group = dir.path().join("a.yaml");
        std::fs::write(
            &with_group,
            "scope: { tier: project, id: ledger-prod }\nexception_sources: { break_glass_group: sec@x.com }\n",
        )
        .unwrap();
        let without = dir.path().join("b.yaml");
        std::fs::write(&without, "scope: { tier: project, id: ledger-prod }\n").unwrap();

        let remote = RemoteBreakGlass::Unavailable {
            reason: "offline".to_string(),
        };
        let at = evaluation_time(None).unwrap();
        assert!(load_input(&with_group, at, &remote)
            .unwrap()
            .exception_sources
            .remote_fallback
            .is_none());
        assert_eq!(
            load_input(&without, at, &remote)
                .unwrap()
                .exception_sources
                .remote_fallback,
            Some(remote)
        );
    }
}

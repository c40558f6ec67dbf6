// compile.rs — `pf compile`: configurations in, manifests and audit records out.
//
// All scopes compile in parallel; failures are reported per scope and the
// command fails if any scope did. Every manifest written gets a
// PolicyCompiled record, and a manifest with the override active also gets
// an EmergencyOverrideActivated record, written first.

use std::path::{Path, PathBuf};

use anyhow::Context;
use pf_audit::{AuditAction, AuditEvent, AuditLog, AuditSink};
use pf_policy::{apply_order, compile_batch, PolicySet};

use crate::commands::{evaluation_time, load_input};
use crate::config::ForgeConfig;
use crate::resolver::StateFileResolver;

pub fn execute(
    config: &ForgeConfig,
    configs: &[PathBuf],
    out: Option<&Path>,
    at: Option<&str>,
    stdout: bool,
) -> anyhow::Result<()> {
    let at = evaluation_time(at)?;
    let resolver = StateFileResolver::new(&config.break_glass_state);

    let inputs = configs
        .iter()
        .map(|path| load_input(path, at, &resolver))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let mut compiled = Vec::new();
    let mut failures = 0;
    for (path, result) in configs.iter().zip(compile_batch(&inputs)) {
        match result {
            Ok(outcome) => compiled.push(outcome.policy_set),
            Err(e) => {
                failures += 1;
                eprintln!("error: {}: {}", path.display(), e);
            }
        }
    }

    let mut audit = AuditLog::open(&config.audit_log)
        .with_context(|| format!("failed to open audit log {}", config.audit_log.display()))?;
    let out_dir = out.map(Path::to_path_buf).unwrap_or_else(|| config.output_dir.clone());

    let ordered = apply_order(&compiled);
    if stdout {
        let json = match ordered.as_slice() {
            [single] => single.to_json_pretty()?,
            many => serde_json::to_string_pretty(many)?,
        };
        println!("{}", json);
    }

    for set in ordered {
        let destination = if stdout {
            None
        } else {
            Some(write_manifest(&out_dir, set)?)
        };
        record(&mut audit, set, destination.as_deref())?;
        if let Some(path) = destination {
            print_summary(set, &path);
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} scope(s) failed to compile", failures, configs.len());
    }
    Ok(())
}

/// File name for a scope's manifest: `<tier>-<id>.json`, `/` replaced by `-`.
pub fn manifest_file_name(set: &PolicySet) -> String {
    format!("{}-{}.json", set.scope.tier, set.scope.id.replace('/', "-"))
}

fn write_manifest(out_dir: &Path, set: &PolicySet) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;
    let path = out_dir.join(manifest_file_name(set));
    let mut json = set.to_json_pretty()?;
    json.push('\n');
    std::fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

fn record(sink: &mut dyn AuditSink, set: &PolicySet, manifest: Option<&Path>) -> anyhow::Result<()> {
    if set.emergency_override_active() {
        let reason = set.emergency_override.reason.clone().unwrap_or_default();
        sink.record(
            AuditEvent::new(&set.scope.id, AuditAction::EmergencyOverrideActivated)
                .with_detail(reason)
                .with_metadata(serde_json::json!({
                    "requested_frameworks": set.requested_frameworks,
                    "compliance_level": set.compliance_level,
                    "suppressed_rule_count": set.summary.suppressed_rule_count,
                })),
        )?;
    }
    sink.record(
        AuditEvent::new(&set.scope.id, AuditAction::PolicyCompiled).with_metadata(serde_json::json!({
            "digest": set.digest,
            "compliance_level": set.compliance_level,
            "rule_count": set.summary.rule_count,
            "manifest": manifest.map(|p| p.display().to_string()),
        })),
    )?;
    Ok(())
}

fn print_summary(set: &PolicySet, path: &Path) {
    println!(
        "Compiled {} {} at {}: {} rule(s) -> {}",
        set.scope.tier,
        set.scope.id,
        set.compliance_level,
        set.summary.rule_count,
        path.display()
    );
    if set.emergency_override_active() {
        println!(
            "  EMERGENCY OVERRIDE ACTIVE ({}): {} rule(s) withheld",
            set.emergency_override.reason.as_deref().unwrap_or("-"),
            set.summary.suppressed_rule_count
        );
    }
}

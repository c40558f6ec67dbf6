// plan.rs — `pf plan`: compile a scope and diff it against the applied manifest.

use std::path::Path;

use anyhow::Context;
use pf_policy::{compile, plan, ApplyPlan, ChangeAction, PolicySet};

use crate::commands::{evaluation_time, load_input};
use crate::config::ForgeConfig;
use crate::resolver::StateFileResolver;

pub fn execute(
    config: &ForgeConfig,
    input: &Path,
    previous: Option<&Path>,
    at: Option<&str>,
) -> anyhow::Result<()> {
    let at = evaluation_time(at)?;
    let resolver = StateFileResolver::new(&config.break_glass_state);
    let next = compile(&load_input(input, at, &resolver)?)?.policy_set;

    let previous = previous.map(load_manifest).transpose()?;
    let plan = plan(previous.as_ref(), &next)?;
    print!("{}", render(&plan, &next));
    Ok(())
}

fn load_manifest(path: &Path) -> anyhow::Result<PolicySet> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read manifest {}", path.display()))?;
    let set = PolicySet::from_json_str(&json)
        .with_context(|| format!("{} is not a policy manifest", path.display()))?;
    if !set.verify_digest()? {
        tracing::warn!(manifest = %path.display(), "manifest digest does not match its contents");
    }
    Ok(set)
}

fn render(plan: &ApplyPlan, next: &PolicySet) -> String {
    let mut out = format!(
        "Plan for {} {} (level {}) under {}\n",
        plan.scope.tier, plan.scope.id, next.compliance_level, plan.policy_parent
    );
    if next.emergency_override_active() {
        out.push_str("Emergency override active: all rules are withheld.\n");
    }
    out.push_str(&format!("{:<10} RULE\n", "ACTION"));
    out.push_str(&format!("{}\n", "-".repeat(60)));
    for change in &plan.changes {
        let action = match change.action {
            ChangeAction::Create => "create",
            ChangeAction::Update => "update",
            ChangeAction::Delete => "delete",
            ChangeAction::Unchanged => "unchanged",
        };
        out.push_str(&format!("{:<10} {}\n", action, change.rule_name));
    }
    out.push_str(&format!(
        "{} to create, {} to update, {} to delete, {} unchanged\n",
        plan.count(ChangeAction::Create),
        plan.count(ChangeAction::Update),
        plan.count(ChangeAction::Delete),
        plan.count(ChangeAction::Unchanged)
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pf_policy::{
        ComplianceLevel, DenyRule, ExceptionPrincipalSet, Framework, OverrideGate,
        PolicySetAssembler, RuleCategory, Scope, ScopeTier,
    };
    use std::collections::BTreeSet;

    fn set(rules: Vec<DenyRule>) -> PolicySet {
        PolicySetAssembler::assemble(
            Scope::resolve(ScopeTier::Project, "ledger-prod").unwrap(),
            ComplianceLevel::Medium,
            BTreeSet::from([Framework::Iso27001]),
            &OverrideGate::Enforcing,
            rules,
            vec![],
        )
        .unwrap()
    }

    fn rule(id: &str) -> DenyRule {
        DenyRule::new(RuleCategory::Iso27001, id, "d", ExceptionPrincipalSet::new())
            .with_permissions(["iam.googleapis.com/roles.update"])
    }

    #[test]
    fn renders_actions_and_totals() {
        let prev = set(vec![rule("old")]);
        let next = set(vec![rule("new")]);
        let out = render(&plan(Some(&prev), &next).unwrap(), &next);
        assert!(out.contains("create     iso27001-new"));
        assert!(out.contains("delete     iso27001-old"));
        assert!(out.contains("1 to create, 0 to update, 1 to delete, 0 unchanged"));
        assert!(out.contains("policies/cloudresourcemanager.googleapis.com%2Fprojects%2Fledger-prod/denypolicies"));
    }

    #[test]
    fn manifest_file_round_trip_verifies() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.json");
        let original = set(vec![rule("a")]);
        std::fs::write(&path, original.to_json_pretty().unwrap()).unwrap();
        assert_eq!(load_manifest(&path).unwrap(), original);
        assert!(load_manifest(&dir.path().join("missing.json")).is_err());
    }
}

// applier.rs — Planning and applying a PolicySet against a scope.
//
// The engine never talks to the cloud control plane. It does own the diff:
// given the previously applied set and the new one, `plan` says which rules
// to create, update, delete, or leave alone. A `PolicyApplier` turns that
// plan into calls and reports per-rule outcomes.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::assembler::PolicySet;
use crate::error::PolicyError;
use crate::rule::DenyRule;
use crate::scope::Scope;

/// What happens to one rule name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
    Create,
    Update,
    Delete,
    Unchanged,
}

/// One row of an [`ApplyPlan`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedChange {
    pub rule_name: String,
    pub action: ChangeAction,
}

/// Ordered (by rule name) list of changes for one scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyPlan {
    pub scope: Scope,
    /// Parent the applier creates rules under.
    pub policy_parent: String,
    pub changes: Vec<PlannedChange>,
}

impl ApplyPlan {
    pub fn count(&self, action: ChangeAction) -> usize {
        self.changes.iter().filter(|c| c.action == action).count()
    }

    /// True if anything other than `Unchanged` is planned.
    pub fn has_changes(&self) -> bool {
        self.changes
            .iter()
            .any(|c| c.action != ChangeAction::Unchanged)
    }
}

/// Diff `next` against what was applied before.
///
/// With no previous set every rule is a create. The two sets must target
/// the same scope.
pub fn plan(previous: Option<&PolicySet>, next: &PolicySet) -> Result<ApplyPlan, PolicyError> {
    let before: &[DenyRule] = match previous {
        Some(prev) if prev.scope.canonical_address != next.scope.canonical_address => {
            return Err(PolicyError::validation(
                &next.scope.id,
                "scope",
                format!(
                    "previous manifest targets {} but the new one targets {}",
                    prev.scope.canonical_address, next.scope.canonical_address
                ),
            ));
        }
        Some(prev) => &prev.rules,
        None => &[],
    };

    let before: HashMap<&str, &DenyRule> = before.iter().map(|r| (r.name.as_str(), r)).collect();
    let after: HashMap<&str, &DenyRule> = next.rules.iter().map(|r| (r.name.as_str(), r)).collect();

    let mut actions: BTreeMap<&str, ChangeAction> = BTreeMap::new();
    for (name, rule) in &after {
        let action = match before.get(name) {
            None => ChangeAction::Create,
            Some(old) if *old == *rule => ChangeAction::Unchanged,
            Some(_) => ChangeAction::Update,
        };
        actions.insert(*name, action);
    }
    for name in before.keys() {
        if !after.contains_key(name) {
            actions.insert(*name, ChangeAction::Delete);
        }
    }

    Ok(ApplyPlan {
        scope: next.scope.clone(),
        policy_parent: next.scope.policy_parent(),
        changes: actions
            .into_iter()
            .map(|(name, action)| PlannedChange {
                rule_name: name.to_string(),
                action,
            })
            .collect(),
    })
}

/// Result of applying one planned change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeStatus {
    Succeeded,
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleOutcome {
    pub rule_name: String,
    pub action: ChangeAction,
    pub status: OutcomeStatus,
}

/// Per-rule outcomes of one apply call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyReport {
    pub scope: String,
    pub outcomes: Vec<RuleOutcome>,
}

impl ApplyReport {
    pub fn all_succeeded(&self) -> bool {
        self.outcomes
            .iter()
            .all(|o| o.status == OutcomeStatus::Succeeded)
    }

    pub fn failures(&self) -> impl Iterator<Item = &RuleOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.status != OutcomeStatus::Succeeded)
    }
}

/// Materializes policy sets against a control plane.
///
/// Implementations must be idempotent: applying the same set twice leaves
/// the target unchanged after the first call.
pub trait PolicyApplier {
    fn apply(&mut self, policy_set: &PolicySet) -> Result<ApplyReport, PolicyError>;
}

/// Applier that records what it would do and remembers the last set per scope.
#[derive(Debug, Default)]
pub struct DryRunApplier {
    applied: HashMap<String, PolicySet>,
}

impl DryRunApplier {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last set applied to the scope with this canonical address.
    pub fn applied(&self, canonical_address: &str) -> Option<&PolicySet> {
        self.applied.get(canonical_address)
    }
}

impl PolicyApplier for DryRunApplier {
    fn apply(&mut self, policy_set: &PolicySet) -> Result<ApplyReport, PolicyError> {
        let address = &policy_set.scope.canonical_address;
        let plan = plan(self.applied.get(address), policy_set)?;
        tracing::info!(
            scope = %policy_set.scope.id,
            create = plan.count(ChangeAction::Create),
            update = plan.count(ChangeAction::Update),
            delete = plan.count(ChangeAction::Delete),
            "dry-run apply"
        );
        let outcomes = plan
            .changes
            .into_iter()
            .map(|change| RuleOutcome {
                rule_name: change.rule_name,
                action: change.action,
                status: OutcomeStatus::Succeeded,
            })
            .collect();
        self.applied.insert(address.clone(), policy_set.clone());
        Ok(ApplyReport {
            scope: policy_set.scope.id.clone(),
            outcomes,
        })
    }
}

/// Order sets parent-first (organization, folder, project), stable within a tier.
pub fn apply_order(sets: &[PolicySet]) -> Vec<&PolicySet> {
    let mut ordered: Vec<&PolicySet> = sets.iter().collect();
    ordered.sort_by_key(|set| set.scope.tier);
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::PolicySetAssembler;
    use crate::emergency::{EmergencyOverride, OverrideGate};
    use crate::error::PolicyErrorKind;
    use crate::exception::ExceptionPrincipalSet;
    use crate::framework::Framework;
    use crate::level::ComplianceLevel;
    use crate::rule::RuleCategory;
    use crate::scope::ScopeTier;
    use std::collections::BTreeSet;

    fn rule(id: &str, permission: &str) -> DenyRule {
        DenyRule::new(RuleCategory::Gdpr, id, "d", ExceptionPrincipalSet::new())
            .with_permissions([permission])
    }

    fn set(tier: ScopeTier, id: &str, rules: Vec<DenyRule>) -> PolicySet {
        set_with_gate(tier, id, rules, &OverrideGate::Enforcing)
    }

    fn set_with_gate(tier: ScopeTier, id: &str, rules: Vec<DenyRule>, gate: &OverrideGate) -> PolicySet {
        PolicySetAssembler::assemble(
            Scope::resolve(tier, id).unwrap(),
            ComplianceLevel::Baseline,
            BTreeSet::from([Framework::Gdpr]),
            gate,
            rules,
            vec![],
        )
        .unwrap()
    }

    #[test]
    fn first_apply_creates_everything() {
        let next = set(ScopeTier::Project, "abcdef", vec![rule("b", "x.y/z"), rule("a", "x.y/z")]);
        let plan = plan(None, &next).unwrap();
        assert_eq!(plan.count(ChangeAction::Create), 2);
        assert_eq!(plan.changes[0].rule_name, "gdpr-a");
        assert_eq!(
            plan.policy_parent,
            "policies/cloudresourcemanager.googleapis.com%2Fprojects%2Fabcdef/denypolicies"
        );
    }

    #[test]
    fn diff_classifies_each_rule() {
        let prev = set(
            ScopeTier::Project,
            "abcdef",
            vec![rule("keep", "a.b/c"), rule("change", "a.b/c"), rule("drop", "a.b/c")],
        );
        let next = set(
            ScopeTier::Project,
            "abcdef",
            vec![rule("keep", "a.b/c"), rule("change", "a.b/d"), rule("new", "a.b/c")],
        );
        let plan = plan(Some(&prev), &next).unwrap();
        let actions: Vec<(&str, ChangeAction)> = plan
            .changes
            .iter()
            .map(|c| (c.rule_name.as_str(), c.action))
            .collect();
        assert_eq!(
            actions,
            vec![
                ("gdpr-change", ChangeAction::Update),
                ("gdpr-drop", ChangeAction::Delete),
                ("gdpr-keep", ChangeAction::Unchanged),
                ("gdpr-new", ChangeAction::Create),
            ]
        );
        assert!(plan.has_changes());
    }

    #[test]
    fn identical_sets_plan_no_changes() {
        let a = set(ScopeTier::Folder, "folders/9", vec![rule("a", "a.b/c")]);
        let plan = plan(Some(&a), &a.clone()).unwrap();
        assert!(!plan.has_changes());
    }

    #[test]
    fn scope_mismatch_rejected() {
        let prev = set(ScopeTier::Project, "abcdef", vec![]);
        let next = set(ScopeTier::Project, "ghijkl", vec![]);
        let err = plan(Some(&prev), &next).unwrap_err();
        assert_eq!(err.kind(), PolicyErrorKind::Validation);
    }

    #[test]
    fn override_plans_deletion_of_live_rules() {
        let live = set(ScopeTier::Project, "abcdef", vec![rule("a", "a.b/c")]);
        let gate = OverrideGate::from_request("abcdef", &EmergencyOverride::activate("INC-1 full outage")).unwrap();
        let overridden = set_with_gate(ScopeTier::Project, "abcdef", vec![rule("a", "a.b/c")], &gate);
        let plan = plan(Some(&live), &overridden).unwrap();
        assert_eq!(plan.count(ChangeAction::Delete), 1);
    }

    #[test]
    fn dry_run_is_idempotent() {
        let mut applier = DryRunApplier::new();
        let next = set(ScopeTier::Project, "abcdef", vec![rule("a", "a.b/c")]);
        let first = applier.apply(&next).unwrap();
        assert!(first.all_succeeded());
        assert_eq!(first.outcomes[0].action, ChangeAction::Create);

        let second = applier.apply(&next).unwrap();
        assert_eq!(second.outcomes[0].action, ChangeAction::Unchanged);
        assert_eq!(second.failures().count(), 0);
        assert!(applier
            .applied("cloudresourcemanager.googleapis.com/projects/abcdef")
            .is_some());
    }

    #[test]
    fn parents_applied_first() {
        let sets = vec![
            set(ScopeTier::Project, "proj-one", vec![]),
            set(ScopeTier::Folder, "folders/1", vec![]),
            set(ScopeTier::Project, "proj-two", vec![]),
            set(ScopeTier::Organization, "42", vec![]),
        ];
        let ids: Vec<&str> = apply_order(&sets)
            .iter()
            .map(|s| s.scope.id.as_str())
            .collect();
        assert_eq!(ids, vec!["42", "folders/1", "proj-one", "proj-two"]);
    }
}

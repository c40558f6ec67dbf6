// assembler.rs — PolicySet assembly and manifest.
//
// Framework rules (canonical framework order) are merged ahead of shared
// rules. A repeated name with identical content is dropped; a repeated name
// with different content is a table bug and fails the compilation. While the
// emergency override is active the merged rules are counted, then withheld.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::emergency::OverrideGate;
use crate::error::PolicyError;
use crate::framework::Framework;
use crate::level::ComplianceLevel;
use crate::rule::DenyRule;
use crate::scope::Scope;

/// Override state as recorded in the manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideRecord {
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<&OverrideGate> for OverrideRecord {
    fn from(gate: &OverrideGate) -> Self {
        Self {
            active: gate.is_overridden(),
            reason: gate.reason().map(str::to_string),
        }
    }
}

/// Summary block of the manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestSummary {
    pub rule_count: usize,
    /// Emitted rules per category slug.
    pub rules_by_category: BTreeMap<String, usize>,
    /// Rules that would have been emitted had no override been active.
    pub suppressed_rule_count: usize,
}

/// The compiled, immutable output for one scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicySet {
    pub scope: Scope,
    pub compliance_level: ComplianceLevel,
    /// Frameworks whose rules are in force (empty while overridden).
    pub enabled_frameworks: BTreeSet<Framework>,
    /// Frameworks the input asked for, kept even while overridden.
    pub requested_frameworks: BTreeSet<Framework>,
    pub emergency_override: OverrideRecord,
    pub rules: Vec<DenyRule>,
    pub summary: ManifestSummary,
    /// Lowercase-hex SHA-256 of the canonical JSON of every other field.
    pub digest: String,
}

/// Borrowed view of every field except the digest, in manifest order.
#[derive(Serialize)]
struct DigestView<'a> {
    scope: &'a Scope,
    compliance_level: ComplianceLevel,
    enabled_frameworks: &'a BTreeSet<Framework>,
    requested_frameworks: &'a BTreeSet<Framework>,
    emergency_override: &'a OverrideRecord,
    rules: &'a [DenyRule],
    summary: &'a ManifestSummary,
}

impl PolicySet {
    pub fn emergency_override_active(&self) -> bool {
        self.emergency_override.active
    }

    /// Look up a rule by name.
    pub fn rule(&self, name: &str) -> Option<&DenyRule> {
        self.rules.iter().find(|rule| rule.name == name)
    }

    /// Recompute the digest from the current field values.
    pub fn compute_digest(&self) -> Result<String, PolicyError> {
        let view = DigestView {
            scope: &self.scope,
            compliance_level: self.compliance_level,
            enabled_frameworks: &self.enabled_frameworks,
            requested_frameworks: &self.requested_frameworks,
            emergency_override: &self.emergency_override,
            rules: &self.rules,
            summary: &self.summary,
        };
        let mut hasher = Sha256::new();
        serde_json::to_writer(&mut hasher, &view).map_err(|e| PolicyError::Serialization {
            scope: self.scope.id.clone(),
            message: e.to_string(),
        })?;
        Ok(format!("{:x}", hasher.finalize()))
    }

    /// True when the stored digest matches the contents.
    pub fn verify_digest(&self) -> Result<bool, PolicyError> {
        Ok(self.compute_digest()? == self.digest)
    }

    /// Pretty JSON manifest. Identical sets render to identical bytes.
    pub fn to_json_pretty(&self) -> Result<String, PolicyError> {
        serde_json::to_string_pretty(self).map_err(|e| PolicyError::Serialization {
            scope: self.scope.id.clone(),
            message: e.to_string(),
        })
    }

    /// Parse a previously written manifest.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Merges compiled rule lists into a [`PolicySet`].
pub struct PolicySetAssembler;

impl PolicySetAssembler {
    /// Merge, check for conflicts, apply the gate, and seal with a digest.
    pub fn assemble(
        scope: Scope,
        compliance_level: ComplianceLevel,
        requested_frameworks: BTreeSet<Framework>,
        gate: &OverrideGate,
        framework_rules: Vec<DenyRule>,
        shared_rules: Vec<DenyRule>,
    ) -> Result<PolicySet, PolicyError> {
        let merged = merge(&scope, framework_rules.into_iter().chain(shared_rules))?;

        let (rules, enabled_frameworks, suppressed_rule_count) = if gate.is_overridden() {
            (Vec::new(), BTreeSet::new(), merged.len())
        } else {
            (merged, requested_frameworks.clone(), 0)
        };

        let mut rules_by_category = BTreeMap::new();
        for rule in &rules {
            *rules_by_category
                .entry(rule.category.slug().to_string())
                .or_insert(0) += 1;
        }

        let mut set = PolicySet {
            scope,
            compliance_level,
            enabled_frameworks,
            requested_frameworks,
            emergency_override: OverrideRecord::from(gate),
            summary: ManifestSummary {
                rule_count: rules.len(),
                rules_by_category,
                suppressed_rule_count,
            },
            rules,
            digest: String::new(),
        };
        set.digest = set.compute_digest()?;
        Ok(set)
    }
}

fn merge(
    scope: &Scope,
    rules: impl IntoIterator<Item = DenyRule>,
) -> Result<Vec<DenyRule>, PolicyError> {
    let mut merged: Vec<DenyRule> = Vec::new();
    let mut by_name: HashMap<String, usize> = HashMap::new();
    for rule in rules {
        match by_name.get(&rule.name) {
            Some(&index) if merged[index] == rule => {
                tracing::debug!(scope = %scope.id, rule = %rule.name, "identical duplicate rule dropped");
            }
            Some(_) => {
                return Err(PolicyError::Conflict {
                    scope: scope.id.clone(),
                    rule_name: rule.name,
                });
            }
            None => {
                by_name.insert(rule.name.clone(), merged.len());
                merged.push(rule);
            }
        }
    }
    Ok(merged)
}

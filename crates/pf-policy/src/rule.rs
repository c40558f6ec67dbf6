// rule.rs — Deny rule descriptors.
//
// A DenyRule blocks `denied_permissions` for `denied_principals` unless the
// caller is in `exception_principals`, optionally gated by a condition the
// enforcement point evaluates. Names are `<category>-<control-id>`, so
// recompiling unchanged input yields structurally identical rules.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::exception::ExceptionPrincipalSet;
use crate::framework::Framework;

/// Principal set matching every identity.
pub const ALL_PRINCIPALS: &str = "principalSet://goog/public:all";

/// Where a rule came from: a framework table or the shared controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleCategory {
    Iso27001,
    Soc2,
    PciDss,
    Hipaa,
    Gdpr,
    Shared,
}

impl RuleCategory {
    /// Rule-name prefix.
    pub fn slug(self) -> &'static str {
        match self {
            RuleCategory::Iso27001 => Framework::Iso27001.slug(),
            RuleCategory::Soc2 => Framework::Soc2.slug(),
            RuleCategory::PciDss => Framework::PciDss.slug(),
            RuleCategory::Hipaa => Framework::Hipaa.slug(),
            RuleCategory::Gdpr => Framework::Gdpr.slug(),
            RuleCategory::Shared => "shared",
        }
    }
}

impl From<Framework> for RuleCategory {
    fn from(framework: Framework) -> Self {
        match framework {
            Framework::Iso27001 => RuleCategory::Iso27001,
            Framework::Soc2 => RuleCategory::Soc2,
            Framework::PciDss => RuleCategory::PciDss,
            Framework::Hipaa => RuleCategory::Hipaa,
            Framework::Gdpr => RuleCategory::Gdpr,
        }
    }
}

impl fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Derive the rule name for a control.
pub fn rule_name(category: RuleCategory, control_id: &str) -> String {
    format!("{}-{}", category.slug(), control_id)
}

/// A concrete deny rule, ready for an applier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenyRule {
    /// Unique within a policy set.
    pub name: String,
    pub category: RuleCategory,
    pub control_id: String,
    pub description: String,
    pub denied_permissions: BTreeSet<String>,
    pub denied_principals: BTreeSet<String>,
    pub exception_principals: ExceptionPrincipalSet,
    /// Opaque boolean expression evaluated by the enforcement point.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

impl DenyRule {
    pub fn new(
        category: RuleCategory,
        control_id: &str,
        description: impl Into<String>,
        exception_principals: ExceptionPrincipalSet,
    ) -> Self {
        Self {
            name: rule_name(category, control_id),
            category,
            control_id: control_id.to_string(),
            description: description.into(),
            denied_permissions: BTreeSet::new(),
            denied_principals: BTreeSet::from([ALL_PRINCIPALS.to_string()]),
            exception_principals,
            condition: None,
        }
    }

    pub fn with_permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.denied_permissions = permissions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_denied_principals<I, S>(mut self, principals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.denied_principals = principals.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }
}

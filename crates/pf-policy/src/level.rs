// level.rs — Compliance level calculation.
//
// The level is the join over the lattice baseline < medium < high < maximum
// of what each enabled framework and the data classification demand. It is
// never stored on its own: it is always recomputed from its inputs.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::PolicyError;
use crate::framework::Framework;

/// Sensitivity of the data held in scope.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum DataClassification {
    #[default]
    Public,
    Internal,
    Confidential,
    Restricted,
}

impl DataClassification {
    /// Parse a classification declared for `scope`; errors name the scope.
    pub fn parse_for_scope(scope: &str, raw: &str) -> Result<Self, PolicyError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "public" => Ok(DataClassification::Public),
            "internal" => Ok(DataClassification::Internal),
            "confidential" => Ok(DataClassification::Confidential),
            "restricted" => Ok(DataClassification::Restricted),
            other => Err(PolicyError::validation(
                scope,
                "data_classification",
                format!(
                    "unknown classification '{}' (expected public, internal, confidential, restricted)",
                    other
                ),
            )),
        }
    }
}

impl std::str::FromStr for DataClassification {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_for_scope("-", s)
    }
}

impl fmt::Display for DataClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataClassification::Public => write!(f, "public"),
            DataClassification::Internal => write!(f, "internal"),
            DataClassification::Confidential => write!(f, "confidential"),
            DataClassification::Restricted => write!(f, "restricted"),
        }
    }
}

/// Ordered severity tier parameterizing every control.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceLevel {
    #[default]
    Baseline,
    Medium,
    High,
    Maximum,
}

impl ComplianceLevel {
    /// Upper bound on interactive session length at this level.
    pub fn session_ceiling_hours(self) -> u32 {
        match self {
            ComplianceLevel::Maximum => 4,
            ComplianceLevel::High => 8,
            ComplianceLevel::Medium => 12,
            ComplianceLevel::Baseline => 24,
        }
    }

    /// Level a single framework demands on its own.
    pub fn required_by(framework: Framework) -> Self {
        match framework {
            Framework::Hipaa | Framework::PciDss => ComplianceLevel::Maximum,
            Framework::Soc2 => ComplianceLevel::High,
            Framework::Iso27001 => ComplianceLevel::Medium,
            Framework::Gdpr => ComplianceLevel::Baseline,
        }
    }

    /// Level a data classification demands on its own.
    pub fn required_for(classification: DataClassification) -> Self {
        match classification {
            DataClassification::Restricted => ComplianceLevel::Maximum,
            DataClassification::Confidential => ComplianceLevel::High,
            DataClassification::Internal => ComplianceLevel::Medium,
            DataClassification::Public => ComplianceLevel::Baseline,
        }
    }

    /// Compute the effective level: the highest demand wins.
    ///
    /// Classification alone can raise the level even with no framework
    /// enabled. Adding frameworks or raising the classification never lowers
    /// the result.
    pub fn compute(
        enabled_frameworks: &BTreeSet<Framework>,
        classification: DataClassification,
    ) -> Self {
        enabled_frameworks
            .iter()
            .map(|f| Self::required_by(*f))
            .fold(Self::required_for(classification), Ord::max)
    }
}

impl fmt::Display for ComplianceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComplianceLevel::Baseline => write!(f, "baseline"),
            ComplianceLevel::Medium => write!(f, "medium"),
            ComplianceLevel::High => write!(f, "high"),
            ComplianceLevel::Maximum => write!(f, "maximum"),
        }
    }
}

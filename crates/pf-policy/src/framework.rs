// framework.rs — Regulatory frameworks and their parameters.
//
// `Framework` is the tagged variant the rule compiler dispatches on. Its
// declaration order is the canonical order rules are emitted in.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::PolicyError;

/// A regulatory framework the engine has a control table for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Framework {
    Iso27001,
    Soc2,
    PciDss,
    Hipaa,
    Gdpr,
}

impl Framework {
    /// All frameworks in canonical order.
    pub const ALL: [Framework; 5] = [
        Framework::Iso27001,
        Framework::Soc2,
        Framework::PciDss,
        Framework::Hipaa,
        Framework::Gdpr,
    ];

    /// Prefix used in rule names (`<slug>-<control-id>`).
    pub fn slug(self) -> &'static str {
        match self {
            Framework::Iso27001 => "iso27001",
            Framework::Soc2 => "soc2",
            Framework::PciDss => "pci-dss",
            Framework::Hipaa => "hipaa",
            Framework::Gdpr => "gdpr",
        }
    }

    /// Configuration name (matches the serde wire form).
    pub fn config_name(self) -> &'static str {
        match self {
            Framework::Iso27001 => "iso27001",
            Framework::Soc2 => "soc2",
            Framework::PciDss => "pci_dss",
            Framework::Hipaa => "hipaa",
            Framework::Gdpr => "gdpr",
        }
    }
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.config_name())
    }
}

impl std::str::FromStr for Framework {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Framework::ALL
            .into_iter()
            .find(|f| f.config_name() == normalized)
            .ok_or_else(|| {
                PolicyError::validation(
                    "-",
                    "enabled_frameworks",
                    format!(
                        "unknown framework '{}' (expected one of iso27001, soc2, pci_dss, hipaa, gdpr)",
                        s
                    ),
                )
            })
    }
}

/// ISO/IEC 27001 parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Iso27001Params {
    /// Emit the A.15 supplier-relationship control.
    #[serde(default)]
    pub include_supplier_controls: bool,
}

/// SOC 2 trust services criteria.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustCriterion {
    Security,
    Availability,
    ProcessingIntegrity,
    Confidentiality,
    Privacy,
}

/// SOC 2 parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Soc2Params {
    /// Which trust services criteria are in audit scope.
    #[serde(default = "default_trust_criteria")]
    pub trust_criteria: BTreeSet<TrustCriterion>,
}

impl Default for Soc2Params {
    fn default() -> Self {
        Self {
            trust_criteria: default_trust_criteria(),
        }
    }
}

fn default_trust_criteria() -> BTreeSet<TrustCriterion> {
    BTreeSet::from([TrustCriterion::Security])
}

/// PCI DSS parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PciDssParams {
    /// Merchant level, 1 (strictest) through 4.
    #[serde(default = "default_merchant_level")]
    pub merchant_level: u8,

    /// Resource tag marking the cardholder data environment.
    #[serde(default = "default_cde_tag")]
    pub cde_tag: String,
}

impl Default for PciDssParams {
    fn default() -> Self {
        Self {
            merchant_level: default_merchant_level(),
            cde_tag: default_cde_tag(),
        }
    }
}

fn default_merchant_level() -> u8 {
    1
}

fn default_cde_tag() -> String {
    "pci/cde".to_string()
}

/// HIPAA parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HipaaParams {
    /// Whether protected health information is stored in scope.
    #[serde(default = "default_true")]
    pub phi: bool,

    /// Whether the organization acts as a business associate.
    #[serde(default)]
    pub business_associate: bool,
}

impl Default for HipaaParams {
    fn default() -> Self {
        Self {
            phi: true,
            business_associate: false,
        }
    }
}

/// GDPR parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GdprParams {
    /// Data controller (as opposed to processor only).
    #[serde(default = "default_true")]
    pub controller: bool,

    /// Article 9 special-category data is processed in scope.
    #[serde(default)]
    pub special_category: bool,
}

impl Default for GdprParams {
    fn default() -> Self {
        Self {
            controller: true,
            special_category: false,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Per-framework parameters. Parameters of frameworks that are not enabled
/// are carried but ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameworkParams {
    #[serde(default)]
    pub iso27001: Iso27001Params,
    #[serde(default)]
    pub soc2: Soc2Params,
    #[serde(default)]
    pub pci_dss: PciDssParams,
    #[serde(default)]
    pub hipaa: HipaaParams,
    #[serde(default)]
    pub gdpr: GdprParams,
}

impl FrameworkParams {
    /// Range-check parameter values.
    pub fn validate(&self, scope: &str) -> Result<(), PolicyError> {
        if !(1..=4).contains(&self.pci_dss.merchant_level) {
            return Err(PolicyError::validation(
                scope,
                "framework_params.pci_dss.merchant_level",
                format!(
                    "merchant level must be between 1 and 4, got {}",
                    self.pci_dss.merchant_level
                ),
            ));
        }
        let tag = &self.pci_dss.cde_tag;
        if tag.trim().is_empty() {
            return Err(PolicyError::validation(
                scope,
                "framework_params.pci_dss.cde_tag",
                "cardholder data environment tag must not be empty",
            ));
        }
        // The tag is spliced into a quoted condition literal.
        if tag.contains(['"', '\\']) {
            return Err(PolicyError::validation(
                scope,
                "framework_params.pci_dss.cde_tag",
                format!("cardholder data environment tag '{}' may not contain quotes or backslashes", tag),
            ));
        }
        Ok(())
    }
}

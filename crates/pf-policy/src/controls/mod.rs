// controls/mod.rs — Declarative control tables.
//
// Each framework (and the shared cross-framework set) is a static table of
// `ControlSpec`s. A spec names its permissions, an optional condition
// template, which principals it denies, and an activation predicate. The
// compilers walk a table and instantiate every active spec; adding a
// framework means adding a table, not new control flow.
//
// Conditions are opaque strings for the enforcement point. The engine only
// picks a template and fills in parameters; it never evaluates them.

pub mod gdpr;
pub mod hipaa;
pub mod iso27001;
pub mod pci_dss;
pub mod shared;
pub mod soc2;

use crate::exception::ExceptionPrincipalSet;
use crate::framework::{Framework, FrameworkParams, TrustCriterion};
use crate::level::{ComplianceLevel, DataClassification};
use crate::overrides::SecurityControlOverrides;
use crate::rule::{DenyRule, RuleCategory, ALL_PRINCIPALS};

/// Everything an activation predicate or condition template may read.
#[derive(Debug, Clone, Copy)]
pub struct ControlContext<'a> {
    pub level: ComplianceLevel,
    pub classification: DataClassification,
    pub params: &'a FrameworkParams,
    pub overrides: &'a SecurityControlOverrides,
}

/// Framework parameter a control can be gated on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamFlag {
    Iso27001SupplierControls,
    Soc2Criterion(TrustCriterion),
    /// PCI merchant level numerically at or below (i.e. at least as strict as) this.
    PciMerchantLevelAtMost(u8),
    HipaaPhi,
    HipaaBusinessAssociate,
    GdprController,
    GdprSpecialCategory,
}

impl ParamFlag {
    fn holds(self, params: &FrameworkParams) -> bool {
        match self {
            ParamFlag::Iso27001SupplierControls => params.iso27001.include_supplier_controls,
            ParamFlag::Soc2Criterion(criterion) => params.soc2.trust_criteria.contains(&criterion),
            ParamFlag::PciMerchantLevelAtMost(level) => params.pci_dss.merchant_level <= level,
            ParamFlag::HipaaPhi => params.hipaa.phi,
            ParamFlag::HipaaBusinessAssociate => params.hipaa.business_associate,
            ParamFlag::GdprController => params.gdpr.controller,
            ParamFlag::GdprSpecialCategory => params.gdpr.special_category,
        }
    }
}

/// Security-control override a shared control can be forced on by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideFlag {
    EnforceMfa,
    RequireApproval,
}

impl OverrideFlag {
    fn holds(self, overrides: &SecurityControlOverrides) -> bool {
        match self {
            OverrideFlag::EnforceMfa => overrides.enforce_mfa,
            OverrideFlag::RequireApproval => overrides.require_approval,
        }
    }
}

/// Activation predicate over level, classification, params, and overrides.
#[derive(Debug, Clone, Copy)]
pub enum Activation {
    Always,
    /// Level at or above.
    AtLeast(ComplianceLevel),
    /// Classification at or above.
    Classification(DataClassification),
    Param(ParamFlag),
    Override(OverrideFlag),
    All(&'static [Activation]),
    Any(&'static [Activation]),
}

impl Activation {
    pub fn holds(&self, ctx: &ControlContext<'_>) -> bool {
        match self {
            Activation::Always => true,
            Activation::AtLeast(level) => ctx.level >= *level,
            Activation::Classification(min) => ctx.classification >= *min,
            Activation::Param(flag) => flag.holds(ctx.params),
            Activation::Override(flag) => flag.holds(ctx.overrides),
            Activation::All(all) => all.iter().all(|a| a.holds(ctx)),
            Activation::Any(any) => any.iter().any(|a| a.holds(ctx)),
        }
    }
}

/// Parameterized condition expression.
#[derive(Debug, Clone, Copy)]
pub enum ConditionTemplate {
    /// Request falls outside the configured business hours.
    OutsideBusinessHours,
    /// Caller did not authenticate with a second factor.
    MissingMfa,
    /// Target resource lacks a tag.
    MissingTag {
        key: &'static str,
        value: &'static str,
    },
    /// Target resource is inside the PCI cardholder data environment.
    InCardholderEnvironment,
    /// Fewer change approvals attached than required.
    InsufficientApprovals,
    /// Session older than the effective session cap.
    SessionOlderThanCap,
    /// Caller is modifying bindings on itself.
    SelfModification,
    /// Conjunction of templates.
    All(&'static [ConditionTemplate]),
}

impl ConditionTemplate {
    pub fn render(&self, ctx: &ControlContext<'_>) -> String {
        match self {
            ConditionTemplate::OutsideBusinessHours => {
                let hours = &ctx.overrides.business_hours;
                format!(
                    "request.time.getHours(\"{tz}\") < {start} || request.time.getHours(\"{tz}\") >= {end}",
                    tz = hours.time_zone,
                    start = hours.start_hour,
                    end = hours.end_hour
                )
            }
            ConditionTemplate::MissingMfa => {
                "!request.auth.claims.amr.exists(m, m == \"mfa\")".to_string()
            }
            ConditionTemplate::MissingTag { key, value } => {
                format!("!resource.matchTag(\"{}\", \"{}\")", key, value)
            }
            ConditionTemplate::InCardholderEnvironment => format!(
                "resource.matchTag(\"{}\", \"in-scope\")",
                ctx.params.pci_dss.cde_tag
            ),
            ConditionTemplate::InsufficientApprovals => format!(
                "int(request.headers[\"x-change-approvals\"]) < {}",
                ctx.overrides.effective_required_approvals(ctx.level)
            ),
            ConditionTemplate::SessionOlderThanCap => format!(
                "request.time - timestamp(request.auth.claims.auth_time) > duration(\"{}h\")",
                ctx.overrides.effective_session_hours(ctx.level)
            ),
            ConditionTemplate::SelfModification => {
                "resource.name.endsWith(request.auth.principal)".to_string()
            }
            ConditionTemplate::All(parts) => parts
                .iter()
                .map(|part| format!("({})", part.render(ctx)))
                .collect::<Vec<_>>()
                .join(" && "),
        }
    }
}

/// Which principals a control denies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeniedPrincipals {
    Everyone,
    /// The configured approver group; the control is skipped without one.
    ApproverGroup,
}

/// One row of a control table.
#[derive(Debug, Clone, Copy)]
pub struct ControlSpec {
    pub id: &'static str,
    pub description: &'static str,
    pub permissions: &'static [&'static str],
    pub condition: Option<ConditionTemplate>,
    pub denied: DeniedPrincipals,
    pub activation: Activation,
}

impl ControlSpec {
    /// Instantiate this control, or `None` if it is inactive in `ctx`.
    pub fn instantiate(
        &self,
        category: RuleCategory,
        ctx: &ControlContext<'_>,
        exceptions: &ExceptionPrincipalSet,
    ) -> Option<DenyRule> {
        if !self.activation.holds(ctx) {
            tracing::debug!(category = %category, control = self.id, level = %ctx.level, "control inactive");
            return None;
        }

        let denied = match self.denied {
            DeniedPrincipals::Everyone => ALL_PRINCIPALS.to_string(),
            DeniedPrincipals::ApproverGroup => match &ctx.overrides.approver_group {
                Some(group) => format!("principalSet://goog/group/{}", group.trim()),
                None => {
                    tracing::debug!(category = %category, control = self.id, "no approver group configured; control skipped");
                    return None;
                }
            },
        };

        let mut rule = DenyRule::new(category, self.id, self.description, exceptions.clone())
            .with_permissions(self.permissions.iter().copied())
            .with_denied_principals([denied]);
        if let Some(condition) = &self.condition {
            rule = rule.with_condition(condition.render(ctx));
        }
        Some(rule)
    }
}

/// The control table for a framework.
pub fn table(framework: Framework) -> &'static [ControlSpec] {
    match framework {
        Framework::Iso27001 => iso27001::CONTROLS,
        Framework::Soc2 => soc2::CONTROLS,
        Framework::PciDss => pci_dss::CONTROLS,
        Framework::Hipaa => hipaa::CONTROLS,
        Framework::Gdpr => gdpr::CONTROLS,
    }
}

// shared.rs — Cross-framework controls.
//
// These apply whenever at least one framework is enabled, independent of
// which. They are parameterized by the compliance level and the
// security-control overrides.

use super::{Activation, ConditionTemplate, ControlSpec, DeniedPrincipals, OverrideFlag};
use crate::level::ComplianceLevel;

/// Operations treated as high-risk by the MFA, session, approval, and
/// time-of-day controls.
pub const HIGH_RISK_PERMISSIONS: &[&str] = &[
    "cloudresourcemanager.googleapis.com/projects.delete",
    "cloudresourcemanager.googleapis.com/projects.setIamPolicy",
    "iam.googleapis.com/roles.update",
    "iam.googleapis.com/serviceAccountKeys.create",
    "iam.googleapis.com/serviceAccounts.setIamPolicy",
];

const DEPLOY_PERMISSIONS: &[&str] = &[
    "cloudbuild.googleapis.com/builds.create",
    "clouddeploy.googleapis.com/releases.create",
    "run.googleapis.com/services.update",
];

pub static CONTROLS: &[ControlSpec] = &[
    ControlSpec {
        id: "mfa-enforcement",
        description: "High-risk operations require a second authentication factor",
        permissions: HIGH_RISK_PERMISSIONS,
        condition: Some(ConditionTemplate::MissingMfa),
        denied: DeniedPrincipals::Everyone,
        activation: Activation::Any(&[
            Activation::AtLeast(ComplianceLevel::Medium),
            Activation::Override(OverrideFlag::EnforceMfa),
        ]),
    },
    ControlSpec {
        id: "session-duration",
        description: "High-risk operations are refused once the session exceeds its cap",
        permissions: HIGH_RISK_PERMISSIONS,
        condition: Some(ConditionTemplate::SessionOlderThanCap),
        denied: DeniedPrincipals::Everyone,
        activation: Activation::Always,
    },
    ControlSpec {
        id: "approval-required",
        description: "High-risk operations need the required number of recorded approvals",
        permissions: HIGH_RISK_PERMISSIONS,
        condition: Some(ConditionTemplate::InsufficientApprovals),
        denied: DeniedPrincipals::Everyone,
        activation: Activation::Any(&[
            Activation::AtLeast(ComplianceLevel::High),
            Activation::Override(OverrideFlag::RequireApproval),
        ]),
    },
    ControlSpec {
        id: "sod-self-modification",
        description: "Segregation of duties: no principal may modify its own bindings",
        permissions: &[
            "cloudresourcemanager.googleapis.com/projects.setIamPolicy",
            "iam.googleapis.com/serviceAccounts.setIamPolicy",
        ],
        condition: Some(ConditionTemplate::SelfModification),
        denied: DeniedPrincipals::Everyone,
        activation: Activation::AtLeast(ComplianceLevel::High),
    },
    ControlSpec {
        id: "sod-approver-deploy",
        description: "Segregation of duties: approvers may not also deploy",
        permissions: DEPLOY_PERMISSIONS,
        condition: None,
        denied: DeniedPrincipals::ApproverGroup,
        activation: Activation::AtLeast(ComplianceLevel::High),
    },
    ControlSpec {
        id: "time-of-day",
        description: "High-risk operations are refused outside business hours",
        permissions: HIGH_RISK_PERMISSIONS,
        condition: Some(ConditionTemplate::OutsideBusinessHours),
        denied: DeniedPrincipals::Everyone,
        activation: Activation::AtLeast(ComplianceLevel::Maximum),
    },
];

// soc2.rs — SOC 2 trust services criteria controls.
//
// Each control is gated on its criterion being in audit scope.

use super::{Activation, ConditionTemplate, ControlSpec, DeniedPrincipals, ParamFlag};
use crate::framework::TrustCriterion;
use crate::level::ComplianceLevel;

pub static CONTROLS: &[ControlSpec] = &[
    ControlSpec {
        id: "cc6-logical-access",
        description: "CC6.1 logical access: long-lived service account keys cannot be minted",
        permissions: &[
            "iam.googleapis.com/serviceAccountKeys.create",
            "iam.googleapis.com/serviceAccountKeys.upload",
        ],
        condition: None,
        denied: DeniedPrincipals::Everyone,
        activation: Activation::Param(ParamFlag::Soc2Criterion(TrustCriterion::Security)),
    },
    ControlSpec {
        id: "cc7-system-monitoring",
        description: "CC7.2 system monitoring: audit trails and alerting cannot be disabled",
        permissions: &[
            "logging.googleapis.com/sinks.delete",
            "monitoring.googleapis.com/alertPolicies.delete",
        ],
        condition: None,
        denied: DeniedPrincipals::Everyone,
        activation: Activation::All(&[
            Activation::Param(ParamFlag::Soc2Criterion(TrustCriterion::Security)),
            Activation::AtLeast(ComplianceLevel::High),
        ]),
    },
    ControlSpec {
        id: "cc8-change-management",
        description: "CC8.1 change management: production deploys need recorded approvals",
        permissions: &[
            "run.googleapis.com/services.update",
            "container.googleapis.com/clusters.update",
        ],
        condition: Some(ConditionTemplate::InsufficientApprovals),
        denied: DeniedPrincipals::Everyone,
        activation: Activation::All(&[
            Activation::Param(ParamFlag::Soc2Criterion(TrustCriterion::Security)),
            Activation::AtLeast(ComplianceLevel::Maximum),
        ]),
    },
    ControlSpec {
        id: "a1-availability",
        description: "A1.2 availability: backups and databases cannot be deleted",
        permissions: &[
            "cloudsql.googleapis.com/backupRuns.delete",
            "cloudsql.googleapis.com/instances.delete",
        ],
        condition: None,
        denied: DeniedPrincipals::Everyone,
        activation: Activation::Param(ParamFlag::Soc2Criterion(TrustCriterion::Availability)),
    },
    ControlSpec {
        id: "pi1-processing-integrity",
        description: "PI1 processing integrity: pipeline definitions are write-protected",
        permissions: &[
            "dataflow.googleapis.com/jobs.cancel",
            "dataflow.googleapis.com/jobs.updateContents",
        ],
        condition: None,
        denied: DeniedPrincipals::Everyone,
        activation: Activation::Param(ParamFlag::Soc2Criterion(
            TrustCriterion::ProcessingIntegrity,
        )),
    },
    ControlSpec {
        id: "c1-confidentiality",
        description: "C1.1 confidentiality: unencrypted buckets cannot be exposed",
        permissions: &["storage.googleapis.com/buckets.setIamPolicy"],
        condition: Some(ConditionTemplate::MissingTag {
            key: "compliance/encryption",
            value: "cmek",
        }),
        denied: DeniedPrincipals::Everyone,
        activation: Activation::Param(ParamFlag::Soc2Criterion(TrustCriterion::Confidentiality)),
    },
    ControlSpec {
        id: "p4-privacy-retention",
        description: "P4.2 privacy: personal-data datasets cannot be deleted outside retention",
        permissions: &["bigquery.googleapis.com/datasets.delete"],
        condition: Some(ConditionTemplate::MissingTag {
            key: "compliance/retention",
            value: "expired",
        }),
        denied: DeniedPrincipals::Everyone,
        activation: Activation::Param(ParamFlag::Soc2Criterion(TrustCriterion::Privacy)),
    },
];

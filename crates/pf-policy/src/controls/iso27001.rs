// iso27001.rs — ISO/IEC 27001 Annex A controls.

use super::{Activation, ConditionTemplate, ControlSpec, DeniedPrincipals, ParamFlag};
use crate::level::{ComplianceLevel, DataClassification};

pub static CONTROLS: &[ControlSpec] = &[
    ControlSpec {
        id: "access-control",
        description: "A.9 access control: only break-glass and automation may change IAM roles",
        permissions: &[
            "iam.googleapis.com/roles.create",
            "iam.googleapis.com/roles.delete",
            "iam.googleapis.com/roles.update",
        ],
        condition: None,
        denied: DeniedPrincipals::Everyone,
        activation: Activation::Always,
    },
    ControlSpec {
        id: "cryptography",
        description: "A.10 cryptography: protect key material from destruction and rotation changes",
        permissions: &[
            "cloudkms.googleapis.com/cryptoKeyVersions.destroy",
            "cloudkms.googleapis.com/cryptoKeys.update",
        ],
        condition: None,
        denied: DeniedPrincipals::Everyone,
        activation: Activation::AtLeast(ComplianceLevel::Medium),
    },
    ControlSpec {
        id: "logging-monitoring",
        description: "A.12.4 logging and monitoring: audit log routing cannot be removed",
        permissions: &[
            "logging.googleapis.com/sinks.delete",
            "logging.googleapis.com/sinks.update",
        ],
        condition: None,
        denied: DeniedPrincipals::Everyone,
        activation: Activation::AtLeast(ComplianceLevel::Medium),
    },
    ControlSpec {
        id: "communications-security",
        description: "A.13 communications security: network perimeter changes are restricted",
        permissions: &[
            "compute.googleapis.com/firewalls.create",
            "compute.googleapis.com/firewalls.delete",
            "compute.googleapis.com/firewalls.update",
        ],
        condition: None,
        denied: DeniedPrincipals::Everyone,
        activation: Activation::AtLeast(ComplianceLevel::High),
    },
    ControlSpec {
        id: "information-classification",
        description: "A.8.2 information classification: unlabelled storage cannot be shared",
        permissions: &["storage.googleapis.com/buckets.setIamPolicy"],
        condition: Some(ConditionTemplate::MissingTag {
            key: "compliance/data-classification",
            value: "labelled",
        }),
        denied: DeniedPrincipals::Everyone,
        activation: Activation::Classification(DataClassification::Confidential),
    },
    ControlSpec {
        id: "supplier-relationships",
        description: "A.15 supplier relationships: external identity federation is controlled",
        permissions: &[
            "iam.googleapis.com/workloadIdentityPoolProviders.create",
            "iam.googleapis.com/workloadIdentityPoolProviders.update",
        ],
        condition: None,
        denied: DeniedPrincipals::Everyone,
        activation: Activation::Param(ParamFlag::Iso27001SupplierControls),
    },
];

// gdpr.rs — GDPR controls.

use super::{Activation, ConditionTemplate, ControlSpec, DeniedPrincipals, ParamFlag};
use crate::level::ComplianceLevel;

pub static CONTROLS: &[ControlSpec] = &[
    ControlSpec {
        id: "art25-data-protection-by-design",
        description: "Art. 25: personal-data stores cannot be made publicly readable",
        permissions: &[
            "bigquery.googleapis.com/datasets.setIamPolicy",
            "storage.googleapis.com/buckets.setIamPolicy",
        ],
        condition: Some(ConditionTemplate::MissingTag {
            key: "compliance/personal-data",
            value: "none",
        }),
        denied: DeniedPrincipals::Everyone,
        activation: Activation::Always,
    },
    ControlSpec {
        id: "art32-security-of-processing",
        description: "Art. 32: encryption keys for personal data cannot be destroyed",
        permissions: &[
            "cloudkms.googleapis.com/cryptoKeyVersions.destroy",
            "cloudkms.googleapis.com/cryptoKeys.update",
        ],
        condition: None,
        denied: DeniedPrincipals::Everyone,
        activation: Activation::AtLeast(ComplianceLevel::Medium),
    },
    ControlSpec {
        id: "art44-international-transfers",
        description: "Art. 44: personal data cannot leave EU-resident resources",
        permissions: &[
            "bigquery.googleapis.com/tables.export",
            "storage.googleapis.com/objects.create",
        ],
        condition: Some(ConditionTemplate::MissingTag {
            key: "compliance/residency",
            value: "eu",
        }),
        denied: DeniedPrincipals::Everyone,
        activation: Activation::Param(ParamFlag::GdprController),
    },
    ControlSpec {
        id: "art9-special-categories",
        description: "Art. 9: special-category data requires MFA for every read",
        permissions: &[
            "bigquery.googleapis.com/tables.getData",
            "storage.googleapis.com/objects.get",
        ],
        condition: Some(ConditionTemplate::All(&[
            ConditionTemplate::MissingTag {
                key: "compliance/special-category",
                value: "false",
            },
            ConditionTemplate::MissingMfa,
        ])),
        denied: DeniedPrincipals::Everyone,
        activation: Activation::Param(ParamFlag::GdprSpecialCategory),
    },
];

// hipaa.rs — HIPAA Security Rule technical safeguards (45 CFR 164.312).

use super::{Activation, ConditionTemplate, ControlSpec, DeniedPrincipals, ParamFlag};

pub static CONTROLS: &[ControlSpec] = &[
    ControlSpec {
        id: "164-312a-access-control",
        description: "164.312(a): unique user identification, no shared service account keys",
        permissions: &[
            "iam.googleapis.com/serviceAccountKeys.create",
            "iam.googleapis.com/serviceAccounts.getAccessToken",
        ],
        condition: None,
        denied: DeniedPrincipals::Everyone,
        activation: Activation::Always,
    },
    ControlSpec {
        id: "164-312b-audit-controls",
        description: "164.312(b): activity on ePHI systems stays recorded",
        permissions: &[
            "logging.googleapis.com/sinks.delete",
            "logging.googleapis.com/sinks.update",
        ],
        condition: None,
        denied: DeniedPrincipals::Everyone,
        activation: Activation::Always,
    },
    ControlSpec {
        id: "164-312c-integrity",
        description: "164.312(c): ePHI stores cannot be altered or destroyed outside approved paths",
        permissions: &[
            "healthcare.googleapis.com/datasets.delete",
            "healthcare.googleapis.com/fhirStores.delete",
        ],
        condition: None,
        denied: DeniedPrincipals::Everyone,
        activation: Activation::Param(ParamFlag::HipaaPhi),
    },
    ControlSpec {
        id: "164-312d-authentication",
        description: "164.312(d): person or entity authentication for ePHI access",
        permissions: &[
            "healthcare.googleapis.com/fhirResources.get",
            "healthcare.googleapis.com/fhirResources.update",
        ],
        condition: Some(ConditionTemplate::MissingMfa),
        denied: DeniedPrincipals::Everyone,
        activation: Activation::Param(ParamFlag::HipaaPhi),
    },
    ControlSpec {
        id: "164-312e-transmission-security",
        description: "164.312(e): ePHI transmission paths cannot be downgraded",
        permissions: &[
            "compute.googleapis.com/sslPolicies.update",
            "compute.googleapis.com/targetHttpsProxies.setSslPolicy",
        ],
        condition: None,
        denied: DeniedPrincipals::Everyone,
        activation: Activation::Param(ParamFlag::HipaaPhi),
    },
    ControlSpec {
        id: "164-314-business-associate",
        description: "164.314: data shared under a BAA cannot be exported to unmanaged projects",
        permissions: &[
            "bigquery.googleapis.com/tables.export",
            "healthcare.googleapis.com/fhirStores.export",
        ],
        condition: Some(ConditionTemplate::MissingTag {
            key: "compliance/baa",
            value: "covered",
        }),
        denied: DeniedPrincipals::Everyone,
        activation: Activation::Param(ParamFlag::HipaaBusinessAssociate),
    },
];

// pci_dss.rs — PCI DSS v4 requirements.
//
// Most rules are scoped to the cardholder data environment through the
// configured CDE tag.

use super::{Activation, ConditionTemplate, ControlSpec, DeniedPrincipals, ParamFlag};

pub static CONTROLS: &[ControlSpec] = &[
    ControlSpec {
        id: "req1-network-controls",
        description: "Req 1: network security controls around the CDE are change-restricted",
        permissions: &[
            "compute.googleapis.com/firewalls.create",
            "compute.googleapis.com/firewalls.delete",
            "compute.googleapis.com/firewalls.update",
        ],
        condition: Some(ConditionTemplate::InCardholderEnvironment),
        denied: DeniedPrincipals::Everyone,
        activation: Activation::Always,
    },
    ControlSpec {
        id: "req3-protect-stored-data",
        description: "Req 3: keys protecting stored account data cannot be destroyed",
        permissions: &[
            "cloudkms.googleapis.com/cryptoKeyVersions.destroy",
            "cloudkms.googleapis.com/cryptoKeyVersions.disable",
        ],
        condition: None,
        denied: DeniedPrincipals::Everyone,
        activation: Activation::Always,
    },
    ControlSpec {
        id: "req7-restrict-access",
        description: "Req 7: access to CDE resources cannot be widened",
        permissions: &[
            "cloudresourcemanager.googleapis.com/projects.setIamPolicy",
            "storage.googleapis.com/buckets.setIamPolicy",
        ],
        condition: Some(ConditionTemplate::InCardholderEnvironment),
        denied: DeniedPrincipals::Everyone,
        activation: Activation::Always,
    },
    ControlSpec {
        id: "req8-mfa",
        description: "Req 8.4: administrative access into the CDE requires MFA",
        permissions: &[
            "compute.googleapis.com/instances.setMetadata",
            "iap.googleapis.com/tunnelInstances.accessViaIAP",
        ],
        condition: Some(ConditionTemplate::All(&[
            ConditionTemplate::InCardholderEnvironment,
            ConditionTemplate::MissingMfa,
        ])),
        denied: DeniedPrincipals::Everyone,
        activation: Activation::Always,
    },
    ControlSpec {
        id: "req10-logging",
        description: "Req 10: audit logs of CDE activity cannot be removed or rerouted",
        permissions: &[
            "logging.googleapis.com/buckets.delete",
            "logging.googleapis.com/sinks.delete",
            "logging.googleapis.com/sinks.update",
        ],
        condition: None,
        denied: DeniedPrincipals::Everyone,
        activation: Activation::Always,
    },
    ControlSpec {
        id: "req11-security-testing",
        description: "Req 11: vulnerability findings cannot be muted",
        permissions: &["securitycenter.googleapis.com/findings.setMute"],
        condition: None,
        denied: DeniedPrincipals::Everyone,
        activation: Activation::Param(ParamFlag::PciMerchantLevelAtMost(2)),
    },
];

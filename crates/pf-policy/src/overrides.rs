// overrides.rs — Security-control overrides for the shared controls.
//
// Overrides can switch shared controls on below the level that would
// normally activate them, and tighten their parameters. They can never
// switch a control off.

use serde::{Deserialize, Serialize};

use crate::error::PolicyError;
use crate::exception::is_valid_email;
use crate::level::ComplianceLevel;

/// Allowed working-hours window for the time-of-day restriction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessHours {
    /// First allowed hour (0–23).
    #[serde(default = "default_start_hour")]
    pub start_hour: u32,
    /// First disallowed hour (1–24).
    #[serde(default = "default_end_hour")]
    pub end_hour: u32,
    /// IANA time zone the hours are expressed in.
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
}

impl Default for BusinessHours {
    fn default() -> Self {
        Self {
            start_hour: default_start_hour(),
            end_hour: default_end_hour(),
            time_zone: default_time_zone(),
        }
    }
}

fn default_start_hour() -> u32 {
    8
}

fn default_end_hour() -> u32 {
    18
}

fn default_time_zone() -> String {
    "UTC".to_string()
}

/// Explicit security-control settings layered over the level defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityControlOverrides {
    /// Force MFA enforcement even at baseline.
    #[serde(default)]
    pub enforce_mfa: bool,

    /// Force approval gating of high-risk operations below `high`.
    #[serde(default)]
    pub require_approval: bool,

    /// Number of approvals high-risk operations need.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_approvals: Option<u32>,

    /// Configured session cap; the level ceiling still applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_session_hours: Option<u32>,

    #[serde(default)]
    pub business_hours: BusinessHours,

    /// Group whose members approve changes and must not deploy them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approver_group: Option<String>,
}

impl SecurityControlOverrides {
    /// Range-check every override.
    pub fn validate(&self, scope: &str) -> Result<(), PolicyError> {
        if self.required_approvals == Some(0) {
            return Err(PolicyError::validation(
                scope,
                "security_control_overrides.required_approvals",
                "required approvals must be at least 1",
            ));
        }
        if self.max_session_hours == Some(0) {
            return Err(PolicyError::validation(
                scope,
                "security_control_overrides.max_session_hours",
                "max session hours must be at least 1",
            ));
        }
        let hours = &self.business_hours;
        if hours.start_hour >= hours.end_hour || hours.end_hour > 24 {
            return Err(PolicyError::validation(
                scope,
                "security_control_overrides.business_hours",
                format!(
                    "invalid window {}..{} (need start < end <= 24)",
                    hours.start_hour, hours.end_hour
                ),
            ));
        }
        if hours.time_zone.trim().is_empty() || hours.time_zone.contains(['"', '\\']) {
            return Err(PolicyError::validation(
                scope,
                "security_control_overrides.business_hours.time_zone",
                format!("invalid time zone '{}'", hours.time_zone),
            ));
        }
        if let Some(group) = &self.approver_group {
            if !is_valid_email(group.trim()) {
                return Err(PolicyError::validation(
                    scope,
                    "security_control_overrides.approver_group",
                    format!("'{}' is not a valid group email", group),
                ));
            }
        }
        Ok(())
    }

    /// Session cap: the configured value, never above the level ceiling.
    pub fn effective_session_hours(&self, level: ComplianceLevel) -> u32 {
        let ceiling = level.session_ceiling_hours();
        self.max_session_hours
            .map(|configured| configured.min(ceiling))
            .unwrap_or(ceiling)
    }

    /// Approvals required: the override, else 2 at maximum and 1 below.
    pub fn effective_required_approvals(&self, level: ComplianceLevel) -> u32 {
        self.required_approvals.unwrap_or(match level {
            ComplianceLevel::Maximum => 2,
            _ => 1,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_hours_capped_by_level() {
        let overrides = SecurityControlOverrides {
            max_session_hours: Some(10),
            ..Default::default()
        };
        assert_eq!(overrides.effective_session_hours(ComplianceLevel::Maximum), 4);
        assert_eq!(overrides.effective_session_hours(ComplianceLevel::High), 8);
        assert_eq!(overrides.effective_session_hours(ComplianceLevel::Medium), 10);
        assert_eq!(overrides.effective_session_hours(ComplianceLevel::Baseline), 10);
    }

    #[test]
    fn session_hours_default_to_ceiling() {
        let overrides = SecurityControlOverrides::default();
        assert_eq!(overrides.effective_session_hours(ComplianceLevel::Medium), 12);
    }

    #[test]
    fn approvals_default_by_level() {
        let overrides = SecurityControlOverrides::default();
        assert_eq!(
            overrides.effective_required_approvals(ComplianceLevel::Maximum),
            2
        );
        assert_eq!(overrides.effective_required_approvals(ComplianceLevel::High), 1);
        let explicit = SecurityControlOverrides {
            required_approvals: Some(3),
            ..Default::default()
        };
        assert_eq!(explicit.effective_required_approvals(ComplianceLevel::High), 3);
    }

    #[test]
    fn rejects_zero_values_and_bad_window() {
        let zero = SecurityControlOverrides {
            required_approvals: Some(0),
            ..Default::default()
        };
        assert!(zero.validate("123").is_err());

        let inverted = SecurityControlOverrides {
            business_hours: BusinessHours {
                start_hour: 18,
                end_hour: 8,
                time_zone: "UTC".to_string(),
            },
            ..Default::default()
        };
        assert!(inverted.validate("123").is_err());

        let bad_group = SecurityControlOverrides {
            approver_group: Some("approvers".to_string()),
            ..Default::default()
        };
        let err = bad_group.validate("123").unwrap_err();
        assert!(err.to_string().contains("approver_group"));

        let quoted_zone = SecurityControlOverrides {
            business_hours: BusinessHours {
                time_zone: "UTC\\\"".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(quoted_zone.validate("123").is_err());
    }

    #[test]
    fn defaults_are_valid() {
        assert!(SecurityControlOverrides::default().validate("123").is_ok());
    }
}

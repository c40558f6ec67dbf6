// emergency.rs — Emergency override gate.
//
// Two states: Enforcing (initial) and Overridden. Entering Overridden needs
// a documented reason; a request with a short or empty reason stops the
// compilation instead of quietly staying in Enforcing. There is no expiry
// here. An external scheduler owns that.

use serde::{Deserialize, Serialize};

use crate::error::PolicyError;

/// Reasons must be strictly longer than this (after trimming).
pub const MIN_REASON_LEN: usize = 10;

/// Requested override, as it appears in input configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyOverride {
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub reason: String,
}

impl EmergencyOverride {
    pub fn activate(reason: impl Into<String>) -> Self {
        Self {
            active: true,
            reason: reason.into(),
        }
    }
}

/// Gate state for one compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverrideGate {
    Enforcing,
    Overridden { reason: String },
}

impl OverrideGate {
    /// Validate the request and pick the gate state.
    ///
    /// An inactive request is always `Enforcing`, whatever its reason says.
    pub fn from_request(scope: &str, request: &EmergencyOverride) -> Result<Self, PolicyError> {
        if !request.active {
            return Ok(OverrideGate::Enforcing);
        }
        let reason = request.reason.trim();
        if reason.chars().count() <= MIN_REASON_LEN {
            return Err(PolicyError::EmergencyOverride {
                scope: scope.to_string(),
                message: format!(
                    "reason must be longer than {} characters (got {})",
                    MIN_REASON_LEN,
                    reason.chars().count()
                ),
            });
        }
        tracing::warn!(scope = %scope, reason = %reason, "emergency override active; rule emission suppressed");
        Ok(OverrideGate::Overridden {
            reason: reason.to_string(),
        })
    }

    pub fn is_overridden(&self) -> bool {
        matches!(self, OverrideGate::Overridden { .. })
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            OverrideGate::Enforcing => None,
            OverrideGate::Overridden { reason } => Some(reason),
        }
    }
}

// input.rs — Compilation input model and loaders.
//
// One `CompilationInput` describes one scope. It loads from YAML or JSON;
// every optional section has a serde default so a minimal file only needs
// the scope, frameworks, classification, and a break-glass group.
//
// Example (YAML):
//
//   scope: { tier: project, id: payments-prod }
//   enabled_frameworks: [pci_dss, soc2]
//   data_classification: restricted
//   exception_sources:
//     break_glass_group: breakglass@example.com
//     service_accounts: [deployer@payments-prod.iam.gserviceaccount.com]

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::emergency::EmergencyOverride;
use crate::error::PolicyError;
use crate::exception::{BreakGlassResolver, ExceptionSources, RemoteBreakGlass};
use crate::framework::{Framework, FrameworkParams};
use crate::level::DataClassification;
use crate::overrides::SecurityControlOverrides;
use crate::scope::ScopeRef;

/// Everything the engine needs to compile one scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilationInput {
    pub scope: ScopeRef,

    #[serde(default)]
    pub enabled_frameworks: BTreeSet<Framework>,

    #[serde(default)]
    pub framework_params: FrameworkParams,

    #[serde(default)]
    pub data_classification: DataClassification,

    #[serde(default)]
    pub exception_sources: ExceptionSources,

    #[serde(default)]
    pub security_control_overrides: SecurityControlOverrides,

    #[serde(default)]
    pub emergency_override: EmergencyOverride,

    /// Instant exemptions are checked against. Must be set before compiling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation_time: Option<DateTime<Utc>>,
}

impl CompilationInput {
    /// A minimal enforcing input with defaults everywhere else.
    pub fn new(scope: ScopeRef) -> Self {
        Self {
            scope,
            enabled_frameworks: BTreeSet::new(),
            framework_params: FrameworkParams::default(),
            data_classification: DataClassification::default(),
            exception_sources: ExceptionSources::default(),
            security_control_overrides: SecurityControlOverrides::default(),
            emergency_override: EmergencyOverride::default(),
            evaluation_time: None,
        }
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load from a file: `.json` parses as JSON, anything else as YAML.
    pub fn from_file(path: &Path) -> Result<Self, PolicyError> {
        let load_err = |message: String| PolicyError::Load {
            path: path.to_path_buf(),
            message,
        };
        let data = fs::read_to_string(path).map_err(|e| load_err(e.to_string()))?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        // Untyped pass first, so a bad classification is reported against
        // its scope rather than as an unreadable file.
        if is_json {
            let mut value: serde_json::Value =
                serde_json::from_str(&data).map_err(|e| load_err(e.to_string()))?;
            let scope_id = value
                .pointer("/scope/id")
                .and_then(serde_json::Value::as_str)
                .map(str::to_string);
            if let Some(field) = value.get_mut("data_classification") {
                let rendered = field.to_string();
                if let Some(class) = classification_field(scope_id.as_deref(), field.as_str(), &rendered)? {
                    *field = serde_json::Value::String(class.to_string());
                }
            }
            serde_json::from_value(value).map_err(|e| load_err(e.to_string()))
        } else {
            let mut value: serde_yaml::Value =
                serde_yaml::from_str(&data).map_err(|e| load_err(e.to_string()))?;
            let scope_id = value
                .get("scope")
                .and_then(|scope| scope.get("id"))
                .and_then(serde_yaml::Value::as_str)
                .map(str::to_string);
            if let Some(field) = value.get_mut("data_classification") {
                let rendered = format!("{:?}", field);
                if let Some(class) = classification_field(scope_id.as_deref(), field.as_str(), &rendered)? {
                    *field = serde_yaml::Value::String(class.to_string());
                }
            }
            serde_yaml::from_value(value).map_err(|e| load_err(e.to_string()))
        }
    }

    /// Set the evaluation time unless the input already pins one.
    pub fn with_default_evaluation_time(mut self, at: DateTime<Utc>) -> Self {
        self.evaluation_time.get_or_insert(at);
        self
    }

    /// Set the evaluation time, replacing any pinned value.
    pub fn with_evaluation_time(mut self, at: DateTime<Utc>) -> Self {
        self.evaluation_time = Some(at);
        self
    }

    /// Inject the remote break-glass lookup result.
    pub fn with_remote_fallback(mut self, remote: RemoteBreakGlass) -> Self {
        self.exception_sources.remote_fallback = Some(remote);
        self
    }

    /// Whether compiling needs the remote break-glass state: no group is
    /// configured and no remote result has been injected yet.
    pub fn needs_remote_break_glass(&self) -> bool {
        self.exception_sources.break_glass_group.trim().is_empty()
            && self.exception_sources.remote_fallback.is_none()
    }

    /// Ask `resolver` for the break-glass state, but only when
    /// [`needs_remote_break_glass`](Self::needs_remote_break_glass) holds.
    pub fn with_resolved_fallback(self, resolver: &dyn BreakGlassResolver) -> Self {
        if !self.needs_remote_break_glass() {
            return self;
        }
        tracing::debug!(scope = %self.scope.id, "no break-glass group configured; consulting resolver");
        let remote = resolver.resolve();
        self.with_remote_fallback(remote)
    }

    /// Range-check framework params and overrides.
    pub fn validate(&self) -> Result<(), PolicyError> {
        self.framework_params.validate(&self.scope.id)?;
        self.security_control_overrides.validate(&self.scope.id)
    }
}

/// Check a raw `data_classification` value against its scope.
///
/// Without a readable scope id there is nothing to attribute the error to,
/// so the typed pass reports it instead.
fn classification_field(
    scope_id: Option<&str>,
    raw: Option<&str>,
    rendered: &str,
) -> Result<Option<DataClassification>, PolicyError> {
    let Some(scope) = scope_id else {
        return Ok(None);
    };
    match raw {
        Some(raw) => DataClassification::parse_for_scope(scope, raw).map(Some),
        None => Err(PolicyError::validation(
            scope,
            "data_classification",
            format!("classification must be a string, got {}", rendered),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PolicyErrorKind;
    use crate::framework::TrustCriterion;
    use crate::scope::ScopeTier;
    use chrono::TimeZone;
    use std::io::Write;

    const MINIMAL: &str = r#"
scope:
  tier: project
  id: payments-prod
enabled_frameworks: [pci_dss, soc2]
data_classification: restricted
exception_sources:
  break_glass_group: breakglass@example.com
"#;

    #[test]
    fn minimal_yaml_gets_defaults() {
        let input = CompilationInput::from_yaml_str(MINIMAL).unwrap();
        assert_eq!(input.scope.tier, ScopeTier::Project);
        assert!(input.enabled_frameworks.contains(&Framework::PciDss));
        assert_eq!(input.data_classification, DataClassification::Restricted);
        assert_eq!(input.framework_params.pci_dss.merchant_level, 1);
        assert!(input
            .framework_params
            .soc2
            .trust_criteria
            .contains(&TrustCriterion::Security));
        assert!(!input.emergency_override.active);
        assert!(input.evaluation_time.is_none());
    }

    #[test]
    fn org_alias_accepted() {
        let input = CompilationInput::from_yaml_str("scope: { tier: org, id: \"1234\" }\n").unwrap();
        assert_eq!(input.scope.tier, ScopeTier::Organization);
    }

    #[test]
    fn unknown_classification_rejected() {
        let yaml = "scope: { tier: project, id: abcdef }\ndata_classification: secret\n";
        assert!(CompilationInput::from_yaml_str(yaml).is_err());
    }

    #[test]
    fn json_file_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scope.json");
        let mut file = fs::File::create(&path).unwrap();
        write!(
            file,
            r#"{{"scope": {{"tier": "folder", "id": "folders/42"}}, "enabled_frameworks": ["gdpr"]}}"#
        )
        .unwrap();
        let input = CompilationInput::from_file(&path).unwrap();
        assert_eq!(input.scope.id, "folders/42");
        assert!(input.enabled_frameworks.contains(&Framework::Gdpr));
    }

    #[test]
    fn unknown_classification_in_file_names_scope() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scope.yaml");
        fs::write(
            &path,
            "scope: { tier: project, id: ledger-prod }\ndata_classification: secret\n",
        )
        .unwrap();
        let err = CompilationInput::from_file(&path).unwrap_err();
        assert_eq!(err.kind(), PolicyErrorKind::Validation);
        assert!(err.to_string().contains("ledger-prod"));
        assert!(err.to_string().contains("data_classification"));

        let json = dir.path().join("scope.json");
        fs::write(
            &json,
            r#"{"scope": {"tier": "folder", "id": "folders/42"}, "data_classification": 3}"#,
        )
        .unwrap();
        let err = CompilationInput::from_file(&json).unwrap_err();
        assert_eq!(err.kind(), PolicyErrorKind::Validation);
        assert!(err.to_string().contains("folders/42"));
    }

    #[test]
    fn classification_in_file_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scope.yaml");
        fs::write(
            &path,
            "scope: { tier: project, id: ledger-prod }\ndata_classification: Restricted\n",
        )
        .unwrap();
        let input = CompilationInput::from_file(&path).unwrap();
        assert_eq!(input.data_classification, DataClassification::Restricted);
    }

    #[test]
    fn resolver_consulted_only_when_nothing_configured() {
        let remote = RemoteBreakGlass::Unavailable {
            reason: "offline".to_string(),
        };
        let configured = CompilationInput::from_yaml_str(MINIMAL).unwrap();
        assert!(!configured.needs_remote_break_glass());
        assert!(configured
            .with_resolved_fallback(&remote)
            .exception_sources
            .remote_fallback
            .is_none());

        let bare = CompilationInput::new(ScopeRef::new(ScopeTier::Project, "abcdef"));
        assert!(bare.needs_remote_break_glass());
        let resolved = bare.with_resolved_fallback(&remote);
        assert_eq!(resolved.exception_sources.remote_fallback, Some(remote.clone()));
        assert!(!resolved.needs_remote_break_glass());

        // An injected result is never replaced.
        let other = RemoteBreakGlass::Unavailable {
            reason: "second lookup".to_string(),
        };
        assert_eq!(
            resolved.with_resolved_fallback(&other).exception_sources.remote_fallback,
            Some(remote)
        );
    }

    #[test]
    fn missing_file_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = CompilationInput::from_file(&dir.path().join("absent.yaml")).unwrap_err();
        assert_eq!(err.kind(), PolicyErrorKind::Load);
        assert!(err.to_string().contains("absent.yaml"));
    }

    #[test]
    fn pinned_time_survives_default() {
        let pinned = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
        let input = CompilationInput::new(ScopeRef::new(ScopeTier::Project, "abcdef"))
            .with_evaluation_time(pinned)
            .with_default_evaluation_time(now);
        assert_eq!(input.evaluation_time, Some(pinned));
    }

    #[test]
    fn validate_checks_params_and_overrides() {
        let mut input = CompilationInput::from_yaml_str(MINIMAL).unwrap();
        assert!(input.validate().is_ok());
        input.framework_params.pci_dss.merchant_level = 7;
        let err = input.validate().unwrap_err();
        assert_eq!(err.kind(), PolicyErrorKind::Validation);
        assert!(err.to_string().contains("payments-prod"));
    }
}

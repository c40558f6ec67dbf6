// exception.rs — Exception principal resolution.
//
// Every deny rule carries the same exception list: the principals that must
// never be locked out by it. The list is merged from several sources in a
// fixed order:
//
// 1. break-glass group (explicit, else the remote fallback)
// 2. explicit service accounts, in input order
// 3. workload-identity pool bindings, in input order
// 4. temporary exemptions that have not expired at the evaluation time
//
// and deduplicated keeping the first occurrence. A missing break-glass
// principal while enforcement is live is a configuration error: rules with
// an empty exception list would block their own administrators.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::PolicyError;

const EMAIL_PATTERN: &str = r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)+$";

/// Returns true if `candidate` looks like `local@domain.tld`.
pub fn is_valid_email(candidate: &str) -> bool {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(EMAIL_PATTERN).ok())
        .as_ref()
        .map(|re| re.is_match(candidate))
        .unwrap_or(false)
}

const IDENTIFIER_PATTERN: &str = r"^[a-z0-9][a-z0-9_-]*$";

/// Returns true if `candidate` is a lowercase identifier: letters, digits,
/// `-` and `_`, starting with a letter or digit.
pub fn is_valid_identifier(candidate: &str) -> bool {
    static IDENTIFIER: OnceLock<Option<Regex>> = OnceLock::new();
    IDENTIFIER
        .get_or_init(|| Regex::new(IDENTIFIER_PATTERN).ok())
        .as_ref()
        .map(|re| re.is_match(candidate))
        .unwrap_or(false)
}

/// A workload-identity pool binding exempted from every rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadIdentityBinding {
    pub pool_id: String,
    pub provider_id: String,
    /// Numeric project number hosting the pool.
    pub project_number: String,
    /// Mapped attribute name (e.g. `repository`).
    pub attribute_name: String,
    /// Attribute value members must carry (e.g. `acme/deploy`).
    pub attribute_value: String,
}

/// A time-bounded exemption for a single principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporaryExemption {
    /// Email or fully qualified principal identifier.
    pub principal: String,
    pub expires_at: DateTime<Utc>,
    pub reason: String,
}

impl TemporaryExemption {
    /// Expired strictly before `at`; an exemption ending exactly at `at` is live.
    pub fn is_expired(&self, at: DateTime<Utc>) -> bool {
        self.expires_at < at
    }
}

/// Result of asking the remote break-glass state store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RemoteBreakGlass {
    Available {
        break_glass_group: String,
        #[serde(default)]
        super_admins: Vec<String>,
    },
    Unavailable {
        reason: String,
    },
}

impl RemoteBreakGlass {
    /// The fallback group, if the store answered with a non-empty one.
    pub fn fallback_group(&self) -> Option<&str> {
        match self {
            RemoteBreakGlass::Available {
                break_glass_group, ..
            } if !break_glass_group.trim().is_empty() => Some(break_glass_group.trim()),
            _ => None,
        }
    }

    pub fn super_admins(&self) -> &[String] {
        match self {
            RemoteBreakGlass::Available { super_admins, .. } => super_admins,
            RemoteBreakGlass::Unavailable { .. } => &[],
        }
    }
}

/// Collaborator that looks up the remote break-glass state.
///
/// Implementations do the I/O; the engine only ever sees the result.
pub trait BreakGlassResolver {
    fn resolve(&self) -> RemoteBreakGlass;
}

impl BreakGlassResolver for RemoteBreakGlass {
    fn resolve(&self) -> RemoteBreakGlass {
        self.clone()
    }
}

/// All exception inputs for one compilation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionSources {
    /// Break-glass group email. Empty means "use the remote fallback".
    #[serde(default)]
    pub break_glass_group: String,

    /// Result of the remote break-glass lookup, injected by the caller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_fallback: Option<RemoteBreakGlass>,

    #[serde(default)]
    pub service_accounts: Vec<String>,

    #[serde(default)]
    pub workload_identity_bindings: Vec<WorkloadIdentityBinding>,

    #[serde(default)]
    pub temporary_exemptions: Vec<TemporaryExemption>,
}

/// One exception source. Each resolves to zero or one principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExceptionSource {
    BreakGlassGroup(String),
    ServiceAccount(String),
    WorkloadIdentityBinding(WorkloadIdentityBinding),
    TemporaryExemption(TemporaryExemption),
}

impl ExceptionSource {
    /// Resolve to a principal string, or `None` if this source contributes nothing.
    pub fn resolve(
        &self,
        scope: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<String>, PolicyError> {
        match self {
            ExceptionSource::BreakGlassGroup(email) => {
                let email = email.trim();
                if email.is_empty() {
                    return Ok(None);
                }
                if !is_valid_email(email) {
                    return Err(PolicyError::validation(
                        scope,
                        "exception_sources.break_glass_group",
                        format!("'{}' is not a valid group email", email),
                    ));
                }
                Ok(Some(format!("principalSet://goog/group/{}", email)))
            }
            ExceptionSource::ServiceAccount(identity) => {
                let identity = identity.trim();
                if identity.is_empty() || identity.contains(char::is_whitespace) {
                    return Err(PolicyError::validation(
                        scope,
                        "exception_sources.service_accounts",
                        format!("invalid service account identity '{}'", identity),
                    ));
                }
                if identity.contains("://") {
                    return Ok(Some(identity.to_string()));
                }
                Ok(Some(format!(
                    "principal://iam.googleapis.com/projects/-/serviceAccounts/{}",
                    identity
                )))
            }
            ExceptionSource::WorkloadIdentityBinding(binding) => {
                let field = "exception_sources.workload_identity_bindings";
                for (name, value) in [
                    ("pool_id", &binding.pool_id),
                    ("provider_id", &binding.provider_id),
                    ("attribute_name", &binding.attribute_name),
                ] {
                    if !is_valid_identifier(value) {
                        return Err(PolicyError::validation(
                            scope,
                            format!("{}.{}", field, name),
                            format!(
                                "{} '{}' must be lowercase letters, digits, '-' or '_'",
                                name, value
                            ),
                        ));
                    }
                }
                let value = &binding.attribute_value;
                if value.is_empty() || value.chars().any(|c| c.is_whitespace() || c.is_control()) {
                    return Err(PolicyError::validation(
                        scope,
                        format!("{}.attribute_value", field),
                        format!(
                            "attribute value '{}' for pool '{}' must be non-empty and contain no whitespace",
                            value, binding.pool_id
                        ),
                    ));
                }
                if binding.project_number.is_empty()
                    || !binding.project_number.chars().all(|c| c.is_ascii_digit())
                {
                    return Err(PolicyError::validation(
                        scope,
                        format!("{}.project_number", field),
                        format!(
                            "project number '{}' for pool '{}' must be numeric",
                            binding.project_number, binding.pool_id
                        ),
                    ));
                }
                Ok(Some(format!(
                    "principalSet://iam.googleapis.com/projects/{}/locations/global/workloadIdentityPools/{}/attribute.{}/{}",
                    binding.project_number,
                    binding.pool_id,
                    binding.attribute_name,
                    binding.attribute_value
                )))
            }
            ExceptionSource::TemporaryExemption(exemption) => {
                let principal = exemption.principal.trim();
                let resolved = if principal.contains("://") {
                    principal.to_string()
                } else if is_valid_email(principal) {
                    format!("principal://goog/subject/{}", principal)
                } else {
                    return Err(PolicyError::validation(
                        scope,
                        "exception_sources.temporary_exemptions",
                        format!("'{}' is neither a principal URI nor a valid email", principal),
                    ));
                };
                // Malformed entries are rejected even once expired.
                if exemption.is_expired(at) {
                    return Ok(None);
                }
                Ok(Some(resolved))
            }
        }
    }
}

/// Ordered, duplicate-free list of exception principals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExceptionPrincipalSet(Vec<String>);

impl ExceptionPrincipalSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append unless already present. Returns whether it was inserted.
    pub fn insert(&mut self, principal: impl Into<String>) -> bool {
        let principal = principal.into();
        if self.0.contains(&principal) {
            return false;
        }
        self.0.push(principal);
        true
    }

    pub fn contains(&self, principal: &str) -> bool {
        self.0.iter().any(|p| p == principal)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ExceptionPrincipalSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for principal in iter {
            set.insert(principal);
        }
        set
    }
}

/// Where the break-glass principal came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakGlassOrigin {
    Explicit,
    RemoteFallback,
}

/// Resolved exception list plus the facts an auditor wants about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionResolution {
    pub principals: ExceptionPrincipalSet,
    pub break_glass_origin: Option<BreakGlassOrigin>,
    /// Temporary exemptions dropped because they had expired.
    pub expired_exemptions: Vec<String>,
    /// Super admins reported by the remote store. Never exempted.
    pub super_admins: Vec<String>,
}

/// Build the ordered source list from the configured inputs.
///
/// The break-glass slot holds the explicit group when set, else the remote
/// fallback group, else nothing.
pub fn exception_sources(sources: &ExceptionSources) -> (Vec<ExceptionSource>, Option<BreakGlassOrigin>) {
    let mut ordered = Vec::new();
    let explicit = sources.break_glass_group.trim();
    let origin = if !explicit.is_empty() {
        ordered.push(ExceptionSource::BreakGlassGroup(explicit.to_string()));
        Some(BreakGlassOrigin::Explicit)
    } else if let Some(group) = sources
        .remote_fallback
        .as_ref()
        .and_then(RemoteBreakGlass::fallback_group)
    {
        ordered.push(ExceptionSource::BreakGlassGroup(group.to_string()));
        Some(BreakGlassOrigin::RemoteFallback)
    } else {
        None
    };

    ordered.extend(
        sources
            .service_accounts
            .iter()
            .cloned()
            .map(ExceptionSource::ServiceAccount),
    );
    ordered.extend(
        sources
            .workload_identity_bindings
            .iter()
            .cloned()
            .map(ExceptionSource::WorkloadIdentityBinding),
    );
    ordered.extend(
        sources
            .temporary_exemptions
            .iter()
            .cloned()
            .map(ExceptionSource::TemporaryExemption),
    );
    (ordered, origin)
}

/// Resolve all exception sources into one deduplicated principal list.
///
/// `override_active` relaxes only the break-glass requirement: while an
/// emergency override is in force no rules are emitted, so an absent
/// break-glass group cannot lock anyone out.
pub fn resolve_exceptions(
    scope: &str,
    sources: &ExceptionSources,
    override_active: bool,
    at: DateTime<Utc>,
) -> Result<ExceptionResolution, PolicyError> {
    let (ordered, break_glass_origin) = exception_sources(sources);

    if break_glass_origin.is_none() && !override_active {
        let remote = match &sources.remote_fallback {
            Some(RemoteBreakGlass::Unavailable { reason }) => {
                format!("remote break-glass state unavailable: {}", reason)
            }
            Some(RemoteBreakGlass::Available { .. }) => {
                "remote break-glass state returned an empty group".to_string()
            }
            None => "no remote break-glass state supplied".to_string(),
        };
        return Err(PolicyError::configuration(
            scope,
            "exception_sources.break_glass_group",
            format!(
                "no break-glass principal and enforcement is live ({}); refusing to emit rules",
                remote
            ),
        ));
    }

    if break_glass_origin == Some(BreakGlassOrigin::RemoteFallback) {
        tracing::warn!(scope, "break-glass group taken from remote fallback state");
    }

    let mut principals = ExceptionPrincipalSet::new();
    let mut expired_exemptions = Vec::new();
    for source in &ordered {
        match source.resolve(scope, at)? {
            Some(principal) => {
                if !principals.insert(principal.clone()) {
                    tracing::debug!(scope, %principal, "duplicate exception principal dropped");
                }
            }
            None => {
                if let ExceptionSource::TemporaryExemption(exemption) = source {
                    tracing::debug!(
                        scope,
                        principal = %exemption.principal,
                        expires_at = %exemption.expires_at,
                        "temporary exemption expired"
                    );
                    expired_exemptions.push(exemption.principal.clone());
                }
            }
        }
    }

    Ok(ExceptionResolution {
        principals,
        break_glass_origin,
        expired_exemptions,
        super_admins: sources
            .remote_fallback
            .as_ref()
            .map(|r| r.super_admins().to_vec())
            .unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PolicyErrorKind;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn binding(pool: &str) -> WorkloadIdentityBinding {
        WorkloadIdentityBinding {
            pool_id: pool.to_string(),
            provider_id: "github".to_string(),
            project_number: "998877".to_string(),
            attribute_name: "repository".to_string(),
            attribute_value: "acme/deploy".to_string(),
        }
    }

    #[test]
    fn resolves_in_source_order() {
        let sources = ExceptionSources {
            break_glass_group: "sec@x.com".to_string(),
            service_accounts: vec!["sa1".to_string(), "sa2".to_string()],
            workload_identity_bindings: vec![binding("p1")],
            ..Default::default()
        };
        let resolved = resolve_exceptions("123", &sources, false, now()).unwrap();
        let principals = resolved.principals.as_slice();
        assert_eq!(principals.len(), 4);
        assert_eq!(principals[0], "principalSet://goog/group/sec@x.com");
        assert!(principals[1].ends_with("/serviceAccounts/sa1"));
        assert!(principals[2].ends_with("/serviceAccounts/sa2"));
        assert_eq!(
            principals[3],
            "principalSet://iam.googleapis.com/projects/998877/locations/global/workloadIdentityPools/p1/attribute.repository/acme/deploy"
        );
        assert_eq!(resolved.break_glass_origin, Some(BreakGlassOrigin::Explicit));
    }

    #[test]
    fn duplicates_keep_first_position() {
        let sources = ExceptionSources {
            break_glass_group: "sec@x.com".to_string(),
            service_accounts: vec![
                "deployer@proj.iam.gserviceaccount.com".to_string(),
                "principalSet://goog/group/sec@x.com".to_string(),
                "deployer@proj.iam.gserviceaccount.com".to_string(),
            ],
            ..Default::default()
        };
        let resolved = resolve_exceptions("123", &sources, false, now()).unwrap();
        assert_eq!(resolved.principals.len(), 2);
        assert_eq!(
            resolved.principals.as_slice()[0],
            "principalSet://goog/group/sec@x.com"
        );
    }

    #[test]
    fn expired_exemptions_are_excluded() {
        let sources = ExceptionSources {
            break_glass_group: "sec@x.com".to_string(),
            temporary_exemptions: vec![
                TemporaryExemption {
                    principal: "old@x.com".to_string(),
                    expires_at: now() - Duration::hours(1),
                    reason: "migration".to_string(),
                },
                TemporaryExemption {
                    principal: "edge@x.com".to_string(),
                    expires_at: now(),
                    reason: "expires exactly now".to_string(),
                },
                TemporaryExemption {
                    principal: "new@x.com".to_string(),
                    expires_at: now() + Duration::days(1),
                    reason: "incident".to_string(),
                },
            ],
            ..Default::default()
        };
        let resolved = resolve_exceptions("123", &sources, false, now()).unwrap();
        assert!(resolved
            .principals
            .contains("principal://goog/subject/new@x.com"));
        assert!(resolved
            .principals
            .contains("principal://goog/subject/edge@x.com"));
        assert!(!resolved
            .principals
            .contains("principal://goog/subject/old@x.com"));
        assert_eq!(resolved.expired_exemptions, vec!["old@x.com".to_string()]);
    }

    #[test]
    fn remote_fallback_used_when_explicit_empty() {
        let sources = ExceptionSources {
            remote_fallback: Some(RemoteBreakGlass::Available {
                break_glass_group: "bg@x.com".to_string(),
                super_admins: vec!["root@x.com".to_string()],
            }),
            ..Default::default()
        };
        let resolved = resolve_exceptions("123", &sources, false, now()).unwrap();
        assert_eq!(
            resolved.principals.as_slice(),
            &["principalSet://goog/group/bg@x.com".to_string()]
        );
        assert_eq!(
            resolved.break_glass_origin,
            Some(BreakGlassOrigin::RemoteFallback)
        );
        assert_eq!(resolved.super_admins, vec!["root@x.com".to_string()]);
        assert!(!resolved.principals.iter().any(|p| p.contains("root@x.com")));
    }

    #[test]
    fn explicit_wins_over_remote_fallback() {
        let sources = ExceptionSources {
            break_glass_group: "sec@x.com".to_string(),
            remote_fallback: Some(RemoteBreakGlass::Available {
                break_glass_group: "bg@x.com".to_string(),
                super_admins: vec![],
            }),
            ..Default::default()
        };
        let resolved = resolve_exceptions("123", &sources, false, now()).unwrap();
        assert_eq!(resolved.principals.len(), 1);
        assert!(resolved.principals.contains("principalSet://goog/group/sec@x.com"));
    }

    #[test]
    fn missing_break_glass_fails_closed() {
        let sources = ExceptionSources {
            service_accounts: vec!["sa1".to_string()],
            remote_fallback: Some(RemoteBreakGlass::Unavailable {
                reason: "state bucket unreachable".to_string(),
            }),
            ..Default::default()
        };
        let err = resolve_exceptions("123", &sources, false, now()).unwrap_err();
        assert_eq!(err.kind(), PolicyErrorKind::Configuration);
        assert!(err.to_string().contains("state bucket unreachable"));
    }

    #[test]
    fn missing_break_glass_allowed_under_override() {
        let sources = ExceptionSources::default();
        let resolved = resolve_exceptions("123", &sources, true, now()).unwrap();
        assert!(resolved.principals.is_empty());
        assert_eq!(resolved.break_glass_origin, None);
    }

    #[test]
    fn malformed_break_glass_email_is_validation_error() {
        let sources = ExceptionSources {
            break_glass_group: "not-an-email".to_string(),
            ..Default::default()
        };
        let err = resolve_exceptions("123", &sources, false, now()).unwrap_err();
        assert_eq!(err.kind(), PolicyErrorKind::Validation);
        assert!(err.to_string().contains("break_glass_group"));
    }

    #[test]
    fn workload_binding_requires_numeric_project_number() {
        let mut bad = binding("p1");
        bad.project_number = "my-project".to_string();
        let sources = ExceptionSources {
            break_glass_group: "sec@x.com".to_string(),
            workload_identity_bindings: vec![bad],
            ..Default::default()
        };
        let err = resolve_exceptions("123", &sources, false, now()).unwrap_err();
        assert!(err.to_string().contains("project_number"));
    }

    #[test]
    fn workload_binding_rejects_malformed_segments() {
        let cases = [
            ("pool_id", {
                let mut b = binding("p 1");
                b.attribute_value = "a b".to_string();
                b
            }),
            ("attribute_name", {
                let mut b = binding("p1");
                b.attribute_name = "repo/name".to_string();
                b
            }),
            ("attribute_value", {
                let mut b = binding("p1");
                b.attribute_value = "acme deploy".to_string();
                b
            }),
            ("provider_id", {
                let mut b = binding("p1");
                b.provider_id = String::new();
                b
            }),
        ];
        for (field, bad) in cases {
            let err = ExceptionSource::WorkloadIdentityBinding(bad)
                .resolve("123", now())
                .unwrap_err();
            assert_eq!(err.kind(), PolicyErrorKind::Validation);
            assert!(err.to_string().contains(field), "{} not named in: {}", field, err);
        }
    }

    #[test]
    fn expired_malformed_exemption_still_rejected() {
        let exemption = |expires_at| {
            ExceptionSource::TemporaryExemption(TemporaryExemption {
                principal: "not an email".to_string(),
                expires_at,
                reason: "typo".to_string(),
            })
        };
        let live = exemption(now() + Duration::days(1)).resolve("123", now());
        let expired = exemption(now() - Duration::days(1)).resolve("123", now());
        assert_eq!(live.unwrap_err().kind(), PolicyErrorKind::Validation);
        assert_eq!(expired.unwrap_err().kind(), PolicyErrorKind::Validation);
    }

    #[test]
    fn identifier_validation() {
        assert!(is_valid_identifier("p1"));
        assert!(is_valid_identifier("github-actions"));
        assert!(is_valid_identifier("repository_owner"));
        assert!(!is_valid_identifier("p 1"));
        assert!(!is_valid_identifier("-pool"));
        assert!(!is_valid_identifier("Pool"));
        assert!(!is_valid_identifier(""));
    }

    #[test]
    fn fully_qualified_service_account_kept_verbatim() {
        let source = ExceptionSource::ServiceAccount(
            "principal://iam.googleapis.com/projects/-/serviceAccounts/ci@p.iam.gserviceaccount.com"
                .to_string(),
        );
        let principal = source.resolve("123", now()).unwrap().unwrap();
        assert!(principal.starts_with("principal://iam.googleapis.com/"));
        assert_eq!(principal.matches("principal://").count(), 1);
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("sec@x.com"));
        assert!(is_valid_email("first.last+ops@sub.example.org"));
        assert!(!is_valid_email("sec@x"));
        assert!(!is_valid_email("@x.com"));
        assert!(!is_valid_email("sec x@x.com"));
    }

    #[test]
    fn remote_state_parses_from_json() {
        let json = r#"{"status": "available", "break_glass_group": "bg@x.com"}"#;
        let remote: RemoteBreakGlass = serde_json::from_str(json).unwrap();
        assert_eq!(remote.fallback_group(), Some("bg@x.com"));
        assert!(remote.super_admins().is_empty());
        assert_eq!(remote.resolve(), remote);
    }
}

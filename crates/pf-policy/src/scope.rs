// scope.rs — Resource-hierarchy scope resolution.
//
// A scope is the node (organization, folder, or project) a policy set is
// compiled for. Resolution validates the raw identifier for its tier and
// derives the canonical address every rule in the set is parented under.
// The canonical address is a pure function of (tier, id).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::PolicyError;

const RESOURCE_MANAGER: &str = "cloudresourcemanager.googleapis.com";

/// Hierarchy tier of a scope. Ordered parent-first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeTier {
    #[serde(alias = "org")]
    Organization,
    Folder,
    Project,
}

impl ScopeTier {
    fn collection(self) -> &'static str {
        match self {
            ScopeTier::Organization => "organizations",
            ScopeTier::Folder => "folders",
            ScopeTier::Project => "projects",
        }
    }
}

impl fmt::Display for ScopeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeTier::Organization => write!(f, "organization"),
            ScopeTier::Folder => write!(f, "folder"),
            ScopeTier::Project => write!(f, "project"),
        }
    }
}

/// Raw scope declaration as it appears in input configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeRef {
    pub tier: ScopeTier,
    pub id: String,
}

impl ScopeRef {
    pub fn new(tier: ScopeTier, id: impl Into<String>) -> Self {
        Self {
            tier,
            id: id.into(),
        }
    }

    /// Validate and canonicalize this declaration.
    pub fn resolve(&self) -> Result<Scope, PolicyError> {
        Scope::resolve(self.tier, &self.id)
    }
}

/// A validated, addressable scope. Immutable once resolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scope {
    pub tier: ScopeTier,
    pub id: String,
    pub canonical_address: String,
}

impl Scope {
    /// Validate `id` against the syntax of `tier` and build the canonical address.
    ///
    /// - organization: numeric string (`"123456789"`)
    /// - folder: `folders/<numeric>`
    /// - project: 6–30 characters of lowercase letters, digits, and hyphens
    pub fn resolve(tier: ScopeTier, id: &str) -> Result<Self, PolicyError> {
        let bare = match tier {
            ScopeTier::Organization => {
                if !is_numeric(id) {
                    return Err(invalid(id, "organization id must be a numeric string"));
                }
                id
            }
            ScopeTier::Folder => match id.strip_prefix("folders/") {
                Some(number) if is_numeric(number) => number,
                _ => return Err(invalid(id, "folder id must have the form 'folders/<numeric>'")),
            },
            ScopeTier::Project => {
                let len = id.chars().count();
                if !(6..=30).contains(&len) {
                    return Err(invalid(
                        id,
                        format!("project id must be 6-30 characters, got {}", len),
                    ));
                }
                if !id
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
                {
                    return Err(invalid(
                        id,
                        "project id may contain only lowercase letters, digits, and hyphens",
                    ));
                }
                id
            }
        };

        Ok(Self {
            tier,
            id: id.to_string(),
            canonical_address: format!("{}/{}/{}", RESOURCE_MANAGER, tier.collection(), bare),
        })
    }

    /// The canonical address with `/` percent-encoded, as deny-policy
    /// attachment points are written.
    pub fn attachment_point(&self) -> String {
        self.canonical_address.replace('/', "%2F")
    }

    /// Parent collection an applier creates this scope's rules under.
    pub fn policy_parent(&self) -> String {
        format!("policies/{}/denypolicies", self.attachment_point())
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.tier, self.id)
    }
}

fn is_numeric(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

fn invalid(id: &str, message: impl Into<String>) -> PolicyError {
    PolicyError::validation(id, "scope.id", message)
}

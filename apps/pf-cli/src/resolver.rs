// resolver.rs — Break-glass state file resolver.
//
// The remote break-glass store is mirrored into a small JSON file by
// whatever job syncs it:
//
//   { "break_glass_group": "oncall@example.com", "super_admins": ["root@example.com"] }
//
// A missing or unreadable file is reported as Unavailable, never as an
// error. The engine then decides whether that is fatal (it is, unless an
// emergency override is active).

use std::path::{Path, PathBuf};

use pf_policy::{BreakGlassResolver, RemoteBreakGlass};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct BreakGlassState {
    break_glass_group: String,
    #[serde(default)]
    super_admins: Vec<String>,
}

/// Reads the break-glass state from a JSON file on every call.
#[derive(Debug, Clone)]
pub struct StateFileResolver {
    path: PathBuf,
}

impl StateFileResolver {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl BreakGlassResolver for StateFileResolver {
    fn resolve(&self) -> RemoteBreakGlass {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "break-glass state unavailable");
                return RemoteBreakGlass::Unavailable {
                    reason: format!("cannot read {}: {}", self.path.display(), e),
                };
            }
        };
        match serde_json::from_str::<BreakGlassState>(&content) {
            Ok(state) => RemoteBreakGlass::Available {
                break_glass_group: state.break_glass_group,
                super_admins: state.super_admins,
            },
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "break-glass state malformed");
                RemoteBreakGlass::Unavailable {
                    reason: format!("malformed {}: {}", self.path.display(), e),
                }
            }
        }
    }
}

// config.rs — CLI settings.
//
// Defaults live under `.pf/` in the project root. An optional
// `.pf/config.toml` overrides any of them; relative paths in it resolve
// against the project root.
//
//   audit_log = ".pf/audit.jsonl"
//   output_dir = ".pf/manifests"
//   break_glass_state = ".pf/break_glass.json"
//   log_filter = "pf_policy=info,pf_cli=info"

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

pub const DEFAULT_LOG_FILTER: &str = "pf_policy=info,pf_cli=info";

/// Resolved CLI settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForgeConfig {
    pub project_root: PathBuf,
    /// Append-only audit log.
    pub audit_log: PathBuf,
    /// Where `pf compile` writes manifests.
    pub output_dir: PathBuf,
    /// JSON state file read when a scope names no break-glass group.
    pub break_glass_state: PathBuf,
    /// Tracing filter used when `RUST_LOG` is unset.
    pub log_filter: String,
}

/// On-disk shape of `.pf/config.toml`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    audit_log: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    break_glass_state: Option<PathBuf>,
    log_filter: Option<String>,
}

impl ForgeConfig {
    /// Standard `.pf/` layout for a project.
    pub fn for_project(project_root: impl AsRef<Path>) -> Self {
        let root = project_root.as_ref().to_path_buf();
        let pf_dir = root.join(".pf");
        Self {
            audit_log: pf_dir.join("audit.jsonl"),
            output_dir: pf_dir.join("manifests"),
            break_glass_state: pf_dir.join("break_glass.json"),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            project_root: root,
        }
    }

    /// Defaults overlaid with `.pf/config.toml` when it exists.
    pub fn load(project_root: impl AsRef<Path>) -> anyhow::Result<Self> {
        let mut config = Self::for_project(project_root);
        let path = config.project_root.join(".pf").join("config.toml");
        if !path.exists() {
            return Ok(config);
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let file: ConfigFile = toml::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;

        if let Some(p) = file.audit_log {
            config.audit_log = config.project_root.join(p);
        }
        if let Some(p) = file.output_dir {
            config.output_dir = config.project_root.join(p);
        }
        if let Some(p) = file.break_glass_state {
            config.break_glass_state = config.project_root.join(p);
        }
        if let Some(filter) = file.log_filter {
            config.log_filter = filter;
        }
        Ok(config)
    }
}

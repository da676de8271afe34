use crate::{config::Config, sanitize::sanitize_code};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Allow/deny rules matched against a file's base name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectionRules {
    #[serde(default)]
    pub explicit_allow_list: BTreeSet<String>,
    #[serde(default)]
    pub implicit_allow_extensions: Vec<String>,
    #[serde(default)]
    pub explicit_deny_list: BTreeSet<String>,
}

impl SelectionRules {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading rule file: {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("parsing rule file: {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        // An empty document is valid YAML but deserializes to null.
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    /// The deny list always wins.
    pub fn is_allowed(&self, file_name: &str) -> bool {
        if self.explicit_deny_list.contains(file_name) {
            return false;
        }
        self.explicit_allow_list.contains(file_name)
            || self
                .implicit_allow_extensions
                .iter()
                .any(|ext| file_name.ends_with(ext.as_str()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Sanitized content; empty means there is nothing to analyze.
    pub payload: String,
}

impl SourceFile {
    pub fn label(&self) -> String {
        self.path.display().to_string()
    }
}

pub fn collect_sources(root: &Path, rules: &SelectionRules, cfg: &Config) -> Result<Vec<SourceFile>> {
    let skip = &cfg.selection.skip_dirs;
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            !(e.file_type().is_dir()
                && e.depth() > 0
                && skip.iter().any(|d| e.file_name().to_str() == Some(d.as_str())))
        });

    let mut out = Vec::new();
    for entry in walker {
        let entry = entry.with_context(|| format!("walking {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            debug!("skipping non UTF-8 file name: {}", entry.path().display());
            continue;
        };
        if !rules.is_allowed(name) {
            continue;
        }

        let raw = match std::fs::read_to_string(entry.path()) {
            Ok(raw) => raw,
            Err(err) => {
                warn!("skipping unreadable file {}: {err}", entry.path().display());
                continue;
            }
        };
        info!("THIS FILE WILL BE ANALYZED: {name}");
        out.push(SourceFile {
            path: entry.path().to_path_buf(),
            payload: sanitize_code(&cfg.sanitize, &raw),
        });
    }
    Ok(out)
}

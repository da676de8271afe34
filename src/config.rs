use crate::error::ConfigError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const KNOWN_BACKENDS: &[&str] = &["jira", "github", "dry_run"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub global: Global,
    #[serde(default)]
    pub service: Service,
    #[serde(default)]
    pub polling: Polling,
    #[serde(default)]
    pub selection: Selection,
    #[serde(default)]
    pub sanitize: Sanitize,
    #[serde(default)]
    pub tracker: Tracker,
    #[serde(default)]
    pub env: EnvNames,
    #[serde(default)]
    pub output: Output,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub debug: Debug,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        let cfg: Config = toml::from_str(&raw).with_context(|| "parsing TOML")?;
        Ok(cfg)
    }

    /// Rejects settings the pipeline cannot run with.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.service.job_slug.trim().is_empty() {
            return Err(ConfigError::Invalid("service.job_slug is empty".into()));
        }
        if self.polling.interval_seconds == 0 {
            return Err(ConfigError::Invalid(
                "polling.interval_seconds must be > 0".into(),
            ));
        }
        if self.polling.transport_retry_cap == 0 {
            return Err(ConfigError::Invalid(
                "polling.transport_retry_cap must be >= 1".into(),
            ));
        }
        for backend in &self.tracker.backends {
            if !KNOWN_BACKENDS.contains(&backend.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "unknown tracker backend: {backend}"
                )));
            }
        }
        if self.tracker.uses("jira")
            && (self.tracker.jira.base_url.is_empty() || self.tracker.jira.username.is_empty())
        {
            return Err(ConfigError::Invalid(
                "tracker.jira.base_url and tracker.jira.username are required".into(),
            ));
        }
        if self.tracker.uses("github")
            && (self.tracker.github.owner.is_empty() || self.tracker.github.repo.is_empty())
        {
            return Err(ConfigError::Invalid(
                "tracker.github.owner and tracker.github.repo are required".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Global {
    pub print_summary: bool,
    /// Upper bound on files analyzed at once; 0 leaves it unbounded.
    pub max_parallel_files: usize,
}
impl Default for Global {
    fn default() -> Self {
        Self {
            print_summary: true,
            max_parallel_files: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub identity_url: String,
    pub api_url: String,
    pub job_slug: String,
    pub request_timeout_seconds: u64,
}
impl Default for Service {
    fn default() -> Self {
        Self {
            identity_url: "https://idm.stackspot.com".into(),
            api_url: "https://genai-code-buddy-api.stackspot.com".into(),
            job_slug: "".into(),
            request_timeout_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Polling {
    pub interval_seconds: u64,
    pub timeout_limit_seconds: u64,
    pub transport_retry_cap: u32,
    /// Absent means restart forever.
    #[serde(default)]
    pub max_restarts: Option<u32>,
}
impl Default for Polling {
    fn default() -> Self {
        Self {
            interval_seconds: 5,
            timeout_limit_seconds: 600,
            transport_retry_cap: 3,
            max_restarts: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Selection {
    pub rules_file: String,
    pub skip_dirs: Vec<String>,
}
impl Default for Selection {
    fn default() -> Self {
        Self {
            rules_file: "scripts/define-scannable-files.yaml".into(),
            skip_dirs: vec![".git".into()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sanitize {
    pub comment_marker: String,
    pub normalize_newlines: bool,
    pub normalize_unicode: bool,
}
impl Default for Sanitize {
    fn default() -> Self {
        Self {
            comment_marker: "#".into(),
            normalize_newlines: true,
            normalize_unicode: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tracker {
    pub backends: Vec<String>,
    #[serde(default)]
    pub jira: Jira,
    #[serde(default)]
    pub github: GitHub,
}
impl Default for Tracker {
    fn default() -> Self {
        Self {
            backends: vec!["jira".into()],
            jira: Default::default(),
            github: Default::default(),
        }
    }
}
impl Tracker {
    pub fn uses(&self, backend: &str) -> bool {
        self.backends.iter().any(|b| b == backend)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jira {
    pub base_url: String,
    pub username: String,
    pub project_key: String,
    pub issue_type: String,
}
impl Default for Jira {
    fn default() -> Self {
        Self {
            base_url: "".into(),
            username: "".into(),
            project_key: "POC".into(),
            issue_type: "Task".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHub {
    pub api_url: String,
    pub owner: String,
    pub repo: String,
}
impl Default for GitHub {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".into(),
            owner: "".into(),
            repo: "".into(),
        }
    }
}

/// Names of the environment variables secrets are read from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvNames {
    pub client_id: String,
    pub client_secret: String,
    pub realm: String,
    pub jira_token: String,
    pub github_token: String,
    pub workspace: String,
}
impl Default for EnvNames {
    fn default() -> Self {
        Self {
            client_id: "CLIENT_ID".into(),
            client_secret: "CLIENT_SECRET".into(),
            realm: "CLIENT_REALM".into(),
            jira_token: "JIRA_API_TOKEN".into(),
            github_token: "GITHUB_TOKEN".into(),
            workspace: "GITHUB_WORKSPACE".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Output {
    pub write_report_json: bool,
    pub report_path: String,
}
impl Default for Output {
    fn default() -> Self {
        Self {
            write_report_json: true,
            report_path: "qc-review-report.json".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logging {
    pub level: String,
    pub json: bool,
    pub write_to_file: bool,
    pub file_path: String,
}
impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
            write_to_file: false,
            file_path: "".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Debug {
    pub dump_effective_config: bool,
}
impl Default for Debug {
    fn default() -> Self {
        Self {
            dump_effective_config: false,
        }
    }
}

/// Credentials pulled from the environment once at startup.
#[derive(Clone)]
pub struct Secrets {
    pub client_id: String,
    pub client_secret: String,
    pub realm: String,
    pub jira_token: Option<String>,
    pub github_token: Option<String>,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("client_id", &self.client_id)
            .field("realm", &self.realm)
            .finish_non_exhaustive()
    }
}

impl Secrets {
    pub fn from_env(cfg: &Config) -> std::result::Result<Self, ConfigError> {
        Self::from_lookup(cfg, |name| std::env::var(name).ok())
    }

    /// Tracker tokens are only required for the backends that are enabled.
    pub fn from_lookup<F>(cfg: &Config, lookup: F) -> std::result::Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup(name)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ConfigError::MissingEnv(name.to_string()))
        };

        let client_id = required(&cfg.env.client_id)?;
        let client_secret = required(&cfg.env.client_secret)?;
        let realm = required(&cfg.env.realm)?;
        let jira_token = if cfg.tracker.uses("jira") {
            Some(required(&cfg.env.jira_token)?)
        } else {
            None
        };
        let github_token = if cfg.tracker.uses("github") {
            Some(required(&cfg.env.github_token)?)
        } else {
            None
        };

        Ok(Self {
            client_id,
            client_secret,
            realm,
            jira_token,
            github_token,
        })
    }
}

/// Rule file location: the CI workspace root when set, else the repository.
pub fn resolve_rules_path(cfg: &Config, repo: &Path, workspace: Option<&str>) -> PathBuf {
    let rules = Path::new(&cfg.selection.rules_file);
    if rules.is_absolute() {
        return rules.to_path_buf();
    }
    match workspace.filter(|w| !w.is_empty()) {
        Some(ws) => PathBuf::from(ws).join(rules),
        None => repo.join(rules),
    }
}

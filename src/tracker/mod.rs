pub mod dry_run;
pub mod github;
pub mod jira;

use crate::config::{Config, Secrets};
use crate::error::{ConfigError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub use dry_run::DryRunFiler;
pub use github::GitHubFiler;
pub use jira::JiraFiler;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRef {
    pub tracker: String,
    pub key: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// Destination for findings. Backends only ever see a title and a body.
#[async_trait]
pub trait IssueFiler: Send + Sync {
    fn name(&self) -> &'static str;

    async fn file_issue(&self, title: &str, body: &str) -> Result<IssueRef>;
}

/// One filer per configured backend; `dry_run` replaces them all.
pub fn build_filers(
    cfg: &Config,
    secrets: &Secrets,
    client: reqwest::Client,
    dry_run: bool,
) -> Result<Vec<Arc<dyn IssueFiler>>> {
    if dry_run {
        let filer: Arc<dyn IssueFiler> = Arc::new(DryRunFiler::default());
        return Ok(vec![filer]);
    }

    let mut filers: Vec<Arc<dyn IssueFiler>> = Vec::new();
    for backend in &cfg.tracker.backends {
        match backend.as_str() {
            "jira" => {
                let token = secrets
                    .jira_token
                    .clone()
                    .ok_or_else(|| ConfigError::MissingEnv(cfg.env.jira_token.clone()))?;
                filers.push(Arc::new(JiraFiler::new(
                    client.clone(),
                    &cfg.tracker.jira,
                    token,
                )));
            }
            "github" => {
                let token = secrets
                    .github_token
                    .clone()
                    .ok_or_else(|| ConfigError::MissingEnv(cfg.env.github_token.clone()))?;
                filers.push(Arc::new(GitHubFiler::new(
                    client.clone(),
                    &cfg.tracker.github,
                    token,
                )));
            }
            "dry_run" => filers.push(Arc::new(DryRunFiler::default())),
            other => {
                return Err(
                    ConfigError::Invalid(format!("unknown tracker backend: {other}")).into(),
                );
            }
        }
    }
    Ok(filers)
}

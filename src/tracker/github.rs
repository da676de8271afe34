use super::{IssueFiler, IssueRef};
use crate::config::GitHub;
use crate::error::{Result, ReviewError};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

pub struct GitHubFiler {
    client: reqwest::Client,
    issues_url: String,
    token: String,
}

#[derive(Deserialize)]
struct CreatedIssue {
    number: u64,
    #[serde(default)]
    html_url: Option<String>,
}

impl GitHubFiler {
    pub fn new(client: reqwest::Client, cfg: &GitHub, token: String) -> Self {
        Self {
            client,
            issues_url: format!(
                "{}/repos/{}/{}/issues",
                cfg.api_url.trim_end_matches('/'),
                cfg.owner,
                cfg.repo
            ),
            token,
        }
    }
}

#[async_trait]
impl IssueFiler for GitHubFiler {
    fn name(&self) -> &'static str {
        "github"
    }

    async fn file_issue(&self, title: &str, body: &str) -> Result<IssueRef> {
        let response = self
            .client
            .post(&self.issues_url)
            .header("Authorization", format!("token {}", self.token))
            .header("Accept", "application/vnd.github.v3+json")
            .json(&serde_json::json!({ "title": title, "body": body }))
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(ReviewError::Tracker {
                tracker: "github",
                detail: format!("HTTP {status}: {text}"),
            });
        }

        let created: CreatedIssue = serde_json::from_str(&text)?;
        info!("Github issue created successfully: #{}", created.number);
        Ok(IssueRef {
            tracker: self.name().to_string(),
            key: created.number.to_string(),
            url: created.html_url,
        })
    }
}

use super::{IssueFiler, IssueRef};
use crate::config::Jira;
use crate::error::{Result, ReviewError};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

pub struct JiraFiler {
    client: reqwest::Client,
    base_url: String,
    username: String,
    token: String,
    project_key: String,
    issue_type: String,
}

#[derive(Deserialize)]
struct CreatedIssue {
    key: String,
}

impl JiraFiler {
    pub fn new(client: reqwest::Client, cfg: &Jira, token: String) -> Self {
        Self {
            client,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            username: cfg.username.clone(),
            token,
            project_key: cfg.project_key.clone(),
            issue_type: cfg.issue_type.clone(),
        }
    }
}

#[async_trait]
impl IssueFiler for JiraFiler {
    fn name(&self) -> &'static str {
        "jira"
    }

    async fn file_issue(&self, title: &str, body: &str) -> Result<IssueRef> {
        let payload = serde_json::json!({
            "fields": {
                "project": { "key": self.project_key },
                "summary": title,
                "description": body,
                "issuetype": { "name": self.issue_type },
            }
        });

        let response = self
            .client
            .post(format!("{}/rest/api/2/issue", self.base_url))
            .basic_auth(&self.username, Some(&self.token))
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if status.as_u16() != 201 {
            return Err(ReviewError::Tracker {
                tracker: "jira",
                detail: format!("HTTP {status}: {text}"),
            });
        }

        let created: CreatedIssue = serde_json::from_str(&text)?;
        let url = format!("{}/browse/{}", self.base_url, created.key);
        info!("Jira issue created: {url}");
        Ok(IssueRef {
            tracker: self.name().to_string(),
            key: created.key,
            url: Some(url),
        })
    }
}

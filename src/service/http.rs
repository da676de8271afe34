use super::{types::*, CredentialProvider, QuickCommandApi};
use crate::config::Config;
use crate::error::{Result, ReviewError};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = concat!("qc-review/", env!("CARGO_PKG_VERSION"));

/// reqwest-backed client for the identity and quick-command endpoints.
#[derive(Clone)]
pub struct HttpQuickCommandApi {
    client: reqwest::Client,
    identity_url: String,
    api_url: String,
}

impl HttpQuickCommandApi {
    pub fn new(cfg: &Config) -> Result<Self> {
        let client = build_client(Duration::from_secs(cfg.service.request_timeout_seconds))?;
        Ok(Self::with_client(
            client,
            &cfg.service.identity_url,
            &cfg.service.api_url,
        ))
    }

    pub fn with_client(client: reqwest::Client, identity_url: &str, api_url: &str) -> Self {
        Self {
            client,
            identity_url: identity_url.trim_end_matches('/').to_string(),
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    fn token_url(&self, realm: &str) -> String {
        format!("{}/{}/oidc/oauth/token", self.identity_url, realm)
    }

    fn create_url(&self, job_slug: &str) -> String {
        format!(
            "{}/v1/quick-commands/create-execution/{}",
            self.api_url, job_slug
        )
    }

    fn callback_url(&self, job_id: &JobId) -> String {
        format!("{}/v1/quick-commands/callback/{}", self.api_url, job_id)
    }
}

pub fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(Duration::from_secs(10))
        .timeout(timeout)
        .build()?;
    Ok(client)
}

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
}

#[async_trait]
impl CredentialProvider for HttpQuickCommandApi {
    async fn acquire_credential(&self, creds: &ClientCredentials) -> Result<Credential> {
        let response = self
            .client
            .post(self.token_url(&creds.realm))
            .form(&[
                ("client_id", creds.client_id.as_str()),
                ("grant_type", "client_credentials"),
                ("client_secret", creds.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ReviewError::Auth(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ReviewError::Auth(e.to_string()))?;
        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| ReviewError::Auth(format!("HTTP {status}: {e}")))?;

        match token.access_token.filter(|t| !t.is_empty()) {
            Some(t) => Ok(Credential::new(t)),
            None => Err(ReviewError::Auth(format!(
                "HTTP {status}: response carried no access_token"
            ))),
        }
    }
}

#[async_trait]
impl QuickCommandApi for HttpQuickCommandApi {
    async fn create_execution(
        &self,
        job_slug: &str,
        credential: &Credential,
        input_payload: &str,
    ) -> Result<Submission> {
        let response = self
            .client
            .post(self.create_url(job_slug))
            .bearer_auth(credential.bearer())
            .json(&serde_json::json!({ "input_data": input_payload }))
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() != 200 {
            return Ok(Submission::Rejected {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        match JobId::from_response_body(&body) {
            Some(id) => Ok(Submission::Accepted(id)),
            None => Err(ReviewError::MalformedResponse(
                "create-execution returned an empty id".into(),
            )),
        }
    }

    async fn execution_status(
        &self,
        job_id: &JobId,
        credential: &Credential,
    ) -> Result<StatusReport> {
        let response = self
            .client
            .get(self.callback_url(job_id))
            .bearer_auth(credential.bearer())
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() != 200 {
            return Err(ReviewError::UnexpectedStatus {
                endpoint: "callback",
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        debug!(job_id = %job_id, bytes = body.len(), "callback body received");
        let value: serde_json::Value = serde_json::from_str(&body)?;
        StatusReport::from_json(value)
    }
}

use crate::error::{Result, ReviewError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Client-credentials grant inputs for the identity endpoint.
#[derive(Clone)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub realm: String,
}

/// Bearer token. Immutable after acquisition and cheap to clone across tasks.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(Arc<str>);

impl Credential {
    pub fn new(token: impl Into<Arc<str>>) -> Self {
        Self(token.into())
    }

    pub fn bearer(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Identifier the service assigns to one execution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(String);

impl JobId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The creation endpoint answers with a JSON string literal; strip the quotes.
    pub fn from_response_body(body: &str) -> Option<Self> {
        let id = body.trim().trim_matches('"');
        if id.is_empty() {
            None
        } else {
            Some(Self(id.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Accepted(JobId),
    Rejected { status: u16 },
}

/// `progress.status` as reported by the callback endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteStatus {
    Pending,
    Running,
    Completed,
    Failure,
    Other(String),
}

impl RemoteStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "PENDING" => RemoteStatus::Pending,
            "RUNNING" => RemoteStatus::Running,
            "COMPLETED" => RemoteStatus::Completed,
            "FAILURE" => RemoteStatus::Failure,
            other => RemoteStatus::Other(other.to_string()),
        }
    }
}

impl fmt::Display for RemoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteStatus::Pending => f.write_str("PENDING"),
            RemoteStatus::Running => f.write_str("RUNNING"),
            RemoteStatus::Completed => f.write_str("COMPLETED"),
            RemoteStatus::Failure => f.write_str("FAILURE"),
            RemoteStatus::Other(s) => f.write_str(s),
        }
    }
}

/// Full callback body of a completed execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultPayload(pub serde_json::Value);

impl ResultPayload {
    pub fn result_text(&self) -> Option<&str> {
        self.0.get("result").and_then(|v| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusReport {
    pub status: RemoteStatus,
    pub payload: ResultPayload,
}

impl StatusReport {
    pub fn from_json(body: serde_json::Value) -> Result<Self> {
        let status = body
            .get("progress")
            .and_then(|p| p.get("status"))
            .and_then(|s| s.as_str())
            .ok_or_else(|| ReviewError::MalformedResponse("missing progress.status".into()))?;
        Ok(Self {
            status: RemoteStatus::parse(status),
            payload: ResultPayload(body),
        })
    }
}

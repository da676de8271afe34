#![allow(dead_code)]

use async_trait::async_trait;
use qc_review::error::{Result, ReviewError};
use qc_review::service::{Credential, JobId, QuickCommandApi, StatusReport, Submission};
use qc_review::tracker::{IssueFiler, IssueRef};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// One scripted answer to a status check.
#[derive(Debug, Clone)]
pub enum Step {
    Status(&'static str),
    Completed(&'static str),
    TransportError,
}

/// In-process service: each submission gets the next script; an exhausted
/// script keeps answering RUNNING.
#[derive(Default)]
pub struct ScriptedApi {
    scripts: Mutex<VecDeque<Vec<Step>>>,
    active: Mutex<HashMap<String, VecDeque<Step>>>,
    pub submissions: Mutex<Vec<String>>,
    pub polls: Mutex<Vec<String>>,
    reject: bool,
}

impl ScriptedApi {
    pub fn new(scripts: Vec<Vec<Step>>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into()),
            ..Default::default()
        }
    }

    pub fn rejecting() -> Self {
        Self {
            reject: true,
            ..Default::default()
        }
    }

    pub fn submissions(&self) -> Vec<String> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn polls(&self) -> Vec<String> {
        self.polls.lock().unwrap().clone()
    }
}

#[async_trait]
impl QuickCommandApi for ScriptedApi {
    async fn create_execution(
        &self,
        _job_slug: &str,
        _credential: &Credential,
        input_payload: &str,
    ) -> Result<Submission> {
        if self.reject {
            return Ok(Submission::Rejected { status: 403 });
        }
        let mut subs = self.submissions.lock().unwrap();
        subs.push(input_payload.to_string());
        let id = format!("job-{}", subs.len());
        let script = self.scripts.lock().unwrap().pop_front().unwrap_or_default();
        self.active
            .lock()
            .unwrap()
            .insert(id.clone(), script.into());
        Ok(Submission::Accepted(JobId::new(id)))
    }

    async fn execution_status(
        &self,
        job_id: &JobId,
        _credential: &Credential,
    ) -> Result<StatusReport> {
        self.polls.lock().unwrap().push(job_id.to_string());
        let step = self
            .active
            .lock()
            .unwrap()
            .get_mut(job_id.as_str())
            .and_then(|s| s.pop_front())
            .unwrap_or(Step::Status("RUNNING"));
        match step {
            Step::Status(s) => StatusReport::from_json(serde_json::json!({
                "progress": { "status": s }
            })),
            Step::Completed(result) => StatusReport::from_json(serde_json::json!({
                "progress": { "status": "COMPLETED" },
                "result": result,
            })),
            Step::TransportError => Err(ReviewError::UnexpectedStatus {
                endpoint: "callback",
                status: 503,
            }),
        }
    }
}

#[derive(Default)]
pub struct RecordingFiler {
    pub issues: Mutex<Vec<(String, String)>>,
    pub fail: bool,
}

impl RecordingFiler {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn issues(&self) -> Vec<(String, String)> {
        self.issues.lock().unwrap().clone()
    }
}

#[async_trait]
impl IssueFiler for RecordingFiler {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn file_issue(&self, title: &str, body: &str) -> Result<IssueRef> {
        if self.fail {
            return Err(ReviewError::Tracker {
                tracker: "recording",
                detail: "refused".into(),
            });
        }
        let mut issues = self.issues.lock().unwrap();
        issues.push((title.to_string(), body.to_string()));
        Ok(IssueRef {
            tracker: "recording".into(),
            key: format!("REC-{}", issues.len()),
            url: None,
        })
    }
}

pub fn credential() -> Credential {
    Credential::new("test-token")
}

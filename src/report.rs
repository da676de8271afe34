use crate::lifecycle::JobStatus;
use crate::tracker::IssueRef;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileOutcome {
    Skipped,
    Failed,
    Processed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReport {
    pub source_label: String,
    pub payload_sha256: String,
    pub outcome: FileOutcome,
    #[serde(default)]
    pub job_id: Option<String>,
    pub restarts: u32,
    #[serde(default)]
    pub abandoned_jobs: Vec<AbandonedJob>,
    pub findings: usize,
    pub issues: Vec<IssueRef>,
    #[serde(default)]
    pub error: Option<String>,
}

impl FileReport {
    pub fn new(source_label: String, payload_sha256: String, outcome: FileOutcome) -> Self {
        Self {
            source_label,
            payload_sha256,
            outcome,
            job_id: None,
            restarts: 0,
            abandoned_jobs: Vec::new(),
            findings: 0,
            issues: Vec::new(),
            error: None,
        }
    }
}

/// A job that was replaced by a restart, and the status it was left in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbandonedJob {
    pub job_id: String,
    pub status: JobStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub job_slug: String,
    pub started: String,
    pub finished: String,
    pub files: Vec<FileReport>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub files: usize,
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub findings: usize,
    pub issues_filed: usize,
}

impl RunReport {
    pub fn summary(&self) -> RunSummary {
        let mut s = RunSummary {
            files: self.files.len(),
            ..Default::default()
        };
        for f in &self.files {
            match f.outcome {
                FileOutcome::Processed => s.processed += 1,
                FileOutcome::Skipped => s.skipped += 1,
                FileOutcome::Failed => s.failed += 1,
            }
            s.findings += f.findings;
            s.issues_filed += f.issues.len();
        }
        s
    }
}

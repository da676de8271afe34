use crate::{
    lifecycle::{LifecycleController, RetryPolicy},
    report::{AbandonedJob, FileOutcome, FileReport, RunReport},
    select::SourceFile,
    service::{Credential, QuickCommandApi},
    tracker::IssueFiler,
    translate::translate,
    util::{base_name, now_rfc3339, sha256_hex},
};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Runs submit, poll and translate for each file, then hands findings to the filers.
pub struct Dispatcher {
    api: Arc<dyn QuickCommandApi>,
    filers: Vec<Arc<dyn IssueFiler>>,
    policy: RetryPolicy,
    credential: Credential,
    job_slug: String,
    max_parallel: usize,
}

impl Dispatcher {
    pub fn new(
        api: Arc<dyn QuickCommandApi>,
        filers: Vec<Arc<dyn IssueFiler>>,
        policy: RetryPolicy,
        credential: Credential,
        job_slug: impl Into<String>,
    ) -> Self {
        Self {
            api,
            filers,
            policy,
            credential,
            job_slug: job_slug.into(),
            max_parallel: 0,
        }
    }

    /// 0 means every file is in flight at once.
    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel;
        self
    }

    pub async fn run(&self, files: Vec<SourceFile>) -> RunReport {
        let started = now_rfc3339();
        let limit = match self.max_parallel {
            0 => files.len().max(1),
            n => n,
        };
        info!(
            "dispatching {} files (slug={}, parallel={limit})",
            files.len(),
            self.job_slug
        );

        let reports = stream::iter(files.iter())
            .map(|f| self.process(f))
            .buffer_unordered(limit)
            .collect::<Vec<_>>()
            .await;

        RunReport {
            job_slug: self.job_slug.clone(),
            started,
            finished: now_rfc3339(),
            files: reports,
        }
    }

    pub async fn process(&self, file: &SourceFile) -> FileReport {
        let label = file.label();
        let name = base_name(&label).to_string();
        let digest = sha256_hex(file.payload.as_bytes());
        info!("Started processing file: {name}");

        if file.payload.is_empty() {
            info!("Skipping empty file: {label}");
            return FileReport::new(label, digest, FileOutcome::Skipped);
        }

        let controller = LifecycleController::new(self.api.as_ref(), &self.policy);
        let outcome = match controller
            .run(&self.job_slug, &self.credential, &file.payload, &label)
            .await
        {
            Ok(outcome) => outcome,
            Err(err) => {
                error!("Error processing file {label}: {err}");
                let mut report = FileReport::new(label, digest, FileOutcome::Failed);
                report.error = Some(err.to_string());
                return report;
            }
        };
        info!("{name} has been PROCESSED");

        let findings = translate(&outcome.payload, &label);
        let mut report = FileReport::new(label, digest, FileOutcome::Processed);
        report.job_id = Some(outcome.job_id.to_string());
        report.restarts = outcome.restarts;
        report.abandoned_jobs = outcome
            .abandoned
            .iter()
            .map(|(id, status)| AbandonedJob {
                job_id: id.to_string(),
                status: *status,
            })
            .collect();
        report.findings = findings.len();

        for finding in &findings {
            for filer in &self.filers {
                match filer.file_issue(&finding.title, &finding.body).await {
                    Ok(issue) => {
                        info!(
                            "{name}: {} filed in {} as {}",
                            finding.title,
                            issue.tracker,
                            issue.url.as_deref().unwrap_or(&issue.key)
                        );
                        report.issues.push(issue);
                    }
                    Err(err) => {
                        warn!("{name}: failed to file {:?} in {}: {err}", finding.title, filer.name());
                    }
                }
            }
        }

        report
    }
}

//! Drives one quick-command job from submission to a completed result.
//!
//! Every anomaly is resolved the same way: the current job is abandoned and a
//! brand-new one is submitted with the same input. The anomalies are
//!
//! - the remote reporting `FAILURE`,
//! - the virtual elapsed time reaching the timeout limit,
//! - `transport_retry_cap` failed status checks against the same job.
//!
//! Elapsed time only advances by the poll interval after an in-progress status,
//! so sleeps spent retrying transport errors do not count toward the timeout.
//! Neither counter is cleared by a good response; only a new job starts afresh.

use crate::config::Config;
use crate::error::{RestartCause, Result, ReviewError};
use crate::service::{Credential, JobId, QuickCommandApi, RemoteStatus, ResultPayload};
use crate::submit::Submitter;
use crate::util::base_name;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub poll_interval: Duration,
    pub timeout_limit: Duration,
    pub transport_retry_cap: u32,
    /// `None` restarts forever.
    pub max_restarts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            timeout_limit: Duration::from_secs(600),
            transport_retry_cap: 3,
            max_restarts: None,
        }
    }
}

impl RetryPolicy {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            poll_interval: Duration::from_secs(cfg.polling.interval_seconds),
            timeout_limit: Duration::from_secs(cfg.polling.timeout_limit_seconds),
            transport_retry_cap: cfg.polling.transport_retry_cap.max(1),
            max_restarts: cfg.polling.max_restarts,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    TimedOut,
}

/// One remote execution. A restart replaces it; it is never resumed.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    pub input_payload: String,
    pub source_label: String,
    pub status: JobStatus,
}

impl Job {
    pub fn new(id: JobId, input_payload: &str, source_label: &str) -> Self {
        Self {
            id,
            input_payload: input_payload.to_string(),
            source_label: source_label.to_string(),
            status: JobStatus::Pending,
        }
    }
}

#[derive(Debug, Default)]
struct RetryBudget {
    elapsed: Duration,
    transport_retries: u32,
}

enum AttemptOutcome {
    Status(RemoteStatus),
    TransportError(String),
}

struct PollAttempt {
    elapsed: Duration,
    outcome: AttemptOutcome,
}

impl PollAttempt {
    fn trace(&self, job_id: &JobId) {
        let elapsed_secs = self.elapsed.as_secs();
        match &self.outcome {
            AttemptOutcome::Status(status) => {
                debug!(job_id = %job_id, elapsed_secs, status = %status, "poll attempt")
            }
            AttemptOutcome::TransportError(error) => {
                debug!(job_id = %job_id, elapsed_secs, error = %error, "poll attempt failed")
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Outcome {
    pub job_id: JobId,
    pub payload: ResultPayload,
    pub restarts: u32,
    /// Jobs given up on before the completed one, with the status they ended in.
    pub abandoned: Vec<(JobId, JobStatus)>,
}

pub struct LifecycleController<'a, A: ?Sized> {
    api: &'a A,
    policy: &'a RetryPolicy,
}

impl<'a, A: QuickCommandApi + ?Sized> LifecycleController<'a, A> {
    pub fn new(api: &'a A, policy: &'a RetryPolicy) -> Self {
        Self { api, policy }
    }

    /// Returns only once a job completes, unless submission is rejected or the
    /// configured restart cap runs out. With no cap and a permanently broken
    /// service this never returns.
    pub async fn run(
        &self,
        job_slug: &str,
        credential: &Credential,
        input_payload: &str,
        source_label: &str,
    ) -> Result<Outcome> {
        let submitter = Submitter::new(self.api);
        let name = base_name(source_label);
        let mut abandoned: Vec<(JobId, JobStatus)> = Vec::new();
        let mut payload = input_payload.to_string();

        loop {
            let restarts = abandoned.len() as u32;
            let Some(mut job) = submitter
                .submit(job_slug, credential, &payload, source_label)
                .await?
            else {
                return Err(ReviewError::SubmissionRejected {
                    source_label: source_label.to_string(),
                });
            };

            let cause = match self.poll(&mut job, credential).await {
                Ok(result) => {
                    return Ok(Outcome {
                        job_id: job.id,
                        payload: result,
                        restarts,
                        abandoned,
                    });
                }
                Err(cause) => cause,
            };

            if let Some(max) = self.policy.max_restarts {
                if restarts >= max {
                    return Err(ReviewError::RestartLimit {
                        source_label: source_label.to_string(),
                        restarts,
                        cause,
                    });
                }
            }
            warn!(
                "{name}: job {} abandoned as {:?} ({cause}); RESTARTING execution (restart #{})",
                job.id,
                job.status,
                restarts + 1
            );
            payload = std::mem::take(&mut job.input_payload);
            abandoned.push((job.id, job.status));
        }
    }

    async fn poll(
        &self,
        job: &mut Job,
        credential: &Credential,
    ) -> std::result::Result<ResultPayload, RestartCause> {
        let name = base_name(&job.source_label).to_string();
        let cap = self.policy.transport_retry_cap;
        let interval = self.policy.poll_interval;
        let mut budget = RetryBudget::default();

        loop {
            match self.api.execution_status(&job.id, credential).await {
                Ok(report) => {
                    match &report.status {
                        RemoteStatus::Completed => {
                            job.status = JobStatus::Completed;
                            info!("{name}: Execution complete!");
                            return Ok(report.payload);
                        }
                        RemoteStatus::Failure => {
                            job.status = JobStatus::Failed;
                            warn!("{name}: execution {} reported FAILURE", job.id);
                            return Err(RestartCause::RemoteFailure);
                        }
                        other => {
                            job.status = match other {
                                RemoteStatus::Pending => JobStatus::Pending,
                                _ => JobStatus::Running,
                            };
                            info!(
                                "{name}: Status: {other} ({} seconds elapsed), waiting...",
                                budget.elapsed.as_secs()
                            );
                            PollAttempt {
                                elapsed: budget.elapsed,
                                outcome: AttemptOutcome::Status(other.clone()),
                            }
                            .trace(&job.id);
                            tokio::time::sleep(interval).await;
                            budget.elapsed += interval;
                        }
                    }
                }
                Err(err) => {
                    budget.transport_retries += 1;
                    warn!("{name}: Error: {err}");
                    if budget.transport_retries >= cap {
                        job.status = JobStatus::Failed;
                        warn!("{name}: Maximum retries reached");
                        return Err(RestartCause::TransportRetriesExhausted {
                            attempts: budget.transport_retries,
                            last_error: err.to_string(),
                        });
                    }
                    info!(
                        "{name}: Retrying... Attempt {} of {cap}",
                        budget.transport_retries
                    );
                    PollAttempt {
                        elapsed: budget.elapsed,
                        outcome: AttemptOutcome::TransportError(err.to_string()),
                    }
                    .trace(&job.id);
                    tokio::time::sleep(interval).await;
                }
            }

            if budget.elapsed >= self.policy.timeout_limit {
                job.status = JobStatus::TimedOut;
                warn!(
                    "{name}: Execution took too long ({} seconds)",
                    budget.elapsed.as_secs()
                );
                return Err(RestartCause::TimeoutExceeded {
                    elapsed: budget.elapsed,
                });
            }
        }
    }
}

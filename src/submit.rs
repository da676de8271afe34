use crate::error::Result;
use crate::lifecycle::Job;
use crate::service::{Credential, QuickCommandApi, Submission};
use crate::util::base_name;
use tracing::{info, warn};

/// Starts one remote execution. Never retries; restarts belong to the poller.
pub struct Submitter<'a, A: ?Sized> {
    api: &'a A,
}

impl<'a, A: QuickCommandApi + ?Sized> Submitter<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self { api }
    }

    /// `Ok(None)` when the service answered with a non-200 status.
    pub async fn submit(
        &self,
        job_slug: &str,
        credential: &Credential,
        input_payload: &str,
        source_label: &str,
    ) -> Result<Option<Job>> {
        match self
            .api
            .create_execution(job_slug, credential, input_payload)
            .await?
        {
            Submission::Accepted(id) => {
                info!("{} ExecutionID: {}", base_name(source_label), id);
                Ok(Some(Job::new(id, input_payload, source_label)))
            }
            Submission::Rejected { status } => {
                warn!("{source_label}: create-execution responded with HTTP {status}");
                Ok(None)
            }
        }
    }
}

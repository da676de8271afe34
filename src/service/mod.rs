pub mod http;
pub mod types;

use crate::error::Result;
use async_trait::async_trait;

pub use http::HttpQuickCommandApi;
pub use types::{
    ClientCredentials, Credential, JobId, RemoteStatus, ResultPayload, StatusReport, Submission,
};

/// Obtains the bearer credential used for every quick-command call.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn acquire_credential(&self, creds: &ClientCredentials) -> Result<Credential>;
}

/// Remote side of the job lifecycle: create an execution, then check on it.
#[async_trait]
pub trait QuickCommandApi: Send + Sync {
    async fn create_execution(
        &self,
        job_slug: &str,
        credential: &Credential,
        input_payload: &str,
    ) -> Result<Submission>;

    /// Any `Err` is a transport-level failure from the poller's point of view.
    async fn execution_status(&self, job_id: &JobId, credential: &Credential)
        -> Result<StatusReport>;
}

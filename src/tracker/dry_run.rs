use super::{IssueFiler, IssueRef};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::info;

/// Logs findings instead of filing them.
#[derive(Debug, Default)]
pub struct DryRunFiler {
    filed: AtomicUsize,
}

impl DryRunFiler {
    pub fn filed(&self) -> usize {
        self.filed.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl IssueFiler for DryRunFiler {
    fn name(&self) -> &'static str {
        "dry_run"
    }

    async fn file_issue(&self, title: &str, body: &str) -> Result<IssueRef> {
        let n = self.filed.fetch_add(1, Ordering::Relaxed) + 1;
        info!("[dry-run] {title}: {body}");
        Ok(IssueRef {
            tracker: self.name().to_string(),
            key: format!("DRY-{n}"),
            url: None,
        })
    }
}

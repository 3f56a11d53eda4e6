//! Forge operations governance depends on.

use anyhow::Result;
use async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Enumerates supported `CommitState` values.
pub enum CommitState {
    Pending,
    Success,
    Failure,
}

impl CommitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitStatus {
    pub context: String,
    pub state: CommitState,
    pub description: Option<String>,
    pub target_url: Option<String>,
}

/// Side effects on the issue or pull request under governance.
///
/// Implementations are bound to one subject; every call acts on it. Empty
/// label or login lists must be accepted as no-ops, and removing a label
/// that is not present must not fail.
#[async_trait]
pub trait GovernanceHost: Send + Sync {
    async fn current_labels(&self) -> Result<Vec<String>>;
    async fn add_labels(&self, labels: &[String]) -> Result<()>;
    async fn remove_labels(&self, labels: &[String]) -> Result<()>;
    async fn post_comment(&self, body: &str) -> Result<()>;
    async fn set_commit_status(&self, sha: &str, status: &CommitStatus) -> Result<()>;
    async fn assign_users(&self, logins: &[String]) -> Result<()>;
    async fn request_reviewers(&self, logins: &[String]) -> Result<()>;
    async fn close_issue(&self) -> Result<()>;
    async fn release_exists(&self, tag: &str) -> Result<bool>;
}

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures_util::future::try_join_all;
use tau_governance::event_context::EventContext;
use tau_governance::host::{CommitStatus, GovernanceHost};

use crate::client::GithubApiClient;
use crate::comment::render_comment;

/// `GovernanceHost` backed by the GitHub REST API for one issue or pull request.
///
/// Reads (labels, releases, commit statuses) go through `reader`; every
/// write visible as the bot goes through `writer`.
pub struct GithubGovernanceHost {
    reader: GithubApiClient,
    writer: GithubApiClient,
    context: EventContext,
    config_path: String,
}

impl GithubGovernanceHost {
    pub fn new(
        reader: GithubApiClient,
        writer: GithubApiClient,
        context: EventContext,
        config_path: impl Into<String>,
    ) -> Self {
        Self {
            reader,
            writer,
            context,
            config_path: config_path.into(),
        }
    }

    fn number(&self) -> u64 {
        self.context.issue_number
    }
}

#[async_trait]
impl GovernanceHost for GithubGovernanceHost {
    async fn current_labels(&self) -> Result<Vec<String>> {
        self.reader.list_issue_labels(self.number()).await
    }

    async fn add_labels(&self, labels: &[String]) -> Result<()> {
        if labels.is_empty() {
            return Ok(());
        }
        tracing::info!(issue = self.number(), ?labels, "adding labels");
        self.writer.add_issue_labels(self.number(), labels).await
    }

    async fn remove_labels(&self, labels: &[String]) -> Result<()> {
        if labels.is_empty() {
            return Ok(());
        }
        tracing::info!(issue = self.number(), ?labels, "removing labels");
        try_join_all(
            labels
                .iter()
                .map(|label| self.writer.remove_issue_label(self.number(), label)),
        )
        .await?;
        Ok(())
    }

    async fn post_comment(&self, body: &str) -> Result<()> {
        let rendered = render_comment(body, &self.context, &self.config_path);
        let created = self
            .writer
            .create_issue_comment(self.number(), &rendered)
            .await?;
        tracing::info!(issue = self.number(), comment_id = created.id, "posted comment");
        Ok(())
    }

    async fn set_commit_status(&self, sha: &str, status: &CommitStatus) -> Result<()> {
        tracing::info!(
            sha,
            context = %status.context,
            state = status.state.as_str(),
            "setting commit status"
        );
        self.reader
            .create_commit_status(sha, status)
            .await
            .with_context(|| format!("failed to set commit status '{}'", status.context))
    }

    async fn assign_users(&self, logins: &[String]) -> Result<()> {
        if logins.is_empty() {
            return Ok(());
        }
        self.writer.add_assignees(self.number(), logins).await
    }

    async fn request_reviewers(&self, logins: &[String]) -> Result<()> {
        if logins.is_empty() {
            return Ok(());
        }
        self.writer.request_reviewers(self.number(), logins).await
    }

    async fn close_issue(&self) -> Result<()> {
        tracing::info!(issue = self.number(), "closing");
        self.writer.close_issue(self.number()).await
    }

    async fn release_exists(&self, tag: &str) -> Result<bool> {
        Ok(self.reader.release_exists(tag).await)
    }
}

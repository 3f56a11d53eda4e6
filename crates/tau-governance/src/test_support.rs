use std::collections::HashSet;
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::host::{CommitStatus, GovernanceHost};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum HostCall {
    AddLabels(Vec<String>),
    RemoveLabels(Vec<String>),
    PostComment(String),
    SetCommitStatus { sha: String, status: CommitStatus },
    AssignUsers(Vec<String>),
    RequestReviewers(Vec<String>),
    CloseIssue,
}

#[derive(Default)]
struct RecordingState {
    labels: Vec<String>,
    calls: Vec<HostCall>,
    release_lookups: Vec<String>,
}

/// In-memory host that applies label changes and records every call.
#[derive(Default)]
pub(crate) struct RecordingHost {
    state: Mutex<RecordingState>,
    releases: HashSet<String>,
    fail_writes: bool,
}

impl RecordingHost {
    pub(crate) fn with_labels(labels: &[&str]) -> Self {
        let host = Self::default();
        host.state.lock().expect("lock").labels = strings(labels);
        host
    }

    pub(crate) fn with_releases(mut self, tags: &[&str]) -> Self {
        self.releases = tags.iter().map(|tag| tag.to_string()).collect();
        self
    }

    pub(crate) fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    pub(crate) fn calls(&self) -> Vec<HostCall> {
        self.state.lock().expect("lock").calls.clone()
    }

    pub(crate) fn labels(&self) -> Vec<String> {
        self.state.lock().expect("lock").labels.clone()
    }

    pub(crate) fn release_lookups(&self) -> Vec<String> {
        self.state.lock().expect("lock").release_lookups.clone()
    }

    pub(crate) fn clear_calls(&self) {
        self.state.lock().expect("lock").calls.clear();
    }

    fn record(&self, call: HostCall) -> Result<()> {
        if self.fail_writes {
            bail!("injected host failure");
        }
        self.state.lock().expect("lock").calls.push(call);
        Ok(())
    }
}

pub(crate) fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

#[async_trait]
impl GovernanceHost for RecordingHost {
    async fn current_labels(&self) -> Result<Vec<String>> {
        Ok(self.labels())
    }

    async fn add_labels(&self, labels: &[String]) -> Result<()> {
        self.record(HostCall::AddLabels(labels.to_vec()))?;
        let mut state = self.state.lock().expect("lock");
        for label in labels {
            if !state.labels.contains(label) {
                state.labels.push(label.clone());
            }
        }
        Ok(())
    }

    async fn remove_labels(&self, labels: &[String]) -> Result<()> {
        self.record(HostCall::RemoveLabels(labels.to_vec()))?;
        self.state
            .lock()
            .expect("lock")
            .labels
            .retain(|label| !labels.contains(label));
        Ok(())
    }

    async fn post_comment(&self, body: &str) -> Result<()> {
        self.record(HostCall::PostComment(body.to_string()))
    }

    async fn set_commit_status(&self, sha: &str, status: &CommitStatus) -> Result<()> {
        self.record(HostCall::SetCommitStatus {
            sha: sha.to_string(),
            status: status.clone(),
        })
    }

    async fn assign_users(&self, logins: &[String]) -> Result<()> {
        self.record(HostCall::AssignUsers(logins.to_vec()))
    }

    async fn request_reviewers(&self, logins: &[String]) -> Result<()> {
        self.record(HostCall::RequestReviewers(logins.to_vec()))
    }

    async fn close_issue(&self) -> Result<()> {
        self.record(HostCall::CloseIssue)
    }

    async fn release_exists(&self, tag: &str) -> Result<bool> {
        self.state
            .lock()
            .expect("lock")
            .release_lookups
            .push(tag.to_string());
        Ok(self.releases.contains(tag))
    }
}

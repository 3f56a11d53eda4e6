use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
/// Public struct `GithubUser` used across Tau governance components.
pub struct GithubUser {
    pub login: String,
    #[serde(default)]
    pub id: u64,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
/// Public struct `GithubLabel` used across Tau governance components.
pub struct GithubLabel {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GithubCommitRef {
    pub sha: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
/// Issue or pull request as it appears in a webhook payload.
pub struct GithubIssuePayload {
    pub number: u64,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub author_association: Option<String>,
    #[serde(default)]
    pub user: Option<GithubUser>,
    #[serde(default)]
    pub labels: Vec<GithubLabel>,
    /// Present on issues that are pull requests, and on pull requests as
    /// the head commit reference.
    #[serde(default)]
    pub pull_request: Option<Value>,
    #[serde(default)]
    pub head: Option<GithubCommitRef>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GithubCommentPayload {
    pub id: u64,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub author_association: Option<String>,
    #[serde(default)]
    pub user: Option<GithubUser>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GithubRepositoryPayload {
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub default_branch: Option<String>,
    #[serde(default)]
    pub owner: Option<GithubUser>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
/// The subset of a GitHub webhook payload that governance reads.
pub struct WebhookPayload {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub sender: Option<GithubUser>,
    #[serde(default)]
    pub issue: Option<GithubIssuePayload>,
    #[serde(default)]
    pub pull_request: Option<GithubIssuePayload>,
    #[serde(default)]
    pub comment: Option<GithubCommentPayload>,
    #[serde(default)]
    pub repository: Option<GithubRepositoryPayload>,
}

impl WebhookPayload {
    pub fn from_json_str(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    /// The pull request when present, otherwise the issue.
    pub fn subject(&self) -> Option<&GithubIssuePayload> {
        self.pull_request.as_ref().or(self.issue.as_ref())
    }
}

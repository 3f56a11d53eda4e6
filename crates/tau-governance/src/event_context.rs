//! Immutable description of the webhook event a governance run reacts to.

use anyhow::{anyhow, Result};

use crate::webhook_payload::{GithubUser, WebhookPayload};

const CREATED_OR_OPENED: &[(&str, &str)] = &[
    ("issue_comment", "created"),
    ("pull_request", "opened"),
    ("pull_request_target", "opened"),
    ("issues", "opened"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Which governance section of the policy applies to the event.
pub enum GovernanceTarget {
    #[default]
    Issue,
    PullRequest,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventSender {
    pub login: String,
    pub id: u64,
    pub kind: Option<String>,
}

impl EventSender {
    pub fn is_user(&self) -> bool {
        self.kind.as_deref() == Some("User")
    }
}

impl From<&GithubUser> for EventSender {
    fn from(user: &GithubUser) -> Self {
        Self {
            login: user.login.clone(),
            id: user.id,
            kind: user.kind.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Repository facts used when rendering bot comments.
pub struct RepositoryContext {
    pub html_url: Option<String>,
    pub default_branch: Option<String>,
    pub owner_login: Option<String>,
    pub owner_html_url: Option<String>,
    pub owner_is_organization: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Everything a governance run needs to know about the triggering event.
///
/// Built once per invocation and passed explicitly to every component.
pub struct EventContext {
    pub event_name: String,
    pub action: String,
    pub target: GovernanceTarget,
    pub sender: Option<EventSender>,
    pub author_association: Option<String>,
    pub issue_number: u64,
    pub issue_author: Option<String>,
    pub body: Option<String>,
    pub labels: Vec<String>,
    pub state: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub is_pull_request: bool,
    pub head_sha: Option<String>,
    pub repository: Option<RepositoryContext>,
}

impl EventContext {
    pub fn from_webhook_payload(event_name: &str, payload: &WebhookPayload) -> Result<Self> {
        let (target, subject) = match (&payload.issue, &payload.pull_request) {
            (Some(issue), _) => (GovernanceTarget::Issue, issue),
            (None, Some(pull_request)) => (GovernanceTarget::PullRequest, pull_request),
            (None, None) => {
                return Err(anyhow!(
                    "event '{event_name}' carries neither an issue nor a pull_request"
                ))
            }
        };

        let comment = payload.comment.as_ref();
        let body = comment
            .and_then(|comment| comment.body.clone())
            .or_else(|| {
                payload
                    .pull_request
                    .as_ref()
                    .and_then(|pull_request| pull_request.body.clone())
            })
            .or_else(|| payload.issue.as_ref().and_then(|issue| issue.body.clone()));
        let author_association = comment
            .and_then(|comment| comment.author_association.clone())
            .or_else(|| {
                payload
                    .pull_request
                    .as_ref()
                    .and_then(|pull_request| pull_request.author_association.clone())
            })
            .or_else(|| {
                payload
                    .issue
                    .as_ref()
                    .and_then(|issue| issue.author_association.clone())
            });
        let labels_source = payload.subject().unwrap_or(subject);

        let repository = payload.repository.as_ref().map(|repository| {
            let owner = repository.owner.as_ref();
            RepositoryContext {
                html_url: repository.html_url.clone(),
                default_branch: repository.default_branch.clone(),
                owner_login: owner.map(|owner| owner.login.clone()),
                owner_html_url: owner.and_then(|owner| owner.html_url.clone()),
                owner_is_organization: owner
                    .and_then(|owner| owner.kind.as_deref())
                    .is_some_and(|kind| kind == "Organization"),
            }
        });

        Ok(Self {
            event_name: event_name.to_string(),
            action: payload.action.clone().unwrap_or_default(),
            target,
            sender: payload.sender.as_ref().map(EventSender::from),
            author_association,
            issue_number: subject.number,
            issue_author: subject.user.as_ref().map(|user| user.login.clone()),
            body,
            labels: labels_source
                .labels
                .iter()
                .map(|label| label.name.clone())
                .collect(),
            state: subject.state.clone(),
            created_at: subject.created_at.clone(),
            updated_at: subject.updated_at.clone(),
            is_pull_request: payload.pull_request.is_some()
                || payload
                    .issue
                    .as_ref()
                    .is_some_and(|issue| issue.pull_request.is_some()),
            head_sha: payload
                .pull_request
                .as_ref()
                .and_then(|pull_request| pull_request.head.as_ref())
                .map(|head| head.sha.clone()),
            repository,
        })
    }

    pub fn with_head_sha(mut self, sha: impl Into<String>) -> Self {
        self.head_sha = Some(sha.into());
        self
    }

    /// True when the event name is `event_name` and the action is one of `actions`.
    pub fn is(&self, event_name: &str, actions: &[&str]) -> bool {
        self.event_name == event_name && actions.contains(&self.action.as_str())
    }

    /// Comment created, or issue / pull request opened.
    pub fn is_created_or_opened(&self) -> bool {
        CREATED_OR_OPENED
            .iter()
            .any(|&(event_name, action)| self.is(event_name, &[action]))
    }

    pub fn is_opened(&self) -> bool {
        self.action == "opened"
    }

    /// A pull request whose head commit is known, so statuses can be set on it.
    pub fn status_target_sha(&self) -> Option<&str> {
        if !self.is_pull_request {
            return None;
        }
        self.head_sha.as_deref().filter(|sha| !sha.trim().is_empty())
    }
}

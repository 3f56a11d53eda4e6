use std::collections::BTreeSet;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use tau_governance::event_filter::ignore_reason;
use tau_governance::webhook_payload::WebhookPayload;
use tau_governance::{
    parse_governance_config, run_governance, CommitState, CommitStatus, EventContext,
    GovernanceConfig, GovernanceHost,
};
use tokio::sync::Mutex as AsyncMutex;

const POLICY: &str = r#"
version: v1
issue:
  captures:
    - regex: '- Version: *(.+) *'
      label: 'version/$CAPTURED'
      github_release: true
  chat_ops:
    - cmd: /close
      type: close
      author_association:
        member: true
    - cmd: /assign
      type: assign
  labels:
    - prefix: triage
      list: [accepted, rejected]
      multiple: false
      needs:
        comment: 'Hi @$AUTHOR, a maintainer will triage this soon.'
    - prefix: kind
      list: [bug, feature]
pull_request:
  chat_ops:
    - cmd: /review
      type: review
  labels:
    - prefix: kind
      list: [fix, feat]
      needs:
        status:
          context: Kind
          description:
            success: Kind label present
            failure: Missing kind label
"#;

#[derive(Default)]
struct ForgeState {
    labels: Vec<String>,
    comments: Vec<String>,
    statuses: Vec<(String, CommitStatus)>,
    assignees: Vec<String>,
    reviewers: Vec<String>,
    closed: bool,
    write_count: usize,
}

/// In-memory forge that applies every write to a single issue or pull request.
struct InMemoryForge {
    state: AsyncMutex<ForgeState>,
    releases: BTreeSet<String>,
}

impl InMemoryForge {
    fn new(releases: &[&str]) -> Self {
        Self {
            state: AsyncMutex::new(ForgeState::default()),
            releases: releases.iter().map(|tag| tag.to_string()).collect(),
        }
    }

    async fn labels(&self) -> Vec<String> {
        let mut labels = self.state.lock().await.labels.clone();
        labels.sort();
        labels
    }

    async fn write_count(&self) -> usize {
        self.state.lock().await.write_count
    }
}

#[async_trait]
impl GovernanceHost for InMemoryForge {
    async fn current_labels(&self) -> Result<Vec<String>> {
        Ok(self.state.lock().await.labels.clone())
    }

    async fn add_labels(&self, labels: &[String]) -> Result<()> {
        let mut state = self.state.lock().await;
        state.write_count += 1;
        for label in labels {
            if !state.labels.contains(label) {
                state.labels.push(label.clone());
            }
        }
        Ok(())
    }

    async fn remove_labels(&self, labels: &[String]) -> Result<()> {
        let mut state = self.state.lock().await;
        state.write_count += 1;
        state.labels.retain(|label| !labels.contains(label));
        Ok(())
    }

    async fn post_comment(&self, body: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        state.write_count += 1;
        state.comments.push(body.to_string());
        Ok(())
    }

    async fn set_commit_status(&self, sha: &str, status: &CommitStatus) -> Result<()> {
        let mut state = self.state.lock().await;
        state.write_count += 1;
        state.statuses.push((sha.to_string(), status.clone()));
        Ok(())
    }

    async fn assign_users(&self, logins: &[String]) -> Result<()> {
        let mut state = self.state.lock().await;
        state.write_count += 1;
        state.assignees.extend_from_slice(logins);
        Ok(())
    }

    async fn request_reviewers(&self, logins: &[String]) -> Result<()> {
        let mut state = self.state.lock().await;
        state.write_count += 1;
        state.reviewers.extend_from_slice(logins);
        Ok(())
    }

    async fn close_issue(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        state.write_count += 1;
        state.closed = true;
        Ok(())
    }

    async fn release_exists(&self, tag: &str) -> Result<bool> {
        Ok(self.releases.contains(tag))
    }
}

fn policy() -> GovernanceConfig {
    parse_governance_config(POLICY).expect("policy should decode")
}

fn sender(login: &str, id: u64) -> Value {
    json!({ "login": login, "id": id, "type": "User" })
}

fn issue(body: &str) -> Value {
    json!({
        "number": 17,
        "body": body,
        "state": "open",
        "created_at": "2026-03-01T10:00:00Z",
        "updated_at": "2026-03-01T10:00:00Z",
        "author_association": "NONE",
        "user": sender("reporter", 10),
        "labels": []
    })
}

fn context(event_name: &str, payload: Value) -> EventContext {
    let payload: WebhookPayload = serde_json::from_value(payload).expect("payload");
    EventContext::from_webhook_payload(event_name, &payload).expect("context")
}

async fn deliver(config: &GovernanceConfig, forge: &InMemoryForge, context: &EventContext) {
    assert_eq!(ignore_reason(context, Some(999)), None, "event should be processed");
    let governance = config
        .governance_for(context.target)
        .expect("governance section");
    run_governance(governance, context, forge)
        .await
        .expect("governance run");
}

#[tokio::test]
async fn integration_issue_lifecycle_converges_to_triaged_state() {
    let config = policy();
    let forge = InMemoryForge::new(&["v2.1.0"]);

    let opened = context(
        "issues",
        json!({
            "action": "opened",
            "sender": sender("reporter", 10),
            "issue": issue("Crash on start\n- Version: 2.1.0\n- Version: 9.9.9"),
        }),
    );
    deliver(&config, &forge, &opened).await;
    assert_eq!(forge.labels().await, vec!["needs/triage", "version/2.1.0"]);
    {
        let state = forge.state.lock().await;
        assert_eq!(
            state.comments,
            vec!["Hi @$AUTHOR, a maintainer will triage this soon.".to_string()]
        );
    }

    let triaged = context(
        "issue_comment",
        json!({
            "action": "created",
            "sender": sender("maintainer", 20),
            "comment": {
                "id": 1,
                "body": "<!-- bot: ignore\n/triage rejected\n-->\n/triage accepted rejected\n/kind bug\n/close\n/assign @maintainer",
                "author_association": "MEMBER"
            },
            "issue": issue("Crash on start"),
        }),
    );
    deliver(&config, &forge, &triaged).await;
    assert_eq!(
        forge.labels().await,
        vec!["kind/bug", "triage/rejected", "version/2.1.0"]
    );
    {
        let state = forge.state.lock().await;
        assert!(state.closed);
        assert_eq!(state.assignees, vec!["maintainer".to_string()]);
        assert_eq!(state.comments.len(), 1);
    }

    let writes_before = forge.write_count().await;
    let relabeled = context(
        "issues",
        json!({
            "action": "labeled",
            "sender": sender("maintainer", 20),
            "issue": {
                "number": 17,
                "state": "open",
                "created_at": "2026-03-01T10:00:00Z",
                "updated_at": "2026-03-02T09:00:00Z",
                "labels": []
            },
        }),
    );
    deliver(&config, &forge, &relabeled).await;
    assert_eq!(forge.write_count().await, writes_before, "steady state makes no writes");
}

#[tokio::test]
async fn integration_contributor_cannot_close_but_can_assign() {
    let config = policy();
    let forge = InMemoryForge::new(&[]);
    let comment = context(
        "issue_comment",
        json!({
            "action": "created",
            "sender": sender("drive-by", 30),
            "comment": {
                "id": 2,
                "body": "/close\n/assign to @drive-by please",
                "author_association": "CONTRIBUTOR"
            },
            "issue": issue("Feature idea"),
        }),
    );
    deliver(&config, &forge, &comment).await;

    let state = forge.state.lock().await;
    assert!(!state.closed);
    assert_eq!(state.assignees, vec!["drive-by".to_string()]);
    assert_eq!(state.labels, vec!["needs/triage".to_string()]);
    assert!(state.comments.is_empty(), "needs comment is only posted on open");
}

#[tokio::test]
async fn integration_pull_request_status_tracks_kind_label() {
    let config = policy();
    let forge = InMemoryForge::new(&[]);
    let pull_request = |action: &str, body: &str, sha: &str| {
        context(
            "pull_request",
            json!({
                "action": action,
                "sender": sender("author", 40),
                "pull_request": {
                    "number": 21,
                    "body": body,
                    "state": "open",
                    "author_association": "CONTRIBUTOR",
                    "user": sender("author", 40),
                    "labels": [],
                    "head": { "sha": sha }
                },
            }),
        )
    };

    deliver(
        &config,
        &forge,
        &pull_request("opened", "Adds retries\n/review @lead", "sha-1"),
    )
    .await;
    deliver(
        &config,
        &forge,
        &pull_request("synchronize", "/kind fix", "sha-2"),
    )
    .await;

    forge
        .add_labels(&["kind/fix".to_string()])
        .await
        .expect("maintainer adds label");
    deliver(&config, &forge, &pull_request("labeled", "", "sha-2")).await;

    let state = forge.state.lock().await;
    assert_eq!(state.reviewers, vec!["lead".to_string()]);
    let statuses: Vec<_> = state
        .statuses
        .iter()
        .map(|(sha, status)| (sha.as_str(), status.state, status.description.as_deref()))
        .collect();
    assert_eq!(
        statuses,
        vec![
            ("sha-1", CommitState::Failure, Some("Missing kind label")),
            ("sha-2", CommitState::Failure, Some("Missing kind label")),
            ("sha-2", CommitState::Success, Some("Kind label present")),
        ]
    );
    assert_eq!(state.labels, vec!["kind/fix".to_string()]);
}

//! Dispatch of configured slash commands to their single action.

use anyhow::Result;

use crate::command::CommandSet;
use crate::host::GovernanceHost;
use crate::policy::{ChatOpsAction, ChatOpsRule};

/// Keeps `@login` tokens, stripped of the `@`, in order; everything else is dropped.
pub fn mentioned_logins<I, S>(tokens: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tokens
        .into_iter()
        .filter_map(|token| {
            token
                .as_ref()
                .trim()
                .strip_prefix('@')
                .filter(|login| !login.is_empty())
                .map(str::to_string)
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// What a chat-ops rule did, for logging and tests.
pub enum ChatOpsOutcome {
    NotMatched,
    Skipped,
    Closed,
    Assigned(Vec<String>),
    ReviewRequested(Vec<String>),
    Commented,
    Labeled { added: Vec<String>, removed: Vec<String> },
}

/// Runs `rule` when at least one command starts with its `cmd`.
pub async fn dispatch_chat_ops(
    rule: &ChatOpsRule,
    commands: &CommandSet,
    host: &dyn GovernanceHost,
) -> Result<ChatOpsOutcome> {
    let matched = commands.prefix(&rule.cmd);
    if matched.is_empty() {
        return Ok(ChatOpsOutcome::NotMatched);
    }

    let outcome = match &rule.action {
        ChatOpsAction::None => ChatOpsOutcome::Skipped,
        ChatOpsAction::Close => {
            host.close_issue().await?;
            ChatOpsOutcome::Closed
        }
        ChatOpsAction::Assign => {
            let logins = mentioned_logins(matched.iter().flat_map(|entry| &entry.args));
            if logins.is_empty() {
                ChatOpsOutcome::Skipped
            } else {
                host.assign_users(&logins).await?;
                ChatOpsOutcome::Assigned(logins)
            }
        }
        ChatOpsAction::Review => {
            let logins = mentioned_logins(matched.iter().flat_map(|entry| &entry.args));
            if logins.is_empty() {
                ChatOpsOutcome::Skipped
            } else {
                host.request_reviewers(&logins).await?;
                ChatOpsOutcome::ReviewRequested(logins)
            }
        }
        ChatOpsAction::Comment { comment } => {
            host.post_comment(comment).await?;
            ChatOpsOutcome::Commented
        }
        ChatOpsAction::Label { label } => {
            let added = label.add.to_vec();
            if !added.is_empty() {
                host.add_labels(&added).await?;
            }
            let removed = label.remove.to_vec();
            if !removed.is_empty() {
                host.remove_labels(&removed).await?;
            }
            ChatOpsOutcome::Labeled { added, removed }
        }
    };
    tracing::debug!(cmd = %rule.cmd, kind = rule.action.kind(), ?outcome, "chat ops dispatched");
    Ok(outcome)
}

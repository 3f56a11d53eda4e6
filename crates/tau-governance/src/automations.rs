use anyhow::Result;

use crate::chat_ops::mentioned_logins;
use crate::host::GovernanceHost;
use crate::policy::Automations;

/// Picks one `@login` from `candidates`, rotating by issue number.
pub fn pick_assignee(candidates: &[String], issue_number: u64) -> Option<String> {
    let logins = mentioned_logins(candidates);
    if logins.is_empty() {
        return None;
    }
    let index = (issue_number % logins.len() as u64) as usize;
    logins.into_iter().nth(index)
}

/// Assigns the rotated candidate from `auto_assign_any_from`, if any.
pub async fn apply_automations(
    automations: &Automations,
    issue_number: u64,
    host: &dyn GovernanceHost,
) -> Result<Option<String>> {
    let Some(assignee) = pick_assignee(&automations.auto_assign_any_from, issue_number) else {
        return Ok(None);
    };
    tracing::debug!(assignee = %assignee, issue_number, "auto-assigning");
    host.assign_users(std::slice::from_ref(&assignee)).await?;
    Ok(Some(assignee))
}

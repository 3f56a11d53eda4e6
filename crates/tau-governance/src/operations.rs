//! Sequencing of policy sections for one event.

use anyhow::{Context, Result};

use crate::author_association::is_author_association_allowed;
use crate::automations::apply_automations;
use crate::capture::apply_capture;
use crate::chat_ops::{dispatch_chat_ops, ChatOpsOutcome};
use crate::command::CommandSet;
use crate::event_context::EventContext;
use crate::host::GovernanceHost;
use crate::label_reconcile::{apply_label_policy, LabelReconciliation};
use crate::policy::Governance;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Public struct `GovernanceReport` summarizing what one run did.
pub struct GovernanceReport {
    pub captured_labels: Vec<String>,
    pub chat_ops: Vec<(String, ChatOpsOutcome)>,
    pub labels: Vec<(String, LabelReconciliation)>,
    pub auto_assigned: Option<String>,
    pub skipped_by_association: usize,
}

/// Runs captures, chat-ops, labels, and automations in that order.
///
/// Captures and chat-ops only run for created/opened triggers. Label
/// families run on every event so the `needs/{prefix}` sentinel and its
/// commit status stay current. Every rule is checked against the sender's
/// author association first and skipped silently when the gate denies it.
/// Host failures abort the run; effects already applied stay applied.
pub async fn run_governance(
    governance: &Governance,
    context: &EventContext,
    host: &dyn GovernanceHost,
) -> Result<GovernanceReport> {
    let commands = CommandSet::from_body(context.body.as_deref());
    let association = context.author_association.as_deref();
    let created_or_opened = context.is_created_or_opened();
    let mut report = GovernanceReport::default();

    if created_or_opened && !governance.captures.is_empty() {
        tracing::info!(count = governance.captures.len(), "operations: processing captures");
        let body = context.body.as_deref().unwrap_or_default();
        for policy in &governance.captures {
            if !is_author_association_allowed(policy.author_association.as_ref(), association) {
                report.skipped_by_association += 1;
                continue;
            }
            let labels = apply_capture(policy, body, host)
                .await
                .with_context(|| format!("capture '{}' failed", policy.regex))?;
            report.captured_labels.extend(labels);
        }
    }

    if created_or_opened && !governance.chat_ops.is_empty() {
        tracing::info!(count = governance.chat_ops.len(), "operations: processing chat ops");
        for rule in &governance.chat_ops {
            if !is_author_association_allowed(rule.author_association.as_ref(), association) {
                report.skipped_by_association += 1;
                continue;
            }
            let outcome = dispatch_chat_ops(rule, &commands, host)
                .await
                .with_context(|| format!("chat ops '{}' failed", rule.cmd))?;
            report.chat_ops.push((rule.cmd.clone(), outcome));
        }
    }

    if !governance.labels.is_empty() {
        tracing::info!(count = governance.labels.len(), "operations: processing labels");
        for policy in &governance.labels {
            if !is_author_association_allowed(policy.author_association.as_ref(), association) {
                report.skipped_by_association += 1;
                continue;
            }
            let outcome = apply_label_policy(policy, &commands, context, host)
                .await
                .with_context(|| format!("label family '{}' failed", policy.prefix))?;
            report.labels.push((policy.prefix.clone(), outcome));
        }
    }

    if let Some(automations) = governance.automations.as_ref() {
        if context.is_opened() {
            tracing::info!("operations: processing automations");
            report.auto_assigned = apply_automations(automations, context.issue_number, host)
                .await
                .context("automations failed")?;
        }
    }

    Ok(report)
}

//! Label-family reconciliation.
//!
//! A family is every `{prefix}/{value}` label plus the `needs/{prefix}`
//! sentinel. Each pass seeds from the subject's current labels, applies
//! `/{prefix}-remove` and `/{prefix}` commands, enforces multiplicity, and
//! emits the minimal add/remove diff. Nothing is kept between passes.

use anyhow::Result;

use crate::command::CommandSet;
use crate::event_context::EventContext;
use crate::host::{CommitState, CommitStatus, GovernanceHost};
use crate::policy::{LabelPolicy, NeedsStatusPolicy, StatusDescription};

#[derive(Debug, Clone, PartialEq, Eq)]
/// Working state for one family during a single reconciliation pass.
pub struct PrefixLabelSet {
    prefix: String,
    sentinel: String,
    existing: Vec<String>,
    working: Vec<String>,
    sentinel_present: bool,
}

impl PrefixLabelSet {
    /// Seeds from the current labels in list order.
    ///
    /// The last family label in list order counts as the most recently
    /// added one. GitHub does not order labels by application time, so this
    /// is an approximation kept for compatibility.
    pub fn seed<'a>(prefix: &str, current_labels: impl IntoIterator<Item = &'a str>) -> Self {
        let sentinel = format!("needs/{prefix}");
        let family_prefix = format!("{prefix}/");
        let mut set = Self {
            prefix: prefix.to_string(),
            sentinel,
            existing: Vec::new(),
            working: Vec::new(),
            sentinel_present: false,
        };
        for label in current_labels {
            if label == set.sentinel {
                set.existing.push(label.to_string());
                set.sentinel_present = true;
            } else if label.starts_with(&family_prefix) {
                set.existing.push(label.to_string());
                set.add(label.to_string());
            }
        }
        set
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn sentinel(&self) -> &str {
        &self.sentinel
    }

    pub fn sentinel_present(&self) -> bool {
        self.sentinel_present
    }

    pub fn existing(&self) -> &[String] {
        &self.existing
    }

    /// Family labels in the order they were last added.
    pub fn working(&self) -> &[String] {
        &self.working
    }

    pub fn last_added(&self) -> Option<&str> {
        self.working.last().map(String::as_str)
    }

    pub fn add(&mut self, label: String) {
        self.working.retain(|existing| existing != &label);
        self.working.push(label);
    }

    pub fn remove(&mut self, label: &str) {
        self.working.retain(|existing| existing != label);
    }

    /// Keeps only the most recently added label, if any.
    pub fn collapse_to_last(&mut self) {
        if let Some(last) = self.working.pop() {
            self.working.clear();
            self.working.push(last);
        }
    }

    /// Consumes the set and computes the diff against the seeded labels.
    ///
    /// The sentinel is wanted exactly when `needs_required` holds and no
    /// family label remains.
    pub fn into_reconciliation(self, needs_required: bool) -> LabelReconciliation {
        let needs = needs_required && self.working.is_empty();
        let mut desired = self.working;
        if needs {
            desired.push(self.sentinel.clone());
        }

        let to_remove = self
            .existing
            .iter()
            .filter(|label| !desired.contains(label))
            .cloned()
            .collect();

        let mut to_add = Vec::new();
        if needs && !self.sentinel_present {
            to_add.push(self.sentinel.clone());
        }
        to_add.extend(
            desired
                .into_iter()
                .filter(|label| label != &self.sentinel && !self.existing.contains(label)),
        );

        LabelReconciliation {
            to_add,
            to_remove,
            needs,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Result of one reconciliation pass.
pub struct LabelReconciliation {
    pub to_add: Vec<String>,
    pub to_remove: Vec<String>,
    /// The family has no value and the sentinel is (or stays) applied.
    pub needs: bool,
}

impl LabelReconciliation {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// Computes the label diff for one family.
///
/// Explicit `/{prefix}-remove` and `/{prefix}` commands are applied only when
/// `apply_commands` is set (comment created, issue or pull request opened);
/// the sentinel is re-evaluated on every event.
pub fn reconcile_labels(
    policy: &LabelPolicy,
    commands: &CommandSet,
    current_labels: &[String],
    apply_commands: bool,
) -> LabelReconciliation {
    let mut set = PrefixLabelSet::seed(&policy.prefix, current_labels.iter().map(String::as_str));

    if apply_commands {
        for value in commands
            .word_prefix(&format!("/{}-remove", policy.prefix))
            .into_iter()
            .flat_map(|matched| matched.args)
        {
            set.remove(&policy.label_for(&value));
        }
        for value in commands
            .word_prefix(&format!("/{}", policy.prefix))
            .into_iter()
            .flat_map(|matched| matched.args)
            .filter(|value| policy.allows(value))
        {
            set.add(policy.label_for(&value));
        }
    }

    if !policy.multiple {
        set.collapse_to_last();
    }

    let needs_required = has_needs_command(policy, commands)
        || set.sentinel_present()
        || policy.needs.is_active();
    set.into_reconciliation(needs_required)
}

fn has_needs_command(policy: &LabelPolicy, commands: &CommandSet) -> bool {
    ["needs", "need"].iter().any(|verb| {
        !commands
            .word_prefix(&format!("/{verb} {}", policy.prefix))
            .is_empty()
    })
}

/// Commit status for a family: success once a value is present, otherwise
/// failure when a failure description exists and pending when it does not.
pub fn needs_commit_status(policy: &NeedsStatusPolicy, satisfied: bool) -> CommitStatus {
    let (state, description) = match (&policy.description, satisfied) {
        (Some(StatusDescription::Text(text)), true) => (CommitState::Success, Some(text.clone())),
        (Some(StatusDescription::Text(text)), false) => (CommitState::Failure, Some(text.clone())),
        (Some(StatusDescription::PerState { success, .. }), true) => {
            (CommitState::Success, success.clone())
        }
        (
            Some(StatusDescription::PerState {
                failure: Some(failure),
                ..
            }),
            false,
        ) => (CommitState::Failure, Some(failure.clone())),
        (None, true) => (CommitState::Success, None),
        (Some(StatusDescription::PerState { failure: None, .. }) | None, false) => {
            (CommitState::Pending, None)
        }
    };
    CommitStatus {
        context: policy.context.clone(),
        state,
        description,
        target_url: policy.url.clone(),
    }
}

/// Reconciles one family against the host's current labels and performs
/// the resulting label, comment, and commit-status effects.
pub async fn apply_label_policy(
    policy: &LabelPolicy,
    commands: &CommandSet,
    context: &EventContext,
    host: &dyn GovernanceHost,
) -> Result<LabelReconciliation> {
    let current_labels = host.current_labels().await?;
    let outcome = reconcile_labels(
        policy,
        commands,
        &current_labels,
        context.is_created_or_opened(),
    );
    tracing::debug!(
        prefix = %policy.prefix,
        to_add = ?outcome.to_add,
        to_remove = ?outcome.to_remove,
        needs = outcome.needs,
        "label reconciliation computed"
    );

    if !outcome.to_remove.is_empty() {
        host.remove_labels(&outcome.to_remove).await?;
    }
    if !outcome.to_add.is_empty() {
        host.add_labels(&outcome.to_add).await?;
    }

    if outcome.needs && context.is_opened() {
        if let Some(comment) = policy.needs.comment() {
            host.post_comment(comment).await?;
        }
    }

    if let Some(status_policy) = policy.needs.status() {
        if let Some(sha) = context.status_target_sha() {
            let status = needs_commit_status(status_policy, !outcome.needs);
            host.set_commit_status(sha, &status).await?;
        }
    }

    Ok(outcome)
}

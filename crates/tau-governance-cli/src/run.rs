use anyhow::{Context, Result};
use tau_governance::event_filter::{ignore_reason, IgnoreReason};
use tau_governance::operations::{run_governance, GovernanceReport};
use tau_governance::policy::{Governance, GovernanceConfig};
use tau_governance::webhook_payload::WebhookPayload;
use tau_governance::EventContext;
use tau_governance_github::{
    fetch_governance_config, read_governance_config, GithubApiClient, GithubGovernanceHost,
    RepoRef,
};

use crate::cli_args::Cli;

#[derive(Debug)]
/// Enumerates supported `RunOutcome` values.
pub(crate) enum RunOutcome {
    Ignored(IgnoreReason),
    NoGovernance,
    Completed(GovernanceReport),
}

/// Handles one webhook invocation end to end.
pub(crate) async fn run(cli: &Cli) -> Result<RunOutcome> {
    let raw_event = tokio::fs::read_to_string(&cli.event_path)
        .await
        .with_context(|| format!("failed to read {}", cli.event_path.display()))?;
    let payload = WebhookPayload::from_json_str(&raw_event)
        .with_context(|| format!("failed to parse {}", cli.event_path.display()))?;
    let mut context = EventContext::from_webhook_payload(&cli.event_name, &payload)?;
    tracing::info!(
        event = %context.event_name,
        action = %context.action,
        number = context.issue_number,
        "governance event received"
    );

    let repo = RepoRef::parse(&cli.repo)?;
    let reader = api_client(cli, &cli.github_token, repo.clone())?;
    let writer = api_client(cli, cli.write_token(), repo)?;

    let bot_user_id = match writer.authenticated_user_id().await {
        Ok(id) => Some(id),
        Err(error) => {
            tracing::warn!(error = %error, "could not resolve bot user id");
            None
        }
    };
    if let Some(reason) = ignore_reason(&context, bot_user_id) {
        tracing::info!(reason = reason.as_str(), "event ignored");
        return Ok(RunOutcome::Ignored(reason));
    }

    let config = load_config(cli, &reader).await?;
    let Some(governance) = config.governance_for(context.target) else {
        tracing::info!(governance = ?context.target, "no governance section for event");
        return Ok(RunOutcome::NoGovernance);
    };

    if needs_head_sha(governance, &context) {
        let sha = reader
            .pull_request_head_sha(context.issue_number)
            .await
            .context("failed to resolve pull request head sha")?;
        context = context.with_head_sha(sha);
    }

    let host = GithubGovernanceHost::new(reader, writer, context.clone(), &cli.config_path);
    let report = run_governance(governance, &context, &host).await?;
    tracing::info!(
        captured = report.captured_labels.len(),
        chat_ops = report.chat_ops.len(),
        label_families = report.labels.len(),
        skipped = report.skipped_by_association,
        "governance completed"
    );
    Ok(RunOutcome::Completed(report))
}

fn api_client(cli: &Cli, token: &str, repo: RepoRef) -> Result<GithubApiClient> {
    GithubApiClient::new(
        cli.api_base.clone(),
        token.to_string(),
        repo,
        cli.request_timeout_ms,
        cli.retry_max_attempts,
        cli.retry_base_delay_ms,
    )
}

async fn load_config(cli: &Cli, reader: &GithubApiClient) -> Result<GovernanceConfig> {
    match cli.config_file.as_deref() {
        Some(path) => read_governance_config(path).await,
        None => fetch_governance_config(reader, &cli.config_path, cli.sha.as_deref()).await,
    }
}

/// Comments on pull requests carry no head commit; fetch it only when a
/// label family will publish a commit status.
fn needs_head_sha(governance: &Governance, context: &EventContext) -> bool {
    context.is_pull_request
        && context.head_sha.is_none()
        && governance
            .labels
            .iter()
            .any(|policy| policy.needs.status().is_some())
}

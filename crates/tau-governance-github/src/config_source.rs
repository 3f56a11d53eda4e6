use std::path::Path;

use anyhow::{Context, Result};
use tau_governance::policy::{parse_governance_config, GovernanceConfig};

use crate::client::GithubApiClient;

/// Fetches the policy file from the repository at `git_ref` and validates it.
pub async fn fetch_governance_config(
    client: &GithubApiClient,
    config_path: &str,
    git_ref: Option<&str>,
) -> Result<GovernanceConfig> {
    let raw = client.file_contents(config_path, git_ref).await?;
    parse_governance_config(&raw)
        .with_context(|| format!("invalid governance config '{config_path}'"))
}

pub async fn read_governance_config(path: &Path) -> Result<GovernanceConfig> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_governance_config(&raw)
        .with_context(|| format!("invalid governance config '{}'", path.display()))
}

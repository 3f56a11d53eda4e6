use std::path::PathBuf;

use clap::Parser;

pub(crate) const DEFAULT_CONFIG_PATH: &str = ".github/governance.yml";

fn parse_positive_usize(value: &str) -> Result<usize, String> {
    let parsed = value
        .parse::<usize>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

fn parse_positive_u64(value: &str) -> Result<u64, String> {
    let parsed = value
        .parse::<u64>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

#[derive(Debug, Parser)]
#[command(
    name = "tau-governance",
    about = "Applies a governance policy to one GitHub issue or pull request event",
    version
)]
pub(crate) struct Cli {
    #[arg(
        long = "github-token",
        env = "GITHUB_TOKEN",
        hide_env_values = true,
        help = "GitHub token used for reads and commit statuses"
    )]
    pub(crate) github_token: String,

    #[arg(
        long = "bot-token",
        env = "GOVERNANCE_BOT_TOKEN",
        hide_env_values = true,
        help = "Token the bot writes labels, comments, and assignments with (defaults to --github-token)"
    )]
    pub(crate) bot_token: Option<String>,

    #[arg(
        long = "config-path",
        env = "GOVERNANCE_CONFIG_PATH",
        default_value = DEFAULT_CONFIG_PATH,
        help = "Repository path of the governance policy file"
    )]
    pub(crate) config_path: String,

    #[arg(
        long = "config-file",
        env = "GOVERNANCE_CONFIG_FILE",
        help = "Local governance policy file; skips fetching --config-path from the repository"
    )]
    pub(crate) config_file: Option<PathBuf>,

    #[arg(
        long = "event-name",
        env = "GITHUB_EVENT_NAME",
        help = "Webhook event name (issues, issue_comment, pull_request, pull_request_target)"
    )]
    pub(crate) event_name: String,

    #[arg(
        long = "event-path",
        env = "GITHUB_EVENT_PATH",
        help = "Path to the webhook payload JSON"
    )]
    pub(crate) event_path: PathBuf,

    #[arg(
        long = "repo",
        env = "GITHUB_REPOSITORY",
        help = "Repository in owner/repo form"
    )]
    pub(crate) repo: String,

    #[arg(
        long = "sha",
        env = "GITHUB_SHA",
        help = "Commit the policy file is read at"
    )]
    pub(crate) sha: Option<String>,

    #[arg(
        long = "api-base",
        env = "GITHUB_API_URL",
        default_value = "https://api.github.com",
        help = "GitHub REST API base URL"
    )]
    pub(crate) api_base: String,

    #[arg(
        long = "request-timeout-ms",
        env = "GOVERNANCE_REQUEST_TIMEOUT_MS",
        default_value_t = 30_000,
        value_parser = parse_positive_u64,
        help = "Timeout in milliseconds for each github api request"
    )]
    pub(crate) request_timeout_ms: u64,

    #[arg(
        long = "retry-max-attempts",
        env = "GOVERNANCE_RETRY_MAX_ATTEMPTS",
        default_value_t = 4,
        value_parser = parse_positive_usize,
        help = "Maximum attempts for retryable github api failures (429/5xx/transport)"
    )]
    pub(crate) retry_max_attempts: usize,

    #[arg(
        long = "retry-base-delay-ms",
        env = "GOVERNANCE_RETRY_BASE_DELAY_MS",
        default_value_t = 500,
        value_parser = parse_positive_u64,
        help = "Base backoff delay in milliseconds for github api retries"
    )]
    pub(crate) retry_base_delay_ms: u64,
}

impl Cli {
    pub(crate) fn write_token(&self) -> &str {
        self.bot_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .unwrap_or(self.github_token.as_str())
    }
}

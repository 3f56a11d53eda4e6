use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tau_governance::host::CommitStatus;

use crate::transport::{
    is_retryable_github_status, is_retryable_transport_error, parse_retry_after, retry_delay,
    truncate_for_error,
};

const PAGE_SIZE: usize = 100;
const ERROR_BODY_MAX_CHARS: usize = 800;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Public struct `RepoRef` naming one `owner/repo` repository.
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let (owner, name) = trimmed
            .split_once('/')
            .ok_or_else(|| anyhow!("invalid repository '{raw}', expected owner/repo"))?;
        let owner = owner.trim();
        let name = name.trim();
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            bail!("invalid repository '{raw}', expected owner/repo");
        }
        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }

    pub fn as_slug(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GithubCommentCreateResponse {
    pub id: u64,
    pub html_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GithubLabelRow {
    name: String,
}

#[derive(Debug, Deserialize)]
struct GithubContentRow {
    #[serde(default)]
    content: String,
    #[serde(default)]
    encoding: Option<String>,
}

#[derive(Clone)]
/// REST client scoped to one repository and one token.
///
/// Every request is retried on 429/5xx responses and transient transport
/// errors, up to `retry_max_attempts` attempts in total.
pub struct GithubApiClient {
    http: reqwest::Client,
    api_base: String,
    repo: RepoRef,
    retry_max_attempts: usize,
    retry_base_delay_ms: u64,
}

impl GithubApiClient {
    pub fn new(
        api_base: String,
        token: String,
        repo: RepoRef,
        request_timeout_ms: u64,
        retry_max_attempts: usize,
        retry_base_delay_ms: u64,
    ) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("Tau-governance"),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "x-github-api-version",
            reqwest::header::HeaderValue::from_static("2022-11-28"),
        );
        let auth_header = format!("Bearer {}", token.trim());
        headers.insert(
            reqwest::header::AUTHORIZATION,
            reqwest::header::HeaderValue::from_str(&auth_header)
                .context("invalid github authorization header")?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(request_timeout_ms.max(1)))
            .build()
            .context("failed to create github api client")?;
        Ok(Self {
            http: client,
            api_base: api_base.trim_end_matches('/').to_string(),
            repo,
            retry_max_attempts: retry_max_attempts.max(1),
            retry_base_delay_ms: retry_base_delay_ms.max(1),
        })
    }

    pub fn repo(&self) -> &RepoRef {
        &self.repo
    }

    pub async fn authenticated_user_id(&self) -> Result<u64> {
        #[derive(Deserialize)]
        struct Viewer {
            id: u64,
        }

        let url = self.api_url(&["user"])?;
        let viewer: Viewer = self
            .request_json("resolve authenticated user", || self.http.get(url.clone()))
            .await?;
        Ok(viewer.id)
    }

    pub async fn list_issue_labels(&self, issue_number: u64) -> Result<Vec<String>> {
        let url = self.repo_url(&["issues", &issue_number.to_string(), "labels"])?;
        let mut page = 1_u32;
        let mut labels = Vec::new();
        loop {
            let page_value = page.to_string();
            let chunk: Vec<GithubLabelRow> = self
                .request_json("list issue labels", || {
                    self.http.get(url.clone()).query(&[
                        ("per_page", "100"),
                        ("page", page_value.as_str()),
                    ])
                })
                .await?;
            let chunk_len = chunk.len();
            labels.extend(chunk.into_iter().map(|row| row.name));
            if chunk_len < PAGE_SIZE {
                break;
            }
            page = page.saturating_add(1);
        }
        Ok(labels)
    }

    pub async fn add_issue_labels(&self, issue_number: u64, labels: &[String]) -> Result<()> {
        let url = self.repo_url(&["issues", &issue_number.to_string(), "labels"])?;
        let payload = json!({ "labels": labels });
        self.request_unit("add issue labels", || {
            self.http.post(url.clone()).json(&payload)
        })
        .await
    }

    /// Removes one label; returns `false` when the label was not on the issue.
    pub async fn remove_issue_label(&self, issue_number: u64, label: &str) -> Result<bool> {
        let url = self.repo_url(&["issues", &issue_number.to_string(), "labels", label])?;
        let response = self
            .send_with_retry("remove issue label", || self.http.delete(url.clone()))
            .await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            tracing::debug!(label, issue_number, "label already absent");
            return Ok(false);
        }
        ensure_success("remove issue label", response).await?;
        Ok(true)
    }

    pub async fn create_issue_comment(
        &self,
        issue_number: u64,
        body: &str,
    ) -> Result<GithubCommentCreateResponse> {
        let url = self.repo_url(&["issues", &issue_number.to_string(), "comments"])?;
        let payload = json!({ "body": body });
        self.request_json("create issue comment", || {
            self.http.post(url.clone()).json(&payload)
        })
        .await
    }

    pub async fn close_issue(&self, issue_number: u64) -> Result<()> {
        let url = self.repo_url(&["issues", &issue_number.to_string()])?;
        let payload = json!({ "state": "closed" });
        self.request_unit("close issue", || self.http.patch(url.clone()).json(&payload))
            .await
    }

    pub async fn add_assignees(&self, issue_number: u64, assignees: &[String]) -> Result<()> {
        let url = self.repo_url(&["issues", &issue_number.to_string(), "assignees"])?;
        let payload = json!({ "assignees": assignees });
        self.request_unit("add assignees", || self.http.post(url.clone()).json(&payload))
            .await
    }

    pub async fn request_reviewers(&self, pull_number: u64, reviewers: &[String]) -> Result<()> {
        let url = self.repo_url(&["pulls", &pull_number.to_string(), "requested_reviewers"])?;
        let payload = json!({ "reviewers": reviewers });
        self.request_unit("request reviewers", || {
            self.http.post(url.clone()).json(&payload)
        })
        .await
    }

    pub async fn create_commit_status(&self, sha: &str, status: &CommitStatus) -> Result<()> {
        let url = self.repo_url(&["statuses", sha])?;
        let mut payload = json!({
            "state": status.state.as_str(),
            "context": status.context,
        });
        if let Some(description) = status.description.as_deref() {
            payload["description"] = json!(description);
        }
        if let Some(target_url) = status.target_url.as_deref() {
            payload["target_url"] = json!(target_url);
        }
        self.request_unit("create commit status", || {
            self.http.post(url.clone()).json(&payload)
        })
        .await
    }

    /// Any failure, including a missing release, reads as `false`.
    pub async fn release_exists(&self, tag: &str) -> bool {
        let url = match self.repo_url(&["releases", "tags", tag]) {
            Ok(url) => url,
            Err(error) => {
                tracing::debug!(tag, error = %error, "release lookup url rejected");
                return false;
            }
        };
        match self
            .request_unit("get release by tag", || self.http.get(url.clone()))
            .await
        {
            Ok(()) => true,
            Err(error) => {
                tracing::debug!(tag, error = %error, "release lookup failed");
                false
            }
        }
    }

    pub async fn pull_request_head_sha(&self, pull_number: u64) -> Result<String> {
        #[derive(Deserialize)]
        struct PullRequest {
            head: Head,
        }
        #[derive(Deserialize)]
        struct Head {
            sha: String,
        }

        let url = self.repo_url(&["pulls", &pull_number.to_string()])?;
        let pull: PullRequest = self
            .request_json("get pull request", || self.http.get(url.clone()))
            .await?;
        Ok(pull.head.sha)
    }

    /// Reads a UTF-8 file from the repository, optionally at `git_ref`.
    pub async fn file_contents(&self, path: &str, git_ref: Option<&str>) -> Result<String> {
        let mut segments = vec!["contents"];
        segments.extend(path.split('/').filter(|segment| !segment.is_empty()));
        let url = self.repo_url(&segments)?;
        let row: GithubContentRow = self
            .request_json("get repository content", || {
                let request = self.http.get(url.clone());
                match git_ref {
                    Some(git_ref) => request.query(&[("ref", git_ref)]),
                    None => request,
                }
            })
            .await
            .with_context(|| format!("failed to fetch '{path}' from {}", self.repo.as_slug()))?;
        decode_content(&row).with_context(|| format!("failed to decode '{path}'"))
    }

    fn api_url(&self, segments: &[&str]) -> Result<reqwest::Url> {
        let mut url = reqwest::Url::parse(&self.api_base)
            .with_context(|| format!("invalid github api base '{}'", self.api_base))?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("github api base '{}' cannot carry a path", self.api_base))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn repo_url(&self, segments: &[&str]) -> Result<reqwest::Url> {
        let mut full = vec!["repos", self.repo.owner.as_str(), self.repo.name.as_str()];
        full.extend_from_slice(segments);
        self.api_url(&full)
    }

    async fn send_with_retry<F>(
        &self,
        operation: &str,
        mut request_builder: F,
    ) -> Result<reqwest::Response>
    where
        F: FnMut() -> reqwest::RequestBuilder,
    {
        let mut attempt = 0_usize;
        loop {
            attempt = attempt.saturating_add(1);
            let response = request_builder()
                .header("x-tau-retry-attempt", attempt.saturating_sub(1).to_string())
                .send()
                .await;
            match response {
                Ok(response) => {
                    let status = response.status();
                    if !status.is_success()
                        && attempt < self.retry_max_attempts
                        && is_retryable_github_status(status.as_u16())
                    {
                        let delay = retry_delay(
                            self.retry_base_delay_ms,
                            attempt,
                            parse_retry_after(response.headers()),
                        );
                        tracing::debug!(
                            operation,
                            attempt,
                            status = status.as_u16(),
                            "retrying github request"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Ok(response);
                }
                Err(error) => {
                    if attempt < self.retry_max_attempts && is_retryable_transport_error(&error) {
                        tokio::time::sleep(retry_delay(self.retry_base_delay_ms, attempt, None))
                            .await;
                        continue;
                    }
                    return Err(error)
                        .with_context(|| format!("github api {operation} request failed"));
                }
            }
        }
    }

    async fn request_json<T, F>(&self, operation: &str, request_builder: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: FnMut() -> reqwest::RequestBuilder,
    {
        let response = self.send_with_retry(operation, request_builder).await?;
        let response = ensure_success(operation, response).await?;
        response
            .json::<T>()
            .await
            .with_context(|| format!("failed to decode github {operation}"))
    }

    async fn request_unit<F>(&self, operation: &str, request_builder: F) -> Result<()>
    where
        F: FnMut() -> reqwest::RequestBuilder,
    {
        let response = self.send_with_retry(operation, request_builder).await?;
        ensure_success(operation, response).await?;
        Ok(())
    }
}

async fn ensure_success(operation: &str, response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    bail!(
        "github api {operation} failed with status {}: {}",
        status.as_u16(),
        truncate_for_error(&body, ERROR_BODY_MAX_CHARS)
    );
}

fn decode_content(row: &GithubContentRow) -> Result<String> {
    match row.encoding.as_deref() {
        Some("base64") | None => {
            let compact: String = row
                .content
                .chars()
                .filter(|ch| !ch.is_ascii_whitespace())
                .collect();
            let bytes = BASE64
                .decode(compact.as_bytes())
                .context("content is not valid base64")?;
            String::from_utf8(bytes).context("content is not valid utf-8")
        }
        Some(other) => bail!("unsupported content encoding '{other}'"),
    }
}

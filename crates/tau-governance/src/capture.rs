//! Labels derived from regex captures over the raw body.

use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};

use crate::command::body_lines;
use crate::host::GovernanceHost;
use crate::policy::CapturePolicy;

pub const CAPTURED_PLACEHOLDER: &str = "$CAPTURED";

pub fn compile_capture_regex(policy: &CapturePolicy) -> Result<Regex, regex::Error> {
    RegexBuilder::new(&policy.regex)
        .case_insensitive(policy.ignore_case)
        .build()
}

/// Trimmed text of the first capture group of the first match on `line`.
///
/// A regex without a capture group yields an empty string on match.
pub fn captured_text<'a>(regex: &Regex, line: &'a str) -> Option<&'a str> {
    let captures = regex.captures(line)?;
    Some(
        captures
            .get(1)
            .map_or("", |group| group.as_str())
            .trim(),
    )
}

pub fn render_capture_label(template: &str, captured: &str) -> String {
    template.replace(CAPTURED_PLACEHOLDER, captured)
}

/// Checks `v{version}` first and then the bare version, where `version` is
/// the captured text without a leading `v`.
pub async fn release_tag_exists(host: &dyn GovernanceHost, captured: &str) -> Result<bool> {
    let version = captured.strip_prefix('v').unwrap_or(captured);
    if host.release_exists(&format!("v{version}")).await? {
        return Ok(true);
    }
    host.release_exists(version).await
}

/// Scans `body` line by line and returns the labels the policy derives,
/// in line order and without duplicates.
pub async fn capture_labels(
    policy: &CapturePolicy,
    body: &str,
    host: &dyn GovernanceHost,
) -> Result<Vec<String>> {
    let regex = compile_capture_regex(policy)
        .with_context(|| format!("invalid capture regex '{}'", policy.regex))?;

    let mut labels: Vec<String> = Vec::new();
    for line in body_lines(body) {
        let Some(captured) = captured_text(&regex, line) else {
            continue;
        };
        if policy.github_release && !release_tag_exists(host, captured).await? {
            tracing::debug!(captured, "capture skipped, no matching release");
            continue;
        }
        let label = render_capture_label(&policy.label, captured);
        if !labels.contains(&label) {
            labels.push(label);
        }
    }
    Ok(labels)
}

pub async fn apply_capture(
    policy: &CapturePolicy,
    body: &str,
    host: &dyn GovernanceHost,
) -> Result<Vec<String>> {
    let labels = capture_labels(policy, body, host).await?;
    if !labels.is_empty() {
        host.add_labels(&labels).await?;
    }
    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::{apply_capture, captured_text, compile_capture_regex, render_capture_label};
    use crate::policy::CapturePolicy;
    use crate::test_support::{strings, HostCall, RecordingHost};

    fn capture(regex: &str, label: &str) -> CapturePolicy {
        CapturePolicy {
            regex: regex.to_string(),
            label: label.to_string(),
            ignore_case: false,
            github_release: false,
            author_association: None,
        }
    }

    fn version_capture() -> CapturePolicy {
        CapturePolicy {
            github_release: true,
            ..capture("- Version: *(.+) *", "v/$CAPTURED")
        }
    }

    async fn added(policy: &CapturePolicy, body: &str, host: &RecordingHost) -> Vec<HostCall> {
        apply_capture(policy, body, host).await.expect("capture");
        host.calls()
    }

    #[test]
    fn unit_captured_text_trims_group_and_defaults_to_empty() {
        let policy = capture("- Version: *(.+) *", "v/$CAPTURED");
        let regex = compile_capture_regex(&policy).expect("regex");
        assert_eq!(captured_text(&regex, "- Version: 1.0.0  "), Some("1.0.0"));
        assert_eq!(captured_text(&regex, "nothing here"), None);

        let without_group = compile_capture_regex(&capture("^/bug", "kind/bug$CAPTURED"))
            .expect("regex");
        assert_eq!(captured_text(&without_group, "/bug now"), Some(""));
        assert_eq!(render_capture_label("kind/bug$CAPTURED", ""), "kind/bug");
    }

    #[tokio::test]
    async fn functional_apply_capture_matches_lines_with_any_line_ending() {
        let host = RecordingHost::default();
        let calls = added(
            &capture("- Operating System: *(macos|mac) *", "os/mac"),
            "- Version: 1.0.0\r\n- Operating System:mac",
            &host,
        )
        .await;
        assert_eq!(calls, vec![HostCall::AddLabels(strings(&["os/mac"]))]);

        let host = RecordingHost::default();
        let calls = added(
            &capture("- Operating System: *(windows|window|win) *", "os/win"),
            "- Operating System: windows \n- Version: 1.0.0",
            &host,
        )
        .await;
        assert_eq!(calls, vec![HostCall::AddLabels(strings(&["os/win"]))]);
    }

    #[tokio::test]
    async fn functional_apply_capture_respects_ignore_case() {
        let body = "- Operating System: LINUX \n- Version: 1.0.0";
        let host = RecordingHost::default();
        assert!(added(&capture("- Operating System: *(linux) *", "os/linux"), body, &host)
            .await
            .is_empty());

        let host = RecordingHost::default();
        let policy = CapturePolicy {
            ignore_case: true,
            ..capture("- Operating System: *(linux) *", "os/linux")
        };
        assert_eq!(
            added(&policy, body, &host).await,
            vec![HostCall::AddLabels(strings(&["os/linux"]))]
        );
    }

    #[tokio::test]
    async fn functional_apply_capture_renders_captured_text_per_line() {
        let host = RecordingHost::default();
        let calls = added(
            &capture("^- Area: *(\\w+)", "area/$CAPTURED"),
            "- Area: ui\n- Area: api\n- Area: ui",
            &host,
        )
        .await;
        assert_eq!(calls, vec![HostCall::AddLabels(strings(&["area/ui", "area/api"]))]);
    }

    #[tokio::test]
    async fn integration_apply_capture_falls_back_to_bare_release_tag() {
        let host = RecordingHost::default().with_releases(&["1.5.0"]);
        let calls = added(&version_capture(), "- Version: 1.5.0", &host).await;
        assert_eq!(calls, vec![HostCall::AddLabels(strings(&["v/1.5.0"]))]);
        assert_eq!(host.release_lookups(), vec!["v1.5.0", "1.5.0"]);
    }

    #[tokio::test]
    async fn integration_apply_capture_stops_at_prefixed_release_tag() {
        let host = RecordingHost::default().with_releases(&["v1.5.0"]);
        let calls = added(&version_capture(), "- Version: 1.5.0", &host).await;
        assert_eq!(calls, vec![HostCall::AddLabels(strings(&["v/1.5.0"]))]);
        assert_eq!(host.release_lookups(), vec!["v1.5.0"]);
    }

    #[tokio::test]
    async fn regression_apply_capture_skips_lines_without_release_and_continues() {
        let host = RecordingHost::default().with_releases(&["2.0.0"]);
        let calls = added(
            &version_capture(),
            "- Version: 1.5.0\n- Version: 2.0.0",
            &host,
        )
        .await;
        assert_eq!(calls, vec![HostCall::AddLabels(strings(&["v/2.0.0"]))]);

        let host = RecordingHost::default();
        assert!(added(&version_capture(), "- Version: 1.5.0", &host)
            .await
            .is_empty());
        assert_eq!(host.release_lookups(), vec!["v1.5.0", "1.5.0"]);
    }
}

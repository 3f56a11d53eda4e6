//! Declarative governance policy, decoded from the repository's YAML file.

use serde::Deserialize;
use thiserror::Error;

use crate::author_association::AuthorAssociationGate;
use crate::capture::compile_capture_regex;
use crate::event_context::GovernanceTarget;

pub const SUPPORTED_CONFIG_VERSION: &str = "v1";

#[derive(Debug, Error)]
/// Enumerates supported `PolicyError` values.
pub enum PolicyError {
    #[error("failed to decode governance config: {0}")]
    Decode(#[from] serde_yaml::Error),
    #[error("unsupported governance config version '{0}', expected 'v1'")]
    UnsupportedVersion(String),
    #[error("{section}: capture regex '{regex}' is invalid: {source}")]
    InvalidRegex {
        section: &'static str,
        regex: String,
        #[source]
        source: regex::Error,
    },
    #[error("{section}: label policy prefix must not be empty")]
    EmptyLabelPrefix { section: &'static str },
    #[error("{section}: chat_ops cmd must not be empty")]
    EmptyChatOpsCommand { section: &'static str },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
/// Root of the governance policy file.
pub struct GovernanceConfig {
    pub version: String,
    #[serde(default)]
    pub issue: Option<Governance>,
    #[serde(default, alias = "pull-request")]
    pub pull_request: Option<Governance>,
}

impl GovernanceConfig {
    pub fn governance_for(&self, target: GovernanceTarget) -> Option<&Governance> {
        match target {
            GovernanceTarget::Issue => self.issue.as_ref(),
            GovernanceTarget::PullRequest => self.pull_request.as_ref(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
/// Policy sections applied to one kind of subject (issues or pull requests).
pub struct Governance {
    #[serde(default)]
    pub labels: Vec<LabelPolicy>,
    #[serde(default)]
    pub captures: Vec<CapturePolicy>,
    #[serde(default)]
    pub chat_ops: Vec<ChatOpsRule>,
    #[serde(default)]
    pub automations: Option<Automations>,
}

fn default_multiple() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
/// One label family: `{prefix}/{value}` labels plus the `needs/{prefix}` sentinel.
pub struct LabelPolicy {
    pub prefix: String,
    #[serde(rename = "list")]
    pub allowed_values: Vec<String>,
    #[serde(default = "default_multiple")]
    pub multiple: bool,
    #[serde(default)]
    pub needs: NeedsPolicy,
    #[serde(default)]
    pub author_association: Option<AuthorAssociationGate>,
}

impl LabelPolicy {
    pub fn new(prefix: impl Into<String>, allowed_values: &[&str]) -> Self {
        Self {
            prefix: prefix.into(),
            allowed_values: allowed_values.iter().map(|value| value.to_string()).collect(),
            multiple: true,
            needs: NeedsPolicy::None,
            author_association: None,
        }
    }

    pub fn sentinel(&self) -> String {
        format!("needs/{}", self.prefix)
    }

    pub fn label_for(&self, value: &str) -> String {
        format!("{}/{value}", self.prefix)
    }

    pub fn allows(&self, value: &str) -> bool {
        self.allowed_values.iter().any(|allowed| allowed == value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "RawNeedsPolicy")]
/// Whether an empty label family gets its `needs/{prefix}` sentinel, and
/// which comment or commit status goes with it.
pub enum NeedsPolicy {
    #[default]
    None,
    Always,
    Configured {
        comment: Option<String>,
        status: Option<NeedsStatusPolicy>,
    },
}

impl NeedsPolicy {
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::None)
    }

    pub fn comment(&self) -> Option<&str> {
        match self {
            Self::Configured {
                comment: Some(comment),
                ..
            } => Some(comment.as_str()),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<&NeedsStatusPolicy> {
        match self {
            Self::Configured { status, .. } => status.as_ref(),
            _ => None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawNeedsPolicy {
    Flag(bool),
    Settings {
        #[serde(default)]
        comment: Option<String>,
        #[serde(default)]
        status: Option<NeedsStatusPolicy>,
    },
}

impl From<RawNeedsPolicy> for NeedsPolicy {
    fn from(raw: RawNeedsPolicy) -> Self {
        match raw {
            RawNeedsPolicy::Flag(true) => Self::Always,
            RawNeedsPolicy::Flag(false) => Self::None,
            RawNeedsPolicy::Settings { comment, status } => Self::Configured { comment, status },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
/// Commit status reported on pull requests for a label family.
pub struct NeedsStatusPolicy {
    pub context: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub description: Option<StatusDescription>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum StatusDescription {
    Text(String),
    PerState {
        #[serde(default)]
        success: Option<String>,
        #[serde(default)]
        failure: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
/// Regex-derived label taken from free text in the body.
pub struct CapturePolicy {
    pub regex: String,
    pub label: String,
    #[serde(default)]
    pub ignore_case: bool,
    #[serde(default)]
    pub github_release: bool,
    #[serde(default)]
    pub author_association: Option<AuthorAssociationGate>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
/// A slash command bound to exactly one action.
pub struct ChatOpsRule {
    pub cmd: String,
    #[serde(default)]
    pub author_association: Option<AuthorAssociationGate>,
    #[serde(flatten)]
    pub action: ChatOpsAction,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
/// Enumerates supported `ChatOpsAction` values.
pub enum ChatOpsAction {
    Close,
    None,
    Assign,
    Review,
    Comment { comment: String },
    Label { label: LabelChange },
}

impl ChatOpsAction {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Close => "close",
            Self::None => "none",
            Self::Assign => "assign",
            Self::Review => "review",
            Self::Comment { .. } => "comment",
            Self::Label { .. } => "label",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LabelChange {
    #[serde(default)]
    pub add: LabelNames,
    #[serde(default)]
    pub remove: LabelNames,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
/// A single label name or a list of them.
pub enum LabelNames {
    One(String),
    Many(Vec<String>),
}

impl Default for LabelNames {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

impl LabelNames {
    /// Normalizes to a list, dropping blank names.
    pub fn to_vec(&self) -> Vec<String> {
        let names: &[String] = match self {
            Self::One(name) => std::slice::from_ref(name),
            Self::Many(names) => names,
        };
        names
            .iter()
            .filter(|name| !name.trim().is_empty())
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Automations {
    #[serde(default, alias = "autoAssignAnyFrom")]
    pub auto_assign_any_from: Vec<String>,
}

/// Decodes and validates a governance policy file.
pub fn parse_governance_config(raw: &str) -> Result<GovernanceConfig, PolicyError> {
    let config: GovernanceConfig = serde_yaml::from_str(raw)?;
    validate_governance_config(&config)?;
    Ok(config)
}

pub fn validate_governance_config(config: &GovernanceConfig) -> Result<(), PolicyError> {
    if config.version != SUPPORTED_CONFIG_VERSION {
        return Err(PolicyError::UnsupportedVersion(config.version.clone()));
    }
    if let Some(issue) = &config.issue {
        validate_governance("issue", issue)?;
    }
    if let Some(pull_request) = &config.pull_request {
        validate_governance("pull_request", pull_request)?;
    }
    Ok(())
}

fn validate_governance(section: &'static str, governance: &Governance) -> Result<(), PolicyError> {
    if governance
        .labels
        .iter()
        .any(|label| label.prefix.trim().is_empty())
    {
        return Err(PolicyError::EmptyLabelPrefix { section });
    }
    for capture in &governance.captures {
        compile_capture_regex(capture).map_err(|source| PolicyError::InvalidRegex {
            section,
            regex: capture.regex.clone(),
            source,
        })?;
    }
    if governance
        .chat_ops
        .iter()
        .any(|rule| rule.cmd.trim().is_empty())
    {
        return Err(PolicyError::EmptyChatOpsCommand { section });
    }
    Ok(())
}

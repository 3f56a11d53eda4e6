//! GitHub REST host for Tau issue and pull-request governance.

pub mod client;
pub mod comment;
pub mod config_source;
pub mod host;
mod transport;

pub use client::{GithubApiClient, RepoRef};
pub use config_source::{fetch_governance_config, read_governance_config};
pub use host::GithubGovernanceHost;

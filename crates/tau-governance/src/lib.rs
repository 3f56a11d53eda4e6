//! Issue and pull-request governance for Tau repositories.
//!
//! Turns slash commands found in issue, pull-request, and comment bodies into
//! label, comment, assignment, review, and commit-status effects according to
//! a declarative policy. All forge access goes through [`GovernanceHost`].

pub mod author_association;
pub mod automations;
pub mod capture;
pub mod chat_ops;
pub mod command;
pub mod event_context;
pub mod event_filter;
pub mod host;
pub mod label_reconcile;
pub mod operations;
pub mod policy;
pub mod webhook_payload;

#[cfg(test)]
pub(crate) mod test_support;

pub use command::{Command, CommandMatch, CommandSet};
pub use event_context::EventContext;
pub use host::{CommitState, CommitStatus, GovernanceHost};
pub use operations::run_governance;
pub use policy::{parse_governance_config, Governance, GovernanceConfig, PolicyError};

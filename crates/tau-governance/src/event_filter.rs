//! Decides whether an event should be skipped before any governance runs.
//!
//! Skipping prevents the bot from reacting to its own writes and to the
//! `labeled` events GitHub emits while an issue is still being created.

use chrono::DateTime;

use crate::event_context::EventContext;

pub const LABELED_RACE_WINDOW_MS: i64 = 5_000;

const SUBJECT_EVENTS: &[&str] = &["issues", "pull_request", "pull_request_target"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Enumerates supported `IgnoreReason` values.
pub enum IgnoreReason {
    Closed,
    LabeledRaceCondition,
    SelfSender,
    NonUserSender,
    UnsupportedTrigger,
}

impl IgnoreReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Closed => "ignore_closed",
            Self::LabeledRaceCondition => "ignore_labeled_race_condition",
            Self::SelfSender => "ignore_self_sender",
            Self::NonUserSender => "ignore_non_user_sender",
            Self::UnsupportedTrigger => "ignore_unsupported_trigger",
        }
    }
}

/// Returns why the event should be skipped, or `None` to process it.
///
/// `bot_user_id` is the id of the token owner; pass `None` when it could
/// not be resolved.
pub fn ignore_reason(context: &EventContext, bot_user_id: Option<u64>) -> Option<IgnoreReason> {
    if context.state.as_deref() == Some("closed") {
        return Some(IgnoreReason::Closed);
    }

    if is_labeled_race_condition(context) {
        return Some(IgnoreReason::LabeledRaceCondition);
    }

    if let (Some(sender), Some(bot_user_id)) = (&context.sender, bot_user_id) {
        if sender.id == bot_user_id {
            return Some(IgnoreReason::SelfSender);
        }
    }

    let user_only = context.is("issue_comment", &["created"])
        || context.is("issues", &["opened"])
        || context.is("pull_request", &["synchronize", "opened"])
        || context.is("pull_request_target", &["synchronize", "opened"]);
    if user_only {
        return if sender_is_user(context) {
            None
        } else {
            Some(IgnoreReason::NonUserSender)
        };
    }

    let label_toggle = SUBJECT_EVENTS
        .iter()
        .any(|event_name| context.is(event_name, &["labeled", "unlabeled"]));
    if label_toggle {
        return None;
    }

    Some(IgnoreReason::UnsupportedTrigger)
}

pub fn should_ignore_event(context: &EventContext, bot_user_id: Option<u64>) -> bool {
    ignore_reason(context, bot_user_id).is_some()
}

fn sender_is_user(context: &EventContext) -> bool {
    context.sender.as_ref().is_some_and(|sender| sender.is_user())
}

fn is_labeled_race_condition(context: &EventContext) -> bool {
    if context.action != "labeled" || !sender_is_user(context) {
        return false;
    }
    if !SUBJECT_EVENTS
        .iter()
        .any(|event_name| context.event_name == *event_name)
    {
        return false;
    }
    let (Some(created_at), Some(updated_at)) = (
        parse_timestamp_ms(context.created_at.as_deref()),
        parse_timestamp_ms(context.updated_at.as_deref()),
    ) else {
        return false;
    };
    created_at.saturating_add(LABELED_RACE_WINDOW_MS) >= updated_at
}

fn parse_timestamp_ms(raw: Option<&str>) -> Option<i64> {
    let raw = raw?.trim();
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|timestamp| timestamp.timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::{ignore_reason, should_ignore_event, IgnoreReason};
    use crate::event_context::{EventContext, EventSender};

    fn context(event_name: &str, action: &str, sender_kind: &str) -> EventContext {
        EventContext {
            event_name: event_name.to_string(),
            action: action.to_string(),
            sender: Some(EventSender {
                login: "someone".to_string(),
                id: 10,
                kind: Some(sender_kind.to_string()),
            }),
            state: Some("open".to_string()),
            ..EventContext::default()
        }
    }

    #[test]
    fn unit_ignore_reason_accepts_user_created_and_opened_events() {
        assert_eq!(ignore_reason(&context("issue_comment", "created", "User"), None), None);
        assert_eq!(ignore_reason(&context("issues", "opened", "User"), None), None);
        assert_eq!(ignore_reason(&context("pull_request", "synchronize", "User"), None), None);
        assert_eq!(
            ignore_reason(&context("pull_request_target", "opened", "User"), None),
            None
        );
    }

    #[test]
    fn unit_ignore_reason_rejects_bot_senders_on_user_only_triggers() {
        assert_eq!(
            ignore_reason(&context("issue_comment", "created", "Bot"), None),
            Some(IgnoreReason::NonUserSender)
        );
        let mut missing_sender = context("issues", "opened", "User");
        missing_sender.sender = None;
        assert!(should_ignore_event(&missing_sender, None));
    }

    #[test]
    fn functional_ignore_reason_accepts_label_toggles_from_any_sender() {
        assert_eq!(ignore_reason(&context("issues", "unlabeled", "Bot"), None), None);
        assert_eq!(ignore_reason(&context("pull_request", "labeled", "Bot"), None), None);
    }

    #[test]
    fn functional_ignore_reason_rejects_closed_self_and_unsupported_events() {
        let mut closed = context("issues", "opened", "User");
        closed.state = Some("closed".to_string());
        assert_eq!(ignore_reason(&closed, None), Some(IgnoreReason::Closed));

        assert_eq!(
            ignore_reason(&context("issues", "opened", "User"), Some(10)),
            Some(IgnoreReason::SelfSender)
        );
        assert_eq!(
            ignore_reason(&context("issue_comment", "edited", "User"), None),
            Some(IgnoreReason::UnsupportedTrigger)
        );
        assert_eq!(
            ignore_reason(&context("push", "", "User"), None),
            Some(IgnoreReason::UnsupportedTrigger)
        );
    }

    #[test]
    fn regression_ignore_reason_skips_labeled_events_fired_during_creation() {
        let mut racing = context("issues", "labeled", "User");
        racing.created_at = Some("2026-01-01T00:00:00Z".to_string());
        racing.updated_at = Some("2026-01-01T00:00:04Z".to_string());
        assert_eq!(
            ignore_reason(&racing, None),
            Some(IgnoreReason::LabeledRaceCondition)
        );

        let mut settled = racing.clone();
        settled.updated_at = Some("2026-01-01T00:00:06Z".to_string());
        assert_eq!(ignore_reason(&settled, None), None);

        let mut bot = racing.clone();
        bot.sender.as_mut().expect("sender").kind = Some("Bot".to_string());
        assert_eq!(ignore_reason(&bot, None), None);

        let mut unparsable = racing;
        unparsable.created_at = Some("not-a-date".to_string());
        assert_eq!(ignore_reason(&unparsable, None), None);
    }
}

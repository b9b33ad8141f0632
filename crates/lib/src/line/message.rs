//! Outbound message objects for the reply API.

use serde::Serialize;

/// A message object in a reply request's `messages` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OutboundMessage {
    Template {
        /// Shown in notifications and on clients that cannot render templates.
        #[serde(rename = "altText")]
        alt_text: &'static str,
        template: Template,
    },
}

/// Template body. A confirm template always carries exactly two actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Template {
    Confirm {
        text: &'static str,
        actions: [Action; 2],
    },
}

/// Action attached to a template button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Action {
    /// Tapping sends `text` back as a user message; `label` is the button caption.
    Message {
        label: &'static str,
        text: &'static str,
    },
}

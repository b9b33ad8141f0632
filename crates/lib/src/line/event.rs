//! Inbound webhook events.

use serde::Deserialize;

/// Webhook POST body. LINE sends the envelope; a bare event array is accepted too.
#[derive(Debug)]
pub enum WebhookPayload {
    Envelope(Envelope),
    Events(Vec<Event>),
}

/// `{"destination": ..., "events": [...]}` as LINE delivers it.
#[derive(Debug, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub destination: Option<String>,
    pub events: Vec<Event>,
}

impl WebhookPayload {
    /// Parse a raw body. The shape is picked from the first non-whitespace byte so a
    /// malformed body reports serde's own field and position.
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        let first = body.iter().find(|b| !b.is_ascii_whitespace());
        if first == Some(&b'[') {
            serde_json::from_slice(body).map(WebhookPayload::Events)
        } else {
            serde_json::from_slice(body).map(WebhookPayload::Envelope)
        }
    }

    pub fn into_events(self) -> Vec<Event> {
        match self {
            WebhookPayload::Envelope(envelope) => envelope.events,
            WebhookPayload::Events(events) => events,
        }
    }
}

/// One webhook event, tagged by its `type` field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Event {
    /// `replyToken` is absent for events delivered in standby mode.
    Message {
        #[serde(rename = "replyToken", default)]
        reply_token: Option<String>,
        message: MessageContent,
    },
    Postback {
        #[serde(rename = "replyToken", default)]
        reply_token: Option<String>,
        postback: Postback,
    },
    Follow,
    Unfollow,
    Join,
    Leave,
    #[serde(other)]
    Other,
}

impl Event {
    /// Short kind name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::Message { .. } => "message",
            Event::Postback { .. } => "postback",
            Event::Follow => "follow",
            Event::Unfollow => "unfollow",
            Event::Join => "join",
            Event::Leave => "leave",
            Event::Other => "other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Postback {
    pub data: String,
}

/// Body of a message event, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MessageContent {
    Text { text: String },
    Image,
    Video,
    Audio,
    File,
    Location,
    Sticker,
    #[serde(other)]
    Other,
}

//! Survey webhook: verify the LINE signature, parse events, and answer the trigger text
//! with the co-working confirm template.

use std::sync::Arc;

use axum::http::StatusCode;
use thiserror::Error;

use crate::line::{
    signature, Action, Event, LineError, MessageContent, OutboundMessage, ReplySender, Template,
    WebhookPayload,
};

/// Inbound text that triggers the survey. Matched exactly: no trimming, no case folding.
pub const TRIGGER_TEXT: &str = "アンケート";

/// Confirm template sent in reply to [`TRIGGER_TEXT`].
pub const SURVEY_TEMPLATE: OutboundMessage = OutboundMessage::Template {
    alt_text: "this is a confirm template",
    template: Template::Confirm {
        text: "今日のもくもく会は楽しいですか？",
        actions: [
            Action::Message {
                label: "楽しい",
                text: "楽しい",
            },
            Action::Message {
                label: "楽しくない",
                text: "楽しくない",
            },
        ],
    },
};

/// A fresh copy of [`SURVEY_TEMPLATE`].
pub fn survey_template() -> OutboundMessage {
    SURVEY_TEMPLATE
}

/// Faults that abort a webhook request (500).
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("parsing webhook body: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("sending reply: {0}")]
    Send(#[from] LineError),
}

/// Per-request webhook logic. Built once at startup, immutable afterwards.
pub struct SurveyHandler {
    channel_secret: String,
    sender: Arc<dyn ReplySender>,
    halt_on_invalid_signature: bool,
}

impl SurveyHandler {
    pub fn new(channel_secret: impl Into<String>, sender: Arc<dyn ReplySender>) -> Self {
        Self {
            channel_secret: channel_secret.into(),
            sender,
            halt_on_invalid_signature: false,
        }
    }

    /// Drop the events of a request whose signature fails instead of processing them anyway.
    pub fn halt_on_invalid_signature(mut self, halt: bool) -> Self {
        self.halt_on_invalid_signature = halt;
        self
    }

    /// Handle one webhook POST. Returns 400 when the signature fails and 200 otherwise.
    ///
    /// A failed signature does not stop processing unless `halt_on_invalid_signature` is set;
    /// the events are still parsed and answered and the 400 is returned at the end.
    pub async fn handle(
        &self,
        body: &[u8],
        signature_header: Option<&str>,
    ) -> Result<StatusCode, WebhookError> {
        let mut status = StatusCode::OK;
        if let Err(e) = signature::verify(&self.channel_secret, body, signature_header) {
            log::warn!("line webhook: {}", e);
            status = StatusCode::BAD_REQUEST;
            if self.halt_on_invalid_signature {
                return Ok(status);
            }
        }

        let events = WebhookPayload::from_slice(body)?.into_events();
        let mut replies = 0usize;
        for event in &events {
            match survey_reply_token(event) {
                Some(reply_token) => {
                    self.sender.reply(reply_token, &[survey_template()]).await?;
                    replies += 1;
                }
                None => log::debug!("line webhook: skipping {} event", event.kind()),
            }
        }
        log::info!(
            "line webhook: {} event(s), {} survey reply(s) sent",
            events.len(),
            replies
        );
        Ok(status)
    }
}

/// Reply token of an event that should get the survey, i.e. a text message equal to the trigger.
fn survey_reply_token(event: &Event) -> Option<&str> {
    match event {
        Event::Message {
            reply_token,
            message,
        } => match message {
            // Standby-mode events carry no token and cannot be answered.
            MessageContent::Text { text } if text == TRIGGER_TEXT => reply_token.as_deref(),
            MessageContent::Text { .. }
            | MessageContent::Image
            | MessageContent::Video
            | MessageContent::Audio
            | MessageContent::File
            | MessageContent::Location
            | MessageContent::Sticker
            | MessageContent::Other => None,
        },
        Event::Postback { .. }
        | Event::Follow
        | Event::Unfollow
        | Event::Join
        | Event::Leave
        | Event::Other => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    const SECRET: &str = "channel-secret";

    /// Records every reply; fails on the token `"fail"`.
    #[derive(Default)]
    struct RecordingSender {
        sent: Mutex<Vec<(String, Vec<OutboundMessage>)>>,
    }

    impl RecordingSender {
        fn tokens(&self) -> Vec<String> {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .map(|(t, _)| t.clone())
                .collect()
        }
    }

    #[async_trait]
    impl ReplySender for RecordingSender {
        async fn reply(
            &self,
            reply_token: &str,
            messages: &[OutboundMessage],
        ) -> Result<(), LineError> {
            if reply_token == "fail" {
                return Err(LineError::EmptyReplyToken);
            }
            self.sent
                .lock()
                .unwrap()
                .push((reply_token.to_string(), messages.to_vec()));
            Ok(())
        }
    }

    fn handler() -> (SurveyHandler, Arc<RecordingSender>) {
        let sender = Arc::new(RecordingSender::default());
        (SurveyHandler::new(SECRET, sender.clone()), sender)
    }

    fn text_event(token: &str, text: &str) -> serde_json::Value {
        json!({
            "type": "message",
            "replyToken": token,
            "message": { "type": "text", "text": text }
        })
    }

    fn body(events: Vec<serde_json::Value>) -> Vec<u8> {
        serde_json::to_vec(&json!({ "destination": "U0", "events": events })).unwrap()
    }

    async fn post(h: &SurveyHandler, body: &[u8]) -> Result<StatusCode, WebhookError> {
        let sig = signature::sign(SECRET, body);
        h.handle(body, Some(&sig)).await
    }

    #[tokio::test]
    async fn trigger_text_gets_one_survey_reply() {
        let (h, sender) = handler();
        let body = r#"[{"type":"message","message":{"type":"text","text":"アンケート"},"replyToken":"abc123"}]"#
            .as_bytes();
        let status = post(&h, body).await.unwrap();
        assert_eq!(status, StatusCode::OK);
        let sent = sender.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "abc123");
        assert_eq!(sent[0].1, vec![SURVEY_TEMPLATE]);
    }

    #[tokio::test]
    async fn near_misses_get_no_reply() {
        let (h, sender) = handler();
        let body = body(vec![
            text_event("t1", ""),
            text_event("t2", " アンケート"),
            text_event("t3", "アンケート\n"),
            text_event("t4", "ｱﾝｹｰﾄ"),
            text_event("t5", "あんけーと"),
            text_event("t6", "hello"),
        ]);
        assert_eq!(post(&h, &body).await.unwrap(), StatusCode::OK);
        assert!(sender.tokens().is_empty());
    }

    #[tokio::test]
    async fn non_text_and_non_message_events_are_ignored() {
        let (h, sender) = handler();
        let body = body(vec![
            json!({ "type": "follow", "replyToken": "f" }),
            json!({ "type": "unfollow" }),
            json!({ "type": "postback", "replyToken": "p", "postback": { "data": "アンケート" } }),
            json!({ "type": "message", "replyToken": "s", "message": { "type": "sticker" } }),
            json!({ "type": "beacon", "replyToken": "b", "text": "アンケート" }),
        ]);
        assert_eq!(post(&h, &body).await.unwrap(), StatusCode::OK);
        assert!(sender.tokens().is_empty());
    }

    #[tokio::test]
    async fn only_matching_events_are_answered_in_order() {
        let (h, sender) = handler();
        let body = body(vec![
            text_event("a", "アンケート"),
            text_event("b", "other"),
            json!({ "type": "follow", "replyToken": "c" }),
            text_event("d", "アンケート"),
            text_event("e", "アンケート"),
        ]);
        assert_eq!(post(&h, &body).await.unwrap(), StatusCode::OK);
        assert_eq!(sender.tokens(), vec!["a", "d", "e"]);
    }

    #[tokio::test]
    async fn invalid_signature_returns_400_but_still_replies() {
        let (h, sender) = handler();
        let body = body(vec![text_event("abc123", "アンケート")]);
        let bad = signature::sign("wrong-secret", &body);
        assert_eq!(
            h.handle(&body, Some(&bad)).await.unwrap(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(h.handle(&body, None).await.unwrap(), StatusCode::BAD_REQUEST);
        assert_eq!(sender.tokens(), vec!["abc123", "abc123"]);
    }

    #[tokio::test]
    async fn halt_on_invalid_signature_drops_events() {
        let sender = Arc::new(RecordingSender::default());
        let h = SurveyHandler::new(SECRET, sender.clone()).halt_on_invalid_signature(true);
        let body = body(vec![text_event("abc123", "アンケート")]);
        assert_eq!(
            h.handle(&body, Some("AAAA")).await.unwrap(),
            StatusCode::BAD_REQUEST
        );
        assert!(sender.tokens().is_empty());

        assert_eq!(post(&h, &body).await.unwrap(), StatusCode::OK);
        assert_eq!(sender.tokens(), vec!["abc123"]);
    }

    #[tokio::test]
    async fn malformed_body_is_a_parse_error() {
        let (h, sender) = handler();
        let err = post(&h, b"{\"events\": [").await.unwrap_err();
        assert!(matches!(err, WebhookError::Parse(_)));
        assert!(sender.tokens().is_empty());
    }

    #[tokio::test]
    async fn send_failure_aborts_remaining_events() {
        let (h, sender) = handler();
        let body = body(vec![
            text_event("a", "アンケート"),
            text_event("fail", "アンケート"),
            text_event("c", "アンケート"),
        ]);
        let err = post(&h, &body).await.unwrap_err();
        assert!(matches!(err, WebhookError::Send(_)));
        assert_eq!(sender.tokens(), vec!["a"]);
    }

    #[tokio::test]
    async fn standby_events_without_reply_token_are_skipped() {
        let (h, sender) = handler();
        let body = body(vec![
            json!({ "type": "message", "mode": "standby", "message": { "type": "text", "text": "hello" } }),
            text_event("abc123", "アンケート"),
            json!({ "type": "message", "mode": "standby", "message": { "type": "text", "text": "アンケート" } }),
        ]);
        assert_eq!(post(&h, &body).await.unwrap(), StatusCode::OK);
        assert_eq!(sender.tokens(), vec!["abc123"]);
    }

    #[test]
    fn template_is_stable() {
        let a = serde_json::to_string(&survey_template()).unwrap();
        let b = serde_json::to_string(&survey_template()).unwrap();
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_value(survey_template()).unwrap(),
            json!({
                "type": "template",
                "altText": "this is a confirm template",
                "template": {
                    "type": "confirm",
                    "text": "今日のもくもく会は楽しいですか？",
                    "actions": [
                        { "type": "message", "label": "楽しい", "text": "楽しい" },
                        { "type": "message", "label": "楽しくない", "text": "楽しくない" }
                    ]
                }
            })
        );
    }
}

//! LINE reply API client.

use async_trait::async_trait;
use serde::Serialize;

use super::error::LineError;
use super::message::OutboundMessage;

/// Sends reply messages addressed by a webhook reply token.
#[async_trait]
pub trait ReplySender: Send + Sync {
    async fn reply(&self, reply_token: &str, messages: &[OutboundMessage]) -> Result<(), LineError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplyRequest<'a> {
    reply_token: &'a str,
    messages: &'a [OutboundMessage],
}

/// Reply API client: bearer-authenticated POST to `/v2/bot/message/reply`.
pub struct LineClient {
    api_base: String,
    channel_access_token: String,
    client: reqwest::Client,
}

impl LineClient {
    pub fn new(api_base: impl Into<String>, channel_access_token: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into().trim_end_matches('/').to_string(),
            channel_access_token: channel_access_token.into(),
            client: reqwest::Client::new(),
        }
    }

    fn reply_url(&self) -> String {
        format!("{}/v2/bot/message/reply", self.api_base)
    }
}

#[async_trait]
impl ReplySender for LineClient {
    async fn reply(&self, reply_token: &str, messages: &[OutboundMessage]) -> Result<(), LineError> {
        if reply_token.is_empty() {
            return Err(LineError::EmptyReplyToken);
        }
        let res = self
            .client
            .post(self.reply_url())
            .bearer_auth(&self.channel_access_token)
            .json(&ReplyRequest {
                reply_token,
                messages,
            })
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(LineError::Status { status, body });
        }
        log::debug!("line reply sent ({} message(s))", messages.len());
        Ok(())
    }
}

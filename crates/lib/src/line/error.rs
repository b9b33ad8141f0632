//! Error types for the LINE channel.

use thiserror::Error;

/// Why an X-Line-Signature check failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("signature header missing")]
    Missing,
    #[error("signature is not valid base64")]
    Malformed,
    #[error("signature does not match body")]
    Mismatch,
}

/// Failures talking to the LINE reply API.
#[derive(Debug, Error)]
pub enum LineError {
    #[error("reply token is empty")]
    EmptyReplyToken,
    #[error("reply request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("reply API returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
}

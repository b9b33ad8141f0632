//! LINE Messaging API: webhook signature, inbound events, outbound messages, and the reply client.
//!
//! Inbound payloads are closed tagged unions so the survey handler can match them exhaustively.

mod client;
mod error;
mod event;
mod message;
pub mod signature;

pub use client::{LineClient, ReplySender};
pub use error::{LineError, SignatureError};
pub use event::{Envelope, Event, MessageContent, WebhookPayload};
pub use message::{Action, OutboundMessage, Template};

/// Production API host.
pub const DEFAULT_API_BASE: &str = "https://api.line.me";

/// Header LINE puts the body signature in.
pub const SIGNATURE_HEADER: &str = "x-line-signature";

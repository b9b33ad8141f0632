//! Gateway: HTTP server for the LINE webhook.
//!
//! Single port serves the webhook callback and a health probe.

mod server;

pub use server::{router, run_gateway, GatewayState};

//! mokumoku core library: LINE webhook verification, event types, the survey reply,
//! and the gateway server used by the CLI.

pub mod config;
pub mod gateway;
pub mod init;
pub mod line;
pub mod survey;

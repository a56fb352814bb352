//! Command handler port module
//!
use async_trait::async_trait;
use serde_json::Value;

/// Command handler trait
///
/// Implemented by whatever sits behind a [`crate::ConnectionServer`]: the
/// router dispatches admin/route commands, a worker answers ping/work
/// requests. A handler never fails; negative outcomes are reported inside
/// the reply envelope.
#[async_trait]
pub trait CommandHandler: Send + Sync + 'static {
    /// Handle one decoded command and produce the reply
    async fn handle(&self, command: Value) -> Value;
}

//! Worker handler module
//!
use async_trait::async_trait;
use ringlb_wire::CommandHandler;
use serde_json::{Value, json};
use std::time::Duration;

/// Answers pings and acknowledges everything else
pub struct WorkerHandler {
    lag: Duration,
}

impl WorkerHandler {
    /// Create a handler with a synthetic per-request lag
    pub fn new(lag: Duration) -> Self {
        Self { lag }
    }
}

#[async_trait]
impl CommandHandler for WorkerHandler {
    async fn handle(&self, command: Value) -> Value {
        if !self.lag.is_zero() {
            tokio::time::sleep(self.lag).await;
        }
        if command.get("cmd").and_then(Value::as_str) == Some("ping") {
            json!({"status": "alive"})
        } else {
            json!({"status": "ok"})
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ping_answers_alive() {
        let handler = WorkerHandler::new(Duration::ZERO);
        let reply = handler.handle(json!({"cmd": "ping"})).await;
        assert_eq!(reply, json!({"status": "alive"}));
    }

    #[tokio::test]
    async fn anything_else_answers_ok() {
        let handler = WorkerHandler::new(Duration::ZERO);
        let reply = handler.handle(json!({"key": 12, "data": 12})).await;
        assert_eq!(reply, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn lag_delays_the_reply() {
        let handler = WorkerHandler::new(Duration::from_millis(30));
        let started = tokio::time::Instant::now();
        handler.handle(json!({"cmd": "work"})).await;
        assert!(started.elapsed() >= Duration::from_millis(30));
    }
}

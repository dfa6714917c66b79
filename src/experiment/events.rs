//! Progress events for a single kill session
//!
//! Engine stages push typed events into an unbounded channel; the transport
//! (SSE handler, CLI printer, test) drains the receiving end. A dropped
//! receiver is ignored so a disconnected listener never stops the session.

use serde::{Deserialize, Serialize};
use strum::Display;
use tokio::sync::mpsc;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, ToSchema)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProgressKind {
    Info,
    Kill,
    Replacement,
    Recovery,
    Success,
    Error,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ProgressEvent {
    #[serde(rename = "type")]
    pub kind: ProgressKind,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct EventEmitter {
    tx: Option<mpsc::UnboundedSender<ProgressEvent>>,
}

impl EventEmitter {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// An emitter with no listener, for callers that only want the report
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn emit(&self, kind: ProgressKind, message: impl Into<String>) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(ProgressEvent {
                kind,
                message: message.into(),
            });
        }
    }

    pub fn info(&self, message: impl Into<String>) {
        self.emit(ProgressKind::Info, message);
    }

    pub fn kill(&self, message: impl Into<String>) {
        self.emit(ProgressKind::Kill, message);
    }

    pub fn replacement(&self, message: impl Into<String>) {
        self.emit(ProgressKind::Replacement, message);
    }

    pub fn recovery(&self, message: impl Into<String>) {
        self.emit(ProgressKind::Recovery, message);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.emit(ProgressKind::Success, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.emit(ProgressKind::Error, message);
    }

    pub fn done(&self, message: impl Into<String>) {
        self.emit(ProgressKind::Done, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_wire_format() {
        let event = ProgressEvent {
            kind: ProgressKind::Kill,
            message: "Killed pod web-1".to_string(),
        };
        let line = serde_json::to_string(&event).unwrap();
        assert_eq!(line, r#"{"type":"kill","message":"Killed pod web-1"}"#);
    }

    #[tokio::test]
    async fn test_emitter_survives_dropped_listener() {
        let (emitter, rx) = EventEmitter::channel();
        drop(rx);
        emitter.info("nobody is listening");
        emitter.done("still fine");
    }

    #[tokio::test]
    async fn test_events_arrive_in_order() {
        let (emitter, mut rx) = EventEmitter::channel();
        emitter.kill("a");
        emitter.done("b");
        drop(emitter);

        assert_eq!(rx.recv().await.unwrap().kind, ProgressKind::Kill);
        assert_eq!(rx.recv().await.unwrap().kind, ProgressKind::Done);
        assert!(rx.recv().await.is_none());
    }
}

//! Domain events emitted by the engine.
//!
//! Events are audit data, never control flow: a failing [`EventSink`] is
//! logged and otherwise ignored.
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{info, warn};

pub const EVENT_ENTER: &str = "chat_night.enter";
pub const EVENT_MATCH: &str = "chat_night.match";
pub const EVENT_ENGAGE: &str = "chat_night.engage";
pub const EVENT_UNLOCKED: &str = "chat_night.unlocked";

/// Replacement for sensitive payload values.
pub const REDACTED: &str = "[REDACTED]";

const SENSITIVE_KEYS: [&str; 4] = ["password", "token", "access_token", "secret"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatNightEvent {
    pub name: String,
    pub source: String,
    pub user_id: Option<String>,
    pub payload: Map<String, Value>,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Error)]
#[error("event sink failure: {0}")]
pub struct EventSinkError(pub String);

/// Destination for [`ChatNightEvent`]s.
pub trait EventSink: Send + Sync {
    fn record(&self, event: &ChatNightEvent) -> Result<(), EventSinkError>;
}

/// Replace the values of sensitive top-level keys (case-insensitive).
pub fn redact_payload(payload: Map<String, Value>) -> Map<String, Value> {
    payload
        .into_iter()
        .map(|(key, value)| {
            let lowered = key.to_lowercase();
            if SENSITIVE_KEYS.contains(&lowered.as_str()) {
                (key, Value::String(REDACTED.to_string()))
            } else {
                (key, value)
            }
        })
        .collect()
}

/// Writes events as structured `tracing` records.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn record(&self, event: &ChatNightEvent) -> Result<(), EventSinkError> {
        let payload = serde_json::to_string(&event.payload)
            .map_err(|e| EventSinkError(e.to_string()))?;
        info!(
            target: "chatnight::events",
            event = %event.name,
            source = %event.source,
            user_id = ?event.user_id,
            payload = %payload,
            "chat_night_event"
        );
        Ok(())
    }
}

/// Keeps events in memory. Used by tests and local tooling.
#[derive(Debug, Default)]
pub struct MemoryEventSink {
    events: Mutex<Vec<ChatNightEvent>>,
}

impl MemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ChatNightEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn named(&self, name: &str) -> Vec<ChatNightEvent> {
        self.events()
            .into_iter()
            .filter(|event| event.name == name)
            .collect()
    }
}

impl EventSink for MemoryEventSink {
    fn record(&self, event: &ChatNightEvent) -> Result<(), EventSinkError> {
        self.events
            .lock()
            .map_err(|_| EventSinkError("memory sink lock poisoned".into()))?
            .push(event.clone());
        Ok(())
    }
}

/// Best-effort emitter used by the engine.
#[derive(Clone)]
pub(crate) struct EventLog {
    sink: Arc<dyn EventSink>,
}

impl EventLog {
    pub(crate) fn new(sink: Arc<dyn EventSink>) -> Self {
        Self { sink }
    }

    pub(crate) fn emit(&self, name: &str, user_id: Option<&str>, payload: Value, at: DateTime<Utc>) {
        let payload = match payload {
            Value::Object(map) => redact_payload(map),
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                map
            }
        };
        let event = ChatNightEvent {
            name: name.to_string(),
            source: "backend".to_string(),
            user_id: user_id.map(str::to_string),
            payload,
            at,
        };
        if let Err(err) = self.sink.record(&event) {
            warn!(event = name, error = %err, "event_sink_failure");
        }
    }
}

// Copyright 2026 Daniel Pelikan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Plugin events and the web runtime they are delivered to.

use anyhow::{anyhow, Result};
use serde::Serialize;
use std::io::Write;

use crate::wearable::TimerSession;

/// Event name for sessions received from the watch.
pub const EVENT_TIMER_SESSION: &str = "timerSessionReceived";

/// A named event handed to the web runtime.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PluginEvent {
    pub event: String,
    pub data: serde_json::Value,
}

impl PluginEvent {
    pub fn new(event: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }

    /// Build a `timerSessionReceived` event. Absent optional fields are left out.
    pub fn timer_session(session: &TimerSession) -> Result<Self> {
        Ok(Self::new(EVENT_TIMER_SESSION, serde_json::to_value(session)?))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// The embedded web runtime receiving plugin events.
pub trait WebRuntime: Send + Sync {
    /// Deliver an event to the runtime's listeners.
    fn notify_listeners(&self, event: PluginEvent) -> Result<()>;
}

/// Runtime backed by an async channel.
pub struct ChannelRuntime {
    tx: async_channel::Sender<PluginEvent>,
}

impl ChannelRuntime {
    /// Create a runtime and the receiving end of its event stream.
    pub fn new() -> (Self, async_channel::Receiver<PluginEvent>) {
        let (tx, rx) = async_channel::unbounded();
        (Self { tx }, rx)
    }
}

impl WebRuntime for ChannelRuntime {
    fn notify_listeners(&self, event: PluginEvent) -> Result<()> {
        self.tx
            .try_send(event)
            .map_err(|e| anyhow!("Web runtime channel unavailable: {}", e))
    }
}

/// Runtime writing one JSON line per event to stdout.
pub struct StdoutRuntime;

impl WebRuntime for StdoutRuntime {
    fn notify_listeners(&self, event: PluginEvent) -> Result<()> {
        let line = event.to_json()?;
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}", line)?;
        stdout.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_timer_session_event_full() {
        let session = TimerSession::new(1000, 4000, 50)
            .with_title("Focus")
            .with_task_id("abc");
        let event = PluginEvent::timer_session(&session).unwrap();

        assert_eq!(event.event, "timerSessionReceived");
        assert_eq!(
            event.data,
            json!({
                "title": "Focus",
                "startTimeMillis": 1000,
                "endTimeMillis": 4000,
                "durationMinutes": 50,
                "taskId": "abc"
            })
        );
    }

    #[test]
    fn test_timer_session_event_required_only() {
        let event = PluginEvent::timer_session(&TimerSession::new(1000, 4000, 50)).unwrap();
        let data = event.data.as_object().unwrap();

        assert_eq!(data.len(), 3);
        assert!(!data.contains_key("title"));
        assert!(!data.contains_key("taskId"));
    }

    #[test]
    fn test_event_json() {
        let event = PluginEvent::new("ping", json!({"ok": true}));
        assert_eq!(event.to_json().unwrap(), r#"{"event":"ping","data":{"ok":true}}"#);
    }

    #[test]
    fn test_channel_runtime() {
        let (runtime, rx) = ChannelRuntime::new();
        runtime
            .notify_listeners(PluginEvent::new("ping", json!(null)))
            .unwrap();
        assert_eq!(rx.try_recv().unwrap().event, "ping");

        drop(rx);
        assert!(runtime
            .notify_listeners(PluginEvent::new("ping", json!(null)))
            .is_err());
    }
}

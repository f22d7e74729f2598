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

//! Receiver for messages arriving from the wearable.

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::protocol::{self, MessageEvent, TimerSession};
use crate::broadcast::{Broadcast, LocalBroadcast};
use crate::error::{RelayError, Result};
use crate::state::BridgeState;

/// Listens for wearable messages and republishes decoded timer sessions
/// on the local relay channel.
pub struct WearableDataService {
    path_prefix: String,
    broadcast: Arc<LocalBroadcast>,
    state: Arc<BridgeState>,
}

impl WearableDataService {
    /// Create a new receiver.
    pub fn new(
        path_prefix: impl Into<String>,
        broadcast: Arc<LocalBroadcast>,
        state: Arc<BridgeState>,
    ) -> Self {
        Self {
            path_prefix: path_prefix.into(),
            broadcast,
            state,
        }
    }

    pub fn path_prefix(&self) -> &str {
        &self.path_prefix
    }

    pub fn on_create(&self) {
        debug!("WearableDataService created (prefix {})", self.path_prefix);
    }

    pub fn on_destroy(&self) {
        debug!("WearableDataService destroyed");
    }

    /// Entry point for the wearable channel. Failures are logged here and
    /// never propagate to the caller.
    pub fn on_message_received(&self, event: &MessageEvent) {
        debug!(
            "Message received: path={} source={} ({} bytes)",
            event.path,
            event.source_node_id,
            event.data.len()
        );
        self.state.record_received();

        match self.handle_message(event) {
            Ok(session) => {
                debug!("Timer session relayed: {}", session);
            }
            Err(RelayError::UnrecognizedPath(path)) => {
                info!("Ignoring message with path: {}", path);
                self.state.record_ignored();
            }
            Err(e @ RelayError::MalformedPayload(_)) => {
                warn!("Dropping message from {}: {}", event.source_node_id, e);
                self.state.record_dropped();
            }
        }
    }

    /// Check the path, decode the body and publish it.
    pub fn handle_message(&self, event: &MessageEvent) -> Result<TimerSession> {
        if !event.matches_prefix(&self.path_prefix) {
            return Err(RelayError::UnrecognizedPath(event.path.clone()));
        }

        let session = protocol::decode(&event.data)?;
        debug!(
            "Session parsed successfully - duration: {} minutes",
            session.duration_minutes
        );

        let delivered = self
            .broadcast
            .send_broadcast(Broadcast::timer_session(session.clone()));
        debug!("Timer session broadcast to {} receiver(s)", delivered);

        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::ACTION_TIMER_SESSION;
    use crate::wearable::{PATH_PREFIX, PATH_TIMER_SYNC};

    fn service() -> (WearableDataService, Arc<LocalBroadcast>, Arc<BridgeState>) {
        let bus = LocalBroadcast::new();
        let state = BridgeState::new();
        let service = WearableDataService::new(PATH_PREFIX, bus.clone(), state.clone());
        (service, bus, state)
    }

    #[test]
    fn test_valid_message_is_broadcast() {
        let (service, bus, _) = service();
        let (_, mut rx) = bus.register_receiver(ACTION_TIMER_SESSION);

        let event = MessageEvent::new(
            PATH_TIMER_SYNC,
            "watch-1",
            r#"{"title":"Focus","startTimeMillis":1000,"endTimeMillis":4000,"durationMinutes":50,"taskId":"abc"}"#,
        );
        let session = service.handle_message(&event).unwrap();

        let broadcast = rx.try_recv().unwrap();
        assert_eq!(broadcast.action, ACTION_TIMER_SESSION);
        assert_eq!(broadcast.session, session);
        assert_eq!(session.task_id.as_deref(), Some("abc"));
    }

    #[test]
    fn test_suffix_not_enforced() {
        let (service, bus, _) = service();
        let (_, mut rx) = bus.register_receiver(ACTION_TIMER_SESSION);

        let event = MessageEvent::new(
            "/mandalaplan/anything",
            "watch-1",
            r#"{"startTimeMillis":1,"endTimeMillis":2,"durationMinutes":3}"#,
        );
        assert!(service.handle_message(&event).is_ok());
        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn test_unrecognized_path_skips_decode() {
        let (service, bus, state) = service();
        let (_, mut rx) = bus.register_receiver(ACTION_TIMER_SESSION);

        // Body is garbage: if decoding ran we would see MalformedPayload instead
        let event = MessageEvent::new("/other/topic", "watch-1", "garbage");
        assert!(matches!(
            service.handle_message(&event),
            Err(RelayError::UnrecognizedPath(p)) if p == "/other/topic"
        ));

        service.on_message_received(&event);
        assert!(rx.try_recv().is_err());
        assert_eq!(state.get_stats().ignored, 1);
        assert_eq!(state.get_stats().dropped, 0);
    }

    #[test]
    fn test_malformed_payload_dropped() {
        let (service, bus, state) = service();
        let (_, mut rx) = bus.register_receiver(ACTION_TIMER_SESSION);

        let event = MessageEvent::new(PATH_TIMER_SYNC, "watch-1", r#"{"startTimeMillis":"oops"}"#);
        assert!(matches!(
            service.handle_message(&event),
            Err(RelayError::MalformedPayload(_))
        ));

        service.on_message_received(&event);
        assert!(rx.try_recv().is_err());
        assert_eq!(state.get_stats().received, 1);
        assert_eq!(state.get_stats().dropped, 1);
    }

    #[test]
    fn test_custom_prefix() {
        let bus = LocalBroadcast::new();
        let service = WearableDataService::new("/custom", bus, BridgeState::new());
        assert_eq!(service.path_prefix(), "/custom");

        let body = r#"{"startTimeMillis":1,"endTimeMillis":2,"durationMinutes":3}"#;
        let event = MessageEvent::new(PATH_TIMER_SYNC, "watch-1", body);
        assert!(matches!(
            service.handle_message(&event),
            Err(RelayError::UnrecognizedPath(_))
        ));

        let event = MessageEvent::new("/custom/timer-sync", "watch-1", body);
        assert!(service.handle_message(&event).is_ok());
    }
}

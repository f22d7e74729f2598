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

//! WearSync plugin: forwards relayed timer sessions to the web runtime.

use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::broadcast::{Broadcast, LocalBroadcast, ReceiverId, ACTION_TIMER_SESSION};
use crate::events::{PluginEvent, WebRuntime};
use crate::state::BridgeState;

/// Name the plugin is registered under in the web runtime.
pub const PLUGIN_NAME: &str = "WearSync";

/// Response to the `isAvailable` query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AvailabilityResponse {
    pub available: bool,
}

/// Live relay listener registration.
struct ListenerRegistration {
    id: ReceiverId,
    task: JoinHandle<()>,
}

/// Bridge between the local relay channel and the web runtime.
pub struct WearSyncPlugin {
    broadcast: Arc<LocalBroadcast>,
    runtime: Arc<dyn WebRuntime>,
    state: Arc<BridgeState>,
    registration: Mutex<Option<ListenerRegistration>>,
}

impl WearSyncPlugin {
    /// Create a new plugin. Nothing is registered until [`load`](Self::load).
    pub fn new(
        broadcast: Arc<LocalBroadcast>,
        runtime: Arc<dyn WebRuntime>,
        state: Arc<BridgeState>,
    ) -> Self {
        Self {
            broadcast,
            runtime,
            state,
            registration: Mutex::new(None),
        }
    }

    /// Register the relay listener and start forwarding.
    ///
    /// Must be called from within a tokio runtime; otherwise the plugin
    /// stays unregistered.
    pub fn load(&self) {
        let mut registration = self.registration.lock();
        if registration.is_some() {
            warn!("{} plugin already loaded", PLUGIN_NAME);
            return;
        }

        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                error!("{} plugin not loaded, no async runtime: {}", PLUGIN_NAME, e);
                return;
            }
        };

        let (id, rx) = self.broadcast.register_receiver(ACTION_TIMER_SESSION);
        let runtime = self.runtime.clone();
        let state = self.state.clone();
        let task = handle.spawn(Self::forward_loop(rx, runtime, state));

        *registration = Some(ListenerRegistration { id, task });
        self.state.set_registered();
        info!("{} plugin loaded", PLUGIN_NAME);
    }

    /// Release the relay listener.
    ///
    /// Sessions already queued are still delivered before this returns.
    /// Calling it again is a no-op.
    pub async fn handle_on_destroy(&self) {
        let registration = self.registration.lock().take();
        let Some(registration) = registration else {
            debug!("{} plugin not loaded, nothing to release", PLUGIN_NAME);
            return;
        };

        self.broadcast.unregister_receiver(registration.id);
        self.state.set_unregistered();

        if let Err(e) = registration.task.await {
            error!("{} forwarding task failed: {}", PLUGIN_NAME, e);
        }
        info!("{} plugin destroyed", PLUGIN_NAME);
    }

    pub fn is_loaded(&self) -> bool {
        self.registration.lock().is_some()
    }

    /// Report whether the wearable channel is available.
    ///
    /// Placeholder: always affirmative, no connectivity check is made.
    pub fn is_available(&self) -> AvailabilityResponse {
        AvailabilityResponse { available: true }
    }

    async fn forward_loop(
        mut rx: mpsc::UnboundedReceiver<Broadcast>,
        runtime: Arc<dyn WebRuntime>,
        state: Arc<BridgeState>,
    ) {
        while let Some(broadcast) = rx.recv().await {
            Self::forward(&broadcast, runtime.as_ref(), &state);
        }
        debug!("{} relay channel closed", PLUGIN_NAME);
    }

    fn forward(broadcast: &Broadcast, runtime: &dyn WebRuntime, state: &BridgeState) {
        let event = match PluginEvent::timer_session(&broadcast.session) {
            Ok(event) => event,
            Err(e) => {
                error!("Error building timer session event: {}", e);
                return;
            }
        };

        match runtime.notify_listeners(event) {
            Ok(()) => {
                state.record_relayed();
                debug!("Timer session event emitted: {}", broadcast.session);
            }
            Err(e) => error!("Failed to emit timer session event: {}", e),
        }
    }
}

impl Drop for WearSyncPlugin {
    fn drop(&mut self) {
        if let Some(registration) = self.registration.get_mut().take() {
            self.broadcast.unregister_receiver(registration.id);
            registration.task.abort();
            self.state.set_unregistered();
        }
    }
}

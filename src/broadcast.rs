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

//! In-process relay channel between the wearable receiver and the plugin.
//!
//! Receivers register for a single action name and get an unbounded channel.
//! Publishing never blocks. A broadcast with no matching receiver is lost.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

use crate::wearable::TimerSession;

/// Action carrying decoded timer sessions.
pub const ACTION_TIMER_SESSION: &str = "com.mandalaplan.app.TIMER_SESSION";

/// A single relayed item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Broadcast {
    pub action: String,
    pub session: TimerSession,
}

impl Broadcast {
    /// Create a timer session broadcast.
    pub fn timer_session(session: TimerSession) -> Self {
        Self {
            action: ACTION_TIMER_SESSION.to_string(),
            session,
        }
    }
}

/// Handle identifying one receiver registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReceiverId(u64);

struct Registration {
    id: ReceiverId,
    action: String,
    tx: mpsc::UnboundedSender<Broadcast>,
}

/// Process-local broadcast channel.
#[derive(Default)]
pub struct LocalBroadcast {
    next_id: AtomicU64,
    receivers: RwLock<Vec<Registration>>,
}

impl LocalBroadcast {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register interest in one action.
    pub fn register_receiver(
        &self,
        action: impl Into<String>,
    ) -> (ReceiverId, mpsc::UnboundedReceiver<Broadcast>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = ReceiverId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let action = action.into();
        debug!("Registering receiver {:?} for {}", id, action);

        self.receivers.write().push(Registration { id, action, tx });
        (id, rx)
    }

    /// Remove a registration. Returns false if it was already gone.
    pub fn unregister_receiver(&self, id: ReceiverId) -> bool {
        let mut receivers = self.receivers.write();
        let before = receivers.len();
        receivers.retain(|r| r.id != id);
        let removed = receivers.len() != before;
        if removed {
            debug!("Unregistered receiver {:?}", id);
        }
        removed
    }

    /// Deliver to every receiver registered for the broadcast's action.
    ///
    /// Returns the number of receivers reached.
    pub fn send_broadcast(&self, broadcast: Broadcast) -> usize {
        let mut delivered = 0;
        let mut closed = Vec::new();

        {
            let receivers = self.receivers.read();
            for registration in receivers.iter().filter(|r| r.action == broadcast.action) {
                if registration.tx.send(broadcast.clone()).is_ok() {
                    delivered += 1;
                } else {
                    closed.push(registration.id);
                }
            }
        }

        for id in closed {
            self.unregister_receiver(id);
        }

        if delivered == 0 {
            debug!("No receiver for {}, broadcast dropped", broadcast.action);
        }
        delivered
    }

    pub fn receiver_count(&self) -> usize {
        self.receivers.read().len()
    }
}

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

//! Bridge state shared between the receiver and the plugin.

use parking_lot::RwLock;
use std::sync::Arc;

/// Registration status of the plugin's relay listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerStatus {
    Unregistered,
    Registered,
}

impl ListenerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListenerStatus::Unregistered => "Unregistered",
            ListenerStatus::Registered => "Registered",
        }
    }
}

/// Message counters. Informational only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    /// Messages delivered by the wearable channel.
    pub received: u64,
    /// Messages outside the accepted path namespace.
    pub ignored: u64,
    /// Messages dropped because the payload did not decode.
    pub dropped: u64,
    /// Events handed to the web runtime.
    pub relayed: u64,
}

/// Shared bridge state.
#[derive(Debug)]
pub struct BridgeState {
    /// Current listener registration.
    pub listener_status: RwLock<ListenerStatus>,

    /// Running counters.
    pub stats: RwLock<RelayStats>,
}

impl Default for BridgeState {
    fn default() -> Self {
        Self {
            listener_status: RwLock::new(ListenerStatus::Unregistered),
            stats: RwLock::new(RelayStats::default()),
        }
    }
}

impl BridgeState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_registered(&self) {
        *self.listener_status.write() = ListenerStatus::Registered;
    }

    pub fn set_unregistered(&self) {
        *self.listener_status.write() = ListenerStatus::Unregistered;
    }

    pub fn get_listener_status(&self) -> ListenerStatus {
        *self.listener_status.read()
    }

    pub fn record_received(&self) {
        self.stats.write().received += 1;
    }

    pub fn record_ignored(&self) {
        self.stats.write().ignored += 1;
    }

    pub fn record_dropped(&self) {
        self.stats.write().dropped += 1;
    }

    pub fn record_relayed(&self) {
        self.stats.write().relayed += 1;
    }

    pub fn get_stats(&self) -> RelayStats {
        *self.stats.read()
    }
}

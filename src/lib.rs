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

//! MandalaPlan wearable bridge.
//!
//! Receives timer sessions from the companion watch, relays them over an
//! in-process channel and emits them to the embedded web runtime as
//! `timerSessionReceived` events.

pub mod broadcast;
pub mod config;
pub mod error;
pub mod events;
pub mod plugin;
pub mod state;
pub mod wearable;

pub use broadcast::{Broadcast, LocalBroadcast, ACTION_TIMER_SESSION};
pub use error::RelayError;
pub use events::{ChannelRuntime, PluginEvent, StdoutRuntime, WebRuntime, EVENT_TIMER_SESSION};
pub use plugin::{AvailabilityResponse, WearSyncPlugin};
pub use state::BridgeState;
pub use wearable::{MessageEvent, TimerSession, WearableDataService};

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

//! MandalaPlan wear bridge.
//!
//! Reads wearable messages from stdin, one per line as `<path> <json>`, and
//! writes the resulting plugin events to stdout as JSON lines.

use anyhow::Result;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use mandalaplan_wear_bridge::config::{Config, LoggingConfig};
use mandalaplan_wear_bridge::{
    BridgeState, LocalBroadcast, MessageEvent, StdoutRuntime, WearSyncPlugin, WearableDataService,
};

/// `rust_log` wins when set and valid; the configured level is the fallback.
fn build_filter(logging: &LoggingConfig, rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(format!("mandalaplan_wear_bridge={}", logging.level)))
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = build_filter(logging, std::env::var("RUST_LOG").ok().as_deref());

    if logging.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// Split a raw input line into a message. Blank lines are skipped.
///
/// The body is kept as bytes so that invalid UTF-8 reaches the decoder and is
/// dropped there like any other malformed payload.
fn parse_line(line: &[u8], node_id: &str) -> Option<MessageEvent> {
    let line = line.trim_ascii();
    if line.is_empty() {
        return None;
    }

    let (path, body) = match line.iter().position(u8::is_ascii_whitespace) {
        Some(split) => (&line[..split], line[split..].trim_ascii_start()),
        None => (line, &[][..]),
    };
    Some(MessageEvent::new(
        String::from_utf8_lossy(path).into_owned(),
        node_id,
        body,
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::load()?;

    // Initialize logging
    init_tracing(&config.logging);

    info!(
        "Starting MandalaPlan wear bridge v{}...",
        env!("CARGO_PKG_VERSION")
    );

    let node_id = config
        .wearable
        .node_id
        .clone()
        .unwrap_or_else(|| format!("node-{}", Uuid::new_v4()));
    info!("Simulated source node: {}", node_id);

    let state = BridgeState::new();
    let broadcast = LocalBroadcast::new();

    // Bridge side first so nothing received is lost
    let plugin = WearSyncPlugin::new(broadcast.clone(), Arc::new(StdoutRuntime), state.clone());
    plugin.load();
    info!("isAvailable -> {:?}", plugin.is_available());

    let service = WearableDataService::new(
        config.wearable.path_prefix.clone(),
        broadcast,
        state.clone(),
    );
    service.on_create();

    info!("Ready. Reading messages from stdin.");

    let mut input = BufReader::new(tokio::io::stdin());
    let mut line = Vec::new();
    loop {
        line.clear();
        tokio::select! {
            read = input.read_until(b'\n', &mut line) => {
                if read? == 0 {
                    info!("Input closed");
                    break;
                }
                if let Some(event) = parse_line(&line, &node_id) {
                    service.on_message_received(&event);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    service.on_destroy();
    plugin.handle_on_destroy().await;

    let stats = state.get_stats();
    info!(
        "Wear bridge stopped: {} received, {} relayed, {} ignored, {} dropped",
        stats.received, stats.relayed, stats.ignored, stats.dropped
    );
    Ok(())
}

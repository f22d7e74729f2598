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

//! Relay error types.

use thiserror::Error;

/// Result type alias using [`RelayError`].
pub type Result<T> = std::result::Result<T, RelayError>;

/// Reasons an inbound wearable message is not relayed.
///
/// Neither variant is fatal. Both are logged at the receiver and the message
/// is dropped; the web runtime never sees them.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Message path is outside the accepted namespace.
    #[error("Unrecognized message path: {0}")]
    UnrecognizedPath(String),

    /// Payload is not a valid timer session.
    #[error("Malformed timer session payload: {0}")]
    MalformedPayload(String),
}

impl From<serde_json::Error> for RelayError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedPayload(err.to_string())
    }
}

impl From<std::str::Utf8Error> for RelayError {
    fn from(err: std::str::Utf8Error) -> Self {
        Self::MalformedPayload(format!("payload is not UTF-8: {}", err))
    }
}

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

//! Wearable message definitions and timer session decoding.

use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::error::Result;

/// Namespace prefix accepted by the receiver.
pub const PATH_PREFIX: &str = "/mandalaplan";

/// Path the watch app sends finished timer sessions on.
pub const PATH_TIMER_SYNC: &str = "/mandalaplan/timer-sync";

/// A message delivered by the wearable messaging channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEvent {
    /// Topic path chosen by the sender.
    pub path: String,

    /// Node id of the sending device.
    pub source_node_id: String,

    /// Raw message body.
    pub data: Vec<u8>,
}

impl MessageEvent {
    /// Create a new message event.
    pub fn new(
        path: impl Into<String>,
        source_node_id: impl Into<String>,
        data: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            path: path.into(),
            source_node_id: source_node_id.into(),
            data: data.into(),
        }
    }

    /// Build the message a watch sends for a finished session.
    pub fn timer_sync(source_node_id: impl Into<String>, session: &TimerSession) -> Result<Self> {
        Ok(Self::new(
            PATH_TIMER_SYNC,
            source_node_id,
            session.to_json()?.into_bytes(),
        ))
    }

    /// Check whether the path belongs to the given namespace.
    pub fn matches_prefix(&self, prefix: &str) -> bool {
        self.path.starts_with(prefix)
    }
}

/// A timer session recorded on the wearable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSession {
    /// Optional label shown on the watch.
    #[serde(
        default,
        deserialize_with = "scalar_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub title: Option<String>,

    /// Session start, epoch milliseconds.
    #[serde(deserialize_with = "integral")]
    pub start_time_millis: i64,

    /// Session end, epoch milliseconds.
    #[serde(deserialize_with = "integral")]
    pub end_time_millis: i64,

    /// Planned duration in minutes.
    #[serde(deserialize_with = "integral")]
    pub duration_minutes: i32,

    /// Task in the host app this session belongs to.
    #[serde(
        default,
        deserialize_with = "scalar_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub task_id: Option<String>,
}

/// Accept a JSON number whose value is a whole number in range for `T`.
///
/// `1000`, `1000.0` and `1e3` are all accepted; `1000.5` and strings are not.
fn integral<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<i64>,
{
    let number = serde_json::Number::deserialize(deserializer)?;
    let value = match (number.as_i64(), number.as_f64()) {
        (Some(value), _) => value,
        // 2^63 itself is not representable as i64
        (None, Some(f)) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
            f as i64
        }
        _ => return Err(D::Error::custom(format!("expected an integer, got {}", number))),
    };
    T::try_from(value).map_err(|_| D::Error::custom(format!("integer {} out of range", number)))
}

/// Accept a string, or coerce a number or boolean to its text form.
fn scalar_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::String(s) => Ok(Some(s)),
        serde_json::Value::Number(n) => Ok(Some(n.to_string())),
        serde_json::Value::Bool(b) => Ok(Some(b.to_string())),
        other => Err(D::Error::custom(format!("expected a string, got {}", other))),
    }
}

impl TimerSession {
    /// Create a session with only the required fields.
    pub fn new(start_time_millis: i64, end_time_millis: i64, duration_minutes: i32) -> Self {
        Self {
            title: None,
            start_time_millis,
            end_time_millis,
            duration_minutes,
            task_id: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_task_id(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }

    /// Parse from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Start time as a UTC timestamp, if representable.
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.start_time_millis)
    }
}

impl fmt::Display for TimerSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = self.title.as_deref().unwrap_or("untitled");
        match self.started_at() {
            Some(start) => write!(
                f,
                "'{}' {} min from {}",
                title,
                self.duration_minutes,
                start.format("%Y-%m-%d %H:%M:%S UTC")
            ),
            None => write!(f, "'{}' {} min", title, self.duration_minutes),
        }
    }
}

/// Decode a raw message body into a timer session.
///
/// The body must be UTF-8 JSON holding an object with integer
/// `startTimeMillis`, `endTimeMillis` and `durationMinutes`.
pub fn decode(payload: &[u8]) -> Result<TimerSession> {
    let json = std::str::from_utf8(payload)?;
    TimerSession::from_json(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RelayError;

    #[test]
    fn test_decode_full_session() {
        let json = r#"{"title":"Focus","startTimeMillis":1000,"endTimeMillis":4000,"durationMinutes":50,"taskId":"abc"}"#;
        let session = decode(json.as_bytes()).unwrap();

        assert_eq!(session.title.as_deref(), Some("Focus"));
        assert_eq!(session.start_time_millis, 1000);
        assert_eq!(session.end_time_millis, 4000);
        assert_eq!(session.duration_minutes, 50);
        assert_eq!(session.task_id.as_deref(), Some("abc"));
    }

    #[test]
    fn test_decode_optional_fields() {
        let session =
            decode(br#"{"startTimeMillis":1000,"endTimeMillis":4000,"durationMinutes":50}"#)
                .unwrap();
        assert_eq!(session, TimerSession::new(1000, 4000, 50));

        let session = decode(
            br#"{"title":null,"startTimeMillis":1,"endTimeMillis":2,"durationMinutes":3,"taskId":null}"#,
        )
        .unwrap();
        assert_eq!(session.title, None);
        assert_eq!(session.task_id, None);
    }

    #[test]
    fn test_decode_whole_number_floats() {
        let session =
            decode(br#"{"startTimeMillis":1000.0,"endTimeMillis":4e3,"durationMinutes":5E1}"#)
                .unwrap();
        assert_eq!(session, TimerSession::new(1000, 4000, 50));

        let session =
            decode(br#"{"startTimeMillis":1e3,"endTimeMillis":-2.0,"durationMinutes":0.0}"#)
                .unwrap();
        assert_eq!(session, TimerSession::new(1000, -2, 0));
    }

    #[test]
    fn test_decode_rejects_non_integral_or_out_of_range() {
        let cases: &[&[u8]] = &[
            br#"{"startTimeMillis":1000.5,"endTimeMillis":4000,"durationMinutes":50}"#,
            br#"{"startTimeMillis":1000,"endTimeMillis":4000,"durationMinutes":2147483648}"#,
            br#"{"startTimeMillis":1000,"endTimeMillis":4000,"durationMinutes":3e9}"#,
            br#"{"startTimeMillis":9223372036854775808,"endTimeMillis":4000,"durationMinutes":50}"#,
            br#"{"startTimeMillis":1e30,"endTimeMillis":4000,"durationMinutes":50}"#,
            br#"{"startTimeMillis":null,"endTimeMillis":4000,"durationMinutes":50}"#,
        ];

        for case in cases {
            assert!(
                matches!(decode(case), Err(RelayError::MalformedPayload(_))),
                "expected malformed payload for {:?}",
                String::from_utf8_lossy(case)
            );
        }
    }

    #[test]
    fn test_decode_coerces_scalar_labels() {
        let session = decode(
            br#"{"title":5,"startTimeMillis":1,"endTimeMillis":2,"durationMinutes":3,"taskId":true}"#,
        )
        .unwrap();
        assert_eq!(session.title.as_deref(), Some("5"));
        assert_eq!(session.task_id.as_deref(), Some("true"));

        let result = decode(
            br#"{"title":["a"],"startTimeMillis":1,"endTimeMillis":2,"durationMinutes":3}"#,
        );
        assert!(matches!(result, Err(RelayError::MalformedPayload(_))));
    }

    #[test]
    fn test_decode_ignores_unknown_keys() {
        let session = decode(
            br#"{"startTimeMillis":1,"endTimeMillis":2,"durationMinutes":3,"mood":"great"}"#,
        )
        .unwrap();
        assert_eq!(session, TimerSession::new(1, 2, 3));
    }

    #[test]
    fn test_decode_rejects_malformed() {
        let cases: &[&[u8]] = &[
            br#"{"startTimeMillis":"oops"}"#,
            br#"{"endTimeMillis":4000,"durationMinutes":50}"#,
            br#"{"startTimeMillis":1000,"durationMinutes":50}"#,
            br#"{"startTimeMillis":1000,"endTimeMillis":4000}"#,
            br#"{"startTimeMillis":1000,"endTimeMillis":4000,"durationMinutes":"50"}"#,
            br#"{"startTimeMillis":1000.5,"endTimeMillis":4000,"durationMinutes":50}"#,
            b"null",
            b"not json",
            b"",
            &[0xff, 0xfe, 0x00],
        ];

        for case in cases {
            let result = decode(case);
            assert!(
                matches!(result, Err(RelayError::MalformedPayload(_))),
                "expected malformed payload for {:?}",
                String::from_utf8_lossy(case)
            );
        }
    }

    #[test]
    fn test_serialization_omits_absent_fields() {
        let json = TimerSession::new(1000, 4000, 50).to_json().unwrap();
        assert!(!json.contains("title"));
        assert!(!json.contains("taskId"));
        assert!(json.contains("\"startTimeMillis\":1000"));

        let json = TimerSession::new(1000, 4000, 50)
            .with_task_id("abc")
            .to_json()
            .unwrap();
        assert!(json.contains("\"taskId\":\"abc\""));
    }

    #[test]
    fn test_prefix_matching() {
        let msg = MessageEvent::new(PATH_TIMER_SYNC, "node-1", Vec::new());
        assert!(msg.matches_prefix(PATH_PREFIX));

        let msg = MessageEvent::new("/mandalaplan/other", "node-1", Vec::new());
        assert!(msg.matches_prefix(PATH_PREFIX));

        let msg = MessageEvent::new("/other/topic", "node-1", Vec::new());
        assert!(!msg.matches_prefix(PATH_PREFIX));
    }

    #[test]
    fn test_display() {
        let session = TimerSession::new(0, 60_000, 1).with_title("Focus");
        assert_eq!(session.to_string(), "'Focus' 1 min from 1970-01-01 00:00:00 UTC");
    }
}

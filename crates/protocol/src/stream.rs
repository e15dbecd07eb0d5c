//! Messages delivered over the analysis websocket.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind tag of a streamed message.
///
/// Wire names follow the backend: `progress`, `tweet`, `complete`, `error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StreamKind {
	#[serde(rename = "progress")]
	Progress,
	#[serde(rename = "tweet")]
	ItemArrived,
	#[serde(rename = "complete")]
	Completed,
	#[serde(rename = "error")]
	Failed,
}

/// One framed message from the analysis stream.
///
/// Wire form: `{"type": "progress" | "tweet" | "complete" | "error", "data": ...}`.
/// The payload shape depends on the kind and is left to the consumer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamMessage {
	#[serde(rename = "type")]
	pub kind: StreamKind,
	#[serde(default)]
	pub data: Value,
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn stream_message_parses_backend_frame() {
		let frame = r#"{"type": "tweet", "data": {"text": "hello", "like_count": 3}}"#;
		let message: StreamMessage = serde_json::from_str(frame).unwrap();
		assert_eq!(message.kind, StreamKind::ItemArrived);
		assert_eq!(message.data["like_count"], 3);
	}

	#[test]
	fn stream_message_tolerates_missing_data() {
		let message: StreamMessage = serde_json::from_str(r#"{"type": "complete"}"#).unwrap();
		assert_eq!(message.kind, StreamKind::Completed);
		assert_eq!(message.data, json!(null));
	}
}

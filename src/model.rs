//! Log message data model and ingress envelope shapes.
//!
//! # Responsibilities
//! - Define the normalized `LogMessage` sent to analyzers
//! - Accept both ingress shapes (envelope and bare array)
//! - Lift bare strings to INFO messages from an unknown source
//! - Fill server-side ids and timestamps where the agent omitted them

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;
use uuid::Uuid;

use crate::error::GatewayError;

/// Severity levels recognized on ingress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

/// A fully normalized log message, identical to the wire form POSTed to
/// an analyzer's `/analyze` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogMessage {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub source: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

/// A message as submitted by an agent; id and timestamp are optional and
/// server-filled during normalization.
#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    pub id: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub level: LogLevel,
    pub source: String,
    pub message: String,
    pub metadata: Option<Value>,
}

impl IncomingMessage {
    /// Validate and normalize into the wire form.
    pub fn normalize(self) -> Result<LogMessage, GatewayError> {
        if self.source.is_empty() {
            return Err(GatewayError::InvalidArgument(
                "message source must not be empty".to_string(),
            ));
        }
        if self.message.is_empty() {
            return Err(GatewayError::InvalidArgument(
                "message body must not be empty".to_string(),
            ));
        }
        Ok(LogMessage {
            id: self.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            level: self.level,
            source: self.source,
            message: self.message,
            metadata: self.metadata,
        })
    }
}

/// One entry of the bare-array ingress shape: either a structured message
/// or a plain string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum BatchEntry {
    Message(IncomingMessage),
    Text(String),
}

impl BatchEntry {
    fn into_incoming(self) -> IncomingMessage {
        match self {
            BatchEntry::Message(msg) => msg,
            // Plain strings carry no structure; lift them to INFO.
            BatchEntry::Text(text) => IncomingMessage {
                id: None,
                timestamp: None,
                level: LogLevel::Info,
                source: "unknown".to_string(),
                message: text,
                metadata: None,
            },
        }
    }
}

/// Envelope ingress shape.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEnvelope {
    pub id: Option<String>,
    pub agent_id: String,
    pub messages: Vec<IncomingMessage>,
}

/// The two accepted bodies of `POST /logs`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LogSubmission {
    Envelope(LogEnvelope),
    Batch(Vec<BatchEntry>),
}

/// A batch of messages accepted into the dispatch queue.
///
/// Owned exclusively by the queue until a worker drains it.
#[derive(Debug, Clone)]
pub struct LogPacket {
    pub id: String,
    pub agent_id: Option<String>,
    pub messages: Vec<LogMessage>,
    pub enqueued_at: Instant,
}

impl LogSubmission {
    /// Validate and normalize a submission into a queued packet.
    ///
    /// The envelope id is honored when present; ids are opaque and no
    /// uniqueness check is performed.
    pub fn into_packet(self) -> Result<LogPacket, GatewayError> {
        let (id, agent_id, incoming) = match self {
            LogSubmission::Envelope(envelope) => (
                envelope.id,
                Some(envelope.agent_id),
                envelope.messages,
            ),
            LogSubmission::Batch(entries) => (
                None,
                None,
                entries.into_iter().map(BatchEntry::into_incoming).collect(),
            ),
        };

        if incoming.is_empty() {
            return Err(GatewayError::InvalidArgument(
                "packet contains no messages".to_string(),
            ));
        }

        let messages = incoming
            .into_iter()
            .map(IncomingMessage::normalize)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(LogPacket {
            id: id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            agent_id,
            messages,
            enqueued_at: Instant::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_form_parses() {
        let body = serde_json::json!({
            "id": "pkt-1",
            "agentId": "agent-7",
            "messages": [
                {"level": "ERROR", "source": "db", "message": "connection lost"}
            ]
        });
        let submission: LogSubmission = serde_json::from_value(body).unwrap();
        let packet = submission.into_packet().unwrap();

        assert_eq!(packet.id, "pkt-1");
        assert_eq!(packet.agent_id.as_deref(), Some("agent-7"));
        assert_eq!(packet.messages.len(), 1);
        assert_eq!(packet.messages[0].level, LogLevel::Error);
        assert_eq!(packet.messages[0].source, "db");
        // Server-filled fields.
        assert!(!packet.messages[0].id.is_empty());
    }

    #[test]
    fn test_bare_array_lifts_strings() {
        let body = serde_json::json!([
            "disk almost full",
            {"level": "WARN", "source": "kernel", "message": "oom watch"}
        ]);
        let submission: LogSubmission = serde_json::from_value(body).unwrap();
        let packet = submission.into_packet().unwrap();

        assert_eq!(packet.messages.len(), 2);
        assert_eq!(packet.messages[0].level, LogLevel::Info);
        assert_eq!(packet.messages[0].source, "unknown");
        assert_eq!(packet.messages[0].message, "disk almost full");
        assert_eq!(packet.messages[1].level, LogLevel::Warn);
    }

    #[test]
    fn test_unknown_level_rejected() {
        let body = serde_json::json!({
            "agentId": "a",
            "messages": [{"level": "TRACE", "source": "s", "message": "m"}]
        });
        assert!(serde_json::from_value::<LogSubmission>(body).is_err());
    }

    #[test]
    fn test_empty_source_rejected() {
        let body = serde_json::json!({
            "agentId": "a",
            "messages": [{"level": "INFO", "source": "", "message": "m"}]
        });
        let submission: LogSubmission = serde_json::from_value(body).unwrap();
        assert!(matches!(
            submission.into_packet(),
            Err(GatewayError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_empty_packet_rejected() {
        let body = serde_json::json!({"agentId": "a", "messages": []});
        let submission: LogSubmission = serde_json::from_value(body).unwrap();
        assert!(submission.into_packet().is_err());
    }

    #[test]
    fn test_wire_round_trip() {
        let msg = LogMessage {
            id: "m-1".to_string(),
            timestamp: Utc::now(),
            level: LogLevel::Fatal,
            source: "auth".to_string(),
            message: "token store unreachable".to_string(),
            metadata: Some(serde_json::json!({"region": "eu-1", "attempt": 3})),
        };

        let wire = serde_json::to_string(&msg).unwrap();
        let parsed: LogMessage = serde_json::from_str(&wire).unwrap();
        assert_eq!(parsed, msg);
    }
}

//! Inbound messages and decoded risk observations.

use alloc::string::String;
use alloc::vec::Vec;

use crate::{AlertTier, NodeId, UtcNanos};

/// A raw message as delivered by a transport.
///
/// Produced once per delivery and consumed by exactly one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Topic (or subject) the message was published on.
    pub topic: String,
    /// Message body, not yet validated.
    pub payload: Vec<u8>,
    /// When the hub received the message.
    pub received_at: UtcNanos,
}

impl InboundMessage {
    /// Create a message received at `received_at`.
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>, received_at: UtcNanos) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            received_at,
        }
    }

    /// Create a message stamped with the current time.
    #[cfg(feature = "std")]
    pub fn received_now(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self::new(topic, payload, UtcNanos::now())
    }

    /// Payload as text, lossily decoded, for log output.
    pub fn payload_lossy(&self) -> alloc::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }
}

/// A decoded risk report from a single node.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RiskObservation {
    /// Originating node.
    pub node_id: NodeId,
    /// Reported risk level, kept exactly as decoded.
    pub risk_level: i64,
    /// Capture time, UTC nanoseconds.
    pub observed_at: UtcNanos,
}

impl RiskObservation {
    pub fn new(node_id: NodeId, risk_level: i64, observed_at: UtcNanos) -> Self {
        Self {
            node_id,
            risk_level,
            observed_at,
        }
    }

    /// Tier for this observation's risk level.
    pub fn tier(&self) -> AlertTier {
        AlertTier::classify(self.risk_level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_accepts_str_and_bytes() {
        let msg = InboundMessage::new("geodata/node1/status", "1", UtcNanos::from_nanos(5));
        assert_eq!(msg.payload, b"1".to_vec());

        let msg = InboundMessage::new(String::from("t"), vec![0xff, 0xfe], UtcNanos::EPOCH);
        assert_eq!(msg.payload.len(), 2);
    }

    #[test]
    fn payload_lossy_replaces_invalid_utf8() {
        let msg = InboundMessage::new("t", vec![b'1', 0xff], UtcNanos::EPOCH);
        assert_eq!(msg.payload_lossy(), "1\u{fffd}");
    }

    #[test]
    fn observation_tier() {
        let obs = RiskObservation::new(NodeId::new("node2"), 1, UtcNanos::EPOCH);
        assert_eq!(obs.tier(), AlertTier::Warning);
    }
}

//! Error taxonomy for message processing.
//!
//! Only [`DecodeError`] and [`StoreError`] end a message early. Topic
//! problems fall back to the sentinel node id and notifier problems are
//! logged and swallowed; neither is ever propagated out of the pipeline.

use std::time::Duration;

use geowatch_adapters::AdapterError;
use thiserror::Error;

/// The node id could not be extracted from a topic.
///
/// Recoverable: the pipeline continues with [`NodeId::unknown`](geowatch_types::NodeId::unknown).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("could not parse node id from topic '{topic}': {reason}")]
pub struct TopicParseWarning {
    pub topic: String,
    pub reason: &'static str,
}

/// The payload is not a base-10 integer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("payload is not valid UTF-8")]
    NotUtf8,

    #[error("payload is empty")]
    Empty,

    #[error("payload '{0}' is not an integer")]
    NotInteger(String),
}

/// Writing an observation to the time-series store failed.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store write timed out after {0:?}")]
    Timeout(Duration),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store rejected write: {0}")]
    Rejected(String),

    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<AdapterError> for StoreError {
    fn from(err: AdapterError) -> Self {
        match err {
            AdapterError::Connection(msg) => StoreError::Unavailable(msg),
            AdapterError::Timeout => StoreError::Unavailable("request timed out".to_string()),
            other => StoreError::Rejected(other.to_string()),
        }
    }
}

/// A notifier failed to deliver an alert.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notifier timed out after {0:?}")]
    Timeout(Duration),

    #[error("delivery failed: {0}")]
    Delivery(String),
}

impl From<AdapterError> for NotifyError {
    fn from(err: AdapterError) -> Self {
        NotifyError::Delivery(err.to_string())
    }
}

/// Why a message ended in the failed state.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_errors_map_to_store_errors() {
        let err = StoreError::from(AdapterError::Connection("refused".to_string()));
        assert!(matches!(err, StoreError::Unavailable(_)));

        let err = StoreError::from(AdapterError::Auth("bad token".to_string()));
        assert!(matches!(err, StoreError::Rejected(ref m) if m.contains("bad token")));
    }

    #[test]
    fn pipeline_error_is_transparent() {
        let err = PipelineError::from(DecodeError::NotInteger("abc".to_string()));
        assert_eq!(err.to_string(), "payload 'abc' is not an integer");
    }

    #[test]
    fn topic_warning_message() {
        let warning = TopicParseWarning {
            topic: "geodata".to_string(),
            reason: "fewer than two segments",
        };
        assert_eq!(
            warning.to_string(),
            "could not parse node id from topic 'geodata': fewer than two segments"
        );
    }
}

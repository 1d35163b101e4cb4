//! Node id extraction from hierarchical topics.
//!
//! Nodes publish on `<prefix>/<node id>/<suffix>`, so the id is the
//! second segment. A topic that doesn't have one yields the sentinel
//! id and a logged warning; it never stops the message.

use geowatch_types::NodeId;
use tracing::warn;

use crate::error::TopicParseWarning;

/// Default segment delimiter for MQTT topics.
pub const DEFAULT_DELIMITER: char = '/';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopicParser {
    delimiter: char,
}

impl TopicParser {
    pub fn new(delimiter: char) -> Self {
        Self { delimiter }
    }

    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    /// Extract the node id, or explain why there isn't one.
    pub fn try_parse(&self, topic: &str) -> Result<NodeId, TopicParseWarning> {
        let mut segments = topic.split(self.delimiter);
        segments.next();

        match segments.next() {
            Some(segment) if !segment.is_empty() => Ok(NodeId::new(segment)),
            Some(_) => Err(TopicParseWarning {
                topic: topic.to_string(),
                reason: "node segment is empty",
            }),
            None => Err(TopicParseWarning {
                topic: topic.to_string(),
                reason: "fewer than two segments",
            }),
        }
    }

    /// Extract the node id, falling back to [`NodeId::unknown`].
    pub fn parse(&self, topic: &str) -> NodeId {
        self.try_parse(topic).unwrap_or_else(|warning| {
            warn!(%topic, reason = warning.reason, "Could not parse node id from topic");
            NodeId::unknown()
        })
    }
}

impl Default for TopicParser {
    fn default() -> Self {
        Self::new(DEFAULT_DELIMITER)
    }
}

/// Parse with the default `/` delimiter.
pub fn parse(topic: &str) -> NodeId {
    TopicParser::default().parse(topic)
}

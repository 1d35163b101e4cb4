//! Node identity.

use alloc::string::String;

/// Identifier of the field node that published an observation.
///
/// Derived from the topic the observation arrived on. When the topic
/// cannot be parsed the hub uses [`NodeId::unknown`] rather than
/// dropping the message.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct NodeId(String);

impl NodeId {
    /// Sentinel used when no identifier could be extracted.
    pub const UNKNOWN: &'static str = "unknown";

    /// Create a node identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The sentinel identifier.
    pub fn unknown() -> Self {
        Self(String::from(Self::UNKNOWN))
    }

    /// Whether this is the sentinel identifier.
    pub fn is_unknown(&self) -> bool {
        self.0 == Self::UNKNOWN
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for NodeId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

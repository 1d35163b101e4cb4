//! Alert tiers and risk classification.

/// Severity tier derived from a node's risk level.
///
/// Field nodes report `0`, `1` or `2`. Anything else is kept as
/// [`AlertTier::Unrecognized`] so the hub can decide how loudly to
/// react instead of silently treating it as safe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AlertTier {
    /// Level 0: all normal.
    Safe,
    /// Level 1: elevated readings, keep monitoring.
    Warning,
    /// Level 2: high-risk event.
    Danger,
    /// A level outside the defined range, carried verbatim.
    Unrecognized(i64),
}

impl AlertTier {
    /// Map a risk level to its tier.
    ///
    /// Total and pure: every `i64` maps to exactly one tier.
    pub const fn classify(risk_level: i64) -> Self {
        match risk_level {
            0 => AlertTier::Safe,
            1 => AlertTier::Warning,
            2 => AlertTier::Danger,
            other => AlertTier::Unrecognized(other),
        }
    }

    /// The risk level this tier was classified from.
    pub const fn risk_level(&self) -> i64 {
        match self {
            AlertTier::Safe => 0,
            AlertTier::Warning => 1,
            AlertTier::Danger => 2,
            AlertTier::Unrecognized(level) => *level,
        }
    }

    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            AlertTier::Safe => "SAFE",
            AlertTier::Warning => "WARNING",
            AlertTier::Danger => "DANGER",
            AlertTier::Unrecognized(_) => "UNRECOGNIZED",
        }
    }

    /// Whether the level was inside the defined range.
    pub fn is_recognized(&self) -> bool {
        !matches!(self, AlertTier::Unrecognized(_))
    }
}

impl core::fmt::Display for AlertTier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            AlertTier::Unrecognized(level) => write!(f, "UNRECOGNIZED({})", level),
            tier => f.write_str(tier.label()),
        }
    }
}

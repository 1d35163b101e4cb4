//! Risk level to alert tier.

use geowatch_types::AlertTier;

/// Map a decoded risk level to its tier.
///
/// Levels other than 0, 1 and 2 come back as [`AlertTier::Unrecognized`];
/// the dispatcher decides what that means.
pub fn classify(risk_level: i64) -> AlertTier {
    AlertTier::classify(risk_level)
}

//! Timestamp representation for observations and points.
//!
//! Nanoseconds since the Unix epoch (UTC) is the canonical unit, matching
//! the write precision of the time-series store.

use core::time::Duration;

/// A UTC instant in nanoseconds since the Unix epoch.
///
/// Signed so that it maps directly onto the store's 64-bit timestamp
/// column. Covers roughly the years 1678 to 2262.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct UtcNanos(pub i64);

impl UtcNanos {
    /// The Unix epoch.
    pub const EPOCH: UtcNanos = UtcNanos(0);

    /// Capture the current wall-clock time.
    ///
    /// Clocks set before the epoch read as the epoch; clocks past the
    /// representable range saturate.
    #[cfg(feature = "std")]
    pub fn now() -> Self {
        let since_epoch = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default();
        Self::from(since_epoch)
    }

    /// Create from nanoseconds.
    pub const fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    /// Create from whole seconds.
    pub const fn from_secs(secs: i64) -> Self {
        Self(secs.saturating_mul(1_000_000_000))
    }

    /// Get the value in nanoseconds.
    pub const fn as_nanos(&self) -> i64 {
        self.0
    }

    /// Get the value in whole seconds (truncated toward zero).
    pub const fn as_secs(&self) -> i64 {
        self.0 / 1_000_000_000
    }

    /// Elapsed time from `earlier` to `self`, or zero if `earlier` is later.
    pub fn duration_since(&self, earlier: UtcNanos) -> Duration {
        let delta = self.0.saturating_sub(earlier.0);
        if delta <= 0 {
            Duration::ZERO
        } else {
            Duration::from_nanos(delta as u64)
        }
    }
}

impl From<Duration> for UtcNanos {
    fn from(since_epoch: Duration) -> Self {
        Self(i64::try_from(since_epoch.as_nanos()).unwrap_or(i64::MAX))
    }
}

impl core::fmt::Display for UtcNanos {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions() {
        let t = UtcNanos::from(Duration::from_millis(1500));
        assert_eq!(t.as_nanos(), 1_500_000_000);
        assert_eq!(t.as_secs(), 1);
    }

    #[test]
    fn from_secs() {
        let t = UtcNanos::from_secs(5);
        assert_eq!(t.as_nanos(), 5_000_000_000);
    }

    #[test]
    fn from_secs_saturates() {
        assert_eq!(UtcNanos::from_secs(i64::MAX).as_nanos(), i64::MAX);
    }

    #[test]
    fn huge_duration_saturates() {
        let t = UtcNanos::from(Duration::from_secs(u64::MAX));
        assert_eq!(t.as_nanos(), i64::MAX);
    }

    #[test]
    fn now_is_after_2020() {
        // 2020-01-01T00:00:00Z
        let t = UtcNanos::now();
        assert!(t > UtcNanos::from_secs(1_577_836_800));
    }

    #[test]
    fn duration_since() {
        let a = UtcNanos::from_nanos(1_000);
        let b = UtcNanos::from_nanos(3_500);
        assert_eq!(b.duration_since(a), Duration::from_nanos(2_500));
        assert_eq!(a.duration_since(b), Duration::ZERO);
    }

    #[test]
    fn display_is_raw_nanos() {
        assert_eq!(UtcNanos::from_nanos(42).to_string(), "42");
    }

    #[test]
    fn ordering() {
        assert!(UtcNanos::from_nanos(1) < UtcNanos::from_nanos(2));
        assert_eq!(UtcNanos::default(), UtcNanos::EPOCH);
    }
}

//! Payload decoding.
//!
//! Nodes send their risk level as plain UTF-8 text, e.g. `b"2"`.
//! Surrounding whitespace is tolerated (some firmware appends a newline),
//! a leading sign is accepted, and anything else is rejected whole.

use geowatch_types::{NodeId, RiskObservation, UtcNanos};

use crate::error::DecodeError;

/// Longest payload echoed back in a [`DecodeError::NotInteger`].
const MAX_ECHO_CHARS: usize = 32;

/// Decode a payload into an observation captured now.
pub fn decode(node_id: NodeId, payload: &[u8]) -> Result<RiskObservation, DecodeError> {
    decode_at(node_id, payload, UtcNanos::now())
}

/// Decode a payload into an observation captured at `observed_at`.
pub fn decode_at(
    node_id: NodeId,
    payload: &[u8],
    observed_at: UtcNanos,
) -> Result<RiskObservation, DecodeError> {
    let risk_level = parse_risk_level(payload)?;
    Ok(RiskObservation::new(node_id, risk_level, observed_at))
}

/// Parse a payload as a base-10 `i64`.
pub fn parse_risk_level(payload: &[u8]) -> Result<i64, DecodeError> {
    let text = std::str::from_utf8(payload).map_err(|_| DecodeError::NotUtf8)?;
    let text = text.trim();

    if text.is_empty() {
        return Err(DecodeError::Empty);
    }

    text.parse::<i64>()
        .map_err(|_| DecodeError::NotInteger(text.chars().take(MAX_ECHO_CHARS).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integers_decode_exactly() {
        for (payload, expected) in [
            ("0", 0),
            ("1", 1),
            ("2", 2),
            ("-1", -1),
            ("+3", 3),
            ("42", 42),
            ("-9223372036854775808", i64::MIN),
        ] {
            assert_eq!(parse_risk_level(payload.as_bytes()), Ok(expected), "{}", payload);
        }
    }

    #[test]
    fn test_surrounding_whitespace_is_ignored() {
        assert_eq!(parse_risk_level(b" 2\n"), Ok(2));
        assert_eq!(parse_risk_level(b"\t0\r\n"), Ok(0));
    }

    #[test]
    fn test_empty_payloads() {
        assert_eq!(parse_risk_level(b""), Err(DecodeError::Empty));
        assert_eq!(parse_risk_level(b"   "), Err(DecodeError::Empty));
    }

    #[test]
    fn test_non_integer_payloads() {
        for payload in ["abc", "1.5", "2.0", "1e3", "0x2", "two", "1 2", "99999999999999999999"] {
            assert!(
                matches!(parse_risk_level(payload.as_bytes()), Err(DecodeError::NotInteger(_))),
                "{}",
                payload
            );
        }
    }

    #[test]
    fn test_invalid_utf8() {
        assert_eq!(parse_risk_level(&[0xff, 0x32]), Err(DecodeError::NotUtf8));
    }

    #[test]
    fn test_long_payload_is_truncated_in_error() {
        let payload = "x".repeat(500);
        match parse_risk_level(payload.as_bytes()) {
            Err(DecodeError::NotInteger(echo)) => assert_eq!(echo.len(), MAX_ECHO_CHARS),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_decode_at_builds_observation() {
        let obs = decode_at(NodeId::new("node7"), b"2", UtcNanos::from_nanos(99)).unwrap();

        assert_eq!(obs.node_id.as_str(), "node7");
        assert_eq!(obs.risk_level, 2);
        assert_eq!(obs.observed_at, UtcNanos::from_nanos(99));
    }

    #[test]
    fn test_decode_stamps_current_time() {
        let before = UtcNanos::now();
        let obs = decode(NodeId::new("node1"), b"0").unwrap();
        assert!(obs.observed_at >= before);
    }
}

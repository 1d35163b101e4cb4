//! Time-series points and their line protocol encoding.

use alloc::collections::BTreeMap;
use alloc::string::String;
use core::fmt::Write;

use crate::{RiskObservation, UtcNanos, NODE_TAG, RISK_FIELD};

/// A single field value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum FieldValue {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Text(String),
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Integer(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Boolean(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(String::from(v))
    }
}

/// One immutable, timestamped record for the time-series store.
///
/// Tags and fields are kept sorted by key so the encoded line is
/// deterministic.
///
/// # Example
///
/// ```rust
/// use geowatch_types::{Point, UtcNanos};
///
/// let point = Point::builder("eruption_risk")
///     .tag("node_id", "node 3")
///     .field("risk_level", 1i64)
///     .timestamp(UtcNanos::from_nanos(10))
///     .build();
///
/// assert_eq!(point.to_line_protocol(), r"eruption_risk,node_id=node\ 3 risk_level=1i 10");
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub measurement: String,
    pub tags: BTreeMap<String, String>,
    pub fields: BTreeMap<String, FieldValue>,
    pub timestamp: UtcNanos,
}

impl Point {
    /// Start building a point for `measurement`.
    pub fn builder(measurement: impl Into<String>) -> PointBuilder {
        PointBuilder::new(measurement)
    }

    /// The point written for a risk observation: tagged by node, one
    /// integer field, stamped with the capture time.
    pub fn from_observation(measurement: impl Into<String>, observation: &RiskObservation) -> Self {
        Point::builder(measurement)
            .tag(NODE_TAG, observation.node_id.as_str())
            .field(RISK_FIELD, observation.risk_level)
            .timestamp(observation.observed_at)
            .build()
    }

    /// A point needs at least one field to be writable.
    pub fn has_fields(&self) -> bool {
        !self.fields.is_empty()
    }

    /// Look up an integer field.
    pub fn integer_field(&self, key: &str) -> Option<i64> {
        match self.fields.get(key) {
            Some(FieldValue::Integer(v)) => Some(*v),
            _ => None,
        }
    }

    /// Encode as one line of InfluxDB line protocol, nanosecond precision.
    ///
    /// The result never contains a raw newline, so one point is always
    /// exactly one line.
    pub fn to_line_protocol(&self) -> String {
        let mut line = String::new();
        escape_into(&mut line, &self.measurement, Escape::Measurement);

        for (key, value) in &self.tags {
            line.push(',');
            escape_into(&mut line, key, Escape::Key);
            line.push('=');
            escape_into(&mut line, value, Escape::Key);
        }

        let mut first = true;
        for (key, value) in &self.fields {
            line.push(if first { ' ' } else { ',' });
            first = false;
            escape_into(&mut line, key, Escape::Key);
            line.push('=');
            // Writing to a String cannot fail.
            let _ = match value {
                FieldValue::Integer(v) => write!(line, "{}i", v),
                FieldValue::Float(v) => write!(line, "{}", v),
                FieldValue::Boolean(v) => write!(line, "{}", v),
                FieldValue::Text(v) => {
                    line.push('"');
                    escape_into(&mut line, v, Escape::Text);
                    line.push('"');
                    Ok(())
                }
            };
        }

        let _ = write!(line, " {}", self.timestamp.as_nanos());
        line
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Escape {
    Measurement,
    /// Tag keys, tag values and field keys.
    Key,
    /// Quoted string field values.
    Text,
}

fn escape_into(out: &mut String, value: &str, context: Escape) {
    for c in value.chars() {
        match (c, context) {
            ('\\', _) => out.push_str("\\\\"),
            ('\n', _) => out.push_str("\\n"),
            ('\r', _) => out.push_str("\\r"),
            ('\t', _) => out.push_str("\\t"),
            ('"', Escape::Text) => out.push_str("\\\""),
            (',' | ' ', Escape::Measurement | Escape::Key) | ('=', Escape::Key) => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
}

/// Builder for [`Point`].
#[derive(Debug, Clone)]
pub struct PointBuilder {
    point: Point,
}

impl PointBuilder {
    pub fn new(measurement: impl Into<String>) -> Self {
        Self {
            point: Point {
                measurement: measurement.into(),
                tags: BTreeMap::new(),
                fields: BTreeMap::new(),
                timestamp: UtcNanos::EPOCH,
            },
        }
    }

    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.point.tags.insert(key.into(), value.into());
        self
    }

    pub fn field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.point.fields.insert(key.into(), value.into());
        self
    }

    pub fn timestamp(mut self, timestamp: UtcNanos) -> Self {
        self.point.timestamp = timestamp;
        self
    }

    pub fn build(self) -> Point {
        self.point
    }
}

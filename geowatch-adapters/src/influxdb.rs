//! InfluxDB 2.x writer using the HTTP write API.
//!
//! Points are encoded as line protocol and posted to `/api/v2/write`
//! with nanosecond precision. Each call is one synchronous request: it
//! returns once the server has accepted or rejected the batch.
//!
//! ## Example
//!
//! ```rust,no_run
//! use geowatch_adapters::influxdb::InfluxDbWriter;
//! use geowatch_types::{Point, UtcNanos};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let writer = InfluxDbWriter::builder()
//!         .url("http://localhost:8086")
//!         .token("my-token")
//!         .org("my-org")
//!         .bucket("geothermal_data")
//!         .build()?;
//!
//!     let point = Point::builder("eruption_risk")
//!         .tag("node_id", "node1")
//!         .field("risk_level", 0i64)
//!         .timestamp(UtcNanos::now())
//!         .build();
//!
//!     writer.write(&[point]).await?;
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use reqwest::{header, Client, StatusCode};

use geowatch_types::Point;

use crate::AdapterError;

const DEFAULT_URL: &str = "http://localhost:8086";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Writes points to an InfluxDB 2.x bucket.
#[derive(Clone)]
pub struct InfluxDbWriter {
    client: Client,
    url: String,
    token: String,
    org: String,
    bucket: String,
}

impl InfluxDbWriter {
    /// Create a new builder for configuring the writer.
    pub fn builder() -> InfluxDbWriterBuilder {
        InfluxDbWriterBuilder::default()
    }

    /// Check that the server is reachable.
    pub async fn ping(&self) -> Result<(), AdapterError> {
        let response = self.client.get(format!("{}/ping", self.url)).send().await?;

        if !response.status().is_success() {
            return Err(AdapterError::Http(format!(
                "ping returned status {}",
                response.status()
            )));
        }

        Ok(())
    }

    /// Write a batch of points.
    ///
    /// Points without fields cannot be stored and are rejected before
    /// anything is sent.
    pub async fn write(&self, points: &[Point]) -> Result<(), AdapterError> {
        if points.is_empty() {
            return Ok(());
        }
        if let Some(point) = points.iter().find(|p| !p.has_fields()) {
            return Err(AdapterError::Config(format!(
                "point for measurement '{}' has no fields",
                point.measurement
            )));
        }

        let body = encode_batch(points);

        let response = self
            .client
            .post(format!("{}/api/v2/write", self.url))
            .query(&[
                ("org", self.org.as_str()),
                ("bucket", self.bucket.as_str()),
                ("precision", "ns"),
            ])
            .header(header::AUTHORIZATION, format!("Token {}", self.token))
            .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(AdapterError::Auth(format!(
                "write to bucket '{}' rejected with status {}",
                self.bucket, status
            )));
        }

        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AdapterError::Http(format!(
                "write returned status {}: {}",
                status,
                detail.trim()
            )));
        }

        Ok(())
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn org(&self) -> &str {
        &self.org
    }
}

impl std::fmt::Debug for InfluxDbWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Token deliberately omitted.
        f.debug_struct("InfluxDbWriter")
            .field("url", &self.url)
            .field("org", &self.org)
            .field("bucket", &self.bucket)
            .finish()
    }
}

fn encode_batch(points: &[Point]) -> String {
    points
        .iter()
        .map(Point::to_line_protocol)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Builder for InfluxDbWriter.
#[derive(Debug, Default)]
pub struct InfluxDbWriterBuilder {
    url: Option<String>,
    token: Option<String>,
    org: Option<String>,
    bucket: Option<String>,
    timeout: Option<Duration>,
}

impl InfluxDbWriterBuilder {
    /// Set the server URL (default: "http://localhost:8086").
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set the API token.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the organization.
    pub fn org(mut self, org: impl Into<String>) -> Self {
        self.org = Some(org.into());
        self
    }

    /// Set the destination bucket.
    pub fn bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }

    /// Set the per-request timeout (default: 10 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the writer.
    pub fn build(self) -> Result<InfluxDbWriter, AdapterError> {
        let org = self
            .org
            .filter(|o| !o.is_empty())
            .ok_or_else(|| AdapterError::Config("InfluxDB org is required".to_string()))?;
        let bucket = self
            .bucket
            .filter(|b| !b.is_empty())
            .ok_or_else(|| AdapterError::Config("InfluxDB bucket is required".to_string()))?;

        let client = Client::builder()
            .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
            .build()?;

        Ok(InfluxDbWriter {
            client,
            url: self
                .url
                .unwrap_or_else(|| DEFAULT_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            token: self.token.unwrap_or_default(),
            org,
            bucket,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geowatch_types::UtcNanos;

    #[test]
    fn test_builder_defaults() {
        let writer = InfluxDbWriter::builder()
            .org("o")
            .bucket("b")
            .build()
            .unwrap();

        assert_eq!(writer.url, "http://localhost:8086");
        assert_eq!(writer.org(), "o");
        assert_eq!(writer.bucket(), "b");
    }

    #[test]
    fn test_builder_trims_trailing_slash() {
        let writer = InfluxDbWriter::builder()
            .url("http://influx:8086/")
            .org("o")
            .bucket("b")
            .build()
            .unwrap();

        assert_eq!(writer.url, "http://influx:8086");
    }

    #[test]
    fn test_builder_requires_bucket() {
        let err = InfluxDbWriter::builder().org("o").build().unwrap_err();
        assert!(matches!(err, AdapterError::Config(_)));
    }

    #[test]
    fn test_debug_hides_token() {
        let writer = InfluxDbWriter::builder()
            .token("secret-token")
            .org("o")
            .bucket("b")
            .build()
            .unwrap();

        assert!(!format!("{:?}", writer).contains("secret-token"));
    }

    #[test]
    fn test_encode_batch_one_line_per_point() {
        let a = Point::builder("m")
            .tag("node_id", "a")
            .field("risk_level", 0i64)
            .timestamp(UtcNanos::from_nanos(1))
            .build();
        let b = Point::builder("m")
            .tag("node_id", "b")
            .field("risk_level", 2i64)
            .timestamp(UtcNanos::from_nanos(2))
            .build();

        assert_eq!(
            encode_batch(&[a, b]),
            "m,node_id=a risk_level=0i 1\nm,node_id=b risk_level=2i 2"
        );
    }

    #[tokio::test]
    async fn test_write_rejects_empty_point() {
        let writer = InfluxDbWriter::builder()
            .org("o")
            .bucket("b")
            .build()
            .unwrap();

        let err = writer.write(&[Point::builder("m").build()]).await.unwrap_err();
        assert!(matches!(err, AdapterError::Config(_)));
    }

    #[tokio::test]
    async fn test_write_empty_batch_is_noop() {
        let writer = InfluxDbWriter::builder()
            .org("o")
            .bucket("b")
            .build()
            .unwrap();

        assert!(writer.write(&[]).await.is_ok());
    }
}

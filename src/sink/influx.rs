use async_trait::async_trait;
use geowatch_adapters::influxdb::InfluxDbWriter;
use geowatch_types::Point;

use super::ObservationStore;
use crate::error::StoreError;

#[async_trait]
impl ObservationStore for InfluxDbWriter {
    async fn write_point(&self, point: &Point) -> Result<(), StoreError> {
        self.write(std::slice::from_ref(point)).await?;
        Ok(())
    }

    fn description(&self) -> String {
        format!("influxdb: {}/{}", self.org(), self.bucket())
    }
}

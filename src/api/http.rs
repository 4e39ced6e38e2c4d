use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{DeviceQuery, SensorApi, DEVICE_DATA_PATH, VALUE_RANGES_PATH};
use crate::error::ApiError;
use crate::models::{FeatureCollection, ValueRange};

// ---

/// [`SensorApi`] over HTTP. No retries and no timeout: a slow response is
/// simply waited for.
#[derive(Debug, Clone)]
pub struct HttpSensorApi {
    // ---
    client: reqwest::Client,
    base_url: String,
}

impl HttpSensorApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&'static str, String)],
    ) -> Result<T, ApiError> {
        // ---
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {} {:?}", url, params);

        let response = self.client.get(&url).query(params).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status { url, status });
        }

        // Payload problems surface as ApiError::Json.
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl SensorApi for HttpSensorApi {
    async fn value_ranges(&self) -> Result<ValueRange, ApiError> {
        self.get_json(VALUE_RANGES_PATH, &[]).await
    }

    async fn device_data(&self, query: &DeviceQuery) -> Result<FeatureCollection, ApiError> {
        // ---
        let collection: FeatureCollection = self.get_json(DEVICE_DATA_PATH, &query.params()).await?;
        debug!("device-data returned {} features", collection.features.len());
        Ok(collection)
    }
}

//! Backend API gateway.
//!
//! The dashboard depends only on the [`SensorApi`] trait; the reqwest-backed
//! [`HttpSensorApi`] is the production implementation.

use async_trait::async_trait;

use crate::error::ApiError;
use crate::filter::DateFilter;
use crate::models::{FeatureCollection, ValueRange, ViewportBounds};

mod http;

pub use http::HttpSensorApi;

// ---

pub const VALUE_RANGES_PATH: &str = "/api/value-ranges";
pub const DEVICE_DATA_PATH: &str = "/api/device-data";

/// Selection sent to `GET /api/device-data`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceQuery {
    // ---
    pub viewport: ViewportBounds,
    pub dates: Option<DateFilter>,
}

impl DeviceQuery {
    pub fn new(viewport: ViewportBounds, dates: Option<DateFilter>) -> Self {
        Self { viewport, dates }
    }

    /// Query-string pairs. Viewport bounds always; dates only as a pair.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        // ---
        let v = &self.viewport;
        let mut params = vec![
            ("min_lng", v.west.to_string()),
            ("min_lat", v.south.to_string()),
            ("max_lng", v.east.to_string()),
            ("max_lat", v.north.to_string()),
        ];

        if let Some(dates) = &self.dates {
            params.push(("start_date", dates.start_param()));
            params.push(("end_date", dates.end_param()));
        }
        params
    }
}

/// Capabilities the dashboard needs from the backend.
#[async_trait]
pub trait SensorApi: Send + Sync {
    /// `GET /api/value-ranges`
    async fn value_ranges(&self) -> Result<ValueRange, ApiError>;

    /// `GET /api/device-data`
    async fn device_data(&self, query: &DeviceQuery) -> Result<FeatureCollection, ApiError>;
}

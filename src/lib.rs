//! Client core of the GPS telemetry map dashboard.
//!
//! Fetches value ranges and geotagged readings from the dashboard backend,
//! colors each reading by temperature and humidity, and keeps two
//! toggleable marker overlays in sync with the visible map area and the
//! selected date range.

pub mod api;
pub mod color;
pub mod config;
pub mod console;
pub mod dashboard;
pub mod error;
pub mod filter;
pub mod models;
pub mod overlay;
pub mod telemetry;
pub mod viewport;

pub use api::{DeviceQuery, HttpSensorApi, SensorApi};
pub use color::{color_for, normalize, ColorScale, Rgb, HUMIDITY_SCALE, TEMPERATURE_SCALE};
pub use config::Config;
pub use dashboard::{Dashboard, RefreshOutcome, RenderedView, Trigger};
pub use error::{ApiError, DashboardError};
pub use filter::{DateFilter, DateFilterState};
pub use models::{
    FeatureCollection, Measurement, NumericRange, SensorRecord, ValueRange, ViewportBounds,
};
pub use overlay::{Layers, Marker, Overlay, OverlayKind, Popup};
pub use viewport::{MapEvent, MapView, Zoom};

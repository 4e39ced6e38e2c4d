//! Data models shared by the API client and the refresh pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use serde_json::Number;

// ---

/// A closed numeric interval `[min, max]`, sent by the backend as a 2-array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct NumericRange {
    // ---
    pub min: f64,
    pub max: f64,
}

impl NumericRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

impl From<[f64; 2]> for NumericRange {
    fn from([min, max]: [f64; 2]) -> Self {
        Self { min, max }
    }
}

impl From<NumericRange> for [f64; 2] {
    fn from(range: NumericRange) -> Self {
        [range.min, range.max]
    }
}

/// Earliest and latest recorded timestamps, as the backend formats them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "[String; 2]", into = "[String; 2]")]
pub struct DateSpan {
    // ---
    pub earliest: String,
    pub latest: String,
}

impl From<[String; 2]> for DateSpan {
    fn from([earliest, latest]: [String; 2]) -> Self {
        Self { earliest, latest }
    }
}

impl From<DateSpan> for [String; 2] {
    fn from(span: DateSpan) -> Self {
        [span.earliest, span.latest]
    }
}

/// Payload of `GET /api/value-ranges`, fetched once per session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    // ---
    pub temperature: NumericRange,
    pub humidity: NumericRange,
    pub date: DateSpan,
}

/// Visible map area in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportBounds {
    // ---
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

/// A measured number together with the exact text the backend sent for it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Number")]
pub struct Measurement {
    // ---
    value: f64,
    text: String,
}

impl Measurement {
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl From<f64> for Measurement {
    fn from(value: f64) -> Self {
        Self {
            value,
            text: value.to_string(),
        }
    }
}

impl TryFrom<Number> for Measurement {
    type Error = String;

    fn try_from(n: Number) -> Result<Self, Self::Error> {
        let value = n.as_f64().ok_or_else(|| format!("{n} does not fit in f64"))?;
        Ok(Self {
            value,
            text: n.to_string(),
        })
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// One geotagged reading from the telemetry device.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorRecord {
    // ---
    pub device: String,
    pub temperature: Measurement,
    pub humidity: Measurement,
    pub altitude: Measurement,
    pub recorded: String,
    /// `(lat, lng)`
    pub position: (f64, f64),
}

// ---

/// Device identifiers arrive as either strings or bare numbers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DeviceId {
    Text(String),
    Number(Number),
}

impl From<DeviceId> for String {
    fn from(id: DeviceId) -> Self {
        match id {
            DeviceId::Text(s) => s,
            DeviceId::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct FeatureProperties {
    device: DeviceId,
    temperature: Measurement,
    humidity: Measurement,
    altitude: Measurement,
    recorded: String,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum Geometry {
    /// GeoJSON positions are `[lng, lat, (alt)]`.
    Point { coordinates: Vec<f64> },
}

#[derive(Debug, Deserialize)]
struct Feature {
    properties: FeatureProperties,
    geometry: Geometry,
}

impl Feature {
    fn into_record(self) -> Result<SensorRecord, String> {
        // ---
        let Geometry::Point { coordinates } = self.geometry;
        let (lng, lat) = match coordinates.as_slice() {
            [lng, lat, ..] => (*lng, *lat),
            _ => return Err(format!("point has {} coordinates", coordinates.len())),
        };

        let props = self.properties;
        Ok(SensorRecord {
            device: props.device.into(),
            temperature: props.temperature,
            humidity: props.humidity,
            altitude: props.altitude,
            recorded: props.recorded,
            position: (lat, lng),
        })
    }
}

/// Payload of `GET /api/device-data`. Features are kept as raw JSON text so
/// one bad feature does not reject the whole collection, and numbers reach
/// the popups spelled exactly as sent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeatureCollection {
    // ---
    pub features: Vec<Box<RawValue>>,
}

impl FeatureCollection {
    /// Decode every well-formed feature, skipping and logging the rest.
    pub fn into_records(self) -> Vec<SensorRecord> {
        // ---
        let total = self.features.len();
        let mut records = Vec::with_capacity(total);

        for (i, item) in self.features.into_iter().enumerate() {
            let parsed = serde_json::from_str::<Feature>(item.get())
                .map_err(|e| e.to_string())
                .and_then(Feature::into_record);

            match parsed {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!("Skipping malformed record {}: {} - Raw item: {}", i, e, item);
                }
            }
        }

        if records.len() < total {
            tracing::debug!("Decoded {} of {} features", records.len(), total);
        }
        records
    }
}

//! Marker overlays: one per measured field, rebuilt wholesale on refresh.

use std::fmt;
use std::str::FromStr;

use crate::color::{color_for, ColorScale, Rgb, HUMIDITY_SCALE, TEMPERATURE_SCALE};
use crate::models::{NumericRange, SensorRecord, ValueRange};

// ---

/// Circle-marker styling shared by both overlays; only the fill differs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerStyle {
    // ---
    pub radius: u32,
    pub fill: Rgb,
    pub stroke: Rgb,
    pub stroke_weight: u32,
    pub stroke_opacity: f32,
    pub fill_opacity: f32,
}

impl MarkerStyle {
    pub fn filled(fill: Rgb) -> Self {
        Self {
            radius: 8,
            fill,
            stroke: Rgb::BLACK,
            stroke_weight: 1,
            stroke_opacity: 1.0,
            fill_opacity: 0.8,
        }
    }
}

/// Popup content, copied verbatim from the record.
#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    // ---
    pub device: String,
    pub temperature: String,
    pub humidity: String,
    pub altitude: String,
    pub recorded: String,
}

impl From<&SensorRecord> for Popup {
    fn from(r: &SensorRecord) -> Self {
        Self {
            device: r.device.clone(),
            temperature: r.temperature.text().to_string(),
            humidity: r.humidity.text().to_string(),
            altitude: r.altitude.text().to_string(),
            recorded: r.recorded.clone(),
        }
    }
}

impl fmt::Display for Popup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Device: {}", self.device)?;
        writeln!(f, "Temperature: {}°C", self.temperature)?;
        writeln!(f, "Humidity: {}%", self.humidity)?;
        writeln!(f, "Altitude: {}m", self.altitude)?;
        write!(f, "Recorded: {}", self.recorded)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    // ---
    /// `(lat, lng)`
    pub position: (f64, f64),
    pub style: MarkerStyle,
    pub popup: Popup,
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (lat, lng) = self.position;
        write!(
            f,
            "({lat}, {lng}) {} | {}",
            self.style.fill,
            self.popup.to_string().replace('\n', " | ")
        )
    }
}

/// The two overlays the layer toggle switches between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OverlayKind {
    #[default]
    Temperature,
    Humidity,
}

impl OverlayKind {
    pub fn scale(self) -> &'static ColorScale {
        match self {
            OverlayKind::Temperature => &TEMPERATURE_SCALE,
            OverlayKind::Humidity => &HUMIDITY_SCALE,
        }
    }

    /// Field this overlay colors by, with its observed range.
    fn sample(self, record: &SensorRecord, ranges: &ValueRange) -> (f64, NumericRange) {
        match self {
            OverlayKind::Temperature => (record.temperature.value(), ranges.temperature),
            OverlayKind::Humidity => (record.humidity.value(), ranges.humidity),
        }
    }
}

impl fmt::Display for OverlayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OverlayKind::Temperature => "Temperature",
            OverlayKind::Humidity => "Humidity",
        })
    }
}

impl FromStr for OverlayKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "temperature" | "temp" => Ok(OverlayKind::Temperature),
            "humidity" | "hum" => Ok(OverlayKind::Humidity),
            other => Err(format!("unknown layer '{other}'")),
        }
    }
}

/// Named marker collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    // ---
    pub kind: OverlayKind,
    markers: Vec<Marker>,
}

impl Overlay {
    pub fn empty(kind: OverlayKind) -> Self {
        Self {
            kind,
            markers: Vec::new(),
        }
    }

    /// One marker per record, filled by this overlay's field and scale.
    pub fn build(kind: OverlayKind, records: &[SensorRecord], ranges: &ValueRange) -> Self {
        // ---
        let markers = records
            .iter()
            .map(|record| {
                let (value, range) = kind.sample(record, ranges);
                Marker {
                    position: record.position,
                    style: MarkerStyle::filled(color_for(value, range, kind.scale())),
                    popup: Popup::from(record),
                }
            })
            .collect();

        Self { kind, markers }
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

/// Both overlays plus the toggle deciding which one is on the map.
#[derive(Debug, Clone, PartialEq)]
pub struct Layers {
    // ---
    pub temperature: Overlay,
    pub humidity: Overlay,
    visible: OverlayKind,
}

impl Default for Layers {
    fn default() -> Self {
        Self {
            temperature: Overlay::empty(OverlayKind::Temperature),
            humidity: Overlay::empty(OverlayKind::Humidity),
            visible: OverlayKind::default(),
        }
    }
}

impl Layers {
    /// Build both overlays from the same record set.
    pub fn build(records: &[SensorRecord], ranges: &ValueRange) -> (Overlay, Overlay) {
        (
            Overlay::build(OverlayKind::Temperature, records, ranges),
            Overlay::build(OverlayKind::Humidity, records, ranges),
        )
    }

    /// Swap in freshly built overlays, keeping the toggle as it was.
    pub fn replace(&mut self, temperature: Overlay, humidity: Overlay) {
        debug_assert_eq!(temperature.len(), humidity.len());
        self.temperature = temperature;
        self.humidity = humidity;
    }

    pub fn select(&mut self, kind: OverlayKind) {
        self.visible = kind;
    }

    pub fn visible_kind(&self) -> OverlayKind {
        self.visible
    }

    pub fn get(&self, kind: OverlayKind) -> &Overlay {
        match kind {
            OverlayKind::Temperature => &self.temperature,
            OverlayKind::Humidity => &self.humidity,
        }
    }

    pub fn visible(&self) -> &Overlay {
        self.get(self.visible)
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::models::{DateSpan, FeatureCollection, Measurement};

    fn ranges() -> ValueRange {
        ValueRange {
            temperature: NumericRange::new(10.0, 30.0),
            humidity: NumericRange::new(0.0, 100.0),
            date: DateSpan {
                earliest: "2024-05-01T00:00:00Z".to_string(),
                latest: "2024-05-02T00:00:00Z".to_string(),
            },
        }
    }

    fn record(device: &str, temperature: f64, humidity: f64) -> SensorRecord {
        SensorRecord {
            device: device.to_string(),
            temperature: Measurement::from(temperature),
            humidity: Measurement::from(humidity),
            altitude: Measurement::from(41.7),
            recorded: "2024-05-01T09:30:00Z".to_string(),
            position: (51.4545, -2.5879),
        }
    }

    #[test]
    fn test_overlays_share_records_but_not_colors() {
        // ---
        let records = vec![record("gps-01", 10.0, 100.0), record("gps-02", 30.0, 0.0)];
        let (temperature, humidity) = Layers::build(&records, &ranges());

        assert_eq!(temperature.len(), 2);
        assert_eq!(humidity.len(), 2);

        for (t, h) in temperature.markers().iter().zip(humidity.markers()) {
            assert_eq!(t.position, h.position);
            assert_eq!(t.popup, h.popup);
        }

        assert_eq!(temperature.markers()[0].style.fill, Rgb::LIGHT_BLUE);
        assert_eq!(temperature.markers()[1].style.fill, Rgb::RED);
        assert_eq!(humidity.markers()[0].style.fill, Rgb::BLUE);
        assert_eq!(humidity.markers()[1].style.fill, Rgb::WHITE);
    }

    #[test]
    fn test_marker_style_defaults() {
        // ---
        let (temperature, _) = Layers::build(&[record("gps-01", 20.0, 50.0)], &ranges());
        let style = temperature.markers()[0].style;

        assert_eq!(style.radius, 8);
        assert_eq!(style.stroke.hex(), "#000000");
        assert_eq!(style.stroke_weight, 1);
        assert_eq!(style.stroke_opacity, 1.0);
        assert_eq!(style.fill_opacity, 0.8);
    }

    #[test]
    fn test_popup_fields_are_verbatim() {
        // ---
        let body = r#"{"features": [{
            "type": "Feature",
            "properties": {
                "device": "arduino-7",
                "temperature": 1e-7,
                "humidity": 20.50,
                "altitude": -3.25,
                "recorded": "2024-05-01 09:30:17"
            },
            "geometry": { "type": "Point", "coordinates": [0.0, 0.0] }
        }]}"#;
        let fc: FeatureCollection = serde_json::from_str(body).unwrap();
        let popup = Popup::from(&fc.into_records()[0]);

        assert_eq!(popup.device, "arduino-7");
        assert_eq!(popup.temperature, "1e-7");
        assert_eq!(popup.humidity, "20.50");
        assert_eq!(popup.altitude, "-3.25");
        assert_eq!(popup.recorded, "2024-05-01 09:30:17");
        assert_eq!(
            popup.to_string(),
            "Device: arduino-7\nTemperature: 1e-7°C\nHumidity: 20.50%\nAltitude: -3.25m\nRecorded: 2024-05-01 09:30:17"
        );
    }

    #[test]
    fn test_toggle_defaults_to_temperature() {
        // ---
        let mut layers = Layers::default();
        assert_eq!(layers.visible_kind(), OverlayKind::Temperature);

        layers.select(OverlayKind::Humidity);
        let (t, h) = Layers::build(&[record("gps-01", 20.0, 50.0)], &ranges());
        layers.replace(t, h);

        assert_eq!(layers.visible_kind(), OverlayKind::Humidity);
        assert_eq!(layers.visible().kind, OverlayKind::Humidity);
        assert_eq!(layers.visible().len(), 1);
    }

    #[test]
    fn test_overlay_kind_parses() {
        // ---
        assert_eq!("Humidity".parse::<OverlayKind>(), Ok(OverlayKind::Humidity));
        assert_eq!("temp".parse::<OverlayKind>(), Ok(OverlayKind::Temperature));
        assert!("pressure".parse::<OverlayKind>().is_err());
    }
}

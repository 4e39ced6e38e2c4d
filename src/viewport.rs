//! Headless map view: a Web Mercator camera that answers "what is visible".
//!
//! Stands in for the interactive map widget. Every completed pan or zoom
//! yields a settled [`MapEvent`]; intermediate drag frames are modelled as
//! [`MapEvent::Moving`] so callers can tell the two apart.

use std::f64::consts::PI;

use crate::models::ViewportBounds;

// ---

const TILE_SIZE: f64 = 256.0;

/// Web Mercator's latitude limit.
const MAX_LATITUDE: f64 = 85.051_128_779_806_6;

/// Most frames a single drag is split into.
pub const MAX_DRAG_STEPS: u32 = 1000;

/// Viewport change notifications.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MapEvent {
    /// Intermediate frame of a pan or zoom.
    Moving(ViewportBounds),
    /// Pan or zoom finished.
    Settled(ViewportBounds),
}

/// Zoom direction for [`MapView::zoom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zoom {
    In,
    Out,
}

/// Camera over a slippy map of 256 px tiles.
#[derive(Debug, Clone, PartialEq)]
pub struct MapView {
    // ---
    /// `(lat, lng)`
    center: (f64, f64),
    zoom: u8,
    max_zoom: u8,
    width_px: u32,
    height_px: u32,
}

impl MapView {
    pub fn new(center: (f64, f64), zoom: u8, max_zoom: u8, width_px: u32, height_px: u32) -> Self {
        let (lat, lng) = center;
        Self {
            center: (lat.clamp(-MAX_LATITUDE, MAX_LATITUDE), lng),
            zoom: zoom.min(max_zoom),
            max_zoom,
            width_px,
            height_px,
        }
    }

    pub fn center(&self) -> (f64, f64) {
        self.center
    }

    pub fn zoom_level(&self) -> u8 {
        self.zoom
    }

    fn world_size(&self) -> f64 {
        TILE_SIZE * 2_f64.powi(i32::from(self.zoom))
    }

    /// Project `(lat, lng)` to world pixels at the current zoom.
    fn project(&self, (lat, lng): (f64, f64)) -> (f64, f64) {
        // ---
        let size = self.world_size();
        let lat_rad = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
        let x = (lng + 180.0) / 360.0 * size;
        let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * size;
        (x, y)
    }

    fn unproject(&self, (x, y): (f64, f64)) -> (f64, f64) {
        // ---
        let size = self.world_size();
        let lng = x / size * 360.0 - 180.0;
        let lat = (PI * (1.0 - 2.0 * y / size)).sinh().atan().to_degrees();
        (lat.clamp(-MAX_LATITUDE, MAX_LATITUDE), lng)
    }

    /// Currently visible area.
    pub fn bounds(&self) -> ViewportBounds {
        // ---
        let (cx, cy) = self.project(self.center);
        let half_w = f64::from(self.width_px) / 2.0;
        let half_h = f64::from(self.height_px) / 2.0;

        let (north, west) = self.unproject((cx - half_w, cy - half_h));
        let (south, east) = self.unproject((cx + half_w, cy + half_h));
        ViewportBounds {
            west,
            south,
            east,
            north,
        }
    }

    /// Move the center by a screen offset; positive `dx` pans east,
    /// positive `dy` pans south.
    pub fn pan(&mut self, dx: f64, dy: f64) -> MapEvent {
        let (cx, cy) = self.project(self.center);
        self.center = self.unproject((cx + dx, cy + dy));
        MapEvent::Settled(self.bounds())
    }

    /// Step the zoom level, clamped to `[0, max_zoom]`.
    pub fn zoom(&mut self, direction: Zoom) -> MapEvent {
        self.zoom = match direction {
            Zoom::In => self.zoom.saturating_add(1).min(self.max_zoom),
            Zoom::Out => self.zoom.saturating_sub(1),
        };
        MapEvent::Settled(self.bounds())
    }

    /// Drag by a screen offset in `steps` frames: one [`MapEvent::Moving`]
    /// per intermediate frame, then [`MapEvent::Settled`]. `steps` is clamped
    /// to `[1, MAX_DRAG_STEPS]`.
    pub fn drag(&mut self, dx: f64, dy: f64, steps: u32) -> Vec<MapEvent> {
        // ---
        let steps = steps.clamp(1, MAX_DRAG_STEPS);
        let (sx, sy) = (dx / f64::from(steps), dy / f64::from(steps));
        let mut events = Vec::with_capacity(steps as usize);

        for _ in 1..steps {
            let (cx, cy) = self.project(self.center);
            self.center = self.unproject((cx + sx, cy + sy));
            events.push(MapEvent::Moving(self.bounds()));
        }
        events.push(self.pan(sx, sy));
        events
    }
}

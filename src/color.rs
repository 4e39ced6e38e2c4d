//! Value-to-color mapping for the sensor overlays.
//!
//! A reading is normalized linearly against its observed range and the
//! result samples a multi-stop gradient interpolated in RGB space.

use std::fmt;

use crate::models::NumericRange;

// ---

/// 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Rgb = Rgb(0xff, 0xff, 0xff);
    pub const BLACK: Rgb = Rgb(0x00, 0x00, 0x00);
    pub const LIGHT_BLUE: Rgb = Rgb(0xad, 0xd8, 0xe6);
    pub const CYAN: Rgb = Rgb(0x00, 0xff, 0xff);
    pub const LIME: Rgb = Rgb(0x00, 0xff, 0x00);
    pub const YELLOW: Rgb = Rgb(0xff, 0xff, 0x00);
    pub const ORANGE: Rgb = Rgb(0xff, 0xa5, 0x00);
    pub const RED: Rgb = Rgb(0xff, 0x00, 0x00);
    pub const BLUE: Rgb = Rgb(0x00, 0x00, 0xff);

    /// Lowercase `#rrggbb`.
    pub fn hex(&self) -> String {
        self.to_string()
    }

    fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let channel = |a: u8, b: u8| {
            let v = f64::from(a) + (f64::from(b) - f64::from(a)) * t;
            v.round().clamp(0.0, 255.0) as u8
        };
        Rgb(
            channel(self.0, other.0),
            channel(self.1, other.1),
            channel(self.2, other.2),
        )
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

/// Evenly spaced gradient stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorScale {
    stops: &'static [Rgb],
}

/// lightblue → cyan → lime → yellow → orange → red
pub const TEMPERATURE_SCALE: ColorScale = ColorScale {
    stops: &[
        Rgb::LIGHT_BLUE,
        Rgb::CYAN,
        Rgb::LIME,
        Rgb::YELLOW,
        Rgb::ORANGE,
        Rgb::RED,
    ],
};

/// white → lightblue → cyan → blue
pub const HUMIDITY_SCALE: ColorScale = ColorScale {
    stops: &[Rgb::WHITE, Rgb::LIGHT_BLUE, Rgb::CYAN, Rgb::BLUE],
};

impl ColorScale {
    /// Build a scale from at least one stop.
    pub const fn new(stops: &'static [Rgb]) -> Self {
        assert!(!stops.is_empty(), "a color scale needs at least one stop");
        Self { stops }
    }

    /// Sample the gradient at `t`. Positions are clamped to `[0, 1]` and NaN
    /// samples the first stop.
    pub fn sample(&self, t: f64) -> Rgb {
        // ---
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let last = self.stops.len() - 1;
        if last == 0 {
            return self.stops[0];
        }

        let pos = t * last as f64;
        let i = (pos.floor() as usize).min(last - 1);
        self.stops[i].lerp(self.stops[i + 1], pos - i as f64)
    }
}

/// Position of `value` within `range`: 0 at `min`, 1 at `max`. Values
/// outside the range fall outside `[0, 1]`. A degenerate range (zero or
/// non-finite width) yields 0.
pub fn normalize(value: f64, range: NumericRange) -> f64 {
    // ---
    let width = range.max - range.min;
    if width == 0.0 || !width.is_finite() {
        return 0.0;
    }
    (value - range.min) / width
}

/// Fill color for `value` on `scale`.
pub fn color_for(value: f64, range: NumericRange, scale: &ColorScale) -> Rgb {
    scale.sample(normalize(value, range))
}

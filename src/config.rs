//! Configuration loader for the `gps-dashboard` console.
//!
//! All runtime settings and their defaults live here, read from environment
//! variables (with optional `.env` support provided by the caller), so the
//! rest of the crate never calls `env::var` directly.
//!
use std::env;
use std::str::FromStr;

use anyhow::{anyhow, Result};

/// Parse an optional environment variable with a default value.
macro_rules! parse_env_or {
    ($var_name:expr, $ty:ty, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.trim().parse::<$ty>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse a required string environment variable.
macro_rules! require_env {
    ($var_name:expr) => {
        env::var($var_name)
            .map_err(|_| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

pub const DEFAULT_CENTER: (f64, f64) = (51.4545, -2.5879);
pub const DEFAULT_ZOOM: u8 = 16;
pub const DEFAULT_MAX_ZOOM: u8 = 19;

/// Strongly typed application configuration.
///
/// All fields are immutable after loading.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    // ---
    /// Backend base URL serving `/api/value-ranges` and `/api/device-data`.
    pub api_url: String,

    /// Initial map center as `(lat, lng)`.
    pub center: (f64, f64),

    /// Initial zoom level.
    pub zoom: u8,

    /// Highest zoom level the map allows.
    pub max_zoom: u8,

    /// Map size in pixels, used to derive viewport bounds.
    pub width_px: u32,
    pub height_px: u32,
}

/// Load configuration from environment variables with defaults.
///
/// Required:
/// - `DASHBOARD_API_URL` – backend base URL
///
/// Optional:
/// - `MAP_CENTER_LAT` / `MAP_CENTER_LNG` – initial center (default: 51.4545 / -2.5879)
/// - `MAP_ZOOM` – initial zoom (default: 16)
/// - `MAP_MAX_ZOOM` – zoom ceiling (default: 19)
/// - `MAP_WIDTH_PX` / `MAP_HEIGHT_PX` – map size (default: 1024 / 768)
///
/// Returns an error if any required variable is missing or invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let api_url = require_env!("DASHBOARD_API_URL");
    let lat = parse_env_or!("MAP_CENTER_LAT", f64, DEFAULT_CENTER.0);
    let lng = parse_env_or!("MAP_CENTER_LNG", f64, DEFAULT_CENTER.1);
    let zoom = parse_env_or!("MAP_ZOOM", u8, DEFAULT_ZOOM);
    let max_zoom = parse_env_or!("MAP_MAX_ZOOM", u8, DEFAULT_MAX_ZOOM);
    let width_px = parse_env_or!("MAP_WIDTH_PX", u32, 1024);
    let height_px = parse_env_or!("MAP_HEIGHT_PX", u32, 768);

    let cfg = Config {
        api_url,
        center: (lat, lng),
        zoom,
        max_zoom,
        width_px,
        height_px,
    };
    cfg.validate()?;
    Ok(cfg)
}

impl Config {
    /// Config pointing at `api_url` with every other setting defaulted.
    pub fn with_api_url(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
            width_px: 1024,
            height_px: 768,
        }
    }

    fn validate(&self) -> Result<()> {
        // ---
        let (lat, lng) = self.center;
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return Err(anyhow!("Map center ({}, {}) is not a valid position", lat, lng));
        }
        if self.zoom > self.max_zoom {
            return Err(anyhow!("MAP_ZOOM {} exceeds MAP_MAX_ZOOM {}", self.zoom, self.max_zoom));
        }
        if self.width_px == 0 || self.height_px == 0 {
            return Err(anyhow!("Map size must be non-zero"));
        }
        Ok(())
    }

    /// Log the loaded configuration for debugging purposes.
    pub fn log_config(&self) {
        // ---
        tracing::info!("Configuration loaded:");
        tracing::info!("  DASHBOARD_API_URL : {}", self.api_url);
        tracing::info!("  MAP_CENTER        : {}, {}", self.center.0, self.center.1);
        tracing::info!("  MAP_ZOOM          : {} (max {})", self.zoom, self.max_zoom);
        tracing::info!("  MAP_SIZE_PX       : {}x{}", self.width_px, self.height_px);
    }
}

/// Parse a value the way the loader does; used by the console too.
pub fn parse_value<T>(name: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| anyhow!("Invalid {}: {}", name, e))
}

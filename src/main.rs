//! Application entry point for the `gps-dashboard` console.
//!
//! This binary runs the dashboard against a live backend:
//! - Loading configuration from environment variables or `.env`
//! - Initializing structured logging/tracing
//! - Fetching the value ranges (fatal on failure)
//! - Performing the initial refresh for the configured map view
//! - Reading one interaction per line from stdin until `quit` or EOF
//!
//! # Environment Variables
//! - `DASHBOARD_API_URL` (**required**) – backend base URL
//! - `MAP_CENTER_LAT`, `MAP_CENTER_LNG`, `MAP_ZOOM`, `MAP_MAX_ZOOM`,
//!   `MAP_WIDTH_PX`, `MAP_HEIGHT_PX` (optional) – initial map view
//! - `DASHBOARD_LOG_LEVEL`, `DASHBOARD_SPAN_EVENTS`, `FORCE_COLOR`,
//!   `RUST_LOG` (optional) – log output, see [`gps_dashboard::telemetry`]
use anyhow::Result;
use dotenvy::dotenv;
use tokio::io::{AsyncBufReadExt, BufReader};

use gps_dashboard::{config, telemetry};
use gps_dashboard::console::{Command, Console};
use gps_dashboard::{Dashboard, HttpSensorApi, MapView};

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    dotenv().ok();
    telemetry::init();

    let cfg = config::load_from_env()?;
    cfg.log_config();

    let api = HttpSensorApi::new(&cfg.api_url);
    let dashboard = Dashboard::start(api).await?;

    let map = MapView::new(cfg.center, cfg.zoom, cfg.max_zoom, cfg.width_px, cfg.height_px);
    let mut console = Console::new(dashboard, map);

    print_lines(&console.load().await);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let cmd = match Command::parse(&line) {
            Ok(Some(cmd)) => cmd,
            Ok(None) => continue,
            Err(e) => {
                tracing::warn!("{}", e);
                continue;
            }
        };
        if cmd == Command::Quit {
            break;
        }
        print_lines(&console.execute(cmd).await);
    }

    tracing::info!("Console closed");
    Ok(())
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}

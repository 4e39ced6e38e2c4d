//! Dashboard controller: owns the session state and runs the refresh
//! pipeline.
//!
//! Startup fetches the value ranges once; a [`Dashboard`] only exists once
//! that has succeeded. After that every refresh, whatever triggered it,
//! goes through [`Dashboard::refresh`]:
//!
//! 1. take the next generation number,
//! 2. fetch records for the viewport (and the date filter, if complete),
//! 3. build both overlays into a buffer,
//! 4. swap the buffer in, unless a newer refresh has been issued meanwhile.
//!
//! Refreshes may overlap. The latest-issued one wins; anything older that
//! completes afterwards is dropped. A failed fetch leaves the current
//! render untouched.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, TimeZone};
use tracing::{debug, error, info, instrument};

use crate::api::{DeviceQuery, SensorApi};
use crate::error::{DashboardError, Result};
use crate::filter::DateFilterState;
use crate::models::{ValueRange, ViewportBounds};
use crate::overlay::{Layers, OverlayKind};
use crate::viewport::MapEvent;

// ---

/// What asked for a refresh. All sources run the identical pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Once, right after startup.
    Load,
    /// The map finished a pan or zoom.
    ViewportSettled,
    /// The user confirmed a date range.
    ApplyDateRange,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Trigger::Load => "load",
            Trigger::ViewportSettled => "viewport-settled",
            Trigger::ApplyDateRange => "apply-date-range",
        })
    }
}

/// Result of a refresh that got a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The response was rendered.
    Rendered { generation: u64, count: usize },
    /// A newer refresh was issued before this one completed; discarded.
    Stale { generation: u64, latest: u64 },
}

/// What is currently on screen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderedView {
    // ---
    pub layers: Layers,
    count: usize,
    /// Generation of the refresh that produced this render; 0 before any.
    generation: u64,
}

impl RenderedView {
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Text of the record counter.
    pub fn count_label(&self) -> String {
        format!("Data count: {}", self.count)
    }
}

/// Top-level controller. Methods take `&self` so overlapping refreshes can
/// run concurrently.
#[derive(Debug)]
pub struct Dashboard<A> {
    // ---
    api: A,
    ranges: ValueRange,
    filter: Mutex<DateFilterState>,
    issued: AtomicU64,
    view: Mutex<RenderedView>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<A: SensorApi> Dashboard<A> {
    /// Load the value ranges and seed the date filter from them.
    pub async fn start(api: A) -> Result<Self> {
        // ---
        let ranges = match api.value_ranges().await {
            Ok(ranges) => ranges,
            Err(e) => {
                error!("[startup] Failed to load value ranges: {}", e);
                return Err(DashboardError::Startup(e));
            }
        };
        info!("Value ranges loaded: {:?}", ranges);

        let filter = DateFilterState::seeded(&ranges.date);
        Ok(Self {
            api,
            ranges,
            filter: Mutex::new(filter),
            issued: AtomicU64::new(0),
            view: Mutex::new(RenderedView::default()),
        })
    }

    pub fn ranges(&self) -> &ValueRange {
        &self.ranges
    }

    /// Snapshot of the current render.
    pub fn view(&self) -> RenderedView {
        lock(&self.view).clone()
    }

    /// Snapshot of the date pickers.
    pub fn filter_state(&self) -> DateFilterState {
        lock(&self.filter).clone()
    }

    /// "start changed" from the start picker. Takes effect on the next
    /// refresh.
    pub fn set_start<Tz: TimeZone>(&self, chosen: DateTime<Tz>) {
        lock(&self.filter).set_start(chosen);
    }

    /// "end changed" from the end picker.
    pub fn set_end<Tz: TimeZone>(&self, chosen: DateTime<Tz>) {
        lock(&self.filter).set_end(chosen);
    }

    pub fn clear_start(&self) {
        lock(&self.filter).clear_start();
    }

    pub fn clear_end(&self) {
        lock(&self.filter).clear_end();
    }

    /// Layer toggle; does not refetch.
    pub fn select_layer(&self, kind: OverlayKind) {
        lock(&self.view).layers.select(kind);
    }

    /// Route a refresh request from any source.
    #[instrument(level = "debug", skip(self))]
    pub async fn trigger(&self, trigger: Trigger, viewport: ViewportBounds) -> Result<RefreshOutcome> {
        debug!("Refresh requested by {}", trigger);
        self.refresh(viewport).await
    }

    /// Map viewport notifications. Only settled events refresh; `None` for
    /// intermediate frames.
    pub async fn on_map_event(&self, event: MapEvent) -> Option<Result<RefreshOutcome>> {
        match event {
            MapEvent::Moving(_) => None,
            MapEvent::Settled(bounds) => Some(self.trigger(Trigger::ViewportSettled, bounds).await),
        }
    }

    /// Fetch records for `viewport` and rebuild both overlays.
    pub async fn refresh(&self, viewport: ViewportBounds) -> Result<RefreshOutcome> {
        // ---
        let generation = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let query = DeviceQuery::new(viewport, lock(&self.filter).filter());
        debug!("Refresh #{} query: {:?}", generation, query);

        let collection = match self.api.device_data(&query).await {
            Ok(collection) => collection,
            Err(e) => {
                error!("[refresh] #{} failed, keeping previous render: {}", generation, e);
                return Err(DashboardError::Refresh(e));
            }
        };

        let records = collection.into_records();
        let (temperature, humidity) = Layers::build(&records, &self.ranges);

        let mut view = lock(&self.view);
        let latest = self.issued.load(Ordering::SeqCst);
        if generation != latest {
            debug!("Refresh #{} superseded by #{}, discarding", generation, latest);
            return Ok(RefreshOutcome::Stale { generation, latest });
        }

        view.layers.replace(temperature, humidity);
        view.count = records.len();
        view.generation = generation;

        info!("Refresh #{} rendered {} records", generation, view.count);
        Ok(RefreshOutcome::Rendered {
            generation,
            count: view.count,
        })
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::error::ApiError;
    use crate::models::{DateSpan, FeatureCollection, NumericRange};
    use async_trait::async_trait;
    use chrono::Utc;
    use serde_json::value::{to_raw_value, RawValue};
    use serde_json::json;
    use std::collections::VecDeque;
    use tokio::sync::oneshot;

    type Reply = std::result::Result<FeatureCollection, ApiError>;

    enum Scripted {
        Now(Reply),
        Later(oneshot::Receiver<Reply>),
    }

    /// Backend double: hands out scripted replies in call order and keeps
    /// every query it saw.
    struct ScriptedApi {
        ranges: Option<ValueRange>,
        replies: Mutex<VecDeque<Scripted>>,
        queries: Mutex<Vec<DeviceQuery>>,
    }

    impl ScriptedApi {
        fn new(replies: Vec<Scripted>) -> Self {
            Self {
                ranges: Some(ranges()),
                replies: Mutex::new(replies.into()),
                queries: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SensorApi for ScriptedApi {
        async fn value_ranges(&self) -> std::result::Result<ValueRange, ApiError> {
            self.ranges.clone().ok_or_else(|| server_error("/api/value-ranges"))
        }

        async fn device_data(&self, query: &DeviceQuery) -> Reply {
            lock(&self.queries).push(*query);
            let next = lock(&self.replies).pop_front();
            match next {
                Some(Scripted::Now(reply)) => reply,
                Some(Scripted::Later(rx)) => rx.await.unwrap_or_else(|_| Err(server_error("dropped"))),
                None => Ok(FeatureCollection::default()),
            }
        }
    }

    fn server_error(url: &str) -> ApiError {
        ApiError::Status {
            url: url.to_string(),
            status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn ranges() -> ValueRange {
        ValueRange {
            temperature: NumericRange::new(10.0, 30.0),
            humidity: NumericRange::new(0.0, 100.0),
            date: DateSpan {
                earliest: "2024-05-01T00:00:00Z".to_string(),
                latest: "2024-05-08T00:00:00Z".to_string(),
            },
        }
    }

    fn feature(device: &str, temperature: f64) -> Box<RawValue> {
        let value = json!({
            "type": "Feature",
            "properties": {
                "device": device,
                "temperature": temperature,
                "humidity": 55.0,
                "altitude": 20.0,
                "recorded": "2024-05-03T12:00:00Z"
            },
            "geometry": { "type": "Point", "coordinates": [-2.59, 51.45] }
        });
        to_raw_value(&value).unwrap()
    }

    fn collection(devices: &[&str]) -> FeatureCollection {
        FeatureCollection {
            features: devices.iter().map(|d| feature(d, 20.0)).collect(),
        }
    }

    fn viewport() -> ViewportBounds {
        ViewportBounds {
            west: -2.6,
            south: 51.44,
            east: -2.57,
            north: 51.46,
        }
    }

    fn devices(view: &RenderedView) -> Vec<String> {
        view.layers
            .temperature
            .markers()
            .iter()
            .map(|m| m.popup.device.clone())
            .collect()
    }

    #[test]
    fn test_startup_failure_is_fatal() {
        // ---
        let mut api = ScriptedApi::new(vec![]);
        api.ranges = None;

        let result = tokio_test::block_on(Dashboard::start(api));
        assert!(matches!(result, Err(DashboardError::Startup(_))));
    }

    #[test]
    fn test_startup_seeds_filter() {
        // ---
        let dashboard = tokio_test::block_on(Dashboard::start(ScriptedApi::new(vec![]))).unwrap();
        let filter = dashboard.filter_state().filter().expect("seeded from date span");

        assert_eq!(filter.start_param(), "2024-05-01T00:00:00.000Z");
        assert_eq!(filter.end_param(), "2024-05-08T00:00:00.000Z");
        assert_eq!(dashboard.view().count_label(), "Data count: 0");
    }

    #[tokio::test]
    async fn test_refresh_renders_both_overlays() {
        // ---
        let api = ScriptedApi::new(vec![Scripted::Now(Ok(collection(&["a", "b", "c"])))]);
        let dashboard = Dashboard::start(api).await.unwrap();

        let outcome = dashboard.trigger(Trigger::Load, viewport()).await.unwrap();
        assert_eq!(outcome, RefreshOutcome::Rendered { generation: 1, count: 3 });

        let view = dashboard.view();
        assert_eq!(view.layers.temperature.len(), 3);
        assert_eq!(view.layers.humidity.len(), 3);
        assert_eq!(view.count_label(), "Data count: 3");
    }

    #[tokio::test]
    async fn test_empty_response_clears_overlays() {
        // ---
        let api = ScriptedApi::new(vec![
            Scripted::Now(Ok(collection(&["a", "b"]))),
            Scripted::Now(Ok(FeatureCollection::default())),
        ]);
        let dashboard = Dashboard::start(api).await.unwrap();

        dashboard.refresh(viewport()).await.unwrap();
        dashboard.refresh(viewport()).await.unwrap();

        let view = dashboard.view();
        assert!(view.layers.temperature.is_empty());
        assert!(view.layers.humidity.is_empty());
        assert_eq!(view.count_label(), "Data count: 0");
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_render() {
        // ---
        let api = ScriptedApi::new(vec![
            Scripted::Now(Ok(collection(&["a", "b"]))),
            Scripted::Now(Err(server_error("/api/device-data"))),
        ]);
        let dashboard = Dashboard::start(api).await.unwrap();

        dashboard.refresh(viewport()).await.unwrap();
        let before = dashboard.view();

        let result = dashboard.refresh(viewport()).await;
        assert!(matches!(result, Err(DashboardError::Refresh(_))));
        assert_eq!(dashboard.view(), before);
    }

    #[tokio::test]
    async fn test_malformed_records_skipped_counts_match() {
        // ---
        let mut fc = collection(&["a", "b"]);
        let broken = json!({ "type": "Feature", "properties": {}, "geometry": null });
        fc.features.push(to_raw_value(&broken).unwrap());

        let dashboard = Dashboard::start(ScriptedApi::new(vec![Scripted::Now(Ok(fc))]))
            .await
            .unwrap();
        dashboard.refresh(viewport()).await.unwrap();

        let view = dashboard.view();
        assert_eq!(view.count(), 2);
        assert_eq!(view.layers.temperature.len(), view.count());
        assert_eq!(view.layers.humidity.len(), view.count());
    }

    #[tokio::test]
    async fn test_latest_issued_refresh_wins() {
        // ---
        let (first_tx, first_rx) = oneshot::channel();
        let (second_tx, second_rx) = oneshot::channel();
        let api = ScriptedApi::new(vec![Scripted::Later(first_rx), Scripted::Later(second_rx)]);
        let dashboard = Dashboard::start(api).await.unwrap();

        let (first, second, ()) = tokio::join!(
            dashboard.refresh(viewport()),
            dashboard.refresh(viewport()),
            async {
                // Second-issued response arrives first.
                second_tx.send(Ok(collection(&["new"]))).ok();
                tokio::task::yield_now().await;
                first_tx.send(Ok(collection(&["old-1", "old-2"]))).ok();
            }
        );

        assert_eq!(first.unwrap(), RefreshOutcome::Stale { generation: 1, latest: 2 });
        assert_eq!(second.unwrap(), RefreshOutcome::Rendered { generation: 2, count: 1 });

        let view = dashboard.view();
        assert_eq!(devices(&view), vec!["new"]);
        assert_eq!(view.generation(), 2);
    }

    #[tokio::test]
    async fn test_stale_success_does_not_override_failed_latest() {
        // ---
        let (first_tx, first_rx) = oneshot::channel();
        let api = ScriptedApi::new(vec![
            Scripted::Later(first_rx),
            Scripted::Now(Err(server_error("/api/device-data"))),
        ]);
        let dashboard = Dashboard::start(api).await.unwrap();

        let (first, second, ()) = tokio::join!(
            dashboard.refresh(viewport()),
            dashboard.refresh(viewport()),
            async {
                first_tx.send(Ok(collection(&["old"]))).ok();
            }
        );

        assert!(matches!(first, Ok(RefreshOutcome::Stale { .. })));
        assert!(second.is_err());
        assert_eq!(dashboard.view().count_label(), "Data count: 0");
    }

    #[tokio::test]
    async fn test_moving_events_do_not_refresh() {
        // ---
        let dashboard = Dashboard::start(ScriptedApi::new(vec![])).await.unwrap();

        assert!(dashboard.on_map_event(MapEvent::Moving(viewport())).await.is_none());
        assert!(lock(&dashboard.api.queries).is_empty());

        let outcome = dashboard.on_map_event(MapEvent::Settled(viewport())).await;
        assert!(matches!(outcome, Some(Ok(RefreshOutcome::Rendered { .. }))));
        assert_eq!(lock(&dashboard.api.queries).len(), 1);
    }

    #[tokio::test]
    async fn test_half_set_filter_omits_dates() {
        // ---
        let dashboard = Dashboard::start(ScriptedApi::new(vec![])).await.unwrap();
        dashboard.clear_end();
        dashboard.set_start(Utc::now());

        dashboard.trigger(Trigger::ApplyDateRange, viewport()).await.unwrap();

        let queries = lock(&dashboard.api.queries);
        assert_eq!(queries[0].dates, None);
        assert_eq!(queries[0].viewport, viewport());
    }

    #[tokio::test]
    async fn test_layer_toggle_survives_refresh() {
        // ---
        let dashboard = Dashboard::start(ScriptedApi::new(vec![Scripted::Now(Ok(collection(&["a"])))]))
            .await
            .unwrap();
        dashboard.select_layer(OverlayKind::Humidity);
        dashboard.refresh(viewport()).await.unwrap();

        let view = dashboard.view();
        assert_eq!(view.layers.visible_kind(), OverlayKind::Humidity);
        assert_eq!(view.layers.visible().len(), 1);
    }
}

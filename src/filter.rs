//! Date filter state driven by the start/end pickers.
//!
//! Each picker replaces exactly one bound. The pipeline only ever sees a
//! complete [`DateFilter`]; a half-set state means "no date filtering".

use chrono::{DateTime, Local, NaiveDateTime, SecondsFormat, TimeZone, Utc};

use crate::models::DateSpan;

// ---

/// Picker display format (local time).
pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Naive layouts accepted from the backend and from the console, tried in
/// order after RFC 3339.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// A complete date range. Not validated: `start` may be after `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateFilter {
    // ---
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateFilter {
    /// `start_date` query value.
    pub fn start_param(&self) -> String {
        to_iso(&self.start)
    }

    /// `end_date` query value.
    pub fn end_param(&self) -> String {
        to_iso(&self.end)
    }
}

/// Canonical outbound form: UTC, millisecond precision, `Z` suffix.
pub fn to_iso(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a backend timestamp. Offset-less values are taken as UTC.
pub fn parse_backend_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    // ---
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    parse_naive(raw).map(|naive| naive.and_utc())
}

/// Parse a user-entered timestamp. Offset-less values are taken in `tz`,
/// the zone the picker displays.
pub fn parse_user_timestamp<Tz: TimeZone>(raw: &str, tz: &Tz) -> Option<DateTime<Utc>> {
    // ---
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    let naive = parse_naive(raw)?;
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|ts| ts.with_timezone(&Utc))
}

fn parse_naive(raw: &str) -> Option<NaiveDateTime> {
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

/// Mutable start/end selection owned by the dashboard controller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateFilterState {
    // ---
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
}

impl DateFilterState {
    /// Seed both bounds from the backend's date span. A bound whose
    /// timestamp cannot be parsed stays unset.
    pub fn seeded(span: &DateSpan) -> Self {
        // ---
        let parse = |label: &str, raw: &str| {
            let ts = parse_backend_timestamp(raw);
            if ts.is_none() {
                tracing::warn!("Unparseable {} date in value ranges: {:?}", label, raw);
            }
            ts
        };

        Self {
            start: parse("earliest", &span.earliest),
            end: parse("latest", &span.latest),
        }
    }

    /// "start changed" picker event.
    pub fn set_start<Tz: TimeZone>(&mut self, chosen: DateTime<Tz>) {
        self.start = Some(chosen.with_timezone(&Utc));
    }

    /// "end changed" picker event.
    pub fn set_end<Tz: TimeZone>(&mut self, chosen: DateTime<Tz>) {
        self.end = Some(chosen.with_timezone(&Utc));
    }

    pub fn clear_start(&mut self) {
        self.start = None;
    }

    pub fn clear_end(&mut self) {
        self.end = None;
    }

    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.start
    }

    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.end
    }

    /// The filter to apply, present only when both bounds are set.
    pub fn filter(&self) -> Option<DateFilter> {
        Some(DateFilter {
            start: self.start?,
            end: self.end?,
        })
    }

    /// `(start, end)` as the pickers show them, in local time.
    pub fn display(&self) -> (String, String) {
        let show = |ts: Option<DateTime<Utc>>| {
            ts.map(|t| t.with_timezone(&Local).format(DISPLAY_FORMAT).to_string())
                .unwrap_or_else(|| "-".to_string())
        };
        (show(self.start), show(self.end))
    }
}

//! Line-oriented console that stands in for the browser UI.
//!
//! Each input line maps to one user interaction: moving the map, picking a
//! date, pressing "apply", toggling the layer. Output is the text the page
//! would show.

use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, Local, Utc};

use crate::api::SensorApi;
use crate::config::parse_value;
use crate::dashboard::{Dashboard, RefreshOutcome, Trigger};
use crate::filter::parse_user_timestamp;
use crate::overlay::OverlayKind;
use crate::viewport::{MapEvent, MapView, Zoom, MAX_DRAG_STEPS};

// ---

pub const HELP: &str = "\
commands:
  pan <dx> <dy>            move the map by pixels (east/south positive)
  drag <dx> <dy> <steps>   move the map in 1-1000 frames
  zoom <in|out>            change zoom level
  start <datetime>         pick the start date (RFC 3339 or local YYYY-MM-DD HH:MM)
  end <datetime>           pick the end date
  clear <start|end>        clear a date bound
  apply                    apply the date range
  layer <temperature|humidity>
  show                     print the visible layer
  dates                    print the selected dates
  help | quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Start,
    End,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Pan { dx: f64, dy: f64 },
    Drag { dx: f64, dy: f64, steps: u32 },
    Zoom(Zoom),
    Pick(Bound, DateTime<Utc>),
    Clear(Bound),
    Apply,
    Layer(OverlayKind),
    Show,
    Dates,
    Help,
    Quit,
}

fn parse_bound(raw: &str) -> Result<Bound> {
    match raw {
        "start" => Ok(Bound::Start),
        "end" => Ok(Bound::End),
        other => bail!("expected start or end, got '{}'", other),
    }
}

impl Command {
    /// Parse one input line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Result<Option<Command>> {
        // ---
        let line = line.trim();
        let Some((word, rest)) = line
            .split_once(char::is_whitespace)
            .map(|(w, r)| (w, r.trim()))
            .or_else(|| (!line.is_empty()).then_some((line, "")))
        else {
            return Ok(None);
        };
        let word = word.to_ascii_lowercase();
        let args: Vec<&str> = rest.split_whitespace().collect();

        let cmd = match (word.as_str(), args.as_slice()) {
            ("pan", [dx, dy]) => Command::Pan {
                dx: parse_value("dx", dx)?,
                dy: parse_value("dy", dy)?,
            },
            ("drag", [dx, dy, steps]) => {
                let steps: u32 = parse_value("steps", steps)?;
                if !(1..=MAX_DRAG_STEPS).contains(&steps) {
                    bail!("steps must be between 1 and {}, got {}", MAX_DRAG_STEPS, steps);
                }
                Command::Drag {
                    dx: parse_value("dx", dx)?,
                    dy: parse_value("dy", dy)?,
                    steps,
                }
            }
            ("zoom", ["in"]) => Command::Zoom(Zoom::In),
            ("zoom", ["out"]) => Command::Zoom(Zoom::Out),
            ("start" | "end", _) if !rest.is_empty() => {
                let bound = parse_bound(&word)?;
                let ts = parse_user_timestamp(rest, &Local)
                    .ok_or_else(|| anyhow!("cannot parse date '{}'", rest))?;
                Command::Pick(bound, ts)
            }
            ("clear", [bound]) => Command::Clear(parse_bound(bound)?),
            ("apply", []) => Command::Apply,
            ("layer", [kind]) => Command::Layer(kind.parse().map_err(|e: String| anyhow!(e))?),
            ("show", []) => Command::Show,
            ("dates", []) => Command::Dates,
            ("help", []) => Command::Help,
            ("quit" | "exit", []) => Command::Quit,
            _ => bail!("unrecognized command '{}' (try 'help')", line),
        };
        Ok(Some(cmd))
    }
}

/// Console session: the dashboard plus the map it is looking at.
#[derive(Debug)]
pub struct Console<A> {
    // ---
    dashboard: Dashboard<A>,
    map: MapView,
}

impl<A: SensorApi> Console<A> {
    pub fn new(dashboard: Dashboard<A>, map: MapView) -> Self {
        Self { dashboard, map }
    }

    pub fn dashboard(&self) -> &Dashboard<A> {
        &self.dashboard
    }

    pub fn map(&self) -> &MapView {
        &self.map
    }

    /// First refresh, once the page is ready.
    pub async fn load(&self) -> Vec<String> {
        let outcome = self.dashboard.trigger(Trigger::Load, self.map.bounds()).await;
        self.after_refresh(Some(outcome))
    }

    /// Run one command and return the lines to print.
    pub async fn execute(&mut self, cmd: Command) -> Vec<String> {
        // ---
        match cmd {
            Command::Pan { dx, dy } => {
                let event = self.map.pan(dx, dy);
                let outcome = self.dashboard.on_map_event(event).await;
                self.after_refresh(outcome)
            }
            Command::Drag { dx, dy, steps } => {
                let mut last = None;
                for event in self.map.drag(dx, dy, steps) {
                    if let Some(outcome) = self.dashboard.on_map_event(event).await {
                        last = Some(outcome);
                    }
                }
                self.after_refresh(last)
            }
            Command::Zoom(direction) => {
                let event: MapEvent = self.map.zoom(direction);
                let outcome = self.dashboard.on_map_event(event).await;
                self.after_refresh(outcome)
            }
            Command::Pick(Bound::Start, ts) => {
                self.dashboard.set_start(ts);
                self.dates()
            }
            Command::Pick(Bound::End, ts) => {
                self.dashboard.set_end(ts);
                self.dates()
            }
            Command::Clear(Bound::Start) => {
                self.dashboard.clear_start();
                self.dates()
            }
            Command::Clear(Bound::End) => {
                self.dashboard.clear_end();
                self.dates()
            }
            Command::Apply => {
                let outcome = self
                    .dashboard
                    .trigger(Trigger::ApplyDateRange, self.map.bounds())
                    .await;
                self.after_refresh(Some(outcome))
            }
            Command::Layer(kind) => {
                self.dashboard.select_layer(kind);
                vec![format!("Layer: {kind}")]
            }
            Command::Show => self.show(),
            Command::Dates => self.dates(),
            Command::Help => HELP.lines().map(str::to_string).collect(),
            Command::Quit => Vec::new(),
        }
    }

    /// The counter text, once a response has been rendered. Failures were
    /// already logged by the dashboard and leave the page as it was.
    fn after_refresh(&self, outcome: Option<crate::error::Result<RefreshOutcome>>) -> Vec<String> {
        match outcome {
            Some(Ok(RefreshOutcome::Rendered { .. })) => vec![self.dashboard.view().count_label()],
            _ => Vec::new(),
        }
    }

    fn dates(&self) -> Vec<String> {
        let (start, end) = self.dashboard.filter_state().display();
        vec![format!("Start: {start}"), format!("End: {end}")]
    }

    fn show(&self) -> Vec<String> {
        // ---
        let view = self.dashboard.view();
        let overlay = view.layers.visible();
        let mut lines = vec![view.count_label(), format!("Layer: {}", overlay.kind)];
        lines.extend(overlay.markers().iter().map(|m| m.to_string()));
        lines
    }
}

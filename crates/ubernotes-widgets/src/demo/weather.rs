//! Simulated weather panel.

use crate::view::{InputOutcome, WidgetInput, WidgetView};
use chrono::{Local, Timelike};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Location shown when the saved state has none.
pub const DEFAULT_LOCATION: &str = "San Francisco";

/// One weather reading.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    pub location: String,
    pub condition: &'static str,
    pub icon: &'static str,
    pub temperature_c: i32,
    pub humidity: u8,
}

impl WeatherReport {
    pub fn display(&self) -> String {
        format!(
            "{} {} {}°C, {} ({}% humidity)",
            self.icon, self.location, self.temperature_c, self.condition, self.humidity
        )
    }
}

/// Where weather readings come from.
pub trait WeatherSource: Send {
    fn report(&self, location: &str, hour: u32) -> WeatherReport;
}

/// Fixed conditions indexed by hour of day.
#[derive(Debug, Clone, Copy, Default)]
pub struct CannedWeather;

impl WeatherSource for CannedWeather {
    fn report(&self, location: &str, hour: u32) -> WeatherReport {
        let (condition, icon, temperature_c, humidity) = match hour % 24 {
            0..=5 => ("Clear", "🌙", 11, 82),
            6..=9 => ("Morning Fog", "🌫️", 13, 90),
            10..=13 => ("Partly Cloudy", "⛅", 18, 64),
            14..=17 => ("Sunny", "☀️", 21, 52),
            18..=20 => ("Cloudy", "☁️", 16, 70),
            _ => ("Clear", "🌙", 13, 78),
        };
        WeatherReport {
            location: location.to_string(),
            condition,
            icon,
            temperature_c,
            humidity,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WeatherState {
    location: String,
}

/// The weather widget.
pub struct WeatherWidget<W: WeatherSource> {
    source: W,
    location: String,
    hour: Option<u32>,
    report: Option<WeatherReport>,
}

impl<W: WeatherSource> WeatherWidget<W> {
    pub fn new(source: W) -> Self {
        Self {
            source,
            location: DEFAULT_LOCATION.to_string(),
            hour: None,
            report: None,
        }
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn report(&self) -> Option<&WeatherReport> {
        self.report.as_ref()
    }

    /// Show the reading for `hour`. Returns false if already showing it.
    pub fn refresh_at(&mut self, hour: u32) -> bool {
        if self.hour == Some(hour) {
            return false;
        }
        self.hour = Some(hour);
        self.report = Some(self.source.report(&self.location, hour));
        true
    }
}

impl<W: WeatherSource> WidgetView for WeatherWidget<W> {
    fn init(&mut self, content: &str) {
        if let Ok(state) = serde_json::from_str::<WeatherState>(content) {
            if !state.location.trim().is_empty() {
                self.location = state.location;
            }
        }
        self.hour = None;
        self.refresh_at(Local::now().hour());
    }

    fn content(&self) -> String {
        let state = WeatherState {
            location: self.location.clone(),
        };
        serde_json::to_string(&state).unwrap_or_default()
    }

    fn handle_input(&mut self, _input: WidgetInput) -> InputOutcome {
        InputOutcome::Ignored
    }

    fn tick(&mut self, _now: Instant) -> InputOutcome {
        if self.refresh_at(Local::now().hour()) {
            log::trace!("Weather refreshed for {}", self.location);
        }
        InputOutcome::Unchanged
    }

    fn saves_immediately(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canned_by_hour() {
        let source = CannedWeather;
        assert_eq!(source.report("Oslo", 3).condition, "Clear");
        assert_eq!(source.report("Oslo", 15).condition, "Sunny");
        assert_eq!(source.report("Oslo", 15).temperature_c, 21);
        assert_eq!(source.report("Oslo", 39).condition, "Sunny");
    }

    #[test]
    fn test_location_from_state() {
        let mut widget = WeatherWidget::new(CannedWeather);
        widget.init(r#"{"location":"Oslo"}"#);
        assert_eq!(widget.location(), "Oslo");
        assert_eq!(widget.report().unwrap().location, "Oslo");
        assert_eq!(widget.content(), r#"{"location":"Oslo"}"#);
    }

    #[test]
    fn test_default_location_on_bad_state() {
        let mut widget = WeatherWidget::new(CannedWeather);
        widget.init("not json");
        assert_eq!(widget.location(), DEFAULT_LOCATION);
    }

    #[test]
    fn test_refresh_only_on_new_hour() {
        let mut widget = WeatherWidget::new(CannedWeather);
        assert!(widget.refresh_at(8));
        assert!(!widget.refresh_at(8));
        assert!(widget.refresh_at(9));
        let report = widget.report().unwrap();
        assert_eq!(
            report.display(),
            format!("{} San Francisco 13°C, Morning Fog (90% humidity)", report.icon)
        );
    }
}

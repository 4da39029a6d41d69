//! Simulated Ethereum price chart.

use crate::view::{InputOutcome, WidgetInput, WidgetView};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::time::{Duration, Instant};

const BASE_PRICE: f64 = 2400.0;
const MIN_PRICE: f64 = 1800.0;
const MAX_PRICE: f64 = 3200.0;

/// How often the chart regenerates its series.
pub const PRICE_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// Chart time range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PriceRange {
    #[default]
    Week,
    Month,
}

impl PriceRange {
    pub fn parse(key: &str) -> Option<Self> {
        match key {
            "7d" => Some(Self::Week),
            "30d" => Some(Self::Month),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::Week => "7d",
            Self::Month => "30d",
        }
    }

    pub fn days(self) -> i64 {
        match self {
            Self::Week => 7,
            Self::Month => 30,
        }
    }

    /// Hourly data points in the range.
    pub fn points(self) -> usize {
        (self.days() * 24) as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

/// Latest price and its change against the previous point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceSummary {
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
}

impl PriceSummary {
    pub fn from_series(points: &[PricePoint]) -> Option<Self> {
        let latest = points.last()?;
        let previous = if points.len() > 1 {
            &points[points.len() - 2]
        } else {
            latest
        };
        let change = latest.price - previous.price;
        Some(Self {
            price: latest.price,
            change,
            change_percent: change / previous.price * 100.0,
        })
    }

    /// Display form, e.g. `$2412.50 +0.52%`.
    pub fn display(&self) -> String {
        let sign = if self.change_percent >= 0.0 { "+" } else { "" };
        format!("${:.2} {}{:.2}%", self.price, sign, self.change_percent)
    }
}

/// Where price series come from.
pub trait PriceSource: Send {
    fn series(&mut self, range: PriceRange, end: DateTime<Utc>) -> Vec<PricePoint>;
}

/// Random walk around a base price with a cyclical trend.
pub struct SimulatedPriceSource {
    rng: StdRng,
}

impl SimulatedPriceSource {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for SimulatedPriceSource {
    fn default() -> Self {
        Self::new()
    }
}

impl PriceSource for SimulatedPriceSource {
    fn series(&mut self, range: PriceRange, end: DateTime<Utc>) -> Vec<PricePoint> {
        let count = range.points();
        let step = ChronoDuration::days(range.days()) / count as i32;
        let mut price = BASE_PRICE;

        (0..count)
            .map(|i| {
                let walk = (self.rng.random::<f64>() - 0.5) * 0.03;
                let trend = (i as f64 / count as f64 * PI * 4.0).sin() * 0.01;
                let volatility = 1.0 + (self.rng.random::<f64>() - 0.5) * 0.1;
                price = (price * (1.0 + walk + trend) * volatility).clamp(MIN_PRICE, MAX_PRICE);

                PricePoint {
                    timestamp: end - step * (count - i - 1) as i32,
                    price,
                }
            })
            .collect()
    }
}

/// Persisted state blob of the price widget.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceState {
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    range: Option<String>,
    #[serde(default)]
    last_price: Option<f64>,
}

/// The price chart widget.
pub struct PriceWidget<P: PriceSource> {
    source: P,
    range: PriceRange,
    series: Vec<PricePoint>,
    last_refresh: Option<Instant>,
}

impl<P: PriceSource> PriceWidget<P> {
    pub fn new(source: P) -> Self {
        Self {
            source,
            range: PriceRange::default(),
            series: Vec::new(),
            last_refresh: None,
        }
    }

    pub fn range(&self) -> PriceRange {
        self.range
    }

    pub fn series(&self) -> &[PricePoint] {
        &self.series
    }

    pub fn summary(&self) -> Option<PriceSummary> {
        PriceSummary::from_series(&self.series)
    }

    fn refresh(&mut self, now: Instant) {
        self.series = self.source.series(self.range, Utc::now());
        self.last_refresh = Some(now);
        if let Some(summary) = self.summary() {
            log::trace!("ETH {} over {}", summary.display(), self.range.key());
        }
    }
}

impl<P: PriceSource> WidgetView for PriceWidget<P> {
    fn init(&mut self, content: &str) {
        if let Ok(state) = serde_json::from_str::<PriceState>(content) {
            if let Some(range) = state.range.as_deref().and_then(PriceRange::parse) {
                self.range = range;
            }
        }
        self.refresh(Instant::now());
    }

    fn content(&self) -> String {
        let state = PriceState {
            timestamp: Some(Utc::now()),
            range: Some(self.range.key().to_string()),
            last_price: self.summary().map(|summary| summary.price),
        };
        serde_json::to_string(&state).unwrap_or_default()
    }

    fn handle_input(&mut self, input: WidgetInput) -> InputOutcome {
        let WidgetInput::SelectRange(key) = input else {
            return InputOutcome::Ignored;
        };
        match PriceRange::parse(&key) {
            Some(range) if range != self.range => {
                self.range = range;
                self.refresh(Instant::now());
                InputOutcome::Changed
            }
            Some(_) => InputOutcome::Unchanged,
            None => {
                log::debug!("Unknown price range {:?}", key);
                InputOutcome::Unchanged
            }
        }
    }

    fn tick(&mut self, now: Instant) -> InputOutcome {
        let due = self
            .last_refresh
            .is_none_or(|last| now.saturating_duration_since(last) >= PRICE_REFRESH_INTERVAL);
        if due {
            self.refresh(now);
            InputOutcome::Changed
        } else {
            InputOutcome::Unchanged
        }
    }

    fn saves_immediately(&self) -> bool {
        false
    }
}

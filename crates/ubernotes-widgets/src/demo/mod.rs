//! Read-only demo widgets backed by simulated data sources.

pub mod price;
pub mod weather;

pub use price::{PriceRange, PriceSource, PriceSummary, PriceWidget, SimulatedPriceSource};
pub use weather::{CannedWeather, WeatherReport, WeatherSource, WeatherWidget};

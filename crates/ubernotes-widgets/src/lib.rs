//! Widget-side logic for UberNotes.
//!
//! Everything here runs inside a widget's isolated context:
//!
//! - **Note**: rich-text content, dictation and the rule-based mutator
//! - **Demo**: simulated weather and Ethereum price widgets
//! - **Runtime**: the widget end of the message bridge

pub mod demo;
pub mod mutator;
pub mod note;
pub mod runtime;
pub mod throttle;
pub mod view;

pub use demo::{CannedWeather, PriceRange, PriceWidget, SimulatedPriceSource, WeatherWidget};
pub use mutator::Mutation;
pub use note::{NoteError, NoteWidget};
pub use runtime::{HostLink, RuntimeEvent, WidgetRuntime};
pub use throttle::SaveThrottle;
pub use view::{InputOutcome, WidgetInput, WidgetView};

use ubernotes_core::Settings;
use ubernotes_core::template::{ETH_PRICE_TEMPLATE, WEATHER_TEMPLATE};

/// Build the view for a template key. Unknown keys get a note.
pub fn view_for_template(template: &str, settings: &Settings) -> Box<dyn WidgetView> {
    match template {
        WEATHER_TEMPLATE => Box::new(WeatherWidget::new(CannedWeather)),
        ETH_PRICE_TEMPLATE => Box::new(PriceWidget::new(SimulatedPriceSource::new())),
        _ => Box::new(NoteWidget::new(settings)),
    }
}

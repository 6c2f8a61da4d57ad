//! Conversions between OpenFeature and LaunchDarkly data shapes.

mod context;
mod result;
mod tracking;

pub use context::translate_context;
pub use result::{error_code, translate_result, FlagType};
pub use tracking::translate_tracking_event_details;

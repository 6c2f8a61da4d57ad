use serde_json::Value;

use crate::resolution::TrackingEventDetails;

const VALUE: &str = "value";

/// Translate tracking details into the `data` argument of [crate::LdClient::track].
///
/// The metric value travels separately, so it is removed from the data. If nothing else is
/// left, there is no data to send.
pub fn translate_tracking_event_details(details: &TrackingEventDetails) -> Option<Value> {
    let mut data = details.attributes.clone();
    data.remove(VALUE);
    if data.is_empty() {
        None
    } else {
        Some(Value::Object(data))
    }
}

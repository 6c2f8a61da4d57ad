//! An [OpenFeature](https://openfeature.dev) provider for the LaunchDarkly server-side SDK.
//!
//! [LaunchDarklyProvider] implements [FeatureProvider] on top of any [LdClient]. It converts
//! OpenFeature evaluation contexts into LaunchDarkly [User]s, forwards evaluations to the client
//! and converts the client's [Detail] results back into [ResolutionDetails]. Flag evaluation,
//! data sources and analytics delivery all stay inside the client.
//!
//! # Logging
//!
//! Attributes that cannot be translated are dropped and reported through the
//! [`log`](https://docs.rs/log) crate rather than failing the evaluation.

mod attribute_value;
mod client;
mod detail;
mod error;
mod evaluation_context;
mod events;
mod flag_value;
mod options;
mod provider;
mod resolution;
mod test_common;
mod translate;
mod user;

pub use attribute_value::AttributeValue;
pub use client::{ClientError, FlagChangeListener, LdClient};
pub use detail::{Detail, Error as EvalError, Reason, VariationIndex};
pub use error::{Error, Result};
pub use evaluation_context::{EvaluationContext, EvaluationContextFieldValue};
pub use events::{ProviderEvent, ProviderEvents};
pub use flag_value::FlagValue;
pub use options::ProviderOptions;
pub use provider::{FeatureProvider, LaunchDarklyProvider};
pub use resolution::{
    ErrorCode, FlagMetadataValue, ProviderMetadata, ProviderStatus, ResolutionDetails,
    StandardReason, TrackingEventDetails,
};
pub use translate::{
    error_code, translate_context, translate_result, translate_tracking_event_details, FlagType,
};
pub use user::{TypeError, User, UserBuilder};

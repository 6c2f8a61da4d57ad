use std::collections::HashMap;

use serde::Serialize;

/// Reasons defined by OpenFeature for why a flag resolved to its value. LaunchDarkly reason
/// kinds are passed through as-is; these are used where the provider itself decides the outcome.
pub struct StandardReason;

impl StandardReason {
    pub const STATIC: &'static str = "STATIC";
    pub const DEFAULT: &'static str = "DEFAULT";
    pub const TARGETING_MATCH: &'static str = "TARGETING_MATCH";
    pub const SPLIT: &'static str = "SPLIT";
    pub const CACHED: &'static str = "CACHED";
    pub const DISABLED: &'static str = "DISABLED";
    pub const UNKNOWN: &'static str = "UNKNOWN";
    pub const ERROR: &'static str = "ERROR";
}

/// OpenFeature error codes reported alongside a resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ProviderNotReady,
    FlagNotFound,
    ParseError,
    TypeMismatch,
    TargetingKeyMissing,
    InvalidContext,
    General,
}

/// A value attached to a resolution as flag metadata.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FlagMetadataValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

/// The outcome of resolving one flag, in OpenFeature's shape.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionDetails<T> {
    pub value: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<ErrorCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub flag_metadata: HashMap<String, FlagMetadataValue>,
}

impl<T> ResolutionDetails<T> {
    /// A resolution carrying only a value.
    pub fn new(value: T) -> Self {
        ResolutionDetails {
            value,
            variant: None,
            reason: None,
            error_code: None,
            error_message: None,
            flag_metadata: HashMap::new(),
        }
    }

    /// A resolution that falls back to `default` because of `error_code`.
    pub fn error(default: T, error_code: ErrorCode, message: impl Into<String>) -> Self {
        ResolutionDetails {
            reason: Some(StandardReason::ERROR.to_string()),
            error_code: Some(error_code),
            error_message: Some(message.into()),
            ..ResolutionDetails::new(default)
        }
    }

    /// Returns a new resolution with `f` applied to the value.
    pub fn map<U, F>(self, f: F) -> ResolutionDetails<U>
    where
        F: FnOnce(T) -> U,
    {
        ResolutionDetails {
            value: f(self.value),
            variant: self.variant,
            reason: self.reason,
            error_code: self.error_code,
            error_message: self.error_message,
            flag_metadata: self.flag_metadata,
        }
    }
}

/// Extra data attached to a tracking call. `value` is the numeric metric value; everything else
/// is free-form event data.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrackingEventDetails {
    pub value: Option<f64>,
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

impl TrackingEventDetails {
    /// Set the metric value.
    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    /// Add a data attribute.
    pub fn with_attribute(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// Static information describing a provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderMetadata {
    pub name: String,
}

impl ProviderMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        ProviderMetadata { name: name.into() }
    }
}

/// Readiness of a provider as seen by the OpenFeature API.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ProviderStatus {
    #[default]
    NotReady,
    Ready,
    Error,
}

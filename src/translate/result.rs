use crate::detail::{Detail, Error as EvalError, Reason};
use crate::flag_value::FlagValue;
use crate::resolution::{ErrorCode, ResolutionDetails};

/// A type a flag can be resolved as.
pub trait FlagType: Sized {
    /// Name used in type mismatch messages.
    const NAME: &'static str;

    /// Extract a value of this type, or None if the flag value has a different type.
    fn from_flag_value(value: &FlagValue) -> Option<Self>;
}

impl FlagType for bool {
    const NAME: &'static str = "boolean";

    fn from_flag_value(value: &FlagValue) -> Option<Self> {
        value.as_bool()
    }
}

impl FlagType for String {
    const NAME: &'static str = "string";

    fn from_flag_value(value: &FlagValue) -> Option<Self> {
        value.as_string()
    }
}

impl FlagType for f64 {
    const NAME: &'static str = "number";

    fn from_flag_value(value: &FlagValue) -> Option<Self> {
        value.as_float()
    }
}

impl FlagType for i64 {
    const NAME: &'static str = "integer";

    fn from_flag_value(value: &FlagValue) -> Option<Self> {
        value.as_int()
    }
}

impl FlagType for serde_json::Value {
    const NAME: &'static str = "object";

    fn from_flag_value(value: &FlagValue) -> Option<Self> {
        value.as_structure()
    }
}

/// Map a LaunchDarkly error kind onto the closest OpenFeature error code.
pub fn error_code(error: Option<EvalError>) -> ErrorCode {
    match error {
        Some(EvalError::ClientNotReady) => ErrorCode::ProviderNotReady,
        Some(EvalError::MalformedFlag) => ErrorCode::ParseError,
        Some(EvalError::FlagNotFound) => ErrorCode::FlagNotFound,
        Some(EvalError::UserNotSpecified) => ErrorCode::TargetingKeyMissing,
        _ => ErrorCode::General,
    }
}

/// Translate a LaunchDarkly evaluation detail into an OpenFeature resolution of type `T`.
///
/// If the evaluated value is not a `T`, the caller's `default` is returned with a
/// [ErrorCode::TypeMismatch] error instead of the client's result.
pub fn translate_result<T: FlagType>(detail: Detail<FlagValue>, default: T) -> ResolutionDetails<T> {
    let Some(value) = detail.value.as_ref().and_then(T::from_flag_value) else {
        return ResolutionDetails::error(
            default,
            ErrorCode::TypeMismatch,
            format!("flag value is not of type {}", T::NAME),
        );
    };

    let error_code = matches!(detail.reason, Reason::Error { .. })
        .then(|| error_code(detail.reason.error_kind()));

    ResolutionDetails {
        variant: detail.variation_index.map(|index| index.to_string()),
        reason: Some(detail.reason.kind().to_string()),
        error_code,
        ..ResolutionDetails::new(value)
    }
}

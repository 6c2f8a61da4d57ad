use std::collections::HashMap;

use chrono::SecondsFormat;
use itertools::Itertools;
use lazy_static::lazy_static;
use log::{error, warn};

use crate::attribute_value::AttributeValue;
use crate::evaluation_context::{EvaluationContext, EvaluationContextFieldValue};
use crate::user::User;

const TARGETING_KEY: &str = "targetingKey";
const KEY: &str = "key";

lazy_static! {
    /// Built-in user attributes and the type name reported when a value does not fit.
    static ref BUILT_IN_ATTRIBUTES: HashMap<&'static str, &'static str> = [
        ("secondary", "string"),
        ("name", "string"),
        ("firstName", "string"),
        ("lastName", "string"),
        ("email", "string"),
        ("avatar", "string"),
        ("ip", "string"),
        ("country", "string"),
        ("anonymous", "boolean"),
    ]
    .into_iter()
    .collect();
}

/// Element types allowed in a custom array attribute. Integers and floats are both numbers.
#[derive(Clone, Copy, Debug, PartialEq)]
enum ScalarKind {
    String,
    Bool,
    Number,
}

impl ScalarKind {
    fn of(value: &EvaluationContextFieldValue) -> Option<ScalarKind> {
        match value {
            EvaluationContextFieldValue::String(_) => Some(ScalarKind::String),
            EvaluationContextFieldValue::Bool(_) => Some(ScalarKind::Bool),
            EvaluationContextFieldValue::Int(_) | EvaluationContextFieldValue::Float(_) => {
                Some(ScalarKind::Number)
            }
            _ => None,
        }
    }
}

fn scalar_value(value: &EvaluationContextFieldValue) -> Option<AttributeValue> {
    match value {
        EvaluationContextFieldValue::String(s) => Some(s.as_str().into()),
        EvaluationContextFieldValue::Bool(b) => Some((*b).into()),
        EvaluationContextFieldValue::Int(i) => Some((*i).into()),
        EvaluationContextFieldValue::Float(f) => Some((*f).into()),
        _ => None,
    }
}

fn custom_attribute(name: &str, value: &EvaluationContextFieldValue) -> Option<AttributeValue> {
    match value {
        EvaluationContextFieldValue::DateTime(dt) => {
            Some(dt.to_rfc3339_opts(SecondsFormat::Millis, true).into())
        }
        EvaluationContextFieldValue::List(items) => {
            match items.iter().map(ScalarKind::of).all_equal_value() {
                // An empty list is uniform.
                Ok(Some(_)) | Err(None) => Some(AttributeValue::Array(
                    items.iter().filter_map(scalar_value).collect(),
                )),
                _ => {
                    warn!("The attribute '{}' is an unsupported array type.", name);
                    None
                }
            }
        }
        EvaluationContextFieldValue::Struct(_) => {
            warn!("The attribute '{}' is of an unsupported type 'object'", name);
            None
        }
        scalar => scalar_value(scalar),
    }
}

/// Convert an OpenFeature evaluation context into a LaunchDarkly [User].
///
/// The user key is the context's targeting key, or its `key` attribute when there is no
/// targeting key. Built-in user attributes are copied only when they have the right type.
/// Everything else becomes a custom attribute, except nested objects and mixed-type lists,
/// which LaunchDarkly users cannot hold. Dropped attributes are logged, never returned as
/// errors.
pub fn translate_context(context: &EvaluationContext) -> User {
    let key_attribute = context.custom_field(KEY);
    let targeting_key = context.targeting_key.as_deref();

    if key_attribute.is_some() && targeting_key.is_some() {
        warn!(
            "The EvaluationContext contained both a 'targetingKey' and a 'key' attribute. The \
             'key' attribute will be discarded."
        );
    }

    let final_key = targeting_key.or_else(|| key_attribute.and_then(|key| key.as_str()));
    if final_key.is_none() {
        error!(
            "The EvaluationContext must contain either a 'targetingKey' or a 'key' and the type \
             must be a string."
        );
    }

    let mut user = User::with_key(final_key.unwrap_or_default()).build();
    for (name, value) in &context.custom_fields {
        if name == KEY || name == TARGETING_KEY {
            continue;
        }

        match BUILT_IN_ATTRIBUTES.get(name.as_str()) {
            // User::attribute rejects built-in values of the wrong type.
            Some(expected) => {
                let set = scalar_value(value).map(|attribute| user.attribute(name, attribute));
                if !matches!(set, Some(Ok(()))) {
                    error!("The attribute '{}' must be of type {}", name, expected);
                }
            }
            None => {
                if let Some(attribute) = custom_attribute(name, value) {
                    user.custom_attribute(name, attribute);
                }
            }
        }
    }

    user
}

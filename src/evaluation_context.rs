use std::collections::HashMap;

use chrono::{DateTime, Utc};
use log::warn;
use serde_json::Value;

use crate::error::Error;

/// The OpenFeature evaluation context: an optional targeting key plus arbitrary attributes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EvaluationContext {
    /// The targeting key uniquely identifying the subject of the evaluation.
    pub targeting_key: Option<String>,

    /// All other attributes of the context.
    pub custom_fields: HashMap<String, EvaluationContextFieldValue>,
}

impl EvaluationContext {
    /// Set the targeting key.
    pub fn with_targeting_key(mut self, targeting_key: impl Into<String>) -> Self {
        self.targeting_key = Some(targeting_key.into());
        self
    }

    /// Add or replace an attribute.
    pub fn with_custom_field(
        mut self,
        key: impl Into<String>,
        value: impl Into<EvaluationContextFieldValue>,
    ) -> Self {
        self.custom_fields.insert(key.into(), value.into());
        self
    }

    /// Returns the attribute named `key`, if set.
    pub fn custom_field(&self, key: &str) -> Option<&EvaluationContextFieldValue> {
        self.custom_fields.get(key)
    }
}

/// A value stored in an [EvaluationContext].
#[derive(Clone, Debug, PartialEq)]
pub enum EvaluationContextFieldValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    DateTime(DateTime<Utc>),
    List(Vec<EvaluationContextFieldValue>),
    Struct(HashMap<String, EvaluationContextFieldValue>),
}

impl EvaluationContextFieldValue {
    /// Returns None unless self is a String. It will not convert.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            EvaluationContextFieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns None unless self is a Bool. It will not convert.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            EvaluationContextFieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<bool> for EvaluationContextFieldValue {
    fn from(b: bool) -> Self {
        EvaluationContextFieldValue::Bool(b)
    }
}

impl From<i64> for EvaluationContextFieldValue {
    fn from(i: i64) -> Self {
        EvaluationContextFieldValue::Int(i)
    }
}

impl From<f64> for EvaluationContextFieldValue {
    fn from(f: f64) -> Self {
        EvaluationContextFieldValue::Float(f)
    }
}

impl From<&str> for EvaluationContextFieldValue {
    fn from(s: &str) -> Self {
        EvaluationContextFieldValue::String(s.to_owned())
    }
}

impl From<String> for EvaluationContextFieldValue {
    fn from(s: String) -> Self {
        EvaluationContextFieldValue::String(s)
    }
}

impl From<DateTime<Utc>> for EvaluationContextFieldValue {
    fn from(dt: DateTime<Utc>) -> Self {
        EvaluationContextFieldValue::DateTime(dt)
    }
}

impl<T> From<Vec<T>> for EvaluationContextFieldValue
where
    EvaluationContextFieldValue: From<T>,
{
    fn from(v: Vec<T>) -> Self {
        EvaluationContextFieldValue::List(v.into_iter().map(Into::into).collect())
    }
}

impl<S, T> From<HashMap<S, T>> for EvaluationContextFieldValue
where
    String: From<S>,
    EvaluationContextFieldValue: From<T>,
{
    fn from(map: HashMap<S, T>) -> Self {
        EvaluationContextFieldValue::Struct(
            map.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Converts one JSON attribute. Nulls yield None: null object entries are dropped, and an array
/// holding a null is dropped as a whole because its elements no longer share a type.
fn field_from_json(
    key: &str,
    value: Value,
) -> Result<Option<EvaluationContextFieldValue>, Error> {
    Ok(Some(match value {
        Value::Null => return Ok(None),
        Value::Bool(b) => b.into(),
        Value::Number(n) => match n.as_i64() {
            Some(i) => i.into(),
            None => n
                .as_f64()
                .ok_or_else(|| Error::InvalidContext(format!("'{}' is not a valid number", key)))?
                .into(),
        },
        Value::String(s) => s.into(),
        Value::Array(items) => {
            let mut list = Vec::with_capacity(items.len());
            for item in items {
                match field_from_json(key, item)? {
                    Some(field) => list.push(field),
                    None => {
                        warn!("The attribute '{}' is an unsupported array type.", key);
                        return Ok(None);
                    }
                }
            }
            EvaluationContextFieldValue::List(list)
        }
        Value::Object(obj) => {
            let mut fields = HashMap::with_capacity(obj.len());
            for (k, v) in obj {
                if let Some(field) = field_from_json(&k, v)? {
                    fields.insert(k, field);
                }
            }
            EvaluationContextFieldValue::Struct(fields)
        }
    }))
}

/// Builds a context from a JSON object, the way evaluation contexts arrive over test harness
/// and service boundaries. A string `targetingKey` becomes the targeting key; everything else
/// becomes an attribute. Null attributes are skipped, as are arrays containing nulls.
impl TryFrom<Value> for EvaluationContext {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let Value::Object(obj) = value else {
            return Err(Error::InvalidContext(
                "evaluation context must be a JSON object".to_string(),
            ));
        };

        let mut context = EvaluationContext::default();
        for (key, value) in obj {
            if key == "targetingKey" && !value.is_null() {
                let Value::String(targeting_key) = value else {
                    return Err(Error::InvalidContext(
                        "'targetingKey' must be a string".to_string(),
                    ));
                };
                context.targeting_key = Some(targeting_key);
                continue;
            }
            if let Some(field) = field_from_json(&key, value)? {
                context.custom_fields.insert(key, field);
            }
        }
        Ok(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_common::capture_logs;
    use log::Level;
    use maplit::hashmap;
    use serde_json::json;
    use spectral::prelude::*;

    #[test]
    fn builder_sets_fields() {
        let context = EvaluationContext::default()
            .with_targeting_key("the-key")
            .with_custom_field("email", "a@b.c")
            .with_custom_field("count", 3_i64);

        assert_that!(context.targeting_key).contains_value("the-key".to_string());
        assert_that!(context.custom_field("email"))
            .contains_value(&EvaluationContextFieldValue::String("a@b.c".into()));
        assert_that!(context.custom_field("count"))
            .contains_value(&EvaluationContextFieldValue::Int(3));
    }

    #[test]
    fn context_from_json() {
        let context = EvaluationContext::try_from(json!({
            "targetingKey": "the-key",
            "anonymous": true,
            "score": 1.5,
            "groups": ["a", "b"],
            "address": {"city": "Oakland"},
            "ignored": null,
        }))
        .unwrap();

        assert_eq!(
            context,
            EvaluationContext {
                targeting_key: Some("the-key".into()),
                custom_fields: hashmap! {
                    "anonymous".to_string() => true.into(),
                    "score".to_string() => 1.5.into(),
                    "groups".to_string() => vec!["a", "b"].into(),
                    "address".to_string() => hashmap! {"city" => "Oakland"}.into(),
                },
            }
        );
    }

    #[test]
    fn context_from_json_rejects_bad_input() {
        assert_that!(EvaluationContext::try_from(json!([1, 2]))).is_err();
        assert_that!(EvaluationContext::try_from(json!({"targetingKey": 7}))).is_err();
    }

    #[test]
    fn nested_nulls_only_drop_their_attribute() {
        let mut result = None;
        let logs = capture_logs(|| {
            result = Some(EvaluationContext::try_from(json!({
                "targetingKey": "k",
                "email": "a@b.c",
                "address": {"zip": null, "city": "Oakland"},
                "tags": ["a", null],
            })));
        });

        assert_eq!(
            result.unwrap().unwrap(),
            EvaluationContext {
                targeting_key: Some("k".into()),
                custom_fields: hashmap! {
                    "email".to_string() => "a@b.c".into(),
                    "address".to_string() => hashmap! {"city" => "Oakland"}.into(),
                },
            }
        );
        assert_eq!(
            logs,
            vec![(
                Level::Warn,
                "The attribute 'tags' is an unsupported array type.".to_string()
            )]
        );
    }
}

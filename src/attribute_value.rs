use std::collections::HashMap;

use log::warn;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::flag_value::f64_to_i64_safe;

/// An attribute value represents possible values that can be stored in a [crate::User].
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// Stores a string value.
    String(String),
    /// Stores an array of attribute values.
    Array(Vec<AttributeValue>),
    /// Stores a number. Integral numbers serialize without a fractional part.
    Number(#[serde(serialize_with = "serialize_number")] f64),
    /// Stores a boolean.
    Bool(bool),
    /// Stores a map of attribute values.
    Object(HashMap<String, AttributeValue>),
    /// Stores a null value.
    Null,
}

fn serialize_number<S: Serializer>(n: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    match f64_to_i64_safe(*n).filter(|i| *i as f64 == *n) {
        Some(i) => serializer.serialize_i64(i),
        None => serializer.serialize_f64(*n),
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> AttributeValue {
        AttributeValue::String(s.to_owned())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> AttributeValue {
        AttributeValue::String(s)
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> AttributeValue {
        AttributeValue::Bool(b)
    }
}

impl From<i64> for AttributeValue {
    fn from(i: i64) -> Self {
        AttributeValue::Number(i as f64)
    }
}

impl From<f64> for AttributeValue {
    fn from(f: f64) -> Self {
        AttributeValue::Number(f)
    }
}

impl<T> From<Vec<T>> for AttributeValue
where
    AttributeValue: From<T>,
{
    fn from(v: Vec<T>) -> AttributeValue {
        v.into_iter().collect()
    }
}

impl<S, T> From<HashMap<S, T>> for AttributeValue
where
    String: From<S>,
    AttributeValue: From<T>,
{
    fn from(hashmap: HashMap<S, T>) -> AttributeValue {
        hashmap.into_iter().collect()
    }
}

impl<T> FromIterator<T> for AttributeValue
where
    AttributeValue: From<T>,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        AttributeValue::Array(iter.into_iter().map(AttributeValue::from).collect())
    }
}

impl<S, T> FromIterator<(S, T)> for AttributeValue
where
    String: From<S>,
    AttributeValue: From<T>,
{
    fn from_iter<I: IntoIterator<Item = (S, T)>>(iter: I) -> Self {
        AttributeValue::Object(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<&Value> for AttributeValue {
    fn from(v: &Value) -> Self {
        match v {
            Value::Null => AttributeValue::Null,
            Value::Bool(b) => AttributeValue::Bool(*b),
            Value::Number(n) => match n.as_f64() {
                Some(float) => AttributeValue::Number(float),
                None => {
                    warn!("could not interpret '{:?}' as f64", n);
                    AttributeValue::String(n.to_string())
                }
            },
            Value::String(str) => AttributeValue::String(str.clone()),
            Value::Array(arr) => {
                AttributeValue::Array(arr.iter().map(AttributeValue::from).collect())
            }
            Value::Object(obj) => {
                AttributeValue::Object(obj.iter().map(|(k, v)| (k.into(), v.into())).collect())
            }
        }
    }
}

impl AttributeValue {
    /// Returns None unless self is a String. It will not convert.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the wrapped value as a float for numeric types, and None otherwise.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Number(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns None unless self is a bool. It will not convert.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Name of the variant, as it appears in type error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            AttributeValue::Array(_) => "Array",
            AttributeValue::Bool(_) => "Bool",
            AttributeValue::Number(_) => "Number",
            AttributeValue::Null => "Null",
            AttributeValue::Object(_) => "Object",
            AttributeValue::String(_) => "String",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::AttributeValue;
    use maplit::hashmap;
    use serde_json::json;

    #[test]
    fn collect_array() {
        assert_eq!(
            Some(10_i64).into_iter().collect::<AttributeValue>(),
            AttributeValue::Array(vec![AttributeValue::Number(10_f64)])
        );
    }

    #[test]
    fn collect_object() {
        assert_eq!(
            Some(("abc", 10_i64))
                .into_iter()
                .collect::<AttributeValue>(),
            AttributeValue::Object(hashmap! {"abc".to_string() => AttributeValue::Number(10_f64)})
        );
    }

    #[test]
    fn from_json_value() {
        let value = json!({"tags": ["a", "b"], "count": 3, "on": true, "gone": null});
        assert_eq!(
            AttributeValue::from(&value),
            AttributeValue::Object(hashmap! {
                "tags".to_string() => AttributeValue::Array(vec!["a".into(), "b".into()]),
                "count".to_string() => AttributeValue::Number(3.0),
                "on".to_string() => AttributeValue::Bool(true),
                "gone".to_string() => AttributeValue::Null,
            })
        );
    }

    #[test]
    fn serialization() {
        fn test_case(value: AttributeValue, json: &str) {
            assert_eq!(serde_json::to_string(&value).unwrap(), json);
        }

        test_case(AttributeValue::Number(1.5), "1.5");
        test_case(AttributeValue::Bool(true), "true");
        test_case("foo".into(), "\"foo\"");
        test_case(vec![1_i64, 2].into(), "[1,2]");
        test_case(AttributeValue::Number(-3.0), "-3");
        test_case(AttributeValue::Null, "null");
    }

    #[test]
    fn type_names() {
        assert_eq!(AttributeValue::from("x").type_name(), "String");
        assert_eq!(AttributeValue::from(1.0).type_name(), "Number");
        assert_eq!(AttributeValue::from(false).type_name(), "Bool");
        assert_eq!(AttributeValue::Array(vec![]).type_name(), "Array");
        assert_eq!(AttributeValue::Null.type_name(), "Null");
    }
}

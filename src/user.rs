use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::attribute_value::AttributeValue;

const USER_CUSTOM_STARTING_CAPACITY: usize = 10;

/// A User contains specific attributes of a user browsing your site. The only mandatory property is the Key,
/// which must uniquely identify each user. For authenticated users, this may be a username or e-mail address.
/// For anonymous users, this could be an IP address or session ID.
///
/// Besides the mandatory key, User supports two kinds of optional attributes: built-in attributes (e.g.
/// IP and Country) and custom attributes. LaunchDarkly can parse built-in attributes and attach meaning
/// to them. For example, from an IP address, LaunchDarkly can do a geo IP lookup and determine the user's
/// country.
///
/// Custom attributes are not parsed by LaunchDarkly. They can be used in custom rules-- for example, a custom
/// attribute such as "customer_ranking" can be used to launch a feature to the top 10% of users on a site.
///
/// Users are normally produced by [crate::translate_context] from an OpenFeature
/// [crate::EvaluationContext]. To construct one directly, use the [UserBuilder] returned by
/// [User::with_key].
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct User {
    key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    secondary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    #[serde(rename = "firstName", skip_serializing_if = "Option::is_none")]
    first_name: Option<String>,
    #[serde(rename = "lastName", skip_serializing_if = "Option::is_none")]
    last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    anonymous: Option<bool>,

    #[serde(
        default,
        deserialize_with = "deserialize_null_default",
        skip_serializing_if = "HashMap::is_empty"
    )]
    custom: HashMap<String, AttributeValue>,
}

fn deserialize_null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    T: Default + Deserialize<'de>,
    D: Deserializer<'de>,
{
    let opt = Option::deserialize(deserializer)?;
    Ok(opt.unwrap_or_default())
}

/// An error type used for user attribute type failures.
#[derive(Debug, PartialEq)]
pub struct TypeError {
    key: &'static str,
    expected_type: &'static str,
    actual_type: &'static str,
}

impl TypeError {
    fn new(key: &'static str, expected_type: &'static str, actual_value: &AttributeValue) -> Self {
        TypeError {
            key,
            expected_type,
            actual_type: actual_value.type_name(),
        }
    }

    /// The name of the attribute that could not be set.
    pub fn key(&self) -> &str {
        self.key
    }
}

impl std::fmt::Display for TypeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Attribute {} must be {}, not {}",
            self.key, self.expected_type, self.actual_type
        )
    }
}

impl std::error::Error for TypeError {}

fn string_attribute(key: &'static str, value: &AttributeValue) -> Result<String, TypeError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| TypeError::new(key, "String", value))
}

impl User {
    /// Create a new [UserBuilder], seeding it with the provided user key.
    pub fn with_key(key: impl Into<String>) -> UserBuilder {
        UserBuilder::new(key)
    }

    /// Returns the key of the user.
    ///
    /// The key is empty when the user was translated from an evaluation context that carried no
    /// identity.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the secondary key of the user, if any.
    pub fn secondary(&self) -> Option<&str> {
        self.secondary.as_deref()
    }

    /// Returns the ip of the user, if any.
    pub fn ip(&self) -> Option<&str> {
        self.ip.as_deref()
    }

    /// Returns the country of the user, if any.
    pub fn country(&self) -> Option<&str> {
        self.country.as_deref()
    }

    /// Returns the email of the user, if any.
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Returns the first name of the user, if any.
    pub fn first_name(&self) -> Option<&str> {
        self.first_name.as_deref()
    }

    /// Returns the last name of the user, if any.
    pub fn last_name(&self) -> Option<&str> {
        self.last_name.as_deref()
    }

    /// Returns the avatar of the user, if any.
    pub fn avatar(&self) -> Option<&str> {
        self.avatar.as_deref()
    }

    /// Returns the name of the user, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the anonymous attribute of the user.
    ///
    /// If a user is anonymous, the user key will not appear on your LaunchDarkly dashboard.
    pub fn anonymous(&self) -> Option<bool> {
        self.anonymous
    }

    /// Returns the custom attributes of the user.
    pub fn custom(&self) -> &HashMap<String, AttributeValue> {
        &self.custom
    }

    /// Return the value of the attribute named `attr`.
    pub fn value_of(&self, attr: &str) -> Option<AttributeValue> {
        match attr {
            "key" => Some(AttributeValue::String(self.key.clone())),
            "secondary" => self.secondary.as_deref().map(AttributeValue::from),
            "ip" => self.ip.as_deref().map(AttributeValue::from),
            "country" => self.country.as_deref().map(AttributeValue::from),
            "email" => self.email.as_deref().map(AttributeValue::from),
            "firstName" => self.first_name.as_deref().map(AttributeValue::from),
            "lastName" => self.last_name.as_deref().map(AttributeValue::from),
            "avatar" => self.avatar.as_deref().map(AttributeValue::from),
            "name" => self.name.as_deref().map(AttributeValue::from),
            "anonymous" => self.anonymous.map(AttributeValue::from),
            _ => self.custom.get(attr).cloned(),
        }
    }

    /// Set the attribute named `key` to the value `value`.
    ///
    /// Built-in attributes are type checked; anything else is stored as a custom attribute. If
    /// the value has the wrong type for a built-in attribute, the user is left unchanged and a
    /// [TypeError] is returned.
    pub fn attribute<T: Into<AttributeValue>>(
        &mut self,
        key: &str,
        value: T,
    ) -> Result<(), TypeError> {
        let value: AttributeValue = value.into();
        match key {
            "key" => self.key = string_attribute("key", &value)?,
            "secondary" => self.secondary = Some(string_attribute("secondary", &value)?),
            "ip" => self.ip = Some(string_attribute("ip", &value)?),
            "country" => self.country = Some(string_attribute("country", &value)?),
            "email" => self.email = Some(string_attribute("email", &value)?),
            "firstName" => self.first_name = Some(string_attribute("firstName", &value)?),
            "lastName" => self.last_name = Some(string_attribute("lastName", &value)?),
            "avatar" => self.avatar = Some(string_attribute("avatar", &value)?),
            "name" => self.name = Some(string_attribute("name", &value)?),
            "anonymous" => {
                self.anonymous = Some(
                    value
                        .as_bool()
                        .ok_or_else(|| TypeError::new("anonymous", "Bool", &value))?,
                )
            }
            _ => self.custom_attribute(key, value),
        }
        Ok(())
    }

    /// Set the custom attribute named `key`, even if a built-in attribute has the same name.
    pub fn custom_attribute(&mut self, key: impl Into<String>, value: impl Into<AttributeValue>) {
        let _ = self.custom.insert(key.into(), value.into());
    }
}

/// Contains methods for configuring a user.
pub struct UserBuilder {
    key: String,
    secondary: Option<String>,
    ip: Option<String>,
    country: Option<String>,
    email: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    avatar: Option<String>,
    name: Option<String>,
    anonymous: Option<bool>,
    custom: HashMap<String, AttributeValue>,
}

impl UserBuilder {
    /// Create a new user builder, setting the user key value to `key`.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secondary: None,
            ip: None,
            country: None,
            email: None,
            first_name: None,
            last_name: None,
            avatar: None,
            name: None,
            anonymous: None,
            custom: HashMap::with_capacity(USER_CUSTOM_STARTING_CAPACITY),
        }
    }

    /// Set the secondary attribute for this builder instance.
    pub fn secondary(&mut self, secondary: impl Into<String>) -> &mut Self {
        self.secondary = Some(secondary.into());
        self
    }

    /// Set the ip attribute for this builder instance.
    pub fn ip(&mut self, ip: impl Into<String>) -> &mut Self {
        self.ip = Some(ip.into());
        self
    }

    /// Set the country attribute for this builder instance.
    pub fn country(&mut self, country: impl Into<String>) -> &mut Self {
        self.country = Some(country.into());
        self
    }

    /// Set the email attribute for this builder instance.
    pub fn email(&mut self, email: impl Into<String>) -> &mut Self {
        self.email = Some(email.into());
        self
    }

    /// Set the first name attribute for this builder instance.
    pub fn first_name(&mut self, first_name: impl Into<String>) -> &mut Self {
        self.first_name = Some(first_name.into());
        self
    }

    /// Set the last name attribute for this builder instance.
    pub fn last_name(&mut self, last_name: impl Into<String>) -> &mut Self {
        self.last_name = Some(last_name.into());
        self
    }

    /// Set the avatar attribute for this builder instance.
    pub fn avatar(&mut self, avatar: impl Into<String>) -> &mut Self {
        self.avatar = Some(avatar.into());
        self
    }

    /// Set the name attribute for this builder instance.
    pub fn name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = Some(name.into());
        self
    }

    /// Set the anonymous attribute for this builder instance.
    pub fn anonymous(&mut self, anonymous: bool) -> &mut Self {
        self.anonymous = Some(anonymous);
        self
    }

    /// Set the custom attributes for this builder instance.
    pub fn custom(&mut self, custom: HashMap<String, AttributeValue>) -> &mut Self {
        self.custom.extend(custom);
        self
    }

    /// Create a new [User] instance.
    pub fn build(&self) -> User {
        User {
            key: self.key.clone(),
            secondary: self.secondary.clone(),
            ip: self.ip.clone(),
            country: self.country.clone(),
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            avatar: self.avatar.clone(),
            name: self.name.clone(),
            anonymous: self.anonymous,
            custom: self.custom.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use assert_json_diff::assert_json_eq;
    use maplit::hashmap;
    use serde_json::json;
    use spectral::prelude::*;

    #[test]
    fn user_serializes_with_camel_case_names() {
        let user = User::with_key("userKeyA")
            .first_name("First")
            .last_name("Last")
            .anonymous(true)
            .custom(hashmap! { "customKey".into() => "value".into() })
            .build();

        assert_json_eq!(
            serde_json::to_value(&user).unwrap(),
            json!({
                "key": "userKeyA",
                "firstName": "First",
                "lastName": "Last",
                "anonymous": true,
                "custom": {
                    "customKey": "value"
                }
            })
        );
    }

    #[test]
    fn integer_custom_attributes_serialize_as_integers() {
        let mut user = User::with_key("userKeyA").build();
        user.attribute("count", 7_i64).unwrap();
        user.attribute("ratio", 0.5).unwrap();

        assert_json_eq!(
            serde_json::to_value(&user).unwrap(),
            json!({"key": "userKeyA", "custom": {"count": 7, "ratio": 0.5}})
        );
    }

    #[test]
    fn empty_custom_is_omitted() {
        let user = User::with_key("userKeyA").build();
        assert_json_eq!(serde_json::to_value(&user).unwrap(), json!({"key": "userKeyA"}));
    }

    #[test]
    fn parse_user_rejects_missing_key() {
        let result: serde_json::Result<User> = serde_json::from_str(r"{}");
        assert_that!(result).is_err();
    }

    #[test]
    fn parse_user_rejects_null_key() {
        let result: serde_json::Result<User> = serde_json::from_str(r#"{"key": null}"#);
        assert_that!(result).is_err();
    }

    #[test]
    fn null_custom_is_default() {
        let user1: User = serde_json::from_str(r#"{"key": "foo"}"#).unwrap();
        assert_eq!(user1.custom, hashmap![]);

        let user2: User = serde_json::from_str(r#"{"key": "foo", "custom": null}"#).unwrap();
        assert_eq!(user2.custom, hashmap![]);
    }

    #[test]
    fn user_attribute() {
        let mut user = User::with_key("abc").build();

        for attribute in vec![
            "key",
            "secondary",
            "ip",
            "country",
            "email",
            "firstName",
            "lastName",
            "avatar",
            "name",
        ] {
            user.attribute(attribute, "123").unwrap();
            user.attribute(attribute, 123).unwrap_err();
            assert_that!(user.value_of(attribute)).contains_value(AttributeValue::from("123"));
        }

        user.attribute("anonymous", true).unwrap();
        user.attribute("anonymous", 123).unwrap_err();
        assert_that!(user.anonymous()).contains_value(true);

        user.attribute("custom", "123").unwrap();
        user.attribute("custom", 123).unwrap();
        assert_that!(user.value_of("custom")).contains_value(AttributeValue::Number(123.0));
    }

    #[test]
    fn type_error_names_the_attribute() {
        let mut user = User::with_key("abc").build();
        let err = user.attribute("email", false).unwrap_err();

        assert_eq!(err.key(), "email");
        assert_eq!(err.to_string(), "Attribute email must be String, not Bool");
        assert_that!(user.email()).is_none();
    }
}

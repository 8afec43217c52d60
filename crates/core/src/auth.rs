use std::fmt::{Display, Formatter};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Backend record identifier, normalised to a string.
///
/// The backend emits numeric ids; stored records may carry string ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RecordKey(String);

impl RecordKey {
    /// Creates a record key from any string-like value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for RecordKey {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RecordKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawKey {
            Number(i64),
            Text(String),
        }

        Ok(match RawKey::deserialize(deserializer)? {
            RawKey::Number(value) => Self(value.to_string()),
            RawKey::Text(value) => Self(value),
        })
    }
}

/// User record held by an authenticated session.
///
/// Attributes the client does not interpret are preserved verbatim so the
/// record survives a storage round trip unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    id: RecordKey,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    #[serde(flatten)]
    attributes: Map<String, Value>,
}

impl SessionUser {
    /// Creates a user record with no extra attributes.
    #[must_use]
    pub fn new(id: RecordKey, name: impl Into<String>, email: Option<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email,
            attributes: Map::new(),
        }
    }

    /// Returns the backend identifier.
    #[must_use]
    pub fn id(&self) -> &RecordKey {
        &self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the email, if the backend returned one.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Returns an uninterpreted attribute.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::SessionUser;

    #[test]
    fn numeric_and_string_ids_normalise_to_the_same_key() {
        let numeric: Result<SessionUser, _> =
            serde_json::from_str(r#"{"id": 42, "name": "Ana", "email": "ana@example.org"}"#);
        let textual: Result<SessionUser, _> =
            serde_json::from_str(r#"{"id": "42", "name": "Ana", "email": "ana@example.org"}"#);

        assert!(matches!((numeric, textual), (Ok(left), Ok(right)) if left.id() == right.id()));
    }

    #[test]
    fn unknown_attributes_survive_round_trip() {
        let raw = r#"{"id": 7, "name": "Ben", "institution": "Glacier Lab", "active": true}"#;
        let user: Result<SessionUser, _> = serde_json::from_str(raw);
        let Ok(user) = user else {
            panic!("user record should parse");
        };

        assert_eq!(
            user.attribute("institution").and_then(|value| value.as_str()),
            Some("Glacier Lab")
        );

        let encoded = serde_json::to_string(&user).unwrap_or_default();
        let decoded: Result<SessionUser, _> = serde_json::from_str(&encoded);
        assert!(matches!(decoded, Ok(value) if value == user));
    }
}

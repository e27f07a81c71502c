//! Entity types for local and remote data.
//!
//! An entity is an open map of fields plus an optional pending status. The
//! status is kept outside the field map so the remote resource only ever
//! sees `fields`. The annotated form, where the status is folded back in
//! under a configurable key, is what the local store persists.

use crate::{error::Result, Error, PendingStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The public field set of an entity.
pub type Fields = serde_json::Map<String, Value>;

/// Default name of the identity field.
pub const DEFAULT_ID_KEY: &str = "id";

/// Default name of the status field in the annotated form.
pub const DEFAULT_STATUS_KEY: &str = "sync";

/// Names of the identity and status fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyConfig {
    /// Identity field, unique among non-destroyed entities
    pub id: String,
    /// Local-only status annotation field
    pub status: String,
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            id: DEFAULT_ID_KEY.to_string(),
            status: DEFAULT_STATUS_KEY.to_string(),
        }
    }
}

impl KeyConfig {
    pub fn new(id: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: status.into(),
        }
    }

    /// Drop the status field from a field set entering the engine.
    ///
    /// The status lives on [`Entity::status`] only, so it never reaches the
    /// remote and never disagrees with the annotated form.
    pub fn without_status(&self, mut fields: Fields) -> Fields {
        fields.remove(&self.status);
        fields
    }

    /// Whether two field sets share the same identity value.
    ///
    /// Field sets without an identity never match anything.
    pub fn same_identity(&self, a: &Fields, b: &Fields) -> bool {
        match (a.get(&self.id), b.get(&self.id)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        }
    }
}

/// A locally tracked entity.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Entity {
    /// Fields shared with the remote resource
    pub fields: Fields,
    /// Outstanding local mutation, `None` when settled
    pub status: Option<PendingStatus>,
}

impl Entity {
    /// An entity with no outstanding local mutation.
    pub fn settled(fields: Fields) -> Self {
        Self {
            fields,
            status: None,
        }
    }

    /// An entity carrying a local mutation.
    pub fn pending(fields: Fields, status: PendingStatus) -> Self {
        Self {
            fields,
            status: Some(status),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status.is_some()
    }

    /// Whether the entity is hidden from `list`.
    pub fn is_destroyed(&self) -> bool {
        self.status == Some(PendingStatus::Destroy)
    }

    /// The identity value under `key`, if present.
    pub fn identity(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Drop the status annotation.
    pub fn into_fields(self) -> Fields {
        self.fields
    }

    /// Split into fields and status.
    pub fn into_parts(self) -> (Fields, Option<PendingStatus>) {
        (self.fields, self.status)
    }

    /// Encode into the annotated JSON form.
    pub fn to_value(&self, status_key: &str) -> Value {
        let mut map = self.fields.clone();
        match self.status {
            Some(status) => {
                map.insert(status_key.to_string(), Value::from(status.as_str()));
            }
            None => {
                map.remove(status_key);
            }
        }
        Value::Object(map)
    }

    /// Decode from the annotated JSON form.
    pub fn from_value(value: Value, status_key: &str) -> Result<Self> {
        let mut fields = match value {
            Value::Object(map) => map,
            other => {
                return Err(Error::InvalidEntity(format!(
                    "expected an object, got {}",
                    json_kind(&other)
                )))
            }
        };

        let status = match fields.remove(status_key) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.parse()?),
            Some(other) => return Err(Error::InvalidStatus(other.to_string())),
        };

        Ok(Self { fields, status })
    }

    /// Encode a whole collection, preserving order.
    pub fn encode_collection(entities: &[Entity], status_key: &str) -> Value {
        Value::Array(entities.iter().map(|e| e.to_value(status_key)).collect())
    }

    /// Decode a whole collection, preserving order.
    pub fn decode_collection(value: Value, status_key: &str) -> Result<Vec<Entity>> {
        match value {
            Value::Array(items) => items
                .into_iter()
                .map(|item| Entity::from_value(item, status_key))
                .collect(),
            other => Err(Error::InvalidEntity(format!(
                "expected an array, got {}",
                json_kind(&other)
            ))),
        }
    }
}

impl From<Fields> for Entity {
    fn from(fields: Fields) -> Self {
        Entity::settled(fields)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Build a [`Fields`] map from a `json!` object literal.
///
/// Non-object values yield an empty map.
pub fn fields(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        _ => Fields::new(),
    }
}

//! Typed JSON schema mapping.
//!
//! Every wire type in the workspace is a plain struct deriving `Serialize`
//! and `Deserialize`, with its field mapping declared through serde
//! attributes. The conventions are fixed:
//!
//! - wire names are camelCase (`#[serde(rename_all = "camelCase")]`)
//! - optional scalars / objects are `Option<T>` and are skipped when unset
//! - optional collections default to empty and are always emitted, except
//!   a collection that is a oneof member, which is skipped when empty
//! - required fields carry no default, so their absence is a
//!   [`SchemaError::MissingField`]
//! - enumerations are closed, unknown strings are a
//!   [`SchemaError::UnknownVariant`]
//! - numbers are declared per field as integer or float
//!
//! [`JsonType`] is the single entry point for both directions and maps every
//! serde failure into the [`SchemaError`] taxonomy.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::SchemaError;

/// A JSON object (`{...}`) as exchanged with the platform.
pub type JsonObject = serde_json::Map<String, Value>;

/// Bidirectional mapping between wire JSON and a typed object.
pub trait JsonType: Serialize + DeserializeOwned {
    /// Deserialize from an already-parsed JSON tree.
    fn from_json(value: Value) -> Result<Self, SchemaError> {
        serde_json::from_value(value).map_err(SchemaError::from)
    }

    /// Deserialize from raw bytes.
    fn from_slice(bytes: &[u8]) -> Result<Self, SchemaError> {
        serde_json::from_slice(bytes).map_err(SchemaError::from)
    }

    /// Serialize into a fresh JSON tree.
    fn to_json(&self) -> Result<Value, SchemaError> {
        serde_json::to_value(self).map_err(SchemaError::from)
    }

    /// Serialize into a compact JSON string.
    fn to_json_string(&self) -> Result<String, SchemaError> {
        serde_json::to_string(self).map_err(SchemaError::from)
    }
}

impl<T: Serialize + DeserializeOwned> JsonType for T {}

/// Serialize `value` and require the result to be a JSON object.
pub fn to_object<T: Serialize + ?Sized>(value: &T) -> Result<JsonObject, SchemaError> {
    match serde_json::to_value(value).map_err(SchemaError::from)? {
        Value::Object(map) => Ok(map),
        other => Err(SchemaError::TypeMismatch(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

/// Human-readable name of a JSON value's kind.
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

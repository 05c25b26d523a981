//! The user of an Actions on Google conversation.
//!
//! Wraps the request's [`User`] and owns the decoded user storage, which
//! the platform round-trips as a JSON string between turns.

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use dialogwire_core::schema::to_object;
use dialogwire_core::{JsonObject, SchemaError};

use super::request::{PackageEntitlement, Permission, User, UserProfile};

#[derive(Debug, Clone, Default)]
pub struct UserFacade {
    user: User,
    storage: JsonObject,
}

impl UserFacade {
    /// Wrap a request user, decoding its storage.
    ///
    /// A storage string that is not a JSON object fails the whole turn.
    pub fn new(user: User) -> Result<Self, SchemaError> {
        let storage = match user.user_storage.as_deref() {
            None | Some("") => JsonObject::new(),
            Some(raw) => match serde_json::from_str::<Value>(raw).map_err(SchemaError::from)? {
                Value::Object(map) => map,
                other => {
                    return Err(SchemaError::TypeMismatch(format!(
                        "userStorage must encode a JSON object, got {}",
                        dialogwire_core::schema::json_kind(&other)
                    )));
                }
            },
        };
        Ok(Self { user, storage })
    }

    /// Seed an empty storage, as on a first visit, with `default`.
    pub fn with_default_storage(mut self, default: &JsonObject) -> Self {
        if self.storage.is_empty() {
            self.storage = default.clone();
        }
        self
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user.user_id.as_deref()
    }

    pub fn id_token(&self) -> Option<&str> {
        self.user.id_token.as_deref()
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.user.profile.as_ref()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.user.access_token.as_deref()
    }

    pub fn permissions(&self) -> &[Permission] {
        &self.user.permissions
    }

    pub fn locale(&self) -> Option<&str> {
        self.user.locale.as_deref()
    }

    pub fn last_seen(&self) -> Option<DateTime<Utc>> {
        self.user.last_seen
    }

    /// Time elapsed since the user was last seen.
    pub fn last_seen_before(&self) -> Option<TimeDelta> {
        self.user.last_seen.map(|seen| Utc::now() - seen)
    }

    pub fn package_entitlements(&self) -> &[PackageEntitlement] {
        &self.user.package_entitlements
    }

    /// The raw request user.
    pub fn raw(&self) -> &User {
        &self.user
    }

    pub fn user_storage(&self) -> &JsonObject {
        &self.storage
    }

    pub fn user_storage_mut(&mut self) -> &mut JsonObject {
        &mut self.storage
    }

    /// Decode the storage into a typed value.
    pub fn user_storage_as<T: DeserializeOwned>(&self) -> Result<T, SchemaError> {
        serde_json::from_value(Value::Object(self.storage.clone())).map_err(SchemaError::from)
    }

    /// Decode the storage, or `T::default()` while it is empty.
    pub fn user_storage_or_default<T: DeserializeOwned + Default>(&self) -> Result<T, SchemaError> {
        if self.storage.is_empty() {
            return Ok(T::default());
        }
        self.user_storage_as()
    }

    /// Replace the storage with a typed value.
    pub fn set_user_storage<T: Serialize>(&mut self, value: &T) -> Result<(), SchemaError> {
        self.storage = to_object(value)?;
        Ok(())
    }

    /// Clear the storage. Nothing is sent back for an empty storage.
    pub fn reset_user_storage(&mut self) {
        self.storage.clear();
    }

    /// The storage as it goes on the wire, `None` when empty.
    pub fn serialize_user_storage(&self) -> Result<Option<String>, SchemaError> {
        if self.storage.is_empty() {
            return Ok(None);
        }
        serde_json::to_string(&self.storage)
            .map(Some)
            .map_err(SchemaError::from)
    }
}

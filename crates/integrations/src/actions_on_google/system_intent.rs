//! System intents and their value specs.
//!
//! A system intent hands the next turn to the Assistant (permission
//! prompts, sign-in, option pickers, ...). On the wire it is
//! `{"intent": ..., "data": {"@type": <value spec type URL>, ...spec}}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use dialogwire_core::schema::to_object;
use dialogwire_core::{JsonObject, SchemaError};

use super::request::Permission;
use super::response::{Image, ImageDisplayOptions, OpenUrlAction};

/// Prefix of every value spec `@type`.
pub const VALUE_SPEC_NAMESPACE: &str = "type.googleapis.com/google.actions.v2.";

/// A typed value spec for one system intent.
pub trait ValueSpec: Serialize {
    /// The intent to request, e.g. `actions.intent.PERMISSION`.
    const INTENT: &'static str;

    /// Message name appended to [`VALUE_SPEC_NAMESPACE`].
    const TYPE_NAME: &'static str;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemIntent {
    pub intent: String,

    #[serde(default)]
    pub data: JsonObject,
}

impl SystemIntent {
    /// Build the wire form of a system intent from its value spec.
    pub fn new<S: ValueSpec>(spec: &S) -> Result<Self, SchemaError> {
        let mut data = JsonObject::new();
        data.insert(
            "@type".into(),
            Value::String(format!("{VALUE_SPEC_NAMESPACE}{}", S::TYPE_NAME)),
        );
        data.extend(to_object(spec)?);
        Ok(Self {
            intent: S::INTENT.into(),
            data,
        })
    }
}

macro_rules! value_spec {
    ($ty:ident, $intent:literal) => {
        impl ValueSpec for $ty {
            const INTENT: &'static str = $intent;
            const TYPE_NAME: &'static str = stringify!($ty);
        }
    };
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionValueSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opt_context: Option<String>,

    #[serde(default)]
    pub permissions: Vec<Permission>,
}
value_spec!(PermissionValueSpec, "actions.intent.PERMISSION");

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationValueSpec {
    pub dialog_spec: ConfirmationDialogSpec,
}
value_spec!(ConfirmationValueSpec, "actions.intent.CONFIRMATION");

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationDialogSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_confirmation_text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInValueSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opt_context: Option<String>,
}
value_spec!(SignInValueSpec, "actions.intent.SIGN_IN");

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateTimeValueSpec {
    pub dialog_spec: DateTimeDialogSpec,
}
value_spec!(DateTimeValueSpec, "actions.intent.DATETIME");

/// Prompts for the date/time picker. Usually exactly one is set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateTimeDialogSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_datetime_text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_date_text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_time_text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSurfaceValueSpec {
    #[serde(default)]
    pub capabilities: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_title: Option<String>,
}
value_spec!(NewSurfaceValueSpec, "actions.intent.NEW_SURFACE");

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkValueSpec {
    pub open_url_action: OpenUrlAction,

    #[serde(default)]
    pub dialog_spec: DialogSpec,
}
value_spec!(LinkValueSpec, "actions.intent.LINK");

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DialogSpec {
    #[serde(default)]
    pub extension: JsonObject,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryAddressValueSpec {
    pub address_options: AddressOptions,
}
value_spec!(DeliveryAddressValueSpec, "actions.intent.DELIVERY_ADDRESS");

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddressOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

// --- Option selection ---

/// Exactly one of the selection kinds is set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionValueSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simple_select: Option<SimpleSelect>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_select: Option<ListSelect>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carousel_select: Option<CarouselSelect>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_select: Option<CollectionSelect>,
}
value_spec!(OptionValueSpec, "actions.intent.OPTION");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionInfo {
    pub key: String,

    #[serde(default)]
    pub synonyms: Vec<String>,
}

impl OptionInfo {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            synonyms: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimpleSelect {
    #[serde(default)]
    pub items: Vec<SimpleSelectItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleSelectItem {
    pub option_info: OptionInfo,
    pub title: String,
}

/// Item of a list, carousel or collection selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectItem {
    pub option_info: OptionInfo,
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<Image>,
}

impl SelectItem {
    pub fn new(key: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            option_info: OptionInfo::new(key),
            title: title.into(),
            description: None,
            image: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListSelect {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,

    #[serde(default)]
    pub items: Vec<SelectItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarouselSelect {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,

    #[serde(default)]
    pub items: Vec<SelectItem>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_display_options: Option<ImageDisplayOptions>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSelect {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,

    #[serde(default)]
    pub items: Vec<SelectItem>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_display_options: Option<ImageDisplayOptions>,
}

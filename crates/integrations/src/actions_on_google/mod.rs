//! Actions on Google integration.
//!
//! [`ActionsOnGoogleConversation`] exposes the AoG request (user, surface,
//! inputs) and builds the Dialogflow-specific AoG response payload:
//!
//! ```json
//! {
//!   "userStorage": "...",
//!   "expectUserResponse": true,
//!   "richResponse": {"items": [...], "suggestions": [...]},
//!   "systemIntent": {"intent": "...", "data": {...}}
//! }
//! ```

pub mod request;
pub mod response;
pub mod system_intent;
pub mod user;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use dialogwire_core::{IntegrationError, JsonObject, JsonType, SchemaError};

use request::{AppRequest, Input, Permission};
use response::{
    BasicCard, CarouselBrowse, Image, ImageDisplayOptions, Item, LinkOutSuggestion,
    MediaResponse, OpenUrlAction, RichResponse, SimpleResponse, Suggestion, TableCard,
    UrlTypeHint,
};
use system_intent::{
    AddressOptions, CarouselSelect, CollectionSelect, ConfirmationDialogSpec,
    ConfirmationValueSpec, DateTimeDialogSpec, DateTimeValueSpec, DeliveryAddressValueSpec,
    DialogSpec, LinkValueSpec, ListSelect, NewSurfaceValueSpec, OptionValueSpec,
    PermissionValueSpec, SignInValueSpec, SimpleSelect, SystemIntent, ValueSpec,
};
use user::UserFacade;

/// Integration source identifier of Actions on Google.
pub const SOURCE: &str = "google";

/// Capability name of devices with a screen.
pub const SCREEN_OUTPUT: &str = "actions.capability.SCREEN_OUTPUT";

/// Per-registration settings of the AoG integration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AogSettings {
    /// Send spoken text as `<speak>` SSML instead of plain text-to-speech.
    pub text_to_speech_as_ssml: bool,

    /// User storage of a user seen for the first time.
    #[serde(default, skip_serializing_if = "JsonObject::is_empty")]
    pub user_storage_default: JsonObject,
}

impl Default for AogSettings {
    fn default() -> Self {
        Self {
            text_to_speech_as_ssml: true,
            user_storage_default: JsonObject::new(),
        }
    }
}

impl AogSettings {
    /// Seed the storage of first-time users with `value`.
    pub fn with_user_storage_default<T: Serialize>(mut self, value: &T) -> Result<Self, SchemaError> {
        self.user_storage_default = dialogwire_core::schema::to_object(value)?;
        Ok(self)
    }
}

/// Wrap text in `<speak>` tags. The text is not escaped.
pub fn ssmlify(text: &str) -> String {
    format!("<speak>{text}</speak>")
}

fn join<I, S>(texts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    texts
        .into_iter()
        .map(|t| t.as_ref().to_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone)]
pub struct ActionsOnGoogleConversation {
    app_request: AppRequest,
    user: UserFacade,
    settings: AogSettings,
    expect_user_response: Option<bool>,
    rich_response: RichResponse,
    system_intent: Option<SystemIntent>,
}

impl ActionsOnGoogleConversation {
    /// Build from the request payload slice. An empty payload yields an
    /// empty request.
    pub fn from_payload(payload: JsonObject, settings: AogSettings) -> Result<Self, SchemaError> {
        let app_request = if payload.is_empty() {
            AppRequest::default()
        } else {
            AppRequest::from_json(Value::Object(payload))?
        };
        let user = UserFacade::new(app_request.user.clone().unwrap_or_default())?
            .with_default_storage(&settings.user_storage_default);
        Ok(Self {
            app_request,
            user,
            settings,
            expect_user_response: None,
            rich_response: RichResponse::default(),
            system_intent: None,
        })
    }

    // --- Request ---

    pub fn app_request(&self) -> &AppRequest {
        &self.app_request
    }

    pub fn settings(&self) -> &AogSettings {
        &self.settings
    }

    pub fn user(&self) -> &UserFacade {
        &self.user
    }

    pub fn user_mut(&mut self) -> &mut UserFacade {
        &mut self.user
    }

    pub fn inputs(&self) -> &[Input] {
        &self.app_request.inputs
    }

    /// Capability names of the current surface.
    pub fn surface(&self) -> Vec<&str> {
        self.app_request
            .surface
            .iter()
            .flat_map(|s| s.capabilities.iter())
            .filter_map(|c| c.name.as_deref())
            .collect()
    }

    pub fn has_screen(&self) -> bool {
        self.surface().contains(&SCREEN_OUTPUT)
    }

    /// Capability names of all surfaces the conversation could move to.
    pub fn available_surfaces(&self) -> Vec<&str> {
        self.app_request
            .available_surfaces
            .iter()
            .flat_map(|s| s.capabilities.iter())
            .filter_map(|c| c.name.as_deref())
            .collect()
    }

    pub fn is_in_sandbox(&self) -> Option<bool> {
        self.app_request.is_in_sandbox
    }

    // --- Response ---

    /// Speak and keep the microphone open.
    pub fn ask<I, S>(&mut self, texts: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.add_text_response(join(texts), self.settings.text_to_speech_as_ssml);
        self.expect_user_response = Some(true);
    }

    pub fn ask_ssml<I, S>(&mut self, texts: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.add_text_response(join(texts), true);
        self.expect_user_response = Some(true);
    }

    /// Speak and end the conversation.
    pub fn tell<I, S>(&mut self, texts: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.add_text_response(join(texts), self.settings.text_to_speech_as_ssml);
        self.expect_user_response = Some(false);
    }

    pub fn tell_ssml<I, S>(&mut self, texts: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.add_text_response(join(texts), true);
        self.expect_user_response = Some(false);
    }

    /// Set a display text on the most recent simple response.
    pub fn display<I, S>(&mut self, texts: I) -> Result<(), IntegrationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let response = self
            .rich_response
            .items
            .iter_mut()
            .rev()
            .find_map(|item| item.simple_response.as_mut())
            .ok_or(IntegrationError::NoSimpleResponse)?;
        response.display_text = Some(join(texts));
        Ok(())
    }

    /// Add suggestion chips, in order, without de-duplication.
    pub fn suggest<I, S>(&mut self, suggestions: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rich_response
            .suggestions
            .extend(suggestions.into_iter().map(|title| Suggestion {
                title: title.into(),
            }));
    }

    pub fn show_basic_card(&mut self, basic_card: BasicCard) {
        self.add_item(Item {
            basic_card: Some(basic_card),
            ..Item::default()
        });
    }

    /// Show a bare image as a basic card.
    pub fn show_image(&mut self, image: Image, display_options: Option<ImageDisplayOptions>) {
        self.show_basic_card(BasicCard {
            image: Some(image),
            image_display_options: display_options,
            ..BasicCard::default()
        });
    }

    pub fn show_table_card(&mut self, table_card: TableCard) {
        self.add_item(Item {
            table_card: Some(table_card),
            ..Item::default()
        });
    }

    pub fn play_media_response(&mut self, media_response: MediaResponse) {
        self.add_item(Item {
            media_response: Some(media_response),
            ..Item::default()
        });
    }

    pub fn show_carousel_browse(&mut self, carousel_browse: CarouselBrowse) {
        self.add_item(Item {
            carousel_browse: Some(carousel_browse),
            ..Item::default()
        });
    }

    /// Suggest a web or Android app link. Replaces any previous link.
    pub fn suggest_link_out(
        &mut self,
        destination_name: impl Into<String>,
        url: impl Into<String>,
        url_type_hint: Option<UrlTypeHint>,
    ) {
        self.rich_response.link_out_suggestion = Some(LinkOutSuggestion {
            destination_name: destination_name.into(),
            url: None,
            open_url_action: Some(OpenUrlAction {
                url: Some(url.into()),
                android_app: None,
                url_type_hint,
            }),
        });
    }

    // --- System intents ---

    /// Request any system intent. The last call wins.
    pub fn set_system_intent<S: ValueSpec>(&mut self, spec: &S) -> Result<(), SchemaError> {
        self.system_intent = Some(SystemIntent::new(spec)?);
        Ok(())
    }

    pub fn ask_for_permission<I>(&mut self, reason: &str, permissions: I) -> Result<(), SchemaError>
    where
        I: IntoIterator<Item = Permission>,
    {
        self.set_system_intent(&PermissionValueSpec {
            opt_context: Some(reason.into()),
            permissions: permissions.into_iter().collect(),
        })
    }

    pub fn ask_for_confirmation(&mut self, request_confirmation_text: &str) -> Result<(), SchemaError> {
        self.set_system_intent(&ConfirmationValueSpec {
            dialog_spec: ConfirmationDialogSpec {
                request_confirmation_text: Some(request_confirmation_text.into()),
            },
        })
    }

    pub fn ask_for_sign_in(&mut self, reason: &str) -> Result<(), SchemaError> {
        self.set_system_intent(&SignInValueSpec {
            opt_context: Some(reason.into()),
        })
    }

    pub fn ask_for_datetime(&mut self, request_text: &str) -> Result<(), SchemaError> {
        self.ask_for_datetime_with(DateTimeDialogSpec {
            request_datetime_text: Some(request_text.into()),
            ..DateTimeDialogSpec::default()
        })
    }

    pub fn ask_for_date(&mut self, request_text: &str) -> Result<(), SchemaError> {
        self.ask_for_datetime_with(DateTimeDialogSpec {
            request_date_text: Some(request_text.into()),
            ..DateTimeDialogSpec::default()
        })
    }

    pub fn ask_for_time(&mut self, request_text: &str) -> Result<(), SchemaError> {
        self.ask_for_datetime_with(DateTimeDialogSpec {
            request_time_text: Some(request_text.into()),
            ..DateTimeDialogSpec::default()
        })
    }

    fn ask_for_datetime_with(&mut self, dialog_spec: DateTimeDialogSpec) -> Result<(), SchemaError> {
        self.set_system_intent(&DateTimeValueSpec { dialog_spec })
    }

    /// Hand the conversation over to a surface with a screen.
    pub fn ask_for_screen_surface(
        &mut self,
        context: &str,
        notification_title: &str,
    ) -> Result<(), SchemaError> {
        self.ask_for_new_surface([SCREEN_OUTPUT], context, notification_title)
    }

    pub fn ask_for_new_surface<I, S>(
        &mut self,
        capabilities: I,
        context: &str,
        notification_title: &str,
    ) -> Result<(), SchemaError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_system_intent(&NewSurfaceValueSpec {
            capabilities: capabilities.into_iter().map(Into::into).collect(),
            context: Some(context.into()),
            notification_title: Some(notification_title.into()),
        })
    }

    pub fn ask_for_link(
        &mut self,
        open_url_action: OpenUrlAction,
        dialog_spec: Option<DialogSpec>,
    ) -> Result<(), SchemaError> {
        self.set_system_intent(&LinkValueSpec {
            open_url_action,
            dialog_spec: dialog_spec.unwrap_or_default(),
        })
    }

    pub fn ask_for_simple_selection(&mut self, simple_select: SimpleSelect) -> Result<(), SchemaError> {
        self.set_system_intent(&OptionValueSpec {
            simple_select: Some(simple_select),
            ..OptionValueSpec::default()
        })
    }

    pub fn ask_for_list_selection(&mut self, list_select: ListSelect) -> Result<(), SchemaError> {
        self.set_system_intent(&OptionValueSpec {
            list_select: Some(list_select),
            ..OptionValueSpec::default()
        })
    }

    pub fn ask_for_carousel_selection(
        &mut self,
        carousel_select: CarouselSelect,
    ) -> Result<(), SchemaError> {
        self.set_system_intent(&OptionValueSpec {
            carousel_select: Some(carousel_select),
            ..OptionValueSpec::default()
        })
    }

    pub fn ask_for_collection_selection(
        &mut self,
        collection_select: CollectionSelect,
    ) -> Result<(), SchemaError> {
        self.set_system_intent(&OptionValueSpec {
            collection_select: Some(collection_select),
            ..OptionValueSpec::default()
        })
    }

    pub fn ask_for_delivery_address(&mut self, reason: &str) -> Result<(), SchemaError> {
        self.set_system_intent(&DeliveryAddressValueSpec {
            address_options: AddressOptions {
                reason: Some(reason.into()),
            },
        })
    }

    // --- Rendering ---

    /// Render the Dialogflow-flavoured AoG response payload.
    pub fn render(&self) -> Result<JsonObject, SchemaError> {
        let mut payload = JsonObject::new();

        if let Some(storage) = self.user.serialize_user_storage()? {
            payload.insert("userStorage".into(), Value::String(storage));
        }
        if let Some(expect) = self.expect_user_response {
            payload.insert("expectUserResponse".into(), Value::Bool(expect));
        }
        if !self.rich_response.is_empty() {
            payload.insert("richResponse".into(), self.rich_response.to_json()?);
        }
        if let Some(system_intent) = &self.system_intent {
            payload.insert("systemIntent".into(), system_intent.to_json()?);
        }

        Ok(payload)
    }

    fn add_text_response(&mut self, text: String, ssml: bool) {
        let simple_response = if ssml {
            SimpleResponse {
                ssml: Some(ssmlify(&text)),
                ..SimpleResponse::default()
            }
        } else {
            SimpleResponse {
                text_to_speech: Some(text),
                ..SimpleResponse::default()
            }
        };
        self.add_item(Item {
            simple_response: Some(simple_response),
            ..Item::default()
        });
    }

    fn add_item(&mut self, item: Item) {
        self.rich_response.items.push(item);
    }
}

//! Rich response messages.
//!
//! A [`Message`] is a "oneof" on the wire: exactly one of its content
//! fields is meant to be set. It is modeled as a struct of optional
//! siblings, and exclusivity is the caller's responsibility.

use serde::{Deserialize, Serialize};

use crate::schema::JsonObject;

/// Platforms a message can be targeted at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Platform {
    PlatformUnspecified,
    Facebook,
    Slack,
    Telegram,
    Kik,
    Skype,
    Twilio,
    TwilioIp,
    Line,
    Spark,
    Tropo,
    Viber,
    ActionsOnGoogle,
    Telephony,
    GoogleHangouts,
}

impl Platform {
    /// All platforms that have an integration source identifier.
    pub const ALL: [Platform; 14] = [
        Platform::Facebook,
        Platform::Slack,
        Platform::Telegram,
        Platform::Kik,
        Platform::Skype,
        Platform::Twilio,
        Platform::TwilioIp,
        Platform::Line,
        Platform::Spark,
        Platform::Tropo,
        Platform::Viber,
        Platform::ActionsOnGoogle,
        Platform::Telephony,
        Platform::GoogleHangouts,
    ];

    /// The `originalDetectIntentRequest.source` identifier of this platform.
    pub fn source(self) -> Option<&'static str> {
        match self {
            Platform::PlatformUnspecified => None,
            Platform::Facebook => Some("facebook"),
            Platform::Slack => Some("slack"),
            Platform::Telegram => Some("telegram"),
            Platform::Kik => Some("kik"),
            Platform::Skype => Some("skype"),
            Platform::Twilio => Some("twilio"),
            Platform::TwilioIp => Some("twilio-ip"),
            Platform::Line => Some("line"),
            Platform::Spark => Some("spark"),
            Platform::Tropo => Some("tropo"),
            Platform::Viber => Some("viber"),
            Platform::ActionsOnGoogle => Some("google"),
            Platform::Telephony => Some("telephony"),
            Platform::GoogleHangouts => Some("google_hangouts"),
        }
    }

    /// Reverse of [`Platform::source`].
    pub fn from_source(source: &str) -> Option<Platform> {
        Platform::ALL.into_iter().find(|p| p.source() == Some(source))
    }
}

/// One rich response message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<Text>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<Image>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quick_replies: Option<QuickReplies>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card: Option<Card>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simple_responses: Option<SimpleResponses>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic_card: Option<BasicCard>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Suggestions>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_out_suggestion: Option<LinkOutSuggestion>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_select: Option<ListSelect>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carousel_select: Option<CarouselSelect>,

    /// Custom payload. Omitted when empty so it never sits next to another
    /// member of the oneof.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub payload: JsonObject,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telephony_play_audio: Option<TelephonyPlayAudio>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telephony_synthesize_speech: Option<TelephonySynthesizeSpeech>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telephony_transfer_call: Option<TelephonyTransferCall>,
}

impl Message {
    /// A plain text message.
    pub fn text<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            text: Some(Text {
                text: texts.into_iter().map(Into::into).collect(),
            }),
            ..Self::default()
        }
    }

    pub fn image(image: Image) -> Self {
        Self {
            image: Some(image),
            ..Self::default()
        }
    }

    pub fn quick_replies(quick_replies: QuickReplies) -> Self {
        Self {
            quick_replies: Some(quick_replies),
            ..Self::default()
        }
    }

    pub fn card(card: Card) -> Self {
        Self {
            card: Some(card),
            ..Self::default()
        }
    }

    /// Restrict this message to one platform.
    pub fn for_platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Text {
    #[serde(default)]
    pub text: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_uri: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accessibility_text: Option<String>,
}

impl Image {
    pub fn new(image_uri: impl Into<String>, accessibility_text: impl Into<String>) -> Self {
        Self {
            image_uri: Some(image_uri.into()),
            accessibility_text: Some(accessibility_text.into()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickReplies {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default)]
    pub quick_replies: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_uri: Option<String>,

    #[serde(default)]
    pub buttons: Vec<CardButton>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardButton {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postback: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleResponses {
    #[serde(default)]
    pub simple_responses: Vec<SimpleResponse>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_to_speech: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssml: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicCard {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<Image>,

    #[serde(default)]
    pub buttons: Vec<BasicCardButton>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicCardButton {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_uri_action: Option<OpenUriAction>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpenUriAction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Suggestions {
    #[serde(default)]
    pub suggestions: Vec<Suggestion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkOutSuggestion {
    pub destination_name: String,
    pub uri: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListSelect {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default)]
    pub items: Vec<SelectItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarouselSelect {
    pub items: Vec<SelectItem>,
}

/// An item of a list or carousel selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectItem {
    pub info: SelectItemInfo,
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<Image>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectItemInfo {
    pub key: String,

    #[serde(default)]
    pub synonyms: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelephonyPlayAudio {
    pub audio_uri: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TelephonySynthesizeSpeech {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssml: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelephonyTransferCall {
    pub phone_number: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SchemaError;
    use crate::schema::JsonType;
    use serde_json::json;

    #[test]
    fn text_message_wire_shape() {
        let msg = Message::text(["Hi", "there"]);
        assert_eq!(
            msg.to_json().unwrap(),
            json!({"text": {"text": ["Hi", "there"]}})
        );
    }

    #[test]
    fn payload_is_its_own_oneof_member() {
        let mut payload = JsonObject::new();
        payload.insert("custom".into(), json!(true));
        let msg = Message {
            payload,
            ..Message::default()
        };
        assert_eq!(msg.to_json().unwrap(), json!({"payload": {"custom": true}}));

        let parsed = Message::from_json(json!({"text": {"text": ["Hi"]}})).unwrap();
        assert!(parsed.payload.is_empty());
    }

    #[test]
    fn platform_uses_screaming_names_on_the_wire() {
        let msg = Message::text(["Hi"]).for_platform(Platform::ActionsOnGoogle);
        let json = msg.to_json().unwrap();
        assert_eq!(json["platform"], "ACTIONS_ON_GOOGLE");

        let parsed = Message::from_json(json!({"platform": "TWILIO_IP"})).unwrap();
        assert_eq!(parsed.platform, Some(Platform::TwilioIp));
    }

    #[test]
    fn unknown_platform_fails_loudly() {
        let err = Message::from_json(json!({"platform": "MYSPACE"})).unwrap_err();
        assert_eq!(err, SchemaError::UnknownVariant { value: "MYSPACE".into() });
    }

    #[test]
    fn platform_source_mapping() {
        assert_eq!(Platform::ActionsOnGoogle.source(), Some("google"));
        assert_eq!(Platform::from_source("twilio-ip"), Some(Platform::TwilioIp));
        assert_eq!(Platform::from_source("myspace"), None);
        assert_eq!(Platform::PlatformUnspecified.source(), None);
    }

    #[test]
    fn carousel_requires_items() {
        let err = CarouselSelect::from_json(json!({})).unwrap_err();
        assert_eq!(err, SchemaError::MissingField { field: "items".into() });
    }

    #[test]
    fn card_round_trip() {
        let msg = Message::card(Card {
            title: Some("Title".into()),
            subtitle: None,
            image_uri: Some("https://example.com/a.png".into()),
            buttons: vec![CardButton {
                text: Some("Go".into()),
                postback: Some("https://example.com".into()),
            }],
        });
        let back = Message::from_json(msg.to_json().unwrap()).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn quick_replies_always_emit_list() {
        let msg = Message::quick_replies(QuickReplies::default());
        assert_eq!(
            msg.to_json().unwrap()["quickReplies"],
            json!({"quickReplies": []})
        );
    }
}

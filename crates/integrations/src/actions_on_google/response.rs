//! Actions on Google v2 rich response schema.

use serde::{Deserialize, Serialize};

/// Visual response content of one turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RichResponse {
    #[serde(default)]
    pub items: Vec<Item>,

    #[serde(default)]
    pub suggestions: Vec<Suggestion>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_out_suggestion: Option<LinkOutSuggestion>,
}

impl RichResponse {
    /// Whether nothing was added to this response.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.suggestions.is_empty() && self.link_out_suggestion.is_none()
    }
}

/// One rich response item. Exactly one field is expected to be set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simple_response: Option<SimpleResponse>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic_card: Option<BasicCard>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_response: Option<MediaResponse>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carousel_browse: Option<CarouselBrowse>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_card: Option<TableCard>,
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
    pub buttons: Vec<Button>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_display_options: Option<ImageDisplayOptions>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Button {
    pub title: String,
    pub open_url_action: OpenUrlAction,
}

impl Button {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            open_url_action: OpenUrlAction::new(url),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenUrlAction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub android_app: Option<AndroidApp>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_type_hint: Option<UrlTypeHint>,
}

impl OpenUrlAction {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AndroidApp {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_name: Option<String>,

    #[serde(default)]
    pub versions: Vec<VersionFilter>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_version: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_version: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UrlTypeHint {
    UrlTypeHintUnspecified,
    AmpContent,
}

/// An image. Both the URL and the accessibility text are mandatory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub url: String,
    pub accessibility_text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<i32>,
}

impl Image {
    pub fn new(url: impl Into<String>, accessibility_text: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            accessibility_text: accessibility_text.into(),
            height: None,
            width: None,
        }
    }

    pub fn with_size(mut self, width: i32, height: i32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImageDisplayOptions {
    Default,
    White,
    Cropped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaResponse {
    pub media_type: MediaType,

    #[serde(default)]
    pub media_objects: Vec<MediaObject>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaType {
    MediaTypeUnspecified,
    Audio,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaObject {
    pub name: String,
    pub content_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub large_image: Option<Image>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<Image>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarouselBrowse {
    #[serde(default)]
    pub items: Vec<CarouselBrowseItem>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_display_options: Option<ImageDisplayOptions>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarouselBrowseItem {
    pub title: String,
    pub open_url_action: OpenUrlAction,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<Image>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCard {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<Image>,

    #[serde(default)]
    pub column_properties: Vec<ColumnProperties>,

    #[serde(default)]
    pub rows: Vec<Row>,

    #[serde(default)]
    pub buttons: Vec<Button>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub horizontal_alignment: Option<HorizontalAlignment>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HorizontalAlignment {
    Leading,
    Center,
    Trailing,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    #[serde(default)]
    pub cells: Vec<Cell>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub divider_after: Option<bool>,
}

impl Row {
    pub fn new<I, S>(cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cells: cells
                .into_iter()
                .map(|text| Cell { text: text.into() })
                .collect(),
            divider_after: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkOutSuggestion {
    pub destination_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_url_action: Option<OpenUrlAction>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use dialogwire_core::{JsonType, SchemaError};
    use serde_json::json;

    #[test]
    fn image_requires_accessibility_text() {
        let err = Image::from_json(json!({"url": "https://example.com/a.png"})).unwrap_err();
        assert_eq!(
            err,
            SchemaError::MissingField { field: "accessibilityText".into() }
        );
    }

    #[test]
    fn basic_card_wire_shape() {
        let card = BasicCard {
            title: Some("Title".into()),
            image: Some(Image::new("https://example.com/a.png", "A")),
            buttons: vec![Button::new("Open", "https://example.com")],
            image_display_options: Some(ImageDisplayOptions::Cropped),
            ..BasicCard::default()
        };
        assert_eq!(
            card.to_json().unwrap(),
            json!({
                "title": "Title",
                "image": {"url": "https://example.com/a.png", "accessibilityText": "A"},
                "buttons": [{"title": "Open", "openUrlAction": {"url": "https://example.com"}}],
                "imageDisplayOptions": "CROPPED"
            })
        );
    }

    #[test]
    fn table_card_round_trip() {
        let table = TableCard {
            title: Some("Scores".into()),
            column_properties: vec![ColumnProperties {
                header: Some("Team".into()),
                horizontal_alignment: Some(HorizontalAlignment::Leading),
            }],
            rows: vec![Row::new(["Red"]), Row::new(["Blue"])],
            ..TableCard::default()
        };
        let back = TableCard::from_json(table.to_json().unwrap()).unwrap();
        assert_eq!(back, table);
    }

    #[test]
    fn fully_populated_rich_response_round_trips() {
        let image = json!({
            "url": "https://example.com/a.png",
            "accessibilityText": "A",
            "height": 480,
            "width": 640
        });
        let open_url = json!({
            "url": "https://example.com",
            "androidApp": {
                "packageName": "com.example.app",
                "versions": [{"minVersion": 1, "maxVersion": 9}]
            },
            "urlTypeHint": "AMP_CONTENT"
        });
        let wire = json!({
            "items": [
                {"name": "greeting", "simpleResponse": {
                    "textToSpeech": "Hi", "ssml": "<speak>Hi</speak>", "displayText": "Hi!"
                }},
                {"basicCard": {
                    "title": "Title",
                    "subtitle": "Sub",
                    "formattedText": "**bold**",
                    "image": image,
                    "buttons": [{"title": "Open", "openUrlAction": open_url}],
                    "imageDisplayOptions": "WHITE"
                }},
                {"mediaResponse": {
                    "mediaType": "AUDIO",
                    "mediaObjects": [{
                        "name": "Track",
                        "contentUrl": "https://example.com/a.mp3",
                        "description": "A track",
                        "largeImage": image,
                        "icon": image
                    }]
                }},
                {"carouselBrowse": {
                    "items": [{
                        "title": "First",
                        "openUrlAction": open_url,
                        "description": "One",
                        "footer": "Foot",
                        "image": image
                    }],
                    "imageDisplayOptions": "DEFAULT"
                }},
                {"tableCard": {
                    "title": "Scores",
                    "subtitle": "Today",
                    "image": image,
                    "columnProperties": [{"header": "Team", "horizontalAlignment": "CENTER"}],
                    "rows": [{"cells": [{"text": "Red"}], "dividerAfter": true}],
                    "buttons": [{"title": "More", "openUrlAction": {"url": "https://example.com/more"}}]
                }}
            ],
            "suggestions": [{"title": "Yes"}, {"title": "No"}],
            "linkOutSuggestion": {
                "destinationName": "Site",
                "url": "https://example.com",
                "openUrlAction": open_url
            }
        });

        let rich = RichResponse::from_json(wire).unwrap();
        assert_eq!(rich.items.len(), 5);
        assert_eq!(RichResponse::from_json(rich.to_json().unwrap()).unwrap(), rich);

        let table = rich.items[4].table_card.as_ref().unwrap();
        assert_eq!(table.rows[0].divider_after, Some(true));
        assert_eq!(
            rich.items[1].basic_card.as_ref().unwrap().buttons[0]
                .open_url_action
                .url_type_hint,
            Some(UrlTypeHint::AmpContent)
        );
    }

    #[test]
    fn media_type_is_closed() {
        let err = MediaResponse::from_json(json!({"mediaType": "VIDEO"})).unwrap_err();
        assert_eq!(err, SchemaError::UnknownVariant { value: "VIDEO".into() });
    }

    #[test]
    fn rich_response_emptiness() {
        let mut rich = RichResponse::default();
        assert!(rich.is_empty());
        rich.suggestions.push(Suggestion { title: "Yes".into() });
        assert!(!rich.is_empty());
    }
}

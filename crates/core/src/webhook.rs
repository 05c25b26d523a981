//! Webhook request and response envelopes (Dialogflow v2beta1).

use serde::{Deserialize, Serialize};

use crate::message::Message;
use crate::schema::JsonObject;

/// The document the platform POSTs for every turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookRequest {
    /// `projects/<project>/agent/sessions/<session>`
    pub session: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_id: Option<String>,

    pub query_result: QueryResult,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_detect_intent_request: Option<OriginalDetectIntentRequest>,

    #[serde(default)]
    pub alternative_query_results: Vec<QueryResult>,
}

/// The classified user query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speech_recognition_confidence: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,

    #[serde(default)]
    pub parameters: JsonObject,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_required_params_present: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fulfillment_text: Option<String>,

    #[serde(default)]
    pub fulfillment_messages: Vec<Message>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_source: Option<String>,

    #[serde(default)]
    pub webhook_payload: JsonObject,

    #[serde(default)]
    pub output_contexts: Vec<Context>,

    pub intent: Intent,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent_detection_confidence: Option<f64>,

    #[serde(default)]
    pub diagnostic_info: JsonObject,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment_analysis_result: Option<SentimentAnalysisResult>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge_answers: Option<KnowledgeAnswers>,
}

impl QueryResult {
    /// A minimal query result for the given intent display name.
    pub fn for_intent(display_name: impl Into<String>) -> Self {
        Self {
            query_text: None,
            language_code: None,
            speech_recognition_confidence: None,
            action: None,
            parameters: JsonObject::new(),
            all_required_params_present: None,
            fulfillment_text: None,
            fulfillment_messages: Vec::new(),
            webhook_source: None,
            webhook_payload: JsonObject::new(),
            output_contexts: Vec::new(),
            intent: Intent {
                display_name: Some(display_name.into()),
                ..Intent::default()
            },
            intent_detection_confidence: None,
            diagnostic_info: JsonObject::new(),
            sentiment_analysis_result: None,
            knowledge_answers: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Intent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_fallback: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_state: Option<WebhookState>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WebhookState {
    WebhookStateUnspecified,
    WebhookStateEnabled,
    WebhookStateEnabledForSlotFilling,
}

/// A context as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Context {
    /// Full name: `<session>/contexts/<display name>`.
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifespan_count: Option<i32>,

    #[serde(default)]
    pub parameters: JsonObject,
}

/// The platform-specific request this turn originated from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OriginalDetectIntentRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default)]
    pub payload: JsonObject,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentAnalysisResult {
    pub query_text_sentiment: Sentiment,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magnitude: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeAnswers {
    #[serde(default)]
    pub answers: Vec<Answer>,
}

/// A knowledge connector answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faq_question: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_confidence_level: Option<MatchConfidenceLevel>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_confidence: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchConfidenceLevel {
    MatchConfidenceLevelUnspecified,
    Low,
    Medium,
    High,
}

/// The document returned to the platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fulfillment_text: Option<String>,

    #[serde(default)]
    pub fulfillment_messages: Vec<Message>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Integration payloads keyed by source identifier.
    #[serde(default)]
    pub payload: JsonObject,

    #[serde(default)]
    pub output_contexts: Vec<Context>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub followup_event_input: Option<EventInput>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_interaction: Option<bool>,
}

/// An event to trigger instead of sending a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventInput {
    pub name: String,
    pub language_code: String,

    #[serde(default)]
    pub parameters: JsonObject,
}

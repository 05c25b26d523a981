//! The per-turn conversation handed to intent handlers.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use dialogwire_core::message::{Card, Image, Message, QuickReplies};
use dialogwire_core::webhook::{Answer, EventInput, QueryResult, Sentiment};
use dialogwire_core::{JsonObject, Result, TemplateError, WebhookRequest, WebhookResponse};
use dialogwire_integrations::Integrations;

use crate::context::ContextManager;
use crate::templating::Templates;

/// Display name of the private context that carries per-session state.
pub const SESSION_CONTEXT: &str = "_session_context";

/// Parameters of [`SESSION_CONTEXT`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionContext {
    /// Consecutive fallback intents in this session
    #[serde(default)]
    pub fallback_level: u32,
}

/// One webhook turn.
///
/// Built by the [`Agent`](crate::Agent) from a parsed request, passed by
/// value through the handler and consumed by [`render`](Self::render).
/// Response methods only ever add to or replace what will be sent back.
#[derive(Debug)]
pub struct Conversation {
    request: WebhookRequest,
    contexts: ContextManager,
    integrations: Integrations,
    templates: Option<Arc<Templates>>,
    response: WebhookResponse,
    texts: Vec<String>,
}

impl Conversation {
    pub fn new(request: WebhookRequest, contexts: ContextManager, integrations: Integrations) -> Self {
        Self {
            request,
            contexts,
            integrations,
            templates: None,
            response: WebhookResponse::default(),
            texts: Vec::new(),
        }
    }

    pub fn with_templates(mut self, templates: Option<Arc<Templates>>) -> Self {
        self.templates = templates;
        self
    }

    // --- Request ---

    pub fn webhook_request(&self) -> &WebhookRequest {
        &self.request
    }

    pub fn session(&self) -> &str {
        &self.request.session
    }

    pub fn response_id(&self) -> Option<&str> {
        self.request.response_id.as_deref()
    }

    fn query(&self) -> &QueryResult {
        &self.request.query_result
    }

    pub fn query_text(&self) -> Option<&str> {
        self.query().query_text.as_deref()
    }

    pub fn language_code(&self) -> Option<&str> {
        self.query().language_code.as_deref()
    }

    /// Display name of the matched intent.
    pub fn intent(&self) -> &str {
        self.query().intent.display_name.as_deref().unwrap_or_default()
    }

    pub fn is_fallback(&self) -> bool {
        self.query().intent.is_fallback.unwrap_or(false)
    }

    pub fn action(&self) -> Option<&str> {
        self.query().action.as_deref()
    }

    pub fn parameters(&self) -> &JsonObject {
        &self.query().parameters
    }

    pub fn parameter(&self, name: &str) -> Option<&Value> {
        self.query().parameters.get(name)
    }

    pub fn all_required_params_present(&self) -> bool {
        self.query().all_required_params_present.unwrap_or(false)
    }

    pub fn diagnostic_info(&self) -> &JsonObject {
        &self.query().diagnostic_info
    }

    pub fn intent_detection_confidence(&self) -> Option<f64> {
        self.query().intent_detection_confidence
    }

    pub fn speech_recognition_confidence(&self) -> Option<f64> {
        self.query().speech_recognition_confidence
    }

    pub fn sentiment(&self) -> Option<&Sentiment> {
        self.query()
            .sentiment_analysis_result
            .as_ref()
            .map(|s| &s.query_text_sentiment)
    }

    pub fn knowledge_answers(&self) -> &[Answer] {
        self.query()
            .knowledge_answers
            .as_ref()
            .map(|k| k.answers.as_slice())
            .unwrap_or_default()
    }

    pub fn alternative_query_results(&self) -> &[QueryResult] {
        &self.request.alternative_query_results
    }

    /// Platform the request came from, e.g. `google`.
    pub fn source(&self) -> Option<&str> {
        self.request
            .original_detect_intent_request
            .as_ref()
            .and_then(|o| o.source.as_deref())
    }

    pub fn version(&self) -> Option<&str> {
        self.request
            .original_detect_intent_request
            .as_ref()
            .and_then(|o| o.version.as_deref())
    }

    /// The platform's raw request payload.
    pub fn payload(&self) -> Option<&JsonObject> {
        self.request
            .original_detect_intent_request
            .as_ref()
            .map(|o| &o.payload)
    }

    // --- State ---

    pub fn contexts(&self) -> &ContextManager {
        &self.contexts
    }

    pub fn contexts_mut(&mut self) -> &mut ContextManager {
        &mut self.contexts
    }

    pub fn integrations(&self) -> &Integrations {
        &self.integrations
    }

    pub fn integrations_mut(&mut self) -> &mut Integrations {
        &mut self.integrations
    }

    /// Consecutive fallback turns, 0 unless fallback tracking is enabled.
    pub fn fallback_level(&self) -> u32 {
        self.contexts
            .get_typed::<SessionContext>(SESSION_CONTEXT)
            .map(|s| s.fallback_level)
            .unwrap_or(0)
    }

    // --- Response ---

    /// Reply with text and keep listening.
    pub fn ask<I, S>(&mut self, texts: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let texts: Vec<String> = texts.into_iter().map(Into::into).collect();
        self.texts.extend(texts.iter().cloned());
        self.response.fulfillment_messages.push(Message::text(texts));
    }

    /// Reply with text and end the interaction.
    pub fn tell<I, S>(&mut self, texts: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ask(texts);
        self.response.end_interaction = Some(true);
    }

    pub fn show_quick_replies<I, S>(&mut self, title: Option<&str>, replies: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_message(Message::quick_replies(QuickReplies {
            title: title.map(str::to_owned),
            quick_replies: replies.into_iter().map(Into::into).collect(),
        }));
    }

    pub fn show_card(&mut self, card: Card) {
        self.add_message(Message::card(card));
    }

    pub fn show_image(&mut self, image: Image) {
        self.add_message(Message::image(image));
    }

    /// Append any rich message.
    pub fn add_message(&mut self, message: Message) {
        self.response.fulfillment_messages.push(message);
    }

    /// Make the platform trigger `name` after this turn.
    ///
    /// Without a language code the request's language is used.
    pub fn trigger_event(
        &mut self,
        name: impl Into<String>,
        language_code: Option<&str>,
        parameters: JsonObject,
    ) {
        let language_code = language_code
            .or(self.language_code())
            .unwrap_or("en")
            .to_owned();
        self.response.followup_event_input = Some(EventInput {
            name: name.into(),
            language_code,
            parameters,
        });
    }

    /// Render a response template.
    pub fn render_template(&self, key: &str, vars: &[(&str, &str)]) -> Result<String> {
        let templates = self
            .templates
            .as_ref()
            .ok_or_else(|| TemplateError::NotFound(key.to_owned()))?;
        Ok(templates.render(key, vars)?)
    }

    /// Turn everything accumulated during the turn into the response.
    pub fn render(self) -> Result<WebhookResponse> {
        let mut response = self.response;
        if !self.texts.is_empty() {
            response.fulfillment_text = Some(self.texts.join(" "));
        }
        response.output_contexts = self.contexts.to_wire()?;
        response.payload = self.integrations.render()?;
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::make_full_name;
    use dialogwire_core::message::CardButton;
    use dialogwire_core::webhook::{Intent, OriginalDetectIntentRequest};
    use dialogwire_integrations::IntegrationRegistry;
    use serde_json::json;

    const SESSION: &str = "projects/foo/agent/sessions/bar";

    fn request() -> WebhookRequest {
        let mut query_result = QueryResult::for_intent("Welcome");
        query_result.language_code = Some("de".into());
        query_result.parameters = json!({"city": "Berlin"}).as_object().unwrap().clone();
        query_result.intent = Intent {
            display_name: Some("Welcome".into()),
            is_fallback: Some(false),
            ..Intent::default()
        };
        WebhookRequest {
            session: SESSION.into(),
            response_id: Some("r-1".into()),
            query_result,
            original_detect_intent_request: Some(OriginalDetectIntentRequest {
                source: Some("facebook".into()),
                version: None,
                payload: json!({"foo": 1}).as_object().unwrap().clone(),
            }),
            alternative_query_results: Vec::new(),
        }
    }

    fn conversation() -> Conversation {
        let request = request();
        let integrations = Integrations::from_request(
            Arc::new(IntegrationRegistry::new()),
            request.original_detect_intent_request.as_ref(),
        )
        .unwrap();
        Conversation::new(request, ContextManager::new(SESSION), integrations)
    }

    #[test]
    fn request_readers() {
        let conv = conversation();
        assert_eq!(conv.intent(), "Welcome");
        assert_eq!(conv.session(), SESSION);
        assert_eq!(conv.response_id(), Some("r-1"));
        assert_eq!(conv.language_code(), Some("de"));
        assert_eq!(conv.parameter("city"), Some(&json!("Berlin")));
        assert_eq!(conv.source(), Some("facebook"));
        assert_eq!(conv.payload().unwrap()["foo"], 1);
        assert!(!conv.is_fallback());
        assert!(conv.knowledge_answers().is_empty());
        assert!(conv.sentiment().is_none());
        assert_eq!(conv.fallback_level(), 0);
    }

    #[test]
    fn texts_are_joined_into_fulfillment_text() {
        let mut conv = conversation();
        conv.ask(["Hello"]);
        conv.tell(["How", "are you?"]);

        let response = conv.render().unwrap();
        assert_eq!(response.fulfillment_text.as_deref(), Some("Hello How are you?"));
        assert_eq!(response.fulfillment_messages.len(), 2);
        assert_eq!(response.end_interaction, Some(true));
    }

    #[test]
    fn ask_keeps_interaction_open() {
        let mut conv = conversation();
        conv.ask(["Anything else?"]);
        let response = conv.render().unwrap();
        assert_eq!(response.end_interaction, None);
    }

    #[test]
    fn rich_messages_are_appended_in_order() {
        let mut conv = conversation();
        conv.show_quick_replies(Some("Pick"), ["a", "b"]);
        conv.show_card(Card {
            title: Some("Card".into()),
            buttons: vec![CardButton {
                text: Some("Open".into()),
                postback: Some("https://example.com".into()),
            }],
            ..Card::default()
        });
        conv.show_image(Image::new("https://example.com/a.png", "A"));

        let response = conv.render().unwrap();
        let messages = &response.fulfillment_messages;
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].quick_replies.as_ref().unwrap().quick_replies, vec!["a", "b"]);
        assert!(messages[1].card.is_some());
        assert!(messages[2].image.is_some());
        assert_eq!(response.fulfillment_text, None);
    }

    #[test]
    fn trigger_event_defaults_to_request_language() {
        let mut conv = conversation();
        conv.trigger_event("REMIND", None, JsonObject::new());
        let response = conv.render().unwrap();
        let event = response.followup_event_input.unwrap();
        assert_eq!(event.name, "REMIND");
        assert_eq!(event.language_code, "de");
    }

    #[test]
    fn render_includes_contexts_and_integrations() {
        let mut conv = conversation();
        conv.contexts_mut()
            .set("flow", Some(2), json!({"step": 1}).as_object().unwrap().clone())
            .unwrap();
        conv.integrations_mut()
            .generic("slack")
            .unwrap()
            .insert("text", "hi");

        let response = conv.render().unwrap();
        assert_eq!(response.output_contexts.len(), 1);
        assert_eq!(response.output_contexts[0].name, make_full_name(SESSION, "flow"));
        assert_eq!(response.payload["facebook"], json!({"foo": 1}));
        assert_eq!(response.payload["slack"], json!({"text": "hi"}));
    }

    #[test]
    fn templates_are_optional() {
        let conv = conversation();
        assert!(conv.render_template("greeting", &[]).is_err());

        let templates = Templates::from_yaml_str("greeting: Hi {{ name }}").unwrap();
        let conv = conversation().with_templates(Some(Arc::new(templates)));
        assert_eq!(conv.render_template("greeting", &[("name", "Ada")]).unwrap(), "Hi Ada");
    }
}

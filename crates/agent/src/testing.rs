//! Helpers for testing handlers without a running server.
//!
//! ```no_run
//! # use dialogwire_agent::{Agent, Conversation, build_webhook_request};
//! # fn main() -> dialogwire_core::Result<()> {
//! let mut agent = Agent::new();
//! agent.register_handler("Welcome", |mut conv: Conversation| {
//!     conv.tell(["Hi"]);
//!     Ok(conv)
//! })?;
//!
//! let response = agent.test_request(build_webhook_request().intent("Welcome"))?;
//! assert_eq!(response.text_responses(), vec!["Hi"]);
//! # Ok(())
//! # }
//! ```

use serde_json::Value;

use dialogwire_core::webhook::{Context, OriginalDetectIntentRequest, QueryResult};
use dialogwire_core::{JsonObject, WebhookRequest, WebhookResponse};

use crate::context::{display_name_of, is_full_name, make_full_name};

pub const DEFAULT_INTENT: &str = "Default Welcome Intent";
pub const DEFAULT_SESSION: &str = "projects/foo/agent/sessions/bar";

/// Start building a webhook request.
pub fn build_webhook_request() -> WebhookRequestBuilder {
    WebhookRequestBuilder::default()
}

#[derive(Debug, Clone)]
pub struct WebhookRequestBuilder {
    intent: String,
    session: String,
    query_text: Option<String>,
    language_code: String,
    is_fallback: bool,
    parameters: JsonObject,
    contexts: Vec<(String, Option<i32>, JsonObject)>,
    source: Option<(String, Option<String>)>,
    payload: JsonObject,
}

impl Default for WebhookRequestBuilder {
    fn default() -> Self {
        Self {
            intent: DEFAULT_INTENT.into(),
            session: DEFAULT_SESSION.into(),
            query_text: None,
            language_code: "en".into(),
            is_fallback: false,
            parameters: JsonObject::new(),
            contexts: Vec::new(),
            source: None,
            payload: JsonObject::new(),
        }
    }
}

impl WebhookRequestBuilder {
    pub fn intent(mut self, display_name: impl Into<String>) -> Self {
        self.intent = display_name.into();
        self
    }

    pub fn session(mut self, session: impl Into<String>) -> Self {
        self.session = session.into();
        self
    }

    pub fn query_text(mut self, text: impl Into<String>) -> Self {
        self.query_text = Some(text.into());
        self
    }

    pub fn language_code(mut self, code: impl Into<String>) -> Self {
        self.language_code = code.into();
        self
    }

    /// Mark the intent as a fallback intent.
    pub fn fallback(mut self) -> Self {
        self.is_fallback = true;
        self
    }

    pub fn parameter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    /// Add an incoming context. Display names are qualified with the
    /// session when the request is built.
    pub fn context(
        mut self,
        name: impl Into<String>,
        lifespan_count: Option<i32>,
        parameters: Value,
    ) -> Self {
        let parameters = match parameters {
            Value::Object(map) => map,
            _ => JsonObject::new(),
        };
        self.contexts.push((name.into(), lifespan_count, parameters));
        self
    }

    /// Set the originating platform.
    pub fn source(mut self, source: impl Into<String>, version: Option<&str>) -> Self {
        self.source = Some((source.into(), version.map(str::to_owned)));
        self
    }

    /// The platform's payload slice. Only sent along with a source.
    pub fn payload(mut self, payload: Value) -> Self {
        self.payload = match payload {
            Value::Object(map) => map,
            _ => JsonObject::new(),
        };
        self
    }

    pub fn build(self) -> WebhookRequest {
        let mut query_result = QueryResult::for_intent(self.intent);
        query_result.query_text = self.query_text;
        query_result.language_code = Some(self.language_code);
        query_result.parameters = self.parameters;
        query_result.intent.is_fallback = Some(self.is_fallback);
        query_result.output_contexts = self
            .contexts
            .into_iter()
            .map(|(name, lifespan_count, parameters)| Context {
                name: if is_full_name(&name) {
                    name
                } else {
                    make_full_name(&self.session, &name)
                },
                lifespan_count,
                parameters,
            })
            .collect();

        let original_detect_intent_request =
            self.source
                .map(|(source, version)| OriginalDetectIntentRequest {
                    source: Some(source),
                    version,
                    payload: self.payload,
                });

        WebhookRequest {
            session: self.session,
            response_id: Some(uuid::Uuid::new_v4().to_string()),
            query_result,
            original_detect_intent_request,
            alternative_query_results: Vec::new(),
        }
    }
}

impl From<WebhookRequestBuilder> for WebhookRequest {
    fn from(builder: WebhookRequestBuilder) -> Self {
        builder.build()
    }
}

/// A webhook response with lookup helpers for assertions.
#[derive(Debug, Clone)]
pub struct TestWebhookResponse {
    response: WebhookResponse,
}

impl TestWebhookResponse {
    pub fn response(&self) -> &WebhookResponse {
        &self.response
    }

    pub fn fulfillment_text(&self) -> Option<&str> {
        self.response.fulfillment_text.as_deref()
    }

    /// Every text of every text message, in order.
    pub fn text_responses(&self) -> Vec<&str> {
        self.response
            .fulfillment_messages
            .iter()
            .filter_map(|m| m.text.as_ref())
            .flat_map(|t| t.text.iter().map(String::as_str))
            .collect()
    }

    pub fn has_context(&self, display_name: &str) -> bool {
        self.context(display_name).is_some()
    }

    pub fn context(&self, display_name: &str) -> Option<&Context> {
        self.response
            .output_contexts
            .iter()
            .find(|ctx| display_name_of(&ctx.name) == display_name)
    }

    pub fn payload_for(&self, source: &str) -> Option<&Value> {
        self.response.payload.get(source)
    }

    pub fn ends_interaction(&self) -> bool {
        self.response.end_interaction.unwrap_or(false)
    }

    pub fn into_inner(self) -> WebhookResponse {
        self.response
    }
}

impl From<WebhookResponse> for TestWebhookResponse {
    fn from(response: WebhookResponse) -> Self {
        Self { response }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dialogwire_core::message::Message;
    use serde_json::json;

    #[test]
    fn defaults() {
        let request = build_webhook_request().build();
        assert_eq!(request.session, DEFAULT_SESSION);
        assert_eq!(
            request.query_result.intent.display_name.as_deref(),
            Some(DEFAULT_INTENT)
        );
        assert!(request.original_detect_intent_request.is_none());
        assert!(request.response_id.is_some());
        assert_ne!(
            request.response_id,
            build_webhook_request().build().response_id
        );
    }

    #[test]
    fn contexts_are_qualified_with_the_session() {
        let full = "projects/p/agent/sessions/s/contexts/already";
        let request = build_webhook_request()
            .session("projects/p/agent/sessions/s")
            .context("short", Some(2), json!({"a": 1}))
            .context(full, None, json!(null))
            .parameter("city", "Berlin")
            .build();

        let contexts = &request.query_result.output_contexts;
        assert_eq!(contexts[0].name, "projects/p/agent/sessions/s/contexts/short");
        assert_eq!(contexts[0].parameters["a"], 1);
        assert_eq!(contexts[1].name, full);
        assert!(contexts[1].parameters.is_empty());
        assert_eq!(request.query_result.parameters["city"], "Berlin");
    }

    #[test]
    fn source_and_payload() {
        let request = build_webhook_request()
            .source("google", Some("2"))
            .payload(json!({"isInSandbox": true}))
            .build();
        let odir = request.original_detect_intent_request.unwrap();
        assert_eq!(odir.source.as_deref(), Some("google"));
        assert_eq!(odir.version.as_deref(), Some("2"));
        assert_eq!(odir.payload["isInSandbox"], true);
    }

    #[test]
    fn response_helpers() {
        let mut response = WebhookResponse::default();
        response.fulfillment_messages.push(Message::text(["a", "b"]));
        response.fulfillment_messages.push(Message::default());
        response.fulfillment_messages.push(Message::text(["c"]));
        response.output_contexts.push(Context {
            name: make_full_name(DEFAULT_SESSION, "flow"),
            lifespan_count: Some(1),
            parameters: JsonObject::new(),
        });
        response
            .payload
            .insert("google".into(), json!({"expectUserResponse": true}));

        let response = TestWebhookResponse::from(response);
        assert_eq!(response.text_responses(), vec!["a", "b", "c"]);
        assert!(response.has_context("flow"));
        assert!(!response.has_context("other"));
        assert_eq!(
            response.payload_for("google").unwrap()["expectUserResponse"],
            true
        );
        assert!(!response.ends_interaction());
        assert_eq!(response.into_inner().output_contexts.len(), 1);
    }
}

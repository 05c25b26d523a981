//! The agent: registries plus the request → handler → response pipeline.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use dialogwire_config::AppConfig;
use dialogwire_core::{
    ContextError, Error, JsonType, Result, WebhookRequest, WebhookResponse,
};
use dialogwire_integrations::{
    AogSettings, IntegrationEntry, IntegrationKind, IntegrationRegistry, Integrations,
};

use crate::context::{ContextManager, ContextRegistration, ContextRegistry};
use crate::conversation::{Conversation, SESSION_CONTEXT, SessionContext};
use crate::handler::{HandlerRegistry, IntentHandler};
use crate::templating::Templates;
use crate::testing::TestWebhookResponse;

const DEFAULT_UNHANDLED_INTENT_TEXT: &str = "Sorry, I can't help with that right now.";

/// A fulfillment agent.
///
/// Set up once at startup through the `register_*` and `with_*` methods,
/// then shared (typically as `Arc<Agent>`) and only read while handling
/// requests.
pub struct Agent {
    handlers: HandlerRegistry,
    contexts: ContextRegistry,
    integrations: Arc<IntegrationRegistry>,
    templates: Option<Arc<Templates>>,

    /// Log request and response documents at debug level
    log_payloads: bool,

    /// Whether the private session context tracks fallback turns
    track_fallback_level: bool,

    /// Reply for intents without a handler
    unhandled_intent_text: String,
}

impl Agent {
    /// An agent with Actions on Google (version 2) registered and no
    /// handlers.
    pub fn new() -> Self {
        Self {
            handlers: HandlerRegistry::new(),
            contexts: ContextRegistry::new(),
            integrations: Arc::new(IntegrationRegistry::with_actions_on_google(
                "2",
                AogSettings::default(),
            )),
            templates: None,
            log_payloads: false,
            track_fallback_level: false,
            unhandled_intent_text: DEFAULT_UNHANDLED_INTENT_TEXT.into(),
        }
    }

    /// Build an agent from the application config.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let aog = AogSettings {
            text_to_speech_as_ssml: config.actions_on_google.text_to_speech_as_ssml,
            ..AogSettings::default()
        };
        let mut agent = Self {
            integrations: Arc::new(IntegrationRegistry::with_actions_on_google(
                &config.actions_on_google.version,
                aog,
            )),
            log_payloads: config.agent.log_payloads,
            unhandled_intent_text: config.agent.unhandled_intent_text.clone(),
            ..Self::new()
        };

        if config.agent.track_fallback_level {
            agent = agent.with_fallback_tracking()?;
        }
        if let Some(path) = &config.templates.path {
            let templates = Templates::load(path)?;
            info!(path = %path.display(), count = templates.len(), "Loaded response templates");
            agent = agent.with_templates(templates);
        }
        Ok(agent)
    }

    pub fn with_log_payloads(mut self, enabled: bool) -> Self {
        self.log_payloads = enabled;
        self
    }

    pub fn with_unhandled_intent_text(mut self, text: impl Into<String>) -> Self {
        self.unhandled_intent_text = text.into();
        self
    }

    pub fn with_templates(mut self, templates: Templates) -> Self {
        self.templates = Some(Arc::new(templates));
        self
    }

    /// Count consecutive fallback turns per session, see
    /// [`Conversation::fallback_level`].
    pub fn with_fallback_tracking(mut self) -> Result<Self> {
        self.contexts.register(
            ContextRegistration::typed::<SessionContext>(SESSION_CONTEXT)
                .keep_around()
                .with_typed_default::<SessionContext>(),
        )?;
        self.track_fallback_level = true;
        Ok(self)
    }

    /// Seed the Actions on Google user storage of first-time users with
    /// `value`, for every registered AoG version.
    pub fn with_aog_user_storage_default<T: Serialize>(mut self, value: &T) -> Result<Self> {
        let default = dialogwire_core::schema::to_object(value)?;
        for settings in Arc::make_mut(&mut self.integrations).actions_on_google_settings_mut() {
            settings.user_storage_default = default.clone();
        }
        Ok(self)
    }

    // --- Registration ---

    /// Register a closure or function as the handler of `intent`.
    pub fn register_handler<F>(&mut self, intent: impl Into<String>, handler: F) -> Result<()>
    where
        F: Fn(Conversation) -> Result<Conversation> + Send + Sync + 'static,
    {
        self.register_intent_handler(intent, handler)
    }

    pub fn register_intent_handler(
        &mut self,
        intent: impl Into<String>,
        handler: impl IntentHandler + 'static,
    ) -> Result<()> {
        self.handlers.register(intent, Box::new(handler))?;
        Ok(())
    }

    pub fn register_context(&mut self, registration: ContextRegistration) -> Result<()> {
        self.contexts.register(registration)?;
        Ok(())
    }

    pub fn register_integration(
        &mut self,
        source: impl Into<String>,
        version: Option<&str>,
        kind: IntegrationKind,
    ) -> Result<()> {
        Arc::make_mut(&mut self.integrations).register(source, version, kind)?;
        Ok(())
    }

    // --- Introspection ---

    pub fn list_handlers(&self) -> Vec<(&str, &str)> {
        self.handlers.list()
    }

    pub fn list_contexts(&self) -> Vec<&ContextRegistration> {
        self.contexts.list()
    }

    pub fn list_integrations(&self) -> Vec<IntegrationEntry> {
        self.integrations.list()
    }

    pub fn templates(&self) -> Option<&Templates> {
        self.templates.as_deref()
    }

    // --- Request handling ---

    /// Handle a request, reporting a missing handler as
    /// [`Error::UnhandledIntent`].
    pub fn try_handle(&self, request: WebhookRequest) -> Result<WebhookResponse> {
        self.dispatch(request, false)
    }

    /// Handle a request, answering intents without a handler with the
    /// fallback text.
    pub fn handle(&self, request: WebhookRequest) -> Result<WebhookResponse> {
        self.dispatch(request, true)
    }

    /// Handle a raw request body and produce the response document.
    pub fn handle_json(&self, body: &[u8]) -> Result<Value> {
        let request = WebhookRequest::from_slice(body).map_err(Error::MalformedRequest)?;
        if self.log_payloads {
            let pretty = serde_json::from_slice::<Value>(body)
                .ok()
                .and_then(|v| serde_json::to_string_pretty(&v).ok())
                .unwrap_or_else(|| String::from_utf8_lossy(body).into_owned());
            debug!(body = %pretty, "Webhook request");
        }

        let response = self.handle(request)?.to_json()?;
        if self.log_payloads {
            let pretty = serde_json::to_string_pretty(&response).unwrap_or_default();
            debug!(body = %pretty, "Webhook response");
        }
        Ok(response)
    }

    /// Run a request through the full pipeline and wrap the response for
    /// assertions.
    pub fn test_request(&self, request: impl Into<WebhookRequest>) -> Result<TestWebhookResponse> {
        self.handle(request.into()).map(TestWebhookResponse::from)
    }

    fn dispatch(&self, request: WebhookRequest, fallback: bool) -> Result<WebhookResponse> {
        let intent = request
            .query_result
            .intent
            .display_name
            .clone()
            .unwrap_or_default();
        let mut conv = self.initialize_conversation(request)?;

        match self.handlers.get(&intent) {
            Some(handler) => {
                debug!(intent = %intent, handler = handler.name(), "Dispatching to handler");
                handler.handle(conv)?.render()
            }
            None if fallback => {
                warn!(intent = %intent, "No handler registered, sending fallback response");
                conv.ask([self.unhandled_intent_text.as_str()]);
                conv.render()
            }
            None => Err(Error::UnhandledIntent { intent }),
        }
    }

    fn initialize_conversation(&self, request: WebhookRequest) -> Result<Conversation> {
        let contexts = ContextManager::from_request(
            request.session.as_str(),
            request.query_result.output_contexts.clone(),
            &self.contexts,
        )
        .map_err(|e| match e {
            ContextError::Parameters { name, source } => {
                debug!(context = %name, error = %source, "Undecodable context parameters");
                Error::MalformedRequest(source)
            }
            other => other.into(),
        })?;

        let integrations = Integrations::from_request(
            Arc::clone(&self.integrations),
            request.original_detect_intent_request.as_ref(),
        )
        .map_err(Error::MalformedRequest)?;

        let mut conv =
            Conversation::new(request, contexts, integrations).with_templates(self.templates.clone());
        if self.track_fallback_level {
            let is_fallback = conv.is_fallback();
            if let Ok(state) = conv
                .contexts_mut()
                .get_typed_mut::<SessionContext>(SESSION_CONTEXT)
            {
                state.fallback_level = if is_fallback {
                    state.fallback_level.saturating_add(1)
                } else {
                    0
                };
            }
        }
        Ok(conv)
    }
}

impl Default for Agent {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("handlers", &self.handlers)
            .field("contexts", &self.contexts)
            .field("integrations", &self.integrations)
            .field("templates", &self.templates.as_ref().map(|t| t.len()))
            .field("log_payloads", &self.log_payloads)
            .field("track_fallback_level", &self.track_fallback_level)
            .finish()
    }
}

//! Per-turn integration conversations.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use dialogwire_core::webhook::OriginalDetectIntentRequest;
use dialogwire_core::{IntegrationError, JsonObject, Result, SchemaError};

use crate::actions_on_google::{self, ActionsOnGoogleConversation};
use crate::generic::GenericIntegrationConversation;
use crate::registry::IntegrationRegistry;

/// One platform's slice of a turn.
#[derive(Debug, Clone)]
pub enum IntegrationConversation {
    Generic(GenericIntegrationConversation),
    ActionsOnGoogle(Box<ActionsOnGoogleConversation>),
}

impl IntegrationConversation {
    pub fn kind_name(&self) -> &'static str {
        match self {
            IntegrationConversation::Generic(_) => "generic",
            IntegrationConversation::ActionsOnGoogle(_) => "actions_on_google",
        }
    }

    pub fn as_generic(&self) -> Option<&GenericIntegrationConversation> {
        match self {
            IntegrationConversation::Generic(conv) => Some(conv),
            _ => None,
        }
    }

    pub fn as_generic_mut(&mut self) -> Option<&mut GenericIntegrationConversation> {
        match self {
            IntegrationConversation::Generic(conv) => Some(conv),
            _ => None,
        }
    }

    pub fn as_google(&self) -> Option<&ActionsOnGoogleConversation> {
        match self {
            IntegrationConversation::ActionsOnGoogle(conv) => Some(conv),
            _ => None,
        }
    }

    pub fn as_google_mut(&mut self) -> Option<&mut ActionsOnGoogleConversation> {
        match self {
            IntegrationConversation::ActionsOnGoogle(conv) => Some(conv),
            _ => None,
        }
    }

    /// Render this slice of the response payload.
    pub fn render(&self) -> std::result::Result<JsonObject, SchemaError> {
        match self {
            IntegrationConversation::Generic(conv) => Ok(conv.render()),
            IntegrationConversation::ActionsOnGoogle(conv) => conv.render(),
        }
    }
}

/// The integration conversations of one turn, keyed by source.
///
/// The request's own source is built from its payload up front. Any other
/// source is built empty on first mutable access. Every conversation built
/// during the turn is rendered into the response payload.
#[derive(Debug)]
pub struct Integrations {
    registry: Arc<IntegrationRegistry>,
    conversations: BTreeMap<String, IntegrationConversation>,
}

impl Integrations {
    pub fn from_request(
        registry: Arc<IntegrationRegistry>,
        request: Option<&OriginalDetectIntentRequest>,
    ) -> std::result::Result<Self, SchemaError> {
        let mut conversations = BTreeMap::new();

        if let Some(odir) = request {
            if let Some(source) = odir.source.as_deref() {
                let kind = registry.resolve(source, odir.version.as_deref());
                debug!(source = %source, kind = kind.name(), "Instantiating integration");
                conversations.insert(source.to_owned(), kind.instantiate(odir.payload.clone())?);
            }
        }

        Ok(Self {
            registry,
            conversations,
        })
    }

    /// An already instantiated conversation.
    pub fn get(&self, source: &str) -> Option<&IntegrationConversation> {
        self.conversations.get(source)
    }

    /// The conversation for `source`, instantiating it if needed.
    pub fn entry(&mut self, source: &str) -> Result<&mut IntegrationConversation> {
        match self.conversations.entry(source.to_owned()) {
            Entry::Occupied(slot) => Ok(slot.into_mut()),
            Entry::Vacant(slot) => {
                let kind = self.registry.resolve_any(source);
                debug!(source = %source, kind = kind.name(), "Instantiating integration on demand");
                Ok(slot.insert(kind.instantiate(JsonObject::new())?))
            }
        }
    }

    /// A generic (mapping-like) integration conversation.
    pub fn generic(&mut self, source: &str) -> Result<&mut GenericIntegrationConversation> {
        self.entry(source)?.as_generic_mut().ok_or_else(|| {
            IntegrationError::VariantMismatch {
                source_id: source.to_owned(),
                expected: "generic",
            }
            .into()
        })
    }

    /// The Actions on Google conversation.
    pub fn google(&mut self) -> Result<&mut ActionsOnGoogleConversation> {
        self.entry(actions_on_google::SOURCE)?
            .as_google_mut()
            .ok_or_else(|| {
                IntegrationError::VariantMismatch {
                    source_id: actions_on_google::SOURCE.to_owned(),
                    expected: "actions_on_google",
                }
                .into()
            })
    }

    /// Sources with an instantiated conversation.
    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.conversations.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    /// Render every instantiated conversation, keyed by source.
    pub fn render(&self) -> std::result::Result<JsonObject, SchemaError> {
        let mut payload = JsonObject::new();
        for (source, conv) in &self.conversations {
            payload.insert(source.clone(), Value::Object(conv.render()?));
        }
        Ok(payload)
    }
}

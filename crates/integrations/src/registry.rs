//! Integration registry: which conversation variant serves which platform.
//!
//! Populated once at startup and read-only afterwards, so it can be shared
//! between concurrent turns without locking.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::info;

use dialogwire_core::{JsonObject, RegistryError, SchemaError};

use crate::actions_on_google::{self, ActionsOnGoogleConversation, AogSettings};
use crate::conversation::IntegrationConversation;
use crate::generic::GenericIntegrationConversation;

/// The closed set of integration variants.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntegrationKind {
    #[default]
    Generic,
    ActionsOnGoogle(AogSettings),
}

impl IntegrationKind {
    pub fn name(&self) -> &'static str {
        match self {
            IntegrationKind::Generic => "generic",
            IntegrationKind::ActionsOnGoogle(_) => "actions_on_google",
        }
    }

    /// Build a conversation of this kind from a request payload slice.
    pub fn instantiate(&self, payload: JsonObject) -> Result<IntegrationConversation, SchemaError> {
        Ok(match self {
            IntegrationKind::Generic => {
                IntegrationConversation::Generic(GenericIntegrationConversation::from_payload(payload))
            }
            IntegrationKind::ActionsOnGoogle(settings) => IntegrationConversation::ActionsOnGoogle(
                Box::new(ActionsOnGoogleConversation::from_payload(payload, settings.clone())?),
            ),
        })
    }
}

/// One registration, as listed by introspection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntegrationEntry {
    pub source: String,
    pub version: Option<String>,
    pub kind: IntegrationKind,
}

type Key = (String, Option<String>);

#[derive(Debug, Clone, Default)]
pub struct IntegrationRegistry {
    entries: BTreeMap<Key, IntegrationKind>,
}

impl IntegrationRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry serving Actions on Google requests of `version`.
    pub fn with_actions_on_google(version: &str, settings: AogSettings) -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(
            (actions_on_google::SOURCE.to_owned(), Some(version.to_owned())),
            IntegrationKind::ActionsOnGoogle(settings),
        );
        Self { entries }
    }

    /// Register a variant for a `(source, version)` pair.
    pub fn register(
        &mut self,
        source: impl Into<String>,
        version: Option<&str>,
        kind: IntegrationKind,
    ) -> Result<(), RegistryError> {
        let key = (source.into(), version.map(str::to_owned));
        if self.entries.contains_key(&key) {
            return Err(RegistryError::AmbiguousIntegration {
                source_id: key.0,
                version: key.1,
            });
        }
        info!(
            source = %key.0,
            version = key.1.as_deref().unwrap_or("-"),
            kind = kind.name(),
            "Registered integration"
        );
        self.entries.insert(key, kind);
        Ok(())
    }

    /// Exact lookup, no fallback.
    pub fn get(&self, source: &str, version: Option<&str>) -> Option<&IntegrationKind> {
        self.entries
            .get(&(source.to_owned(), version.map(str::to_owned)))
    }

    /// Resolve the variant for a request: the exact version first, then
    /// the versionless registration, then the generic conversation.
    pub fn resolve(&self, source: &str, version: Option<&str>) -> IntegrationKind {
        version
            .and_then(|v| self.get(source, Some(v)))
            .or_else(|| self.get(source, None))
            .cloned()
            .unwrap_or_default()
    }

    /// Resolve a source that is not the request's own: the versionless
    /// registration, else the first registered version, else generic.
    pub fn resolve_any(&self, source: &str) -> IntegrationKind {
        self.get(source, None)
            .or_else(|| {
                self.entries
                    .iter()
                    .find(|((s, _), _)| s == source)
                    .map(|(_, kind)| kind)
            })
            .cloned()
            .unwrap_or_default()
    }

    /// All registrations, ordered by source and version.
    pub fn list(&self) -> Vec<IntegrationEntry> {
        self.entries
            .iter()
            .map(|((source, version), kind)| IntegrationEntry {
                source: source.clone(),
                version: version.clone(),
                kind: kind.clone(),
            })
            .collect()
    }

    /// Settings of every Actions on Google registration.
    pub fn actions_on_google_settings_mut(&mut self) -> impl Iterator<Item = &mut AogSettings> {
        self.entries.values_mut().filter_map(|kind| match kind {
            IntegrationKind::ActionsOnGoogle(settings) => Some(settings),
            IntegrationKind::Generic => None,
        })
    }

    /// Number of registrations.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

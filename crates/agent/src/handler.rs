//! Intent handlers and their registry.

use std::collections::BTreeMap;

use tracing::info;

use dialogwire_core::{RegistryError, Result};

use crate::conversation::Conversation;

/// Fulfillment logic for one intent.
///
/// A handler receives the turn's conversation, adds its response and hands
/// it back. Returning an error aborts the turn.
pub trait IntentHandler: Send + Sync {
    fn handle(&self, conv: Conversation) -> Result<Conversation>;

    /// Name shown by introspection.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl<F> IntentHandler for F
where
    F: Fn(Conversation) -> Result<Conversation> + Send + Sync,
{
    fn handle(&self, conv: Conversation) -> Result<Conversation> {
        self(conv)
    }
}

/// Intent display name to handler. Exactly one handler per intent.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: BTreeMap<String, Box<dyn IntentHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. A second handler for the same intent is rejected.
    pub fn register(
        &mut self,
        intent: impl Into<String>,
        handler: Box<dyn IntentHandler>,
    ) -> std::result::Result<(), RegistryError> {
        let intent = intent.into();
        if self.handlers.contains_key(&intent) {
            return Err(RegistryError::AmbiguousHandler { intent });
        }
        info!(intent = %intent, handler = handler.name(), "Registered intent handler");
        self.handlers.insert(intent, handler);
        Ok(())
    }

    pub fn get(&self, intent: &str) -> Option<&dyn IntentHandler> {
        self.handlers.get(intent).map(|h| h.as_ref())
    }

    /// `(intent, handler name)` pairs, ordered by intent.
    pub fn list(&self) -> Vec<(&str, &str)> {
        self.handlers
            .iter()
            .map(|(intent, handler)| (intent.as_str(), handler.name()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.list()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Greeter;

    impl IntentHandler for Greeter {
        fn handle(&self, mut conv: Conversation) -> Result<Conversation> {
            conv.tell(["Hi"]);
            Ok(conv)
        }

        fn name(&self) -> &str {
            "greeter"
        }
    }

    fn echo(conv: Conversation) -> Result<Conversation> {
        Ok(conv)
    }

    #[test]
    fn empty_registry() {
        let reg = HandlerRegistry::new();
        assert!(reg.is_empty());
        assert!(reg.get("Welcome").is_none());
    }

    #[test]
    fn register_and_list() {
        let mut reg = HandlerRegistry::new();
        reg.register("Welcome", Box::new(Greeter)).unwrap();
        reg.register("Echo", Box::new(echo)).unwrap();

        assert_eq!(reg.len(), 2);
        let listed = reg.list();
        assert_eq!(listed[0].0, "Echo");
        assert!(listed[0].1.ends_with("echo"));
        assert_eq!(listed[1], ("Welcome", "greeter"));
    }

    #[test]
    fn duplicate_intent_is_rejected() {
        let mut reg = HandlerRegistry::new();
        reg.register("Welcome", Box::new(Greeter)).unwrap();
        let err = reg.register("Welcome", Box::new(echo)).unwrap_err();
        assert!(matches!(err, RegistryError::AmbiguousHandler { intent } if intent == "Welcome"));
        assert_eq!(reg.get("Welcome").unwrap().name(), "greeter");
    }
}

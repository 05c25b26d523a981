//! Per-turn view over the contexts of one request.

use tracing::debug;

use dialogwire_core::{ContextError, SchemaError, webhook};

use super::{
    Context, ContextRegistry, ContextValue, KEEP_AROUND_LIFESPAN, Parameters, display_name_of,
    is_full_name, is_valid_display_name, make_full_name,
};

/// The contexts of one turn.
///
/// Lookups take either a display name or a full name. Deleted contexts are
/// kept aside with a zero lifespan so the platform learns about the
/// deletion; they are no longer visible through [`get`](Self::get),
/// [`has`](Self::has) or [`iter`](Self::iter).
#[derive(Debug, Clone, Default)]
pub struct ContextManager {
    session: String,
    active: Vec<Context>,
    deleted: Vec<Context>,
}

impl ContextManager {
    /// An empty manager for `session`.
    pub fn new(session: impl Into<String>) -> Self {
        Self {
            session: session.into(),
            active: Vec::new(),
            deleted: Vec::new(),
        }
    }

    /// Build the turn's context set from the request.
    ///
    /// Incoming contexts are parsed, registered ones are decoded into their
    /// parameter type, missing contexts with a default are created, and
    /// finally every keep-around context gets its lifespan reset.
    pub fn from_request(
        session: impl Into<String>,
        contexts: Vec<webhook::Context>,
        registry: &ContextRegistry,
    ) -> Result<Self, ContextError> {
        let mut manager = Self::new(session);

        for wire in contexts {
            let mut ctx = Context::from_wire(wire);
            if let Some(registration) = registry.get(ctx.display_name()) {
                if let Parameters::Raw(raw) = std::mem::take(&mut ctx.parameters) {
                    ctx.parameters =
                        registration
                            .decode(raw)
                            .map_err(|source| ContextError::Parameters {
                                name: ctx.display_name().to_owned(),
                                source,
                            })?;
                }
            }
            manager.upsert(ctx);
        }

        for name in registry.have_default_factories() {
            if manager.has(name) {
                continue;
            }
            let Some(parameters) = registry.get(name).and_then(|r| r.default_parameters()) else {
                continue;
            };
            let parameters = parameters.map_err(|source| ContextError::Parameters {
                name: name.to_owned(),
                source,
            })?;
            debug!(context = %name, "Creating default context");
            let full_name = make_full_name(&manager.session, name);
            manager.upsert(Context::new(full_name, None, parameters));
        }

        for ctx in &mut manager.active {
            if registry.should_keep_around(ctx.display_name()).unwrap_or(false) {
                ctx.lifespan_count = Some(KEEP_AROUND_LIFESPAN);
            }
        }

        Ok(manager)
    }

    pub fn session(&self) -> &str {
        &self.session
    }

    pub fn get(&self, name: &str) -> Result<&Context, ContextError> {
        self.position(name)
            .map(|i| &self.active[i])
            .ok_or_else(|| ContextError::NotFound(name.to_owned()))
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut Context, ContextError> {
        match self.position(name) {
            Some(i) => Ok(&mut self.active[i]),
            None => Err(ContextError::NotFound(name.to_owned())),
        }
    }

    /// Typed parameters of a registered context.
    pub fn get_typed<T: 'static>(&self, name: &str) -> Result<&T, ContextError> {
        self.get(name)?
            .typed::<T>()
            .ok_or_else(|| not_of_type::<T>(name))
    }

    pub fn get_typed_mut<T: 'static>(&mut self, name: &str) -> Result<&mut T, ContextError> {
        self.get_mut(name)?
            .typed_mut::<T>()
            .ok_or_else(|| not_of_type::<T>(name))
    }

    /// Insert or replace a context from a name and parameters.
    ///
    /// `name` may be a display name, which is qualified with the session, or
    /// an already qualified name.
    pub fn set(
        &mut self,
        name: &str,
        lifespan_count: Option<i32>,
        parameters: impl Into<Parameters>,
    ) -> Result<&mut Context, ContextError> {
        let full_name = self.qualify(name)?;
        Ok(self.upsert(Context::new(full_name, lifespan_count, parameters)))
    }

    pub fn set_typed<T: ContextValue>(
        &mut self,
        name: &str,
        lifespan_count: Option<i32>,
        value: T,
    ) -> Result<&mut Context, ContextError> {
        self.set(name, lifespan_count, Parameters::typed(value))
    }

    /// Insert or replace a complete context.
    pub fn set_context(&mut self, mut ctx: Context) -> Result<&mut Context, ContextError> {
        ctx.name = self.qualify(&ctx.name)?;
        Ok(self.upsert(ctx))
    }

    /// Expire a context on the platform.
    ///
    /// The context stays in the outgoing set with a lifespan of zero.
    pub fn delete(&mut self, name: &str) -> Result<(), ContextError> {
        let index = self
            .position(name)
            .ok_or_else(|| ContextError::NotFound(name.to_owned()))?;
        let mut ctx = self.active.remove(index);
        ctx.lifespan_count = Some(0);
        self.deleted.push(ctx);
        Ok(())
    }

    pub fn has(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Active contexts in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Context> {
        self.active.iter()
    }

    /// Contexts deleted during this turn.
    pub fn deleted(&self) -> impl Iterator<Item = &Context> {
        self.deleted.iter()
    }

    /// The outgoing set: active contexts, then deleted ones.
    pub fn as_list(&self) -> Vec<&Context> {
        self.active.iter().chain(&self.deleted).collect()
    }

    /// Encode the outgoing set for the response.
    pub fn to_wire(&self) -> Result<Vec<webhook::Context>, SchemaError> {
        self.as_list().into_iter().map(Context::to_wire).collect()
    }

    fn position(&self, name: &str) -> Option<usize> {
        let display_name = display_name_of(name);
        self.active
            .iter()
            .position(|ctx| ctx.display_name() == display_name)
    }

    fn qualify(&self, name: &str) -> Result<String, ContextError> {
        if !is_valid_display_name(display_name_of(name)) {
            return Err(ContextError::InvalidName(name.to_owned()));
        }
        if is_full_name(name) {
            Ok(name.to_owned())
        } else if is_valid_display_name(name) {
            Ok(make_full_name(&self.session, name))
        } else {
            Err(ContextError::InvalidName(name.to_owned()))
        }
    }

    /// Replace a context with the same display name or append it. Setting
    /// a context deleted earlier in the turn revives it.
    fn upsert(&mut self, ctx: Context) -> &mut Context {
        let display_name = ctx.display_name().to_owned();
        self.deleted.retain(|c| c.display_name() != display_name);
        let index = match self.position(&display_name) {
            Some(i) => {
                self.active[i] = ctx;
                i
            }
            None => {
                self.active.push(ctx);
                self.active.len() - 1
            }
        };
        &mut self.active[index]
    }
}

fn not_of_type<T>(name: &str) -> ContextError {
    ContextError::Parameters {
        name: name.to_owned(),
        source: SchemaError::TypeMismatch(format!(
            "parameters are not decoded as {}",
            std::any::type_name::<T>()
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextRegistration;
    use dialogwire_core::JsonObject;
    use serde::{Deserialize, Serialize};
    use serde_json::{Value, json};

    const SESSION: &str = "projects/foo/agent/sessions/bar";

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct GameState {
        #[serde(default)]
        questions_answered: u32,
    }

    fn wire(name: &str, lifespan: Option<i32>, params: Value) -> webhook::Context {
        webhook::Context {
            name: make_full_name(SESSION, name),
            lifespan_count: lifespan,
            parameters: params.as_object().cloned().unwrap_or_default(),
        }
    }

    fn obj(value: Value) -> JsonObject {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn parses_incoming_contexts() {
        let registry = ContextRegistry::new();
        let manager = ContextManager::from_request(
            SESSION,
            vec![wire("foo", Some(5), json!({"a": 1}))],
            &registry,
        )
        .unwrap();
        assert_eq!(manager.len(), 1);
        let ctx = manager.get("foo").unwrap();
        assert_eq!(ctx.lifespan_count, Some(5));
        assert_eq!(ctx.raw().unwrap()["a"], 1);
        assert!(manager.has(&make_full_name(SESSION, "foo")));
    }

    #[test]
    fn missing_context_is_not_found() {
        let manager = ContextManager::new(SESSION);
        assert!(matches!(
            manager.get("nope"),
            Err(ContextError::NotFound(name)) if name == "nope"
        ));
    }

    #[test]
    fn deleted_context_is_sent_with_zero_lifespan() {
        let registry = ContextRegistry::new();
        let mut manager = ContextManager::from_request(
            SESSION,
            vec![wire("x", Some(3), json!({"keep": true}))],
            &registry,
        )
        .unwrap();

        manager.delete("x").unwrap();
        assert!(!manager.has("x"));
        assert!(manager.is_empty());

        let out = manager.to_wire().unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name, make_full_name(SESSION, "x"));
        assert_eq!(out[0].lifespan_count, Some(0));
        assert_eq!(out[0].parameters["keep"], true);
    }

    #[test]
    fn deleting_absent_context_fails() {
        let mut manager = ContextManager::new(SESSION);
        assert!(matches!(manager.delete("x"), Err(ContextError::NotFound(_))));
    }

    #[test]
    fn set_after_delete_revives() {
        let mut manager = ContextManager::new(SESSION);
        manager.set("x", Some(2), JsonObject::new()).unwrap();
        manager.delete("x").unwrap();
        manager.set("x", Some(4), obj(json!({"b": 2}))).unwrap();

        let out = manager.to_wire().unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].lifespan_count, Some(4));
    }

    #[test]
    fn keep_around_lifespan_is_reset() {
        let mut registry = ContextRegistry::new();
        registry
            .register(ContextRegistration::new("sticky").keep_around())
            .unwrap();
        let manager = ContextManager::from_request(
            SESSION,
            vec![wire("sticky", Some(1), json!({})), wire("other", Some(1), json!({}))],
            &registry,
        )
        .unwrap();
        assert_eq!(
            manager.get("sticky").unwrap().lifespan_count,
            Some(KEEP_AROUND_LIFESPAN)
        );
        assert_eq!(manager.get("other").unwrap().lifespan_count, Some(1));
    }

    #[test]
    fn missing_context_with_default_is_created() {
        let mut registry = ContextRegistry::new();
        registry
            .register(ContextRegistration::new("prefs").with_default_parameters(obj(json!({"lang": "en"}))))
            .unwrap();
        registry
            .register(
                ContextRegistration::typed::<GameState>("game")
                    .keep_around()
                    .with_typed_default::<GameState>(),
            )
            .unwrap();

        let manager = ContextManager::from_request(SESSION, Vec::new(), &registry).unwrap();

        let prefs = manager.get("prefs").unwrap();
        assert_eq!(prefs.name, make_full_name(SESSION, "prefs"));
        assert_eq!(prefs.lifespan_count, None);
        assert_eq!(prefs.raw().unwrap()["lang"], "en");

        let game = manager.get("game").unwrap();
        assert_eq!(game.lifespan_count, Some(KEEP_AROUND_LIFESPAN));
        assert_eq!(manager.get_typed::<GameState>("game").unwrap(), &GameState::default());
    }

    #[test]
    fn raw_default_of_typed_context_is_decoded() {
        let mut registry = ContextRegistry::new();
        registry
            .register(
                ContextRegistration::typed::<GameState>("game")
                    .with_default_parameters(obj(json!({"questions_answered": 3}))),
            )
            .unwrap();

        let manager = ContextManager::from_request(SESSION, Vec::new(), &registry).unwrap();
        assert_eq!(manager.get_typed::<GameState>("game").unwrap().questions_answered, 3);
    }

    #[test]
    fn present_context_is_not_replaced_by_default() {
        let mut registry = ContextRegistry::new();
        registry
            .register(ContextRegistration::new("prefs").with_default_parameters(obj(json!({"lang": "en"}))))
            .unwrap();
        let manager = ContextManager::from_request(
            SESSION,
            vec![wire("prefs", Some(2), json!({"lang": "de"}))],
            &registry,
        )
        .unwrap();
        assert_eq!(manager.get("prefs").unwrap().raw().unwrap()["lang"], "de");
    }

    #[test]
    fn typed_parameters_are_decoded_and_encoded() {
        let mut registry = ContextRegistry::new();
        registry
            .register(ContextRegistration::typed::<GameState>("game"))
            .unwrap();
        let mut manager = ContextManager::from_request(
            SESSION,
            vec![wire("game", Some(5), json!({"questions_answered": 2}))],
            &registry,
        )
        .unwrap();

        manager
            .get_typed_mut::<GameState>("game")
            .unwrap()
            .questions_answered += 1;
        assert!(matches!(
            manager.get_typed::<String>("game"),
            Err(ContextError::Parameters { .. })
        ));

        let out = manager.to_wire().unwrap();
        assert_eq!(out[0].parameters["questions_answered"], 3);
    }

    #[test]
    fn undecodable_typed_parameters_fail_initialisation() {
        let mut registry = ContextRegistry::new();
        registry
            .register(ContextRegistration::typed::<GameState>("game"))
            .unwrap();
        let err = ContextManager::from_request(
            SESSION,
            vec![wire("game", Some(5), json!({"questions_answered": "lots"}))],
            &registry,
        )
        .unwrap_err();
        assert!(matches!(err, ContextError::Parameters { name, .. } if name == "game"));
    }

    #[test]
    fn set_validates_names() {
        let mut manager = ContextManager::new(SESSION);
        assert!(matches!(
            manager.set("has space", None, JsonObject::new()),
            Err(ContextError::InvalidName(_))
        ));

        let full = make_full_name(SESSION, "qualified");
        manager.set(&full, Some(1), JsonObject::new()).unwrap();
        assert_eq!(manager.get("qualified").unwrap().name, full);

        let ctx = manager.set("plain", None, JsonObject::new()).unwrap();
        assert_eq!(ctx.name, make_full_name(SESSION, "plain"));
    }

    #[test]
    fn set_replaces_in_place() {
        let mut manager = ContextManager::new(SESSION);
        manager.set("a", Some(1), JsonObject::new()).unwrap();
        manager.set("b", Some(1), JsonObject::new()).unwrap();
        manager.set_typed("a", Some(2), GameState { questions_answered: 7 }).unwrap();

        let names: Vec<_> = manager.iter().map(Context::display_name).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(manager.get("a").unwrap().lifespan_count, Some(2));
        assert_eq!(manager.get_typed::<GameState>("a").unwrap().questions_answered, 7);
    }

    #[test]
    fn set_context_qualifies_display_names() {
        let mut manager = ContextManager::new(SESSION);
        manager
            .set_context(Context::new("short", Some(3), JsonObject::new()))
            .unwrap();
        assert_eq!(manager.get("short").unwrap().name, make_full_name(SESSION, "short"));
    }
}

//! Context registrations: keep-around, defaults and typed parameters.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::info;

use dialogwire_core::{ContextError, JsonObject, SchemaError};

use super::{ContextValue, Parameters, is_valid_display_name};

type DefaultFactory = Arc<dyn Fn() -> Parameters + Send + Sync>;
type Decoder = Arc<dyn Fn(JsonObject) -> Result<Box<dyn ContextValue>, SchemaError> + Send + Sync>;

/// How one context is treated across turns.
#[derive(Clone)]
pub struct ContextRegistration {
    display_name: String,
    keep_around: bool,
    default_factory: Option<DefaultFactory>,
    decoder: Option<Decoder>,
    type_name: Option<&'static str>,
}

impl ContextRegistration {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            keep_around: false,
            default_factory: None,
            decoder: None,
            type_name: None,
        }
    }

    /// A registration whose parameters are decoded into `T` before the
    /// handler runs and encoded back when the response is rendered.
    pub fn typed<T>(display_name: impl Into<String>) -> Self
    where
        T: ContextValue + DeserializeOwned,
    {
        let mut registration = Self::new(display_name);
        registration.decoder = Some(Arc::new(
            |params: JsonObject| -> Result<Box<dyn ContextValue>, SchemaError> {
                let value: T = serde_json::from_value(Value::Object(params))?;
                Ok(Box::new(value))
            },
        ));
        registration.type_name = Some(std::any::type_name::<T>());
        registration
    }

    /// Never let the context expire on its own.
    ///
    /// The lifespan is reset before every handler, so the handler can still
    /// delete it explicitly.
    pub fn keep_around(mut self) -> Self {
        self.keep_around = true;
        self
    }

    /// Create the context with these parameters when a request lacks it.
    pub fn with_default_parameters(self, parameters: JsonObject) -> Self {
        self.with_default_factory(move || parameters.clone())
    }

    pub fn with_default_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> JsonObject + Send + Sync + 'static,
    {
        self.default_factory = Some(Arc::new(move || Parameters::Raw(factory())));
        self
    }

    /// Create the context from `T::default()` when a request lacks it.
    pub fn with_typed_default<T>(self) -> Self
    where
        T: ContextValue + Default,
    {
        self.with_typed_factory(T::default)
    }

    pub fn with_typed_factory<T, F>(mut self, factory: F) -> Self
    where
        T: ContextValue,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.default_factory = Some(Arc::new(move || Parameters::typed(factory())));
        self
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn is_keep_around(&self) -> bool {
        self.keep_around
    }

    pub fn has_default(&self) -> bool {
        self.default_factory.is_some()
    }

    /// Rust type the parameters are decoded into, if any.
    pub fn type_name(&self) -> Option<&'static str> {
        self.type_name
    }

    /// Fresh default parameters, if the registration has a factory.
    ///
    /// Raw defaults of a typed registration go through [`Self::decode`].
    pub fn default_parameters(&self) -> Option<Result<Parameters, SchemaError>> {
        let factory = self.default_factory.as_ref()?;
        Some(match factory() {
            Parameters::Raw(raw) => self.decode(raw),
            typed => Ok(typed),
        })
    }

    /// Decode incoming parameters. Untyped registrations pass them through.
    pub fn decode(&self, parameters: JsonObject) -> Result<Parameters, SchemaError> {
        match &self.decoder {
            Some(decode) => decode(parameters).map(Parameters::Typed),
            None => Ok(Parameters::Raw(parameters)),
        }
    }
}

impl fmt::Debug for ContextRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextRegistration")
            .field("display_name", &self.display_name)
            .field("keep_around", &self.keep_around)
            .field("has_default", &self.has_default())
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// Registry of every context with special handling, keyed by display name.
#[derive(Debug, Clone, Default)]
pub struct ContextRegistry {
    entries: BTreeMap<String, ContextRegistration>,
}

impl ContextRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a context. Registering a name again replaces its entry.
    pub fn register(&mut self, registration: ContextRegistration) -> Result<(), ContextError> {
        let name = registration.display_name.clone();
        if !is_valid_display_name(&name) {
            return Err(ContextError::InvalidName(name));
        }
        info!(
            context = %name,
            keep_around = registration.keep_around,
            has_default = registration.has_default(),
            "Registered context"
        );
        self.entries.insert(name, registration);
        Ok(())
    }

    pub fn get(&self, display_name: &str) -> Option<&ContextRegistration> {
        self.entries.get(display_name)
    }

    pub fn contains(&self, display_name: &str) -> bool {
        self.entries.contains_key(display_name)
    }

    pub fn should_keep_around(&self, display_name: &str) -> Result<bool, ContextError> {
        self.entries
            .get(display_name)
            .map(|r| r.keep_around)
            .ok_or_else(|| ContextError::NotRegistered(display_name.to_owned()))
    }

    /// Display names of all registrations with a default factory.
    pub fn have_default_factories(&self) -> BTreeSet<&str> {
        self.entries
            .values()
            .filter(|r| r.has_default())
            .map(|r| r.display_name.as_str())
            .collect()
    }

    pub fn list(&self) -> Vec<&ContextRegistration> {
        self.entries.values().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct GameState {
        #[serde(default)]
        questions_answered: u32,
    }

    #[test]
    fn empty_registry() {
        let reg = ContextRegistry::new();
        assert!(reg.is_empty());
        assert_eq!(reg.len(), 0);
        assert!(reg.have_default_factories().is_empty());
    }

    #[test]
    fn register_and_list() {
        let mut reg = ContextRegistry::new();
        reg.register(ContextRegistration::new("b_ctx").keep_around())
            .unwrap();
        reg.register(ContextRegistration::new("a_ctx")).unwrap();

        let names: Vec<_> = reg.list().into_iter().map(|r| r.display_name()).collect();
        assert_eq!(names, vec!["a_ctx", "b_ctx"]);
        assert!(reg.contains("a_ctx"));
        assert!(reg.should_keep_around("b_ctx").unwrap());
        assert!(!reg.should_keep_around("a_ctx").unwrap());
    }

    #[test]
    fn unknown_context_is_not_registered() {
        let reg = ContextRegistry::new();
        assert!(matches!(
            reg.should_keep_around("nope"),
            Err(ContextError::NotRegistered(name)) if name == "nope"
        ));
    }

    #[test]
    fn invalid_names_are_rejected() {
        let mut reg = ContextRegistry::new();
        assert!(matches!(
            reg.register(ContextRegistration::new("bad name")),
            Err(ContextError::InvalidName(_))
        ));
    }

    #[test]
    fn re_registration_replaces() {
        let mut reg = ContextRegistry::new();
        reg.register(ContextRegistration::new("ctx").keep_around())
            .unwrap();
        reg.register(ContextRegistration::new("ctx")).unwrap();
        assert_eq!(reg.len(), 1);
        assert!(!reg.should_keep_around("ctx").unwrap());
    }

    #[test]
    fn default_factories() {
        let mut reg = ContextRegistry::new();
        reg.register(
            ContextRegistration::new("raw")
                .with_default_parameters(json!({"a": 1}).as_object().unwrap().clone()),
        )
        .unwrap();
        reg.register(ContextRegistration::typed::<GameState>("game").with_typed_default::<GameState>())
            .unwrap();
        reg.register(ContextRegistration::new("plain")).unwrap();

        assert_eq!(
            reg.have_default_factories(),
            BTreeSet::from(["game", "raw"])
        );
        let raw = reg.get("raw").unwrap().default_parameters().unwrap().unwrap();
        assert_eq!(raw.to_object().unwrap()["a"], 1);
        assert!(reg.get("plain").unwrap().default_parameters().is_none());
    }

    #[test]
    fn typed_registration_decodes() {
        let registration = ContextRegistration::typed::<GameState>("game");
        assert!(registration.type_name().unwrap().ends_with("GameState"));

        let params = json!({"questions_answered": 4, "questions_answered.original": "4"});
        let decoded = registration
            .decode(params.as_object().unwrap().clone())
            .unwrap();
        match decoded {
            Parameters::Typed(value) => {
                let state = (*value).as_any().downcast_ref::<GameState>().unwrap();
                assert_eq!(state.questions_answered, 4);
            }
            Parameters::Raw(_) => panic!("expected typed parameters"),
        }

        let bad = json!({"questions_answered": "many"});
        assert!(registration.decode(bad.as_object().unwrap().clone()).is_err());
    }

    #[test]
    fn raw_default_of_typed_registration_is_decoded() {
        let registration = ContextRegistration::typed::<GameState>("game")
            .with_default_parameters(json!({"questions_answered": 2}).as_object().unwrap().clone());
        match registration.default_parameters().unwrap().unwrap() {
            Parameters::Typed(value) => {
                let state = (*value).as_any().downcast_ref::<GameState>().unwrap();
                assert_eq!(state.questions_answered, 2);
            }
            Parameters::Raw(_) => panic!("expected typed parameters"),
        }

        let broken = ContextRegistration::typed::<GameState>("game")
            .with_default_parameters(json!({"questions_answered": "two"}).as_object().unwrap().clone());
        assert!(broken.default_parameters().unwrap().is_err());
    }
}

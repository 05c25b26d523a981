//! Contexts: named, expiring pieces of conversational state.
//!
//! The platform echoes every context it knows about in each request, and
//! expects the complete set back in the response. This module holds the
//! handler-facing [`Context`] (whose parameters may be decoded into a typed
//! value), the process-wide [`ContextRegistry`] and the per-turn
//! [`ContextManager`].

pub mod manager;
pub mod registry;

use std::any::Any;
use std::fmt;
use std::sync::LazyLock;

use regex_lite::Regex;
use serde::Serialize;

use dialogwire_core::schema::to_object;
use dialogwire_core::{JsonObject, SchemaError, webhook};

pub use manager::ContextManager;
pub use registry::{ContextRegistration, ContextRegistry};

/// Lifespan keep-around contexts are reset to before every handler runs.
pub const KEEP_AROUND_LIFESPAN: i32 = 99;

static DISPLAY_NAME: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_\-%]+$").ok());

static FULL_NAME: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"^projects/[^/]+/agent/(environments/[^/]+/users/[^/]+/)?sessions/[^/]+/contexts/[^/]+$",
    )
    .ok()
});

/// Whether `name` is a valid context display name.
pub fn is_valid_display_name(name: &str) -> bool {
    DISPLAY_NAME.as_ref().is_some_and(|re| re.is_match(name))
}

/// Whether `name` is a session-qualified context name.
pub fn is_full_name(name: &str) -> bool {
    FULL_NAME.as_ref().is_some_and(|re| re.is_match(name))
}

/// `<session>/contexts/<display_name>`
pub fn make_full_name(session: &str, display_name: &str) -> String {
    format!("{session}/contexts/{display_name}")
}

/// The last path segment of a context name.
pub fn display_name_of(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

/// A typed context parameter value.
///
/// Implemented for every `Serialize + Clone + Debug` type, so registering a
/// plain struct is enough to work with it instead of a JSON object.
pub trait ContextValue: Any + Send + Sync + fmt::Debug {
    fn to_parameters(&self) -> Result<JsonObject, SchemaError>;
    fn clone_value(&self) -> Box<dyn ContextValue>;
    fn type_name(&self) -> &'static str;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T> ContextValue for T
where
    T: Serialize + Clone + Send + Sync + fmt::Debug + 'static,
{
    fn to_parameters(&self) -> Result<JsonObject, SchemaError> {
        to_object(self)
    }

    fn clone_value(&self) -> Box<dyn ContextValue> {
        Box::new(self.clone())
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Context parameters, either as received or decoded into a registered type.
#[derive(Debug)]
pub enum Parameters {
    Raw(JsonObject),
    Typed(Box<dyn ContextValue>),
}

impl Parameters {
    pub fn typed<T: ContextValue>(value: T) -> Self {
        Parameters::Typed(Box::new(value))
    }

    /// Encode back into the wire representation.
    pub fn to_object(&self) -> Result<JsonObject, SchemaError> {
        match self {
            Parameters::Raw(map) => Ok(map.clone()),
            Parameters::Typed(value) => (**value).to_parameters(),
        }
    }
}

impl Default for Parameters {
    fn default() -> Self {
        Parameters::Raw(JsonObject::new())
    }
}

impl Clone for Parameters {
    fn clone(&self) -> Self {
        match self {
            Parameters::Raw(map) => Parameters::Raw(map.clone()),
            Parameters::Typed(value) => Parameters::Typed((**value).clone_value()),
        }
    }
}

impl From<JsonObject> for Parameters {
    fn from(map: JsonObject) -> Self {
        Parameters::Raw(map)
    }
}

/// A context as handlers see it.
#[derive(Debug, Clone)]
pub struct Context {
    /// Full, session-qualified name
    pub name: String,

    /// `None` leaves the lifespan to the platform default
    pub lifespan_count: Option<i32>,

    pub parameters: Parameters,
}

impl Context {
    pub fn new(
        name: impl Into<String>,
        lifespan_count: Option<i32>,
        parameters: impl Into<Parameters>,
    ) -> Self {
        Self {
            name: name.into(),
            lifespan_count,
            parameters: parameters.into(),
        }
    }

    pub fn display_name(&self) -> &str {
        display_name_of(&self.name)
    }

    /// Raw parameters, `None` when they were decoded into a type.
    pub fn raw(&self) -> Option<&JsonObject> {
        match &self.parameters {
            Parameters::Raw(map) => Some(map),
            Parameters::Typed(_) => None,
        }
    }

    pub fn raw_mut(&mut self) -> Option<&mut JsonObject> {
        match &mut self.parameters {
            Parameters::Raw(map) => Some(map),
            Parameters::Typed(_) => None,
        }
    }

    pub fn typed<T: 'static>(&self) -> Option<&T> {
        match &self.parameters {
            Parameters::Typed(value) => (**value).as_any().downcast_ref(),
            Parameters::Raw(_) => None,
        }
    }

    pub fn typed_mut<T: 'static>(&mut self) -> Option<&mut T> {
        match &mut self.parameters {
            Parameters::Typed(value) => (**value).as_any_mut().downcast_mut(),
            Parameters::Raw(_) => None,
        }
    }

    pub fn from_wire(ctx: webhook::Context) -> Self {
        Self {
            name: ctx.name,
            lifespan_count: ctx.lifespan_count,
            parameters: Parameters::Raw(ctx.parameters),
        }
    }

    pub fn to_wire(&self) -> Result<webhook::Context, SchemaError> {
        Ok(webhook::Context {
            name: self.name.clone(),
            lifespan_count: self.lifespan_count,
            parameters: self.parameters.to_object()?,
        })
    }
}

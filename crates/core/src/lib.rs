//! # dialogwire core
//!
//! Wire types, schema mapping helpers and error definitions shared by every
//! dialogwire crate. Nothing in here knows about HTTP, configuration or
//! handler dispatch: this crate only describes what the dialog platform
//! sends and what it expects back.
//!
//! ## Layout
//!
//! - [`schema`]: the [`JsonType`] contract (deserialize / serialize with
//!   classified errors)
//! - [`webhook`]: webhook request / response envelopes and contexts
//! - [`message`]: rich response messages and the platform enum
//! - [`error`]: the error taxonomy used across the workspace

pub mod error;
pub mod message;
pub mod schema;
pub mod webhook;

// Re-export key types at crate root for ergonomics
pub use error::{
    ContextError, Error, IntegrationError, RegistryError, Result, SchemaError, TemplateError,
};
pub use message::{Card, CardButton, Image, Message, Platform, QuickReplies, Text};
pub use schema::{JsonObject, JsonType};
pub use webhook::{
    Context, EventInput, Intent, OriginalDetectIntentRequest, QueryResult, WebhookRequest,
    WebhookResponse,
};

//! # dialogwire integrations
//!
//! Platform-specific extensions of a webhook turn. Every platform source
//! (`google`, `facebook`, `slack`, ...) gets its own slice of the request
//! payload and of the response payload. The [`IntegrationRegistry`] decides
//! which conversation variant handles which source:
//!
//! - [`GenericIntegrationConversation`]: a JSON object, the default
//! - [`ActionsOnGoogleConversation`]: typed AoG request, rich responses,
//!   system intents and user storage

pub mod actions_on_google;
pub mod conversation;
pub mod generic;
pub mod registry;

// Re-export key types at crate root for ergonomics
pub use actions_on_google::{ActionsOnGoogleConversation, AogSettings};
pub use conversation::{IntegrationConversation, Integrations};
pub use generic::GenericIntegrationConversation;
pub use registry::{IntegrationEntry, IntegrationKind, IntegrationRegistry};

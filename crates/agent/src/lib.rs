//! Webhook dispatch for dialogwire.
//!
//! Every webhook turn goes through the same steps:
//!
//! 1. **Parse** the request document (a malformed one never reaches a handler)
//! 2. **Build the turn state**: contexts via the [`ContextManager`],
//!    platform conversations via the integration registry
//! 3. **Dispatch** to the one handler registered for the intent
//! 4. **Render** the response, with the complete context set and every
//!    platform payload
//!
//! The [`Agent`] owns the process-wide registries. It is built once at
//! startup and then only read, so one instance serves concurrent requests.

pub mod context;
pub mod conversation;
pub mod dispatcher;
pub mod handler;
pub mod templating;
pub mod testing;

pub use context::{
    Context, ContextManager, ContextRegistration, ContextRegistry, ContextValue,
    KEEP_AROUND_LIFESPAN, Parameters,
};
pub use conversation::{Conversation, SESSION_CONTEXT, SessionContext};
pub use dispatcher::Agent;
pub use handler::{HandlerRegistry, IntentHandler};
pub use templating::Templates;
pub use testing::{TestWebhookResponse, WebhookRequestBuilder, build_webhook_request};

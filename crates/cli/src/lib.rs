//! # dialogwire
//!
//! The `dialogwire` binary serves a Dialogflow fulfillment agent over HTTP
//! and offers local tooling around it. This library part holds what the
//! binary and its integration tests share:
//!
//! - [`demo`]: the trivia agent the server runs out of the box
//! - [`simulate`]: webhook requests built from command-line arguments

pub mod demo;
pub mod simulate;

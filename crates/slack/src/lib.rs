//! Slack chat remote for chatwire.
//!
//! Reads messages either from a streaming RTM session (bot token only) or from
//! the Events API webhook (verification token set), sends replies and reactions
//! through the Web API, and serves interactive component callbacks.

pub mod api;
pub mod config;
pub mod events;
pub mod identity;
pub mod interactions;
pub mod outbound;
pub mod reaction;
pub mod remote;
pub mod streaming;
pub mod transport;
pub mod web_api;
pub mod webhook;

#[cfg(test)]
pub(crate) mod testing;

pub use {
    api::{AuthIdentity, MessageRef, SlackApi},
    config::SlackAccountConfig,
    interactions::{InteractionServer, StartOutcome},
    remote::SlackRemote,
    web_api::WebApiClient,
};

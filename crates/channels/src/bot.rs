use std::{collections::HashMap, sync::OnceLock};

use serde::{Deserialize, Serialize};

/// Channel ID → metadata for every conversation the bot can see.
pub type ChannelSet = HashMap<String, ChannelInfo>;

/// Metadata for a single channel the bot is aware of.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub is_member: bool,
}

/// Runtime bot state shared by every reader and sender.
///
/// Identity and channel set are write-once: the identity resolver fills them
/// before any reader starts, everything else only reads.
#[derive(Debug, Default)]
pub struct Bot {
    pub name: String,
    pub events_callback_path: Option<String>,
    pub interactions_callback_path: Option<String>,
    /// Interactive test mode: a human supplies input, so missing credentials are not fatal.
    pub cli: bool,
    pub interactive_components: bool,
    id: OnceLock<String>,
    channels: OnceLock<ChannelSet>,
}

impl Bot {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_events_callback_path(mut self, path: impl Into<String>) -> Self {
        self.events_callback_path = Some(path.into());
        self
    }

    pub fn with_interactions_callback_path(mut self, path: impl Into<String>) -> Self {
        self.interactions_callback_path = Some(path.into());
        self
    }

    pub fn with_cli(mut self, cli: bool) -> Self {
        self.cli = cli;
        self
    }

    pub fn with_interactive_components(mut self, enabled: bool) -> Self {
        self.interactive_components = enabled;
        self
    }

    /// The bot's own platform user ID, once resolved.
    pub fn id(&self) -> Option<&str> {
        self.id.get().map(String::as_str)
    }

    /// Record the bot's platform user ID. Returns `false` if it was already set.
    pub fn set_id(&self, id: impl Into<String>) -> bool {
        self.id.set(id.into()).is_ok()
    }

    /// Channels resolved at startup, if the resolver has run.
    pub fn channels(&self) -> Option<&ChannelSet> {
        self.channels.get()
    }

    /// Record the channel set. Returns `false` if it was already set.
    pub fn set_channels(&self, channels: ChannelSet) -> bool {
        self.channels.set(channels).is_ok()
    }

    /// Whether `user_id` is the bot itself.
    pub fn is_self(&self, user_id: &str) -> bool {
        self.id().is_some_and(|id| id == user_id)
    }
}

//! Platform API boundary.
//!
//! Everything the adapter needs from Slack goes through [`SlackApi`]; the
//! HTTP implementation lives in [`crate::web_api`].

use {
    async_trait::async_trait,
    chatwire_channels::{ChannelInfo, Result},
    chatwire_common::types::Message,
    futures::stream::BoxStream,
};

/// Identity returned by `auth.test`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthIdentity {
    pub user_id: String,
    pub user: Option<String>,
}

/// Reference to a previously posted message, the target of a reaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRef {
    pub channel: String,
    pub timestamp: String,
}

impl MessageRef {
    pub fn new(channel: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            timestamp: timestamp.into(),
        }
    }

    pub fn to_message(message: &Message) -> Self {
        Self::new(message.channel_id.clone(), message.timestamp.clone())
    }
}

/// Raw JSON events pushed over a streaming session.
pub type EventStream = BoxStream<'static, Result<serde_json::Value>>;

/// Slack operations used by the adapter.
#[async_trait]
pub trait SlackApi: Send + Sync {
    async fn auth_test(&self) -> Result<AuthIdentity>;

    async fn list_channels(&self) -> Result<Vec<ChannelInfo>>;

    async fn add_reaction(&self, name: &str, item: &MessageRef) -> Result<()>;

    async fn remove_reaction(&self, name: &str, item: &MessageRef) -> Result<()>;

    /// Post `text` to `channel`, in the thread rooted at `thread_ts` if given.
    async fn post_message(&self, channel: &str, text: &str, thread_ts: Option<&str>)
    -> Result<()>;

    /// Open a persistent session. The stream ends when the session closes.
    async fn open_streaming_session(&self) -> Result<EventStream>;
}

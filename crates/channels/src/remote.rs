use std::sync::Arc;

use {
    async_trait::async_trait,
    chatwire_common::types::{Message, Rule},
    tokio::sync::mpsc,
};

use crate::{Result, bot::Bot};

/// Sending half of the unified inbound message stream.
pub type InboundSender = mpsc::UnboundedSender<Message>;

/// Receiving half of the unified inbound message stream.
pub type InboundReceiver = mpsc::UnboundedReceiver<Message>;

/// Create the unified stream every reader pushes into.
pub fn inbound_channel() -> (InboundSender, InboundReceiver) {
    mpsc::unbounded_channel()
}

/// Rule evaluation hook supplied by the host. The remote calls it when an
/// interactive component callback arrives.
#[async_trait]
pub trait RuleProcessor: Send + Sync {
    async fn process(&self, rule: &Rule, message: Message, bot: &Bot);
}

/// Core chat remote trait. Each chat platform implements this.
#[async_trait]
pub trait ChatRemote: Send + Sync {
    /// Backend identifier (e.g. "slack"), matched against `chat_application`.
    fn id(&self) -> &str;

    /// Human-readable backend name.
    fn name(&self) -> &str;

    /// Authenticate, record the bot's own ID and channel set, and return the ID.
    async fn resolve_identity(&self, bot: &Bot) -> Result<String>;

    /// Resolve identity, select a transport and read messages into `inbound`
    /// until the transport ends.
    ///
    /// Returns an error only for conditions that must stop the process.
    async fn read_inbound(&self, inbound: InboundSender, bot: Arc<Bot>) -> Result<()>;

    /// Send a message. Delivery failures are logged, never returned.
    async fn send_outbound(&self, message: Message, bot: &Bot);

    /// Apply the rule's reaction changes to `message`.
    async fn mutate_reaction(&self, message: &Message, rule: &Rule, bot: &Bot);

    /// Make sure the interactive component listener is running for `rule`.
    async fn serve_interactions(&self, message: &Message, rule: &Rule, bot: Arc<Bot>);
}

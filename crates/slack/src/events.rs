//! Decoding of Slack payloads into [`Message`]s.

use {
    chatwire_channels::{Bot, InboundSender, Result},
    chatwire_common::types::{Message, MessageKind},
    serde::Deserialize,
    tracing::{debug, warn},
};

/// Message subtypes that still carry a user-visible message.
const FORWARDED_SUBTYPES: &[&str] = &["bot_message", "thread_broadcast", "file_share"];

/// A `message` event as delivered by RTM or inside an Events API callback.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageEvent {
    pub channel: Option<String>,
    pub channel_type: Option<String>,
    pub user: Option<String>,
    pub bot_id: Option<String>,
    pub text: Option<String>,
    pub ts: Option<String>,
    pub thread_ts: Option<String>,
    pub subtype: Option<String>,
}

/// Outer envelope of an Events API push.
#[derive(Debug, Clone, Deserialize)]
pub struct EventsApiEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub token: String,
    pub challenge: Option<String>,
    pub event: Option<serde_json::Value>,
}

/// Decode the body of an Events API request.
pub fn decode_webhook_event(body: &[u8]) -> Result<EventsApiEnvelope> {
    Ok(serde_json::from_slice(body)?)
}

/// Map a channel to a message kind.
///
/// `channel_type` wins when Slack provides it; otherwise the channel ID prefix
/// decides (`D` direct, `C` public, `G` private).
pub fn kind_for(channel_id: &str, channel_type: Option<&str>) -> chatwire_common::Result<MessageKind> {
    match channel_type {
        Some("im") => Ok(MessageKind::Direct),
        Some("channel") => Ok(MessageKind::Channel),
        Some("group" | "mpim") => Ok(MessageKind::PrivateChannel),
        Some(other) => Err(chatwire_common::Error::unknown_kind(other)),
        None => match channel_id.chars().next() {
            Some('D') => Ok(MessageKind::Direct),
            Some('C') => Ok(MessageKind::Channel),
            Some('G') => Ok(MessageKind::PrivateChannel),
            _ => Err(chatwire_common::Error::unknown_kind(channel_id)),
        },
    }
}

/// Decode a single event into at most one message.
///
/// Non-message events and message edits/deletions yield `Ok(None)`.
pub fn decode_event(event: &serde_json::Value, bot: &Bot) -> Result<Option<Message>> {
    if event.get("type").and_then(|t| t.as_str()) != Some("message") {
        return Ok(None);
    }

    let event: MessageEvent = serde_json::from_value(event.clone())?;
    if let Some(subtype) = event.subtype.as_deref()
        && !FORWARDED_SUBTYPES.contains(&subtype)
    {
        debug!(bot = %bot.name, subtype, "ignoring message subtype");
        return Ok(None);
    }

    let (Some(channel), Some(ts)) = (event.channel, event.ts) else {
        debug!(bot = %bot.name, "ignoring message without channel or timestamp");
        return Ok(None);
    };

    let kind = kind_for(&channel, event.channel_type.as_deref())?;
    let user_id = event.user.or(event.bot_id);

    let mut message = Message::new(kind, channel, ts);
    message.from_self = user_id.as_deref().is_some_and(|u| bot.is_self(u));
    message.user_id = user_id;
    message.thread_timestamp = event.thread_ts;
    message.input = event.text.unwrap_or_default();
    Ok(Some(message))
}

/// Decode `event` and push the result onto the unified stream.
///
/// Returns `false` once the stream has no consumer left.
pub(crate) fn forward_event(event: &serde_json::Value, inbound: &InboundSender, bot: &Bot) -> bool {
    match decode_event(event, bot) {
        Ok(Some(message)) => {
            debug!(
                bot = %bot.name,
                message_id = %message.id,
                channel_id = %message.channel_id,
                kind = %message.kind,
                "forwarding inbound message"
            );
            inbound.send(message).is_ok()
        },
        Ok(None) => true,
        Err(e) => {
            warn!(bot = %bot.name, error = %e, "dropping undecodable event");
            true
        },
    }
}

#[derive(Debug, Clone, Deserialize)]
struct IdField {
    id: String,
}

#[derive(Debug, Clone, Deserialize)]
struct InteractionContainer {
    message_ts: Option<String>,
    channel_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InteractionAction {
    pub action_id: Option<String>,
    pub name: Option<String>,
    pub value: Option<String>,
}

/// Payload of an interactive component callback (button click, menu choice).
#[derive(Debug, Clone, Deserialize)]
pub struct InteractionPayload {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub token: String,
    channel: Option<IdField>,
    user: Option<IdField>,
    message_ts: Option<String>,
    container: Option<InteractionContainer>,
    #[serde(default)]
    pub actions: Vec<InteractionAction>,
}

impl InteractionPayload {
    pub fn parse(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn channel_id(&self) -> Option<&str> {
        self.channel
            .as_ref()
            .map(|c| c.id.as_str())
            .or_else(|| self.container.as_ref()?.channel_id.as_deref())
    }

    pub fn message_ts(&self) -> Option<&str> {
        self.message_ts
            .as_deref()
            .or_else(|| self.container.as_ref()?.message_ts.as_deref())
    }

    /// Turn the callback into a message whose input is the chosen action value.
    pub fn into_message(self, bot: &Bot) -> Result<Message> {
        let channel_id = self.channel_id().unwrap_or_default().to_string();
        let kind = kind_for(&channel_id, None)?;
        let ts = self.message_ts().unwrap_or_default().to_string();

        let input = self
            .actions
            .first()
            .and_then(|a| a.value.clone().or_else(|| a.action_id.clone()).or_else(|| a.name.clone()))
            .unwrap_or_default();
        let user_id = self.user.map(|u| u.id);

        let mut message = Message::new(kind, channel_id, ts);
        message.from_self = user_id.as_deref().is_some_and(|u| bot.is_self(u));
        message.user_id = user_id;
        message.input = input;
        Ok(message)
    }
}

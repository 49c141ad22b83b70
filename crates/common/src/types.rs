use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

/// Current adapter clock in unix seconds.
pub fn message_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Where a message was posted.
///
/// The set is closed: anything else is rejected when a reader decodes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// One-to-one conversation with the bot.
    Direct,
    /// Public channel.
    Channel,
    /// Private channel or multi-party direct conversation.
    PrivateChannel,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Channel => "channel",
            Self::PrivateChannel => "private_channel",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "direct" => Ok(Self::Direct),
            "channel" => Ok(Self::Channel),
            "private_channel" => Ok(Self::PrivateChannel),
            other => Err(Error::unknown_kind(other)),
        }
    }
}

/// A message flowing through the unified stream, inbound or outbound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub kind: MessageKind,
    pub channel_id: String,
    /// Platform-native timestamp, used as an opaque reference to the message.
    pub timestamp: String,
    /// Parent thread timestamp when the message belongs to a thread.
    pub thread_timestamp: Option<String>,
    pub user_id: Option<String>,
    /// True when the sender is the bot itself. Readers only mark; consumers filter.
    pub from_self: bool,
    pub input: String,
    pub output: String,
    pub start_time: i64,
    pub end_time: Option<i64>,
}

impl Message {
    /// Create a message with a fresh ID and the start time set to now.
    pub fn new(
        kind: MessageKind,
        channel_id: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            channel_id: channel_id.into(),
            timestamp: timestamp.into(),
            thread_timestamp: None,
            user_id: None,
            from_self: false,
            input: String::new(),
            output: String::new(),
            start_time: message_timestamp(),
            end_time: None,
        }
    }
}

/// The slice of a matched rule this layer acts on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rule {
    pub name: String,
    /// Reaction to add to the triggering message.
    pub reaction: Option<String>,
    /// Reaction to remove from the triggering message.
    pub remove_reaction: Option<String>,
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case("direct", MessageKind::Direct)]
    #[case("channel", MessageKind::Channel)]
    #[case("private_channel", MessageKind::PrivateChannel)]
    fn parses_known_kinds(#[case] raw: &str, #[case] expected: MessageKind) {
        assert_eq!(raw.parse::<MessageKind>().unwrap(), expected);
        assert_eq!(expected.to_string(), raw);
    }

    #[test]
    fn rejects_unknown_kind() {
        let err = "broadcast".parse::<MessageKind>().unwrap_err();
        assert!(matches!(err, Error::UnknownKind { ref kind } if kind == "broadcast"));
    }

    #[test]
    fn new_message_has_unique_id_and_start_time() {
        let a = Message::new(MessageKind::Channel, "C1", "1.0");
        let b = Message::new(MessageKind::Channel, "C1", "1.0");
        assert_ne!(a.id, b.id);
        assert!(a.start_time > 0);
        assert!(a.end_time.is_none());
        assert!(!a.from_self);
    }

    #[test]
    fn rule_deserializes_with_missing_fields() {
        let rule: Rule = serde_json::from_str(r#"{"name": "hello", "reaction": "wave"}"#).unwrap();
        assert_eq!(rule.name, "hello");
        assert_eq!(rule.reaction.as_deref(), Some("wave"));
        assert!(rule.remove_reaction.is_none());
    }
}

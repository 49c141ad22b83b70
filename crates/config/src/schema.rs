//! Config schema types.
use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatwireConfig {
    pub bot: BotSettings,
    /// Raw Slack account section, parsed by the Slack remote itself.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slack: Option<serde_json::Value>,
}

/// Bot-wide settings shared by every chat remote.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotSettings {
    pub name: String,
    /// Which registered remote to run (e.g. "slack").
    pub chat_application: String,
    /// Interactive test mode. Missing chat credentials only warn.
    pub cli: bool,
    pub interactive_components: bool,
    /// HTTP path for pushed events, e.g. `/slack_events/v1/mybot-v1_events`.
    pub events_callback_path: Option<String>,
    /// HTTP path for interactive component callbacks.
    pub interactions_callback_path: Option<String>,
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            name: "chatwire".into(),
            chat_application: "slack".into(),
            cli: false,
            interactive_components: false,
            events_callback_path: None,
            interactions_callback_path: None,
        }
    }
}

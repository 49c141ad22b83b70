//! Choice between the streaming session and the events webhook.

use chatwire_channels::{Bot, Error, is_valid_path};

use crate::config::SlackAccountConfig;

/// Ingestion transport selected for an adapter run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportMode {
    /// Persistent RTM session authenticated by the bot token.
    Streaming,
    /// Events API pushes to `path`, verified by the verification token.
    Webhook { path: String },
}

/// Outcome of [`select`].
#[derive(Debug)]
pub enum Selection {
    Selected(TransportMode),
    /// Webhook was chosen but its preconditions failed. Only this reader is off.
    Aborted(Error),
    /// No credential configured at all. Fatal unless the bot runs in CLI mode.
    NoneSelected { fatal: bool },
}

/// Select exactly one transport. The verification token takes precedence
/// over the bare bot token.
pub fn select(config: &SlackAccountConfig, bot: &Bot) -> Selection {
    if config.verification_token().is_some() {
        let path = bot.events_callback_path.as_deref().unwrap_or_default();
        if path.is_empty() {
            return Selection::Aborted(Error::configuration(
                "events_callback_path is required when a verification token is set \
                 (e.g. \"/slack_events/v1/mybot-v1_events\")",
            ));
        }
        if !is_valid_path(path) {
            return Selection::Aborted(Error::configuration(format!(
                "invalid events_callback_path {path:?} (e.g. \"/slack_events/v1/mybot-v1_events\")"
            )));
        }
        return Selection::Selected(TransportMode::Webhook {
            path: path.to_string(),
        });
    }

    if config.token().is_some() {
        return Selection::Selected(TransportMode::Streaming);
    }

    Selection::NoneSelected { fatal: !bot.cli }
}

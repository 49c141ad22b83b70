use std::sync::Arc;

use {
    chatwire_channels::Bot,
    chatwire_common::types::{Message, MessageKind, message_timestamp},
    tracing::{debug, error},
};

use crate::api::SlackApi;

/// Hard limit Slack puts on message text.
pub const MAX_MESSAGE_LEN: usize = 4000;

const ELLIPSIS: &str = "...";

/// Kept prefix length when truncating, leaving room for [`ELLIPSIS`].
const TRUNCATED_LEN: usize = MAX_MESSAGE_LEN - ELLIPSIS.len();

/// Truncate `text` to [`MAX_MESSAGE_LEN`] characters, ending in `...`.
///
/// Length is counted in Unicode scalar values, so a cut never splits a
/// character. Returns whether the text was shortened.
pub fn truncate_output(text: &mut String) -> bool {
    let Some((cut, _)) = text.char_indices().nth(TRUNCATED_LEN) else {
        return false;
    };
    if text[cut..].chars().count() <= ELLIPSIS.len() {
        return false;
    }
    text.truncate(cut);
    text.push_str(ELLIPSIS);
    true
}

/// Outbound sender for Slack.
pub struct SlackOutbound {
    pub(crate) api: Arc<dyn SlackApi>,
}

impl SlackOutbound {
    pub fn new(api: Arc<dyn SlackApi>) -> Self {
        Self { api }
    }

    /// Truncate, end-stamp and post `message`. Returns the message as sent.
    ///
    /// Platform errors are logged and swallowed.
    pub async fn send(&self, mut message: Message, bot: &Bot) -> Message {
        debug!(bot = %bot.name, message_id = %message.id, "sending message");

        if truncate_output(&mut message.output) {
            debug!(
                bot = %bot.name,
                message_id = %message.id,
                "message output truncated to {MAX_MESSAGE_LEN} characters"
            );
        }
        message.end_time = Some(message_timestamp());

        match message.kind {
            MessageKind::Direct | MessageKind::Channel | MessageKind::PrivateChannel => {
                if let Err(e) = self
                    .api
                    .post_message(
                        &message.channel_id,
                        &message.output,
                        message.thread_timestamp.as_deref(),
                    )
                    .await
                {
                    error!(
                        bot = %bot.name,
                        message_id = %message.id,
                        channel_id = %message.channel_id,
                        error = %e,
                        "failed to send slack message"
                    );
                }
            },
        }
        message
    }
}

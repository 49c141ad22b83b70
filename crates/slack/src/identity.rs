use {
    chatwire_channels::{Bot, ChannelSet, Error, Result},
    tracing::{debug, info, warn},
};

use crate::api::{AuthIdentity, SlackApi};

/// Authenticate and record the bot's own ID and channel memberships.
///
/// Any failure of `auth.test` is an [`Error::Auth`]; the caller decides
/// whether that is fatal. A failed channel listing only leaves the channel
/// set empty.
pub async fn resolve(api: &dyn SlackApi, bot: &Bot) -> Result<AuthIdentity> {
    let identity = api.auth_test().await.map_err(Error::auth)?;

    let channels: ChannelSet = match api.list_channels().await {
        Ok(list) => list.into_iter().map(|c| (c.id.clone(), c)).collect(),
        Err(e) => {
            warn!(bot = %bot.name, error = %e, "could not list slack channels");
            ChannelSet::new()
        },
    };
    let channel_count = channels.len();
    if !bot.set_channels(channels) {
        debug!(bot = %bot.name, "channel set already resolved");
    }
    if !bot.set_id(identity.user_id.clone()) {
        debug!(bot = %bot.name, "bot identity already resolved");
    }

    info!(
        bot = %bot.name,
        bot_user_id = %identity.user_id,
        bot_user = ?identity.user,
        channels = channel_count,
        "slack bot authenticated"
    );
    Ok(identity)
}

use {
    chatwire_channels::Bot,
    chatwire_common::types::{Message, Rule},
    tracing::{debug, error},
};

use crate::api::{MessageRef, SlackApi};

/// Apply a rule's reactions to `message`: remove first, then add.
///
/// Each call is attempted independently; failures are only logged.
pub async fn mutate(api: &dyn SlackApi, message: &Message, rule: &Rule, bot: &Bot) {
    let item = MessageRef::to_message(message);

    if let Some(name) = rule.remove_reaction.as_deref().filter(|n| !n.is_empty()) {
        match api.remove_reaction(name, &item).await {
            Ok(()) => debug!(bot = %bot.name, rule = %rule.name, reaction = name, "removed reaction"),
            Err(e) => error!(
                bot = %bot.name,
                rule = %rule.name,
                reaction = name,
                error = %e,
                "could not remove reaction"
            ),
        }
    }

    if let Some(name) = rule.reaction.as_deref().filter(|n| !n.is_empty()) {
        match api.add_reaction(name, &item).await {
            Ok(()) => debug!(bot = %bot.name, rule = %rule.name, reaction = name, "added reaction"),
            Err(e) => error!(
                bot = %bot.name,
                rule = %rule.name,
                reaction = name,
                error = %e,
                "could not add reaction"
            ),
        }
    }
}

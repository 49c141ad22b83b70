use {
    async_trait::async_trait,
    chatwire_channels::{Bot, RuleProcessor},
    chatwire_common::types::{Message, Rule},
    tracing::info,
};

/// Rule processor shipped with the binary: it only logs what it receives.
pub struct LoggingRuleProcessor;

#[async_trait]
impl RuleProcessor for LoggingRuleProcessor {
    async fn process(&self, rule: &Rule, message: Message, bot: &Bot) {
        info!(
            bot = %bot.name,
            rule = %rule.name,
            message_id = %message.id,
            channel_id = %message.channel_id,
            kind = %message.kind,
            user_id = message.user_id.as_deref().unwrap_or("-"),
            input = %message.input,
            "message received"
        );
    }
}

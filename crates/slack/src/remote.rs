use std::sync::Arc;

use {
    async_trait::async_trait,
    chatwire_channels::{Bot, ChatRemote, Error, InboundSender, Result, RuleProcessor},
    chatwire_common::types::{Message, Rule},
    tracing::{error, info, warn},
};

use crate::{
    api::SlackApi,
    config::SlackAccountConfig,
    identity,
    interactions::{InteractionServer, StartOutcome},
    outbound::SlackOutbound,
    reaction,
    streaming::run_streaming_reader,
    transport::{self, Selection, TransportMode},
    web_api::WebApiClient,
    webhook::{events_router, serve_events},
};

/// Slack implementation of [`ChatRemote`].
pub struct SlackRemote {
    api: Arc<dyn SlackApi>,
    config: SlackAccountConfig,
    outbound: SlackOutbound,
    interactions: InteractionServer,
}

impl SlackRemote {
    /// Build a remote talking to the Slack Web API.
    pub fn new(config: SlackAccountConfig, processor: Arc<dyn RuleProcessor>) -> Result<Self> {
        let api = Arc::new(WebApiClient::new(&config)?);
        Ok(Self::with_api(config, api, processor))
    }

    /// Build a remote from the raw `[slack]` config table.
    pub fn from_value(value: serde_json::Value, processor: Arc<dyn RuleProcessor>) -> Result<Self> {
        let config: SlackAccountConfig = serde_json::from_value(value)?;
        Self::new(config, processor)
    }

    pub fn with_api(
        config: SlackAccountConfig,
        api: Arc<dyn SlackApi>,
        processor: Arc<dyn RuleProcessor>,
    ) -> Self {
        let interactions = InteractionServer::new(
            config.interactions_listen.clone(),
            config.verification_token.clone(),
            processor,
        );
        Self {
            outbound: SlackOutbound::new(Arc::clone(&api)),
            api,
            config,
            interactions,
        }
    }

    pub fn config(&self) -> &SlackAccountConfig {
        &self.config
    }

    pub fn interactions(&self) -> &InteractionServer {
        &self.interactions
    }

    async fn run_transport(
        &self,
        mode: TransportMode,
        inbound: InboundSender,
        bot: Arc<Bot>,
    ) -> Result<()> {
        match mode {
            TransportMode::Streaming => {
                info!(bot = %bot.name, "reading slack messages over a streaming session");
                let reader = run_streaming_reader(Arc::clone(&self.api), inbound, Arc::clone(&bot));
                if let Err(e) = reader.await {
                    error!(bot = %bot.name, error = %e, "slack streaming reader stopped");
                }
            },
            TransportMode::Webhook { path } => {
                let Some(token) = self.config.verification_token.clone() else {
                    error!(bot = %bot.name, "webhook selected without a verification token");
                    return Ok(());
                };
                info!(bot = %bot.name, path = %path, "reading slack messages from the events webhook");
                let router = events_router(&path, token, inbound, Arc::clone(&bot));
                if let Err(e) = serve_events(&self.config.events_listen, router, &bot).await {
                    error!(bot = %bot.name, error = %e, "slack events webhook stopped");
                }
            },
        }
        Ok(())
    }
}

#[async_trait]
impl ChatRemote for SlackRemote {
    fn id(&self) -> &str {
        "slack"
    }

    fn name(&self) -> &str {
        "Slack"
    }

    async fn resolve_identity(&self, bot: &Bot) -> Result<String> {
        identity::resolve(self.api.as_ref(), bot)
            .await
            .map(|identity| identity.user_id)
    }

    async fn read_inbound(&self, inbound: InboundSender, bot: Arc<Bot>) -> Result<()> {
        let selection = transport::select(&self.config, &bot);
        if let Selection::NoneSelected { fatal } = selection {
            if fatal {
                error!(bot = %bot.name, "no slack token or verification token configured");
                return Err(Error::no_transport("set slack.token or slack.verification_token"));
            }
            warn!(bot = %bot.name, "no slack token configured, not reading messages");
            return Ok(());
        }

        if let Err(e) = self.resolve_identity(&bot).await {
            if bot.cli {
                warn!(
                    bot = %bot.name,
                    error = %e,
                    "slack authentication failed, continuing in cli mode"
                );
                return Ok(());
            }
            error!(bot = %bot.name, error = %e, "slack authentication failed");
            return Err(e);
        }

        match selection {
            Selection::Selected(mode) => self.run_transport(mode, inbound, bot).await,
            Selection::Aborted(e) => {
                error!(bot = %bot.name, error = %e, "slack reader not started");
                Ok(())
            },
            Selection::NoneSelected { .. } => Ok(()),
        }
    }

    async fn send_outbound(&self, message: Message, bot: &Bot) {
        self.outbound.send(message, bot).await;
    }

    async fn mutate_reaction(&self, message: &Message, rule: &Rule, bot: &Bot) {
        reaction::mutate(self.api.as_ref(), message, rule, bot).await;
    }

    async fn serve_interactions(&self, message: &Message, rule: &Rule, bot: Arc<Bot>) {
        match self.interactions.start_once(rule, bot) {
            StartOutcome::Started(_) => {
                info!(rule = %rule.name, message_id = %message.id, "interaction server starting");
            },
            StartOutcome::AlreadyStarted => {},
            StartOutcome::Aborted(e) => {
                error!(rule = %rule.name, error = %e, "interaction server not started");
            },
        }
    }
}

//! Web API client.
//!
//! Regular Web API calls go through a slack-morphism session. slack-morphism
//! has no RTM support, so `rtm.connect` and the websocket it hands out are
//! driven directly with reqwest and tokio-tungstenite.

use std::sync::Arc;

use {
    async_trait::async_trait,
    chatwire_channels::{ChannelInfo, Error, Result},
    futures::StreamExt,
    secrecy::{ExposeSecret, Secret},
    serde::Deserialize,
    slack_morphism::{errors::SlackClientError, prelude::*},
    tokio_tungstenite::tungstenite,
    tracing::{debug, warn},
};

use crate::{
    api::{AuthIdentity, EventStream, MessageRef, SlackApi},
    config::SlackAccountConfig,
};

/// Upper bound on `conversations.list` pages fetched at startup.
const MAX_CHANNEL_PAGES: usize = 50;

const CHANNEL_PAGE_SIZE: u16 = 200;

/// Slack Web API client authenticated with the bot token.
#[derive(Clone)]
pub struct WebApiClient {
    client: Arc<SlackClient<SlackClientHyperHttpsConnector>>,
    token: SlackApiToken,
    http: reqwest::Client,
    api_base: String,
    bot_token: Secret<String>,
}

impl std::fmt::Debug for WebApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebApiClient")
            .field("api_base", &self.api_base)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

#[derive(Deserialize)]
struct RtmConnectResponse {
    ok: bool,
    error: Option<String>,
    url: Option<String>,
}

/// Map a slack-morphism failure onto the remote error taxonomy.
fn api_error(method: &str, err: SlackClientError) -> Error {
    match err {
        SlackClientError::ApiError(api) => {
            warn!(method, error = %api.code, "slack api call rejected");
            Error::platform(method, api.code)
        },
        other => Error::transport(method, other),
    }
}

fn channel_info(channel: SlackChannelInfo) -> ChannelInfo {
    ChannelInfo {
        id: channel.id.0,
        name: channel.name.unwrap_or_default(),
        is_private: channel.flags.is_private.unwrap_or_default(),
        is_member: channel.flags.is_member.unwrap_or_default(),
    }
}

impl WebApiClient {
    pub fn new(config: &SlackAccountConfig) -> Result<Self> {
        Self::with_base(config.api_base.clone(), config.token.clone())
    }

    /// Build a client whose `rtm.connect` calls go to `api_base`.
    pub fn with_base(api_base: impl Into<String>, token: Secret<String>) -> Result<Self> {
        let _ = rustls::crypto::ring::default_provider().install_default();

        let connector = SlackClientHyperConnector::new()
            .map_err(|e| Error::transport("build slack http connector", e))?;
        let http = reqwest::Client::builder()
            .user_agent(concat!("chatwire/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::transport("build http client", e))?;

        Ok(Self {
            client: Arc::new(SlackClient::new(connector)),
            token: SlackApiToken::new(SlackApiTokenValue(token.expose_secret().clone())),
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            bot_token: token,
        })
    }

    fn session(&self) -> SlackClientSession<'_, SlackClientHyperHttpsConnector> {
        self.client.open_session(&self.token)
    }

    /// Ask for a websocket URL for a new RTM session.
    async fn rtm_connect(&self) -> Result<String> {
        const METHOD: &str = "rtm.connect";
        debug!(method = METHOD, "slack api call");

        let resp: RtmConnectResponse = self
            .http
            .post(format!("{}/{METHOD}", self.api_base))
            .bearer_auth(self.bot_token.expose_secret())
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| Error::transport(METHOD, e))?
            .json()
            .await
            .map_err(|e| Error::transport(METHOD, e))?;

        match resp {
            RtmConnectResponse {
                ok: true,
                url: Some(url),
                ..
            } => Ok(url),
            RtmConnectResponse { error, .. } => {
                let error = error.unwrap_or_else(|| "unknown_error".into());
                warn!(method = METHOD, error = %error, "slack api call rejected");
                Err(Error::platform(METHOD, error))
            },
        }
    }
}

#[async_trait]
impl SlackApi for WebApiClient {
    async fn auth_test(&self) -> Result<AuthIdentity> {
        let resp = self
            .session()
            .auth_test()
            .await
            .map_err(|e| api_error("auth.test", e))?;
        Ok(AuthIdentity {
            user_id: resp.user_id.0,
            user: resp.user,
        })
    }

    async fn list_channels(&self) -> Result<Vec<ChannelInfo>> {
        let session = self.session();
        let mut channels = Vec::new();
        let mut cursor: Option<SlackCursorId> = None;

        for _ in 0..MAX_CHANNEL_PAGES {
            let request = SlackApiConversationsListRequest::new()
                .with_exclude_archived(true)
                .with_types(vec![
                    SlackConversationType::Public,
                    SlackConversationType::Private,
                ])
                .with_limit(CHANNEL_PAGE_SIZE)
                .opt_cursor(cursor.take());
            let page = session
                .conversations_list(&request)
                .await
                .map_err(|e| api_error("conversations.list", e))?;
            channels.extend(page.channels.into_iter().map(channel_info));

            cursor = page
                .response_metadata
                .and_then(|m| m.next_cursor)
                .filter(|c| !c.0.is_empty());
            if cursor.is_none() {
                return Ok(channels);
            }
        }

        warn!(
            pages = MAX_CHANNEL_PAGES,
            count = channels.len(),
            "channel listing stopped at page limit"
        );
        Ok(channels)
    }

    async fn add_reaction(&self, name: &str, item: &MessageRef) -> Result<()> {
        let request = SlackApiReactionsAddRequest::new(
            SlackChannelId(item.channel.clone()),
            SlackReactionName(name.to_string()),
            SlackTs(item.timestamp.clone()),
        );
        self.session()
            .reactions_add(&request)
            .await
            .map_err(|e| api_error("reactions.add", e))?;
        Ok(())
    }

    async fn remove_reaction(&self, name: &str, item: &MessageRef) -> Result<()> {
        let request = SlackApiReactionsRemoveRequest::new(SlackReactionName(name.to_string()))
            .with_channel(SlackChannelId(item.channel.clone()))
            .with_timestamp(SlackTs(item.timestamp.clone()));
        self.session()
            .reactions_remove(&request)
            .await
            .map_err(|e| api_error("reactions.remove", e))?;
        Ok(())
    }

    async fn post_message(
        &self,
        channel: &str,
        text: &str,
        thread_ts: Option<&str>,
    ) -> Result<()> {
        let request = SlackApiChatPostMessageRequest::new(
            SlackChannelId(channel.to_string()),
            SlackMessageContent::new().with_text(text.to_string()),
        )
        .opt_thread_ts(thread_ts.map(|ts| SlackTs(ts.to_string())));
        self.session()
            .chat_post_message(&request)
            .await
            .map_err(|e| api_error("chat.postMessage", e))?;
        Ok(())
    }

    async fn open_streaming_session(&self) -> Result<EventStream> {
        let url = self.rtm_connect().await?;
        let (socket, _) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|e| Error::transport("rtm websocket connect", e))?;

        let events = socket.filter_map(|frame| async move {
            match frame {
                Ok(tungstenite::Message::Text(text)) => {
                    Some(serde_json::from_str(text.as_str()).map_err(Error::from))
                },
                Ok(_) => None,
                Err(e) => Some(Err(Error::transport("rtm websocket read", e))),
            }
        });
        Ok(events.boxed())
    }
}

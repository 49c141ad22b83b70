use std::sync::Mutex;

use {
    async_trait::async_trait,
    chatwire_channels::{ChannelInfo, Error, Result},
    futures::StreamExt,
};

use crate::api::{AuthIdentity, EventStream, MessageRef, SlackApi};

/// A recorded platform call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    AuthTest,
    ListChannels,
    AddReaction(String, MessageRef),
    RemoveReaction(String, MessageRef),
    PostMessage {
        channel: String,
        text: String,
        thread_ts: Option<String>,
    },
    OpenStream,
}

/// In-memory `SlackApi` that records calls and can be told to fail.
#[derive(Default)]
pub struct FakeApi {
    pub calls: Mutex<Vec<Call>>,
    pub fail_auth: bool,
    pub fail_list: bool,
    pub fail_post: bool,
    pub fail_add: bool,
    pub fail_remove: bool,
    pub channels: Vec<ChannelInfo>,
    pub events: Mutex<Vec<Result<serde_json::Value>>>,
}

impl FakeApi {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl SlackApi for FakeApi {
    async fn auth_test(&self) -> Result<AuthIdentity> {
        self.record(Call::AuthTest);
        if self.fail_auth {
            return Err(Error::platform("auth.test", "invalid_auth"));
        }
        Ok(AuthIdentity {
            user_id: "UBOT".into(),
            user: Some("testbot".into()),
        })
    }

    async fn list_channels(&self) -> Result<Vec<ChannelInfo>> {
        self.record(Call::ListChannels);
        if self.fail_list {
            return Err(Error::platform("conversations.list", "ratelimited"));
        }
        Ok(self.channels.clone())
    }

    async fn add_reaction(&self, name: &str, item: &MessageRef) -> Result<()> {
        self.record(Call::AddReaction(name.into(), item.clone()));
        if self.fail_add {
            return Err(Error::platform("reactions.add", "already_reacted"));
        }
        Ok(())
    }

    async fn remove_reaction(&self, name: &str, item: &MessageRef) -> Result<()> {
        self.record(Call::RemoveReaction(name.into(), item.clone()));
        if self.fail_remove {
            return Err(Error::platform("reactions.remove", "no_reaction"));
        }
        Ok(())
    }

    async fn post_message(
        &self,
        channel: &str,
        text: &str,
        thread_ts: Option<&str>,
    ) -> Result<()> {
        self.record(Call::PostMessage {
            channel: channel.into(),
            text: text.into(),
            thread_ts: thread_ts.map(str::to_string),
        });
        if self.fail_post {
            return Err(Error::platform("chat.postMessage", "channel_not_found"));
        }
        Ok(())
    }

    async fn open_streaming_session(&self) -> Result<EventStream> {
        self.record(Call::OpenStream);
        let events: Vec<_> = std::mem::take(&mut *self.events.lock().unwrap());
        Ok(futures::stream::iter(events).boxed())
    }
}

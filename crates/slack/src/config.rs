use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Configuration for a Slack bot account.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SlackAccountConfig {
    /// Bot token (`xoxb-...`). Alone, it selects the streaming transport.
    #[serde(serialize_with = "serialize_secret")]
    pub token: Secret<String>,

    /// Verification token shared with Slack. When set, events arrive by
    /// webhook and interactive components can be served.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_option_secret"
    )]
    pub verification_token: Option<Secret<String>>,

    /// Web API base URL for `rtm.connect`.
    pub api_base: String,

    /// Listen address for the events webhook.
    pub events_listen: String,

    /// Listen address for the interactive components server.
    pub interactions_listen: String,
}

impl SlackAccountConfig {
    /// The bot token, if a non-empty one is configured.
    pub fn token(&self) -> Option<&str> {
        Some(self.token.expose_secret().as_str()).filter(|t| !t.is_empty())
    }

    /// The verification token, if a non-empty one is configured.
    pub fn verification_token(&self) -> Option<&str> {
        self.verification_token
            .as_ref()
            .map(|s| s.expose_secret().as_str())
            .filter(|s| !s.is_empty())
    }
}

impl std::fmt::Debug for SlackAccountConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackAccountConfig")
            .field("token", &"[REDACTED]")
            .field(
                "verification_token",
                &self.verification_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("api_base", &self.api_base)
            .field("events_listen", &self.events_listen)
            .field("interactions_listen", &self.interactions_listen)
            .finish()
    }
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

fn serialize_option_secret<S: serde::Serializer>(
    secret: &Option<Secret<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match secret {
        Some(s) => serializer.serialize_some(s.expose_secret()),
        None => serializer.serialize_none(),
    }
}

impl Default for SlackAccountConfig {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
            verification_token: None,
            api_base: "https://slack.com/api".into(),
            events_listen: "0.0.0.0:3000".into(),
            interactions_listen: "0.0.0.0:4000".into(),
        }
    }
}

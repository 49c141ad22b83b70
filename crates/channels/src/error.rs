use std::error::Error as StdError;

/// Crate-wide result type for remote operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed remote errors shared across chat backends.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The platform rejected the bot credentials.
    #[error("authentication failed: {message}")]
    Auth { message: String },

    /// A reader or server is missing a required setting or has an invalid one.
    #[error("invalid configuration: {message}")]
    Configuration { message: String },

    /// No ingestion credential is configured and the process is not in CLI mode.
    #[error("no transport configured: {message}")]
    NoTransport { message: String },

    /// The shared verification secret did not match.
    #[error("request verification failed")]
    Verification,

    /// The platform answered a call with an error payload.
    #[error("{method} failed: {error}")]
    Platform { method: String, error: String },

    /// Wrapped source error from a platform call.
    #[error("transport failure: {context}: {source}")]
    Transport {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error(transparent)]
    Common(#[from] chatwire_common::Error),

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}

impl Error {
    #[must_use]
    pub fn auth(message: impl std::fmt::Display) -> Self {
        Self::Auth {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn configuration(message: impl std::fmt::Display) -> Self {
        Self::Configuration {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn no_transport(message: impl std::fmt::Display) -> Self {
        Self::NoTransport {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn platform(method: impl Into<String>, error: impl Into<String>) -> Self {
        Self::Platform {
            method: method.into(),
            error: error.into(),
        }
    }

    #[must_use]
    pub fn transport(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::Transport {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Whether this error should terminate the hosting process.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Auth { .. } | Self::NoTransport { .. })
    }
}

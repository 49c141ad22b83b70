//! Events API webhook reader.

use std::sync::Arc;

use {
    axum::{
        Router,
        body::Bytes,
        extract::State,
        http::StatusCode,
        response::{IntoResponse, Response},
        routing::post,
    },
    chatwire_channels::{Bot, Error, InboundSender, Result},
    secrecy::{ExposeSecret, Secret},
    tracing::{debug, info, warn},
};

use crate::events::{decode_webhook_event, forward_event};

#[derive(Clone)]
struct EventsState {
    verification_token: Arc<Secret<String>>,
    inbound: InboundSender,
    bot: Arc<Bot>,
}

/// Router accepting Events API pushes on `path`.
pub fn events_router(
    path: &str,
    verification_token: Secret<String>,
    inbound: InboundSender,
    bot: Arc<Bot>,
) -> Router {
    let state = EventsState {
        verification_token: Arc::new(verification_token),
        inbound,
        bot,
    };
    Router::new()
        .route(path, post(handle_event))
        .with_state(state)
}

/// Compare the token embedded in a request with the configured one.
pub(crate) fn verify_token(expected: &Secret<String>, presented: &str) -> Result<()> {
    if presented.is_empty() || presented != expected.expose_secret() {
        return Err(Error::Verification);
    }
    Ok(())
}

async fn handle_event(State(state): State<EventsState>, body: Bytes) -> Response {
    let envelope = match decode_webhook_event(&body) {
        Ok(envelope) => envelope,
        Err(e) => {
            debug!(bot = %state.bot.name, error = %e, "malformed events payload");
            return StatusCode::BAD_REQUEST.into_response();
        },
    };

    if let Err(e) = verify_token(&state.verification_token, &envelope.token) {
        debug!(bot = %state.bot.name, error = %e, "rejected events request");
        return StatusCode::UNAUTHORIZED.into_response();
    }

    match envelope.kind.as_str() {
        "url_verification" => envelope.challenge.unwrap_or_default().into_response(),
        "event_callback" => {
            if let Some(event) = envelope.event {
                forward_event(&event, &state.inbound, &state.bot);
            }
            StatusCode::OK.into_response()
        },
        other => {
            debug!(bot = %state.bot.name, kind = other, "ignoring events envelope");
            StatusCode::OK.into_response()
        },
    }
}

/// Bind `listen` and serve the events router until the listener fails.
pub async fn serve_events(listen: &str, router: Router, bot: &Bot) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| Error::transport(format!("bind events listener on {listen}"), e))?;
    info!(bot = %bot.name, listen, "slack events webhook listening");
    axum::serve(listener, router).await.map_err(|e| {
        warn!(bot = %bot.name, error = %e, "slack events webhook stopped");
        Error::transport("serve events webhook", e)
    })
}

//! Interactive component listener.
//!
//! One [`InteractionServer`] belongs to each Slack remote. Its listener is
//! bound at most once, however many rules ask for it and from however many
//! tasks.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};

use {
    axum::{
        Form, Router,
        extract::State,
        http::StatusCode,
        routing::{get, post},
    },
    chatwire_channels::{
        Bot, Error, Result, RuleProcessor, TaskStatus, is_valid_path, spawn_supervised,
    },
    chatwire_common::types::Rule,
    secrecy::{ExposeSecret, Secret},
    serde::Deserialize,
    tokio::sync::watch,
    tracing::{debug, info, warn},
};

use crate::{events::InteractionPayload, webhook::verify_token};

/// Liveness route served next to the callback path.
pub const HEALTH_PATH: &str = "/interaction_health";

/// Result of [`InteractionServer::start_once`].
#[derive(Debug)]
pub enum StartOutcome {
    /// This call won the guard and spawned the listener.
    Started(watch::Receiver<TaskStatus>),
    /// A previous call already started the listener.
    AlreadyStarted,
    /// A precondition failed; nothing was bound.
    Aborted(Error),
}

pub struct InteractionServer {
    started: AtomicBool,
    listen: String,
    verification_token: Option<Secret<String>>,
    processor: Arc<dyn RuleProcessor>,
    status: Mutex<Option<watch::Receiver<TaskStatus>>>,
}

#[derive(Clone)]
struct InteractionState {
    verification_token: Arc<Secret<String>>,
    processor: Arc<dyn RuleProcessor>,
    rule: Arc<Rule>,
    bot: Arc<Bot>,
}

#[derive(Deserialize)]
struct InteractionForm {
    payload: String,
}

impl InteractionServer {
    pub fn new(
        listen: impl Into<String>,
        verification_token: Option<Secret<String>>,
        processor: Arc<dyn RuleProcessor>,
    ) -> Self {
        Self {
            started: AtomicBool::new(false),
            listen: listen.into(),
            verification_token,
            processor,
            status: Mutex::new(None),
        }
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    /// Lifecycle of the listener, once it has been started.
    pub fn status(&self) -> Option<watch::Receiver<TaskStatus>> {
        self.status
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn check_preconditions(&self, bot: &Bot) -> Result<(String, Secret<String>)> {
        if !bot.interactive_components {
            return Err(Error::configuration("interactive components are disabled"));
        }
        let token = self
            .verification_token
            .as_ref()
            .filter(|t| !t.expose_secret().is_empty())
            .ok_or_else(|| {
                Error::configuration("a verification token is required for interactive components")
            })?;
        let path = bot.interactions_callback_path.as_deref().unwrap_or_default();
        if !is_valid_path(path) {
            return Err(Error::configuration(format!(
                "invalid interactions_callback_path {path:?} (e.g. \"/slack_interactions/v1/mybot-v1_interactions\")"
            )));
        }
        Ok((path.to_string(), token.clone()))
    }

    /// Start the listener unless it already runs.
    ///
    /// Never blocks on the listener itself: a bind or serve failure shows up
    /// in the logs and in [`Self::status`], not in the return value. The rule
    /// given by the winning call is the one passed to the processor.
    pub fn start_once(&self, rule: &Rule, bot: Arc<Bot>) -> StartOutcome {
        if self.is_started() {
            return StartOutcome::AlreadyStarted;
        }

        let (path, token) = match self.check_preconditions(&bot) {
            Ok(checked) => checked,
            Err(e) => {
                warn!(bot = %bot.name, rule = %rule.name, error = %e, "interaction server not started");
                return StartOutcome::Aborted(e);
            },
        };

        // Held until the receiver is published so `status()` never trails the guard.
        let mut slot = self.status.lock().unwrap_or_else(|e| e.into_inner());
        if self
            .started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return StartOutcome::AlreadyStarted;
        }

        let router = interactions_router(&path, InteractionState {
            verification_token: Arc::new(token),
            processor: Arc::clone(&self.processor),
            rule: Arc::new(rule.clone()),
            bot: Arc::clone(&bot),
        });
        let listen = self.listen.clone();
        let status = spawn_supervised("slack-interactions", move |status| {
            serve_interactions(listen, path, router, bot, status)
        });

        *slot = Some(status.clone());
        StartOutcome::Started(status)
    }
}

fn interactions_router(path: &str, state: InteractionState) -> Router {
    Router::new()
        .route(HEALTH_PATH, get(|| async { "OK" }))
        .route(path, post(handle_interaction))
        .with_state(state)
}

async fn serve_interactions(
    listen: String,
    path: String,
    router: Router,
    bot: Arc<Bot>,
    status: watch::Sender<TaskStatus>,
) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(&listen)
        .await
        .map_err(|e| Error::transport(format!("bind interactions listener on {listen}"), e))?;
    let addr = listener.local_addr().ok();
    info!(bot = %bot.name, listen = %listen, path = %path, "slack interaction server listening");
    status.send_replace(TaskStatus::Running { addr });

    axum::serve(listener, router)
        .await
        .map_err(|e| Error::transport("serve interactions", e))
}

async fn handle_interaction(
    State(state): State<InteractionState>,
    Form(form): Form<InteractionForm>,
) -> StatusCode {
    let payload = match InteractionPayload::parse(&form.payload) {
        Ok(payload) => payload,
        Err(e) => {
            debug!(bot = %state.bot.name, error = %e, "malformed interaction payload");
            return StatusCode::BAD_REQUEST;
        },
    };

    if let Err(e) = verify_token(&state.verification_token, &payload.token) {
        debug!(bot = %state.bot.name, error = %e, "rejected interaction request");
        return StatusCode::UNAUTHORIZED;
    }

    let message = match payload.into_message(&state.bot) {
        Ok(message) => message,
        Err(e) => {
            warn!(bot = %state.bot.name, error = %e, "dropping undecodable interaction");
            return StatusCode::BAD_REQUEST;
        },
    };

    debug!(
        bot = %state.bot.name,
        rule = %state.rule.name,
        message_id = %message.id,
        "processing interaction"
    );
    state.processor.process(&state.rule, message, &state.bot).await;
    StatusCode::OK
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        async_trait::async_trait,
        axum::{body::Body, http::Request},
        chatwire_common::types::Message,
        serde_json::json,
        tower::ServiceExt,
    };

    const PATH: &str = "/slack_interactions/v1/mybot-v1_interactions";

    #[derive(Default)]
    struct Recorder(Mutex<Vec<(String, Message)>>);

    #[async_trait]
    impl RuleProcessor for Recorder {
        async fn process(&self, rule: &Rule, message: Message, _bot: &Bot) {
            self.0.lock().unwrap().push((rule.name.clone(), message));
        }
    }

    fn rule() -> Rule {
        Rule {
            name: "approve".into(),
            ..Default::default()
        }
    }

    fn router(recorder: &Arc<Recorder>) -> Router {
        interactions_router(PATH, InteractionState {
            verification_token: Arc::new(Secret::new("vt".into())),
            processor: Arc::clone(recorder) as Arc<dyn RuleProcessor>,
            rule: Arc::new(rule()),
            bot: Arc::new(Bot::new("testbot")),
        })
    }

    fn form_request(token: &str) -> Request<Body> {
        let payload = json!({
            "type": "block_actions",
            "token": token,
            "user": {"id": "U1"},
            "channel": {"id": "C1"},
            "container": {"message_ts": "1.0"},
            "actions": [{"action_id": "ok", "value": "approved"}],
        })
        .to_string();
        let body = format!("payload={}", urlencode(&payload));
        Request::post(PATH)
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap()
    }

    fn urlencode(raw: &str) -> String {
        raw.bytes()
            .map(|b| match b {
                b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                    (b as char).to_string()
                },
                _ => format!("%{b:02X}"),
            })
            .collect()
    }

    #[tokio::test]
    async fn health_check_is_ok() {
        let app = router(&Arc::new(Recorder::default()));
        let resp = app
            .oneshot(Request::get(HEALTH_PATH).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn verified_interaction_invokes_processor() {
        let recorder = Arc::new(Recorder::default());
        let resp = router(&recorder).oneshot(form_request("vt")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let calls = recorder.0.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "approve");
        assert_eq!(calls[0].1.input, "approved");
        assert_eq!(calls[0].1.channel_id, "C1");
    }

    #[tokio::test]
    async fn wrong_token_skips_processor() {
        let recorder = Arc::new(Recorder::default());
        let resp = router(&recorder).oneshot(form_request("nope")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert!(recorder.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_payload_still_gets_a_response() {
        let recorder = Arc::new(Recorder::default());
        let req = Request::post(PATH)
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from("payload=%7Bnot-json"))
            .unwrap();
        let resp = router(&recorder).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(recorder.0.lock().unwrap().is_empty());
    }

    fn enabled_bot() -> Arc<Bot> {
        Arc::new(
            Bot::new("testbot")
                .with_interactive_components(true)
                .with_interactions_callback_path(PATH),
        )
    }

    fn server(token: Option<&str>) -> InteractionServer {
        InteractionServer::new(
            "127.0.0.1:0",
            token.map(|t| Secret::new(t.into())),
            Arc::new(Recorder::default()),
        )
    }

    #[tokio::test]
    async fn disabled_components_abort_without_consuming_guard() {
        let server = server(Some("vt"));
        let bot = Arc::new(Bot::new("testbot").with_interactions_callback_path(PATH));
        assert!(matches!(
            server.start_once(&rule(), bot),
            StartOutcome::Aborted(Error::Configuration { .. })
        ));
        assert!(!server.is_started());
        assert!(server.status().is_none());
    }

    #[tokio::test]
    async fn missing_token_aborts() {
        let server = server(None);
        assert!(matches!(
            server.start_once(&rule(), enabled_bot()),
            StartOutcome::Aborted(_)
        ));
        assert!(!server.is_started());
    }

    #[tokio::test]
    async fn relative_path_aborts() {
        let server = server(Some("vt"));
        let bot = Arc::new(
            Bot::new("testbot")
                .with_interactive_components(true)
                .with_interactions_callback_path("slack_interactions"),
        );
        assert!(matches!(
            server.start_once(&rule(), bot),
            StartOutcome::Aborted(_)
        ));
    }

    #[tokio::test]
    async fn second_start_is_a_no_op() {
        let server = server(Some("vt"));
        let StartOutcome::Started(mut status) = server.start_once(&rule(), enabled_bot()) else {
            panic!("first start should bind");
        };
        assert!(matches!(
            server.start_once(&rule(), enabled_bot()),
            StartOutcome::AlreadyStarted
        ));
        assert!(matches!(
            chatwire_channels::wait_until_settled(&mut status).await,
            TaskStatus::Running { addr: Some(_) }
        ));
    }
}

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::{
    net::SocketAddr,
    sync::{Arc, Barrier, Mutex},
    thread,
};

use {
    async_trait::async_trait,
    chatwire_channels::{Bot, RuleProcessor, TaskStatus, wait_until_settled},
    chatwire_common::types::{Message, Rule},
    chatwire_slack::{InteractionServer, StartOutcome, interactions::HEALTH_PATH},
    secrecy::Secret,
    serde_json::json,
    tokio::runtime::Handle,
};

const CALLBACK_PATH: &str = "/slack_interactions/v1/mybot-v1_interactions";

#[derive(Default)]
struct RecordingProcessor {
    calls: Mutex<Vec<(String, Message)>>,
}

#[async_trait]
impl RuleProcessor for RecordingProcessor {
    async fn process(&self, rule: &Rule, message: Message, _bot: &Bot) {
        self.calls
            .lock()
            .unwrap()
            .push((rule.name.clone(), message));
    }
}

fn rule(name: &str) -> Rule {
    Rule {
        name: name.into(),
        ..Default::default()
    }
}

fn bot() -> Arc<Bot> {
    Arc::new(
        Bot::new("itest")
            .with_interactive_components(true)
            .with_interactions_callback_path(CALLBACK_PATH),
    )
}

fn server(listen: &str, processor: &Arc<RecordingProcessor>) -> InteractionServer {
    InteractionServer::new(
        listen,
        Some(Secret::new("vt".into())),
        Arc::clone(processor) as Arc<dyn RuleProcessor>,
    )
}

async fn start(server: &InteractionServer) -> SocketAddr {
    let StartOutcome::Started(mut status) = server.start_once(&rule("approve"), bot()) else {
        panic!("server should start");
    };
    match wait_until_settled(&mut status).await {
        TaskStatus::Running { addr: Some(addr) } => addr,
        other => panic!("unexpected status: {other:?}"),
    }
}

fn payload(token: &str) -> String {
    json!({
        "type": "block_actions",
        "token": token,
        "user": {"id": "U1"},
        "channel": {"id": "C9"},
        "message_ts": "1700000000.000300",
        "actions": [{"action_id": "deploy", "value": "prod"}],
    })
    .to_string()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_starts_bind_exactly_once() {
    const CALLERS: usize = 8;

    for round in 0..25 {
        let processor = Arc::new(RecordingProcessor::default());
        let server = Arc::new(server("127.0.0.1:0", &processor));
        let barrier = Arc::new(Barrier::new(CALLERS));

        let callers: Vec<_> = (0..CALLERS)
            .map(|i| {
                let server = Arc::clone(&server);
                let barrier = Arc::clone(&barrier);
                let runtime = Handle::current();
                thread::spawn(move || {
                    let _guard = runtime.enter();
                    barrier.wait();
                    let outcome = server.start_once(&rule(&format!("rule-{i}")), bot());
                    let status_visible = server.status().is_some();
                    (outcome, status_visible)
                })
            })
            .collect();

        let mut started = 0;
        for caller in callers {
            let (outcome, status_visible) = caller.join().unwrap();
            assert!(status_visible, "round {round}: started server without a status");
            match outcome {
                StartOutcome::Started(_) => started += 1,
                StartOutcome::AlreadyStarted => {},
                StartOutcome::Aborted(e) => panic!("unexpected abort: {e}"),
            }
        }
        assert_eq!(started, 1, "round {round}");
        assert!(server.is_started());
    }
}

#[tokio::test]
async fn health_endpoint_answers_once_running() {
    let processor = Arc::new(RecordingProcessor::default());
    let server = server("127.0.0.1:0", &processor);
    let addr = start(&server).await;

    let resp = reqwest::get(format!("http://{addr}{HEALTH_PATH}"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn callback_is_gated_on_verification_token() {
    let processor = Arc::new(RecordingProcessor::default());
    let server = server("127.0.0.1:0", &processor);
    let addr = start(&server).await;
    let url = format!("http://{addr}{CALLBACK_PATH}");
    let client = reqwest::Client::new();

    let rejected = client
        .post(&url)
        .form(&[("payload", payload("forged"))])
        .send()
        .await
        .unwrap();
    assert_eq!(rejected.status(), 401);
    assert!(processor.calls.lock().unwrap().is_empty());

    let accepted = client
        .post(&url)
        .form(&[("payload", payload("vt"))])
        .send()
        .await
        .unwrap();
    assert_eq!(accepted.status(), 200);

    let calls = processor.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "approve");
    assert_eq!(calls[0].1.input, "prod");
    assert_eq!(calls[0].1.timestamp, "1700000000.000300");
}

#[tokio::test]
async fn bind_failure_is_observable() {
    let taken = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = taken.local_addr().unwrap();

    let processor = Arc::new(RecordingProcessor::default());
    let server = server(&addr.to_string(), &processor);
    let StartOutcome::Started(mut status) = server.start_once(&rule("approve"), bot()) else {
        panic!("server should start");
    };

    match wait_until_settled(&mut status).await {
        TaskStatus::Failed { reason } => assert!(reason.contains("bind")),
        other => panic!("unexpected status: {other:?}"),
    }
    let status = server.status().unwrap();
    assert!(matches!(*status.borrow(), TaskStatus::Failed { .. }));
    assert!(matches!(
        server.start_once(&rule("approve"), bot()),
        StartOutcome::AlreadyStarted
    ));
}

#[tokio::test]
async fn unmet_preconditions_bind_nothing() {
    let processor = Arc::new(RecordingProcessor::default());
    let server = InteractionServer::new(
        "127.0.0.1:0",
        None,
        Arc::clone(&processor) as Arc<dyn RuleProcessor>,
    );
    assert!(matches!(
        server.start_once(&rule("approve"), bot()),
        StartOutcome::Aborted(_)
    ));
    assert!(!server.is_started());
    assert!(server.status().is_none());
}

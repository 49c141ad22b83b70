use std::{future::Future, net::SocketAddr};

use {
    tokio::sync::watch,
    tracing::{debug, error},
};

use crate::Result;

/// Lifecycle of a supervised background task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Starting,
    /// Listening, with the bound address when the task owns a socket.
    Running { addr: Option<SocketAddr> },
    Failed { reason: String },
    Stopped,
}

impl TaskStatus {
    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::Starting)
    }
}

/// Spawn `task` in the background and publish its lifecycle on a watch channel.
///
/// The task receives the sender so it can report `Running` once it is ready.
/// When it returns, the final status is `Stopped` or `Failed`; failures are
/// also logged so they are never silent.
pub fn spawn_supervised<F, Fut>(name: impl Into<String>, task: F) -> watch::Receiver<TaskStatus>
where
    F: FnOnce(watch::Sender<TaskStatus>) -> Fut,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    let name = name.into();
    let (tx, rx) = watch::channel(TaskStatus::Starting);
    let fut = task(tx.clone());
    tokio::spawn(async move {
        match fut.await {
            Ok(()) => {
                debug!(task = %name, "background task stopped");
                tx.send_replace(TaskStatus::Stopped);
            },
            Err(e) => {
                error!(task = %name, error = %e, "background task failed");
                tx.send_replace(TaskStatus::Failed {
                    reason: e.to_string(),
                });
            },
        }
    });
    rx
}

/// Wait until the task has left `Starting` and return that status.
pub async fn wait_until_settled(rx: &mut watch::Receiver<TaskStatus>) -> TaskStatus {
    let settled = rx.wait_for(TaskStatus::is_settled).await.map(|s| s.clone());
    settled.unwrap_or_else(|_| rx.borrow().clone())
}

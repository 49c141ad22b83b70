use std::sync::Arc;

use {
    chatwire_channels::{Bot, InboundSender, Result},
    futures::StreamExt,
    tracing::{info, warn},
};

use crate::{api::SlackApi, events::forward_event};

/// Read events from a streaming session until it closes.
///
/// Suspends on the session between events; run it on its own task.
pub async fn run_streaming_reader(
    api: Arc<dyn SlackApi>,
    inbound: InboundSender,
    bot: Arc<Bot>,
) -> Result<()> {
    let mut session = api.open_streaming_session().await?;
    info!(bot = %bot.name, "slack streaming session open");

    while let Some(event) = session.next().await {
        match event {
            Ok(event) => {
                if !forward_event(&event, &inbound, &bot) {
                    info!(bot = %bot.name, "inbound stream closed, stopping streaming reader");
                    return Ok(());
                }
            },
            Err(e) => {
                warn!(bot = %bot.name, error = %e, "slack streaming session failed");
                return Err(e);
            },
        }
    }

    info!(bot = %bot.name, "slack streaming session closed");
    Ok(())
}

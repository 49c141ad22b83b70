mod processor;

use std::{path::PathBuf, process::ExitCode, sync::Arc};

use {
    chatwire_channels::{Bot, InboundSender, RemoteRegistry, RuleProcessor, inbound_channel},
    chatwire_common::types::{Message, MessageKind, Rule, message_timestamp},
    chatwire_config::{BotSettings, ChatwireConfig},
    chatwire_slack::SlackRemote,
    clap::{Parser, Subcommand},
    tokio::io::{AsyncBufReadExt, BufReader},
    tracing::{debug, error, info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use crate::processor::LoggingRuleProcessor;

/// Channel ID given to messages typed on stdin in CLI mode.
const CLI_CHANNEL: &str = "cli";

#[derive(Parser)]
#[command(name = "chatwire", about = "chatwire: chat platform remote adapter")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file (defaults to ./chatwire.toml, then ~/.config/chatwire/).
    #[arg(long, global = true, env = "CHATWIRE_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Interactive test mode: read input from stdin, missing credentials only warn.
    #[arg(long, global = true, default_value_t = false)]
    cli: bool,
}

#[derive(Subcommand, Clone, Copy, Debug, PartialEq, Eq)]
enum Commands {
    /// Run the configured chat remote (default when no subcommand is provided).
    Run,
    /// List the available chat remotes.
    Remotes,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

fn build_bot(settings: &BotSettings, cli_override: bool) -> Bot {
    let mut bot = Bot::new(settings.name.clone())
        .with_cli(settings.cli || cli_override)
        .with_interactive_components(settings.interactive_components);
    bot.events_callback_path = settings.events_callback_path.clone();
    bot.interactions_callback_path = settings.interactions_callback_path.clone();
    bot
}

fn build_registry(
    config: &ChatwireConfig,
    processor: Arc<dyn RuleProcessor>,
) -> anyhow::Result<RemoteRegistry> {
    let slack_config = config
        .slack
        .clone()
        .unwrap_or_else(|| serde_json::json!({}));
    let mut registry = RemoteRegistry::new();
    registry.register(Arc::new(SlackRemote::from_value(slack_config, processor)?));
    Ok(registry)
}

/// Push each stdin line onto the stream as a direct message.
async fn read_stdin(inbound: InboundSender) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let mut message = Message::new(
                    MessageKind::Direct,
                    CLI_CHANNEL,
                    message_timestamp().to_string(),
                );
                message.input = line;
                if inbound.send(message).is_err() {
                    return;
                }
            },
            Ok(None) => {
                debug!("stdin closed");
                return;
            },
            Err(e) => {
                warn!(error = %e, "failed to read stdin");
                return;
            },
        }
    }
}

async fn run(
    config: ChatwireConfig,
    registry: &RemoteRegistry,
    processor: Arc<dyn RuleProcessor>,
    cli_override: bool,
) -> anyhow::Result<ExitCode> {
    let bot = Arc::new(build_bot(&config.bot, cli_override));

    let Some(remote) = registry.get(&config.bot.chat_application) else {
        error!(
            chat_application = %config.bot.chat_application,
            available = ?registry.list(),
            "unknown chat application"
        );
        return Ok(ExitCode::FAILURE);
    };
    info!(bot = %bot.name, remote = remote.name(), cli = bot.cli, "starting chat remote");

    let (inbound, mut messages) = inbound_channel();
    if bot.cli {
        tokio::spawn(read_stdin(inbound.clone()));
    }
    let reader = tokio::spawn({
        let bot = Arc::clone(&bot);
        async move { remote.read_inbound(inbound, bot).await }
    });

    let rule = Rule {
        name: "log".into(),
        ..Default::default()
    };
    while let Some(message) = messages.recv().await {
        if message.from_self {
            continue;
        }
        processor.process(&rule, message, &bot).await;
    }

    match reader.await? {
        Ok(()) => {
            info!(bot = %bot.name, "chat remote stopped");
            Ok(ExitCode::SUCCESS)
        },
        Err(e) if e.is_fatal() => {
            error!(bot = %bot.name, error = %e, "chat remote failed");
            Ok(ExitCode::FAILURE)
        },
        Err(e) => {
            warn!(bot = %bot.name, error = %e, "chat remote stopped with an error");
            Ok(ExitCode::SUCCESS)
        },
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    let config = match &cli.config {
        Some(path) => chatwire_config::load_config(path)?,
        None => chatwire_config::discover_and_load(),
    };

    let processor: Arc<dyn RuleProcessor> = Arc::new(LoggingRuleProcessor);
    let registry = build_registry(&config, Arc::clone(&processor))?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Remotes => {
            for id in registry.list() {
                println!("{id}");
            }
            Ok(ExitCode::SUCCESS)
        },
        Commands::Run => run(config, &registry, processor, cli.cli).await,
    }
}

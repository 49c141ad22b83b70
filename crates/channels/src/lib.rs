//! Chat remote abstraction.
//!
//! Each chat platform (Slack today) implements the [`ChatRemote`] trait: resolve
//! the bot identity, read inbound messages into the unified stream, send
//! outbound messages, mutate reactions and serve interactive components.

pub mod bot;
pub mod error;
pub mod path;
pub mod registry;
pub mod remote;
pub mod task;

pub use {
    bot::{Bot, ChannelInfo, ChannelSet},
    error::{Error, Result},
    path::is_valid_path,
    registry::RemoteRegistry,
    remote::{ChatRemote, InboundReceiver, InboundSender, RuleProcessor, inbound_channel},
    task::{TaskStatus, spawn_supervised, wait_until_settled},
};

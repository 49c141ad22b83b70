//! Configuration loading and env substitution.
//!
//! Config files: `chatwire.toml`, `chatwire.yaml`, or `chatwire.json`
//! Searched in `./` then `~/.config/chatwire/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values.

pub mod env_subst;
pub mod loader;
pub mod schema;

pub use {
    loader::{config_dir, discover_and_load, load_config},
    schema::{BotSettings, ChatwireConfig},
};

//! Treasurebot Client - the bot that plays the harvesting game.
//!
//! Layering, bottom up:
//! - `infrastructure`: awaitable pending operations over a fire-and-forget
//!   channel, event fan-out, and the WebSocket transport
//! - `gateway`: typed game commands bound to correlation channels
//! - `bot`: the orchestration loop over the domain model
//! - `config` / `status`: thin adapters around the core

pub mod bot;
pub mod config;
pub mod error;
pub mod events;
pub mod gateway;
pub mod infrastructure;
pub mod status;
pub mod translate;

pub use bot::{BotSettings, TreasureBot};
pub use config::Settings;
pub use error::ClientError;
pub use events::{GameEvent, GameEventKind};
pub use gateway::{GameClient, GameClientConfig};

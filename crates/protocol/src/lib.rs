//! Treasurebot Protocol - shared vocabulary for talking to the game server.
//!
//! This crate contains the command tags, frame envelopes and payload DTOs
//! exchanged over the game connection, plus the message-signing helper every
//! outbound command needs.
//!
//! # Design Principles
//!
//! 1. **Minimal dependencies** - serde, serde_json, thiserror, chrono and the
//!    signing hash; nothing else
//! 2. **No business logic** - pure data types and serialization
//! 3. **Wire-exact field names** - DTOs mirror the server's JSON keys

pub mod commands;
pub mod error;
pub mod events;
pub mod frames;
pub mod payloads;
pub mod sign;

pub use commands::GameCommand;
pub use error::ProtocolError;
pub use events::ServerEvent;
pub use frames::{ClientFrame, LoginParams, ServerFrame};
pub use payloads::{
    ActiveHeroDto, BlockDto, ClaimInput, CoinDetailDto, ExplodeBlockDto, ExplodeDto, ExplodeInput,
    ExplodeTileInput, HeroIdInput, HeroUpdateDto, HouseDto, RewardDto, RosterHeroDto,
    StoryDetailsDto, StoryLevelRewardDto, StoryMapInput, StoryPlayedDto,
};

//! Treasurebot Domain - the game model the bot reasons about.
//!
//! Everything in this crate is pure: no I/O, no clocks it did not receive as
//! arguments, no protocol types. The client crate feeds it decoded server
//! payloads and asks it what to do next.

pub mod block;
pub mod error;
pub mod gen;
pub mod grid;
pub mod hero;
pub mod house;
pub mod planner;
pub mod reward;
pub mod squad;
pub mod story;

pub use block::{Block, BlockKind};
pub use error::DomainError;
pub use gen::GenBits;
pub use grid::{CrossDamage, Grid, Target, Tile, GRID_HEIGHT, GRID_WIDTH};
pub use hero::{Hero, HeroId, HeroState, HeroStats, Rarity, Skill, Skin};
pub use house::{House, HouseKind, HouseStats};
pub use planner::{Planner, PlannerPolicy};
pub use reward::{Reward, RewardKind};
pub use squad::Squad;
pub use story::{PlayedHero, StoryDetails, StoryReward, MAX_STORY_LEVEL};

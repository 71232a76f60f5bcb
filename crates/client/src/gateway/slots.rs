//! One correlation channel per command.
//!
//! Fetch-style commands get a unique slot (coalescing dedupe); per-hero
//! actions get a serialized group keyed by hero id so one hero's actions
//! run strictly in order while different heroes proceed in parallel.

use treasurebot_protocol::{
    ActiveHeroDto, BlockDto, CoinDetailDto, ExplodeDto, HeroUpdateDto, HouseDto, RewardDto,
    RosterHeroDto, StoryDetailsDto,
};

use crate::error::ClientError;
use crate::infrastructure::messaging::{SerialGroup, UniqueSlot};

#[derive(Default)]
pub struct SlotRegistry {
    pub connect: UniqueSlot<()>,
    pub disconnect: UniqueSlot<()>,
    pub login: UniqueSlot<()>,
    pub block_map: UniqueSlot<Vec<BlockDto>>,
    pub sync_house: UniqueSlot<Vec<HouseDto>>,
    pub active_heroes: UniqueSlot<Vec<ActiveHeroDto>>,
    pub roster: UniqueSlot<Vec<RosterHeroDto>>,
    pub open_session: UniqueSlot<()>,
    pub close_session: UniqueSlot<()>,
    pub rewards: UniqueSlot<Vec<RewardDto>>,
    pub coin_detail: UniqueSlot<CoinDetailDto>,
    pub claim: UniqueSlot<()>,
    pub upgrade_power: UniqueSlot<()>,
    pub story_details: UniqueSlot<StoryDetailsDto>,
    pub story_map: UniqueSlot<()>,
    pub enter_door: UniqueSlot<()>,
    pub explode: SerialGroup<ExplodeDto>,
    pub go_sleep: SerialGroup<HeroUpdateDto>,
    pub go_home: SerialGroup<HeroUpdateDto>,
    pub go_work: SerialGroup<HeroUpdateDto>,
}

impl SlotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shutdown: reject every in-flight operation; queued-but-unstarted
    /// serialized items are abandoned without ever starting.
    pub async fn cancel_all(&self) {
        self.connect.reject(ClientError::Cancelled).await;
        self.disconnect.reject(ClientError::Cancelled).await;
        self.login.reject(ClientError::Cancelled).await;
        self.block_map.reject(ClientError::Cancelled).await;
        self.sync_house.reject(ClientError::Cancelled).await;
        self.active_heroes.reject(ClientError::Cancelled).await;
        self.roster.reject(ClientError::Cancelled).await;
        self.open_session.reject(ClientError::Cancelled).await;
        self.close_session.reject(ClientError::Cancelled).await;
        self.rewards.reject(ClientError::Cancelled).await;
        self.coin_detail.reject(ClientError::Cancelled).await;
        self.claim.reject(ClientError::Cancelled).await;
        self.upgrade_power.reject(ClientError::Cancelled).await;
        self.story_details.reject(ClientError::Cancelled).await;
        self.story_map.reject(ClientError::Cancelled).await;
        self.enter_door.reject(ClientError::Cancelled).await;
        self.explode.cancel_all().await;
        self.go_sleep.cancel_all().await;
        self.go_home.cancel_all().await;
        self.go_work.cancel_all().await;
    }
}

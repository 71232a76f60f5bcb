//! The orchestration loop: cycle heroes through work and rest, keep the
//! grid harvested, claim what the server owes us.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tokio::task::JoinSet;

use treasurebot_domain::{
    Grid, Hero, HeroId, HeroState, House, Planner, PlannerPolicy, Reward, RewardKind, Squad,
};
use treasurebot_protocol::{CoinDetailDto, ExplodeInput, HeroUpdateDto};

use crate::error::ClientError;
use crate::gateway::GameClient;
use crate::translate;

/// Wait between grinding attempts when nobody can work.
const IDLE_WAIT: Duration = Duration::from_secs(120);
/// Minimum spacing between side-quest passes.
const ADVENTURE_INTERVAL: Duration = Duration::from_secs(600);
/// Pause between claiming a side-quest map and entering it.
const STORY_ENTRY_DELAY: Duration = Duration::from_secs(5);
/// Grace period for in-flight placements during shutdown.
const STOP_DRAIN: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct BotSettings {
    /// A resting hero is promoted back to work once its energy fraction
    /// clears this percentage.
    pub min_hero_energy_percent: f64,
    /// Whether the side-quest branch runs at all.
    pub adventure: bool,
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            min_hero_energy_percent: 90.0,
            adventure: false,
        }
    }
}

/// The process-wide mutable aggregate. The bot owns it outright; planners
/// and views only ever see it through this lock.
struct BotState {
    grid: Grid,
    squad: Squad,
    houses: Vec<House>,
    planner: Planner,
    /// Hero ids most recently selected for the working set.
    selection: Vec<HeroId>,
    running: bool,
}

impl BotState {
    /// Selected heroes that are confirmed working and still have energy.
    fn working_ids(&self) -> Vec<HeroId> {
        self.selection
            .iter()
            .copied()
            .filter(|id| {
                self.squad
                    .hero(*id)
                    .map(|hero| hero.state() == HeroState::Work && hero.energy() > 0)
                    .unwrap_or(false)
            })
            .collect()
    }

    fn home_slots(&self) -> usize {
        self.houses
            .iter()
            .find(|house| house.active())
            .map(|house| house.slots() as usize)
            .unwrap_or(0)
    }
}

/// The bot. Clones share one state and one connection.
#[derive(Clone)]
pub struct TreasureBot {
    client: GameClient,
    state: Arc<Mutex<BotState>>,
    settings: Arc<BotSettings>,
    policy: PlannerPolicy,
}

impl TreasureBot {
    pub fn new(client: GameClient, settings: BotSettings, policy: PlannerPolicy) -> Self {
        Self {
            client,
            state: Arc::new(Mutex::new(BotState {
                grid: Grid::default(),
                squad: Squad::default(),
                houses: Vec::new(),
                planner: Planner::new(policy),
                selection: Vec::new(),
                running: false,
            })),
            settings: Arc::new(settings),
            policy,
        }
    }

    pub fn client(&self) -> &GameClient {
        &self.client
    }

    /// Login, prime state, then grind until stopped.
    pub async fn run(&self) -> Result<(), ClientError> {
        self.state.lock().await.running = true;

        tracing::info!("logging in");
        self.client.login().await?;
        tracing::info!(wallet = %self.client.wallet_id(), "logged in");

        self.load_houses().await?;
        self.refresh_grid().await?;
        self.refresh_selection().await?;

        // Fire the first adventure pass immediately, like a fresh session.
        let mut last_adventure = Instant::now()
            .checked_sub(ADVENTURE_INTERVAL)
            .unwrap_or_else(Instant::now);

        loop {
            if self.state.lock().await.grid.is_depleted() {
                self.refresh_grid().await?;
            }
            self.refresh_selection().await?;

            if self.settings.adventure && last_adventure.elapsed() >= ADVENTURE_INTERVAL {
                last_adventure = Instant::now();
                if let Err(error) = self.adventure().await {
                    tracing::warn!(%error, "side-quest pass failed");
                }
            }

            tracing::info!("opening work session");
            self.client.open_session().await?;

            if self.state.lock().await.working_ids().is_empty() {
                tracing::info!("no heroes can work right now; idling");
                tokio::time::sleep(IDLE_WAIT).await;
            } else {
                self.place_bombs().await?;
            }

            tracing::info!("closing work session");
            self.client.close_session().await?;

            if !self.state.lock().await.running {
                return Ok(());
            }
        }
    }

    /// Stop the loop, bed the squad down, cancel what is still pending.
    pub async fn stop(&self) {
        tracing::info!("stopping; sending working heroes to sleep");
        self.state.lock().await.running = false;
        tokio::time::sleep(STOP_DRAIN).await;

        let workers = self.state.lock().await.working_ids();
        for hero_id in workers {
            match self.client.go_sleep(hero_id).await {
                Ok(update) => {
                    if let Err(error) = self.apply_update(update, HeroState::Sleep).await {
                        tracing::warn!(hero = hero_id, %error, "stale hero on shutdown");
                    }
                }
                Err(error) => tracing::warn!(hero = hero_id, %error, "could not bed hero down"),
            }
        }

        self.client.shutdown().await;
    }

    async fn load_houses(&self) -> Result<(), ClientError> {
        let dtos = self.client.sync_house().await?;
        let houses = dtos
            .iter()
            .map(translate::house_from_dto)
            .collect::<Result<Vec<_>, _>>()?;
        tracing::info!(count = houses.len(), "loaded houses");
        self.state.lock().await.houses = houses;
        Ok(())
    }

    /// Reload the grid. A depleted grid first invalidates all planning state
    /// and logs what the session earned.
    async fn refresh_grid(&self) -> Result<(), ClientError> {
        tracing::info!("refreshing map");
        if self.state.lock().await.grid.is_depleted() {
            self.state.lock().await.planner.invalidate();
            match self.client.get_reward().await {
                Ok(rewards) => {
                    for reward in rewards.iter().map(|dto| translate::reward_from_dto(dto)) {
                        tracing::info!(kind = ?reward.kind, value = reward.value, "pending reward");
                    }
                }
                Err(error) => tracing::warn!(%error, "could not fetch rewards"),
            }
        }

        let dtos = self.client.get_block_map().await?;
        let blocks = dtos.iter().map(translate::block_from_dto).collect();
        let mut state = self.state.lock().await;
        state.grid = Grid::new(blocks);
        tracing::info!(map = %state.grid, "map refreshed");
        Ok(())
    }

    /// Recompute the working set: confirmed workers plus any rested hero
    /// whose energy clears the threshold, then reconcile the home roster.
    async fn refresh_selection(&self) -> Result<(), ClientError> {
        tracing::info!("refreshing hero selection");
        let dtos = self.client.get_active_heroes().await?;
        let heroes = dtos
            .iter()
            .map(translate::hero_from_active)
            .collect::<Result<Vec<_>, _>>()?;

        let rested: Vec<(HeroId, f64)> = {
            let mut state = self.state.lock().await;
            state.squad.replace(heroes);
            state.selection = state
                .squad
                .by_state(HeroState::Work)
                .iter()
                .map(|hero| hero.id())
                .collect();
            state
                .squad
                .not_working()
                .iter()
                .map(|hero| (hero.id(), hero.energy_fraction()))
                .collect()
        };

        for (hero_id, fraction) in rested {
            if fraction * 100.0 * 1.2 < self.settings.min_hero_energy_percent {
                continue;
            }
            tracing::info!(hero = hero_id, "sending hero to work");
            match self.client.go_work(hero_id).await {
                Ok(update) => {
                    self.apply_update(update, HeroState::Work).await?;
                    self.state.lock().await.selection.push(hero_id);
                }
                Err(error) => tracing::warn!(hero = hero_id, %error, "go-work not confirmed"),
            }
        }

        let working = self.state.lock().await.working_ids().len();
        tracing::info!(count = working, "working set refreshed");

        self.refresh_home().await
    }

    /// Greedy slot allocation: lowest-energy resters fill the house, current
    /// residents that lost their spot go back to sleep.
    async fn refresh_home(&self) -> Result<(), ClientError> {
        let (home_selection, at_home) = {
            let state = self.state.lock().await;
            let slots = state.home_slots();
            let mut resters: Vec<(HeroId, i32)> = state
                .squad
                .not_working()
                .iter()
                .map(|hero| (hero.id(), hero.energy()))
                .collect();
            resters.sort_by_key(|(_, energy)| *energy);
            let home_selection: Vec<HeroId> =
                resters.iter().take(slots).map(|(id, _)| *id).collect();
            let at_home: Vec<HeroId> = state
                .squad
                .by_state(HeroState::Home)
                .iter()
                .map(|hero| hero.id())
                .collect();
            (home_selection, at_home)
        };

        for hero_id in &at_home {
            if home_selection.contains(hero_id) {
                continue;
            }
            tracing::info!(hero = *hero_id, "evicting hero from home");
            match self.client.go_sleep(*hero_id).await {
                Ok(update) => self.apply_update(update, HeroState::Sleep).await?,
                Err(error) => tracing::warn!(hero = *hero_id, %error, "eviction not confirmed"),
            }
        }

        for hero_id in &home_selection {
            let already_home = {
                let state = self.state.lock().await;
                state
                    .squad
                    .hero(*hero_id)
                    .map(|hero| hero.state() == HeroState::Home)?
            };
            if already_home {
                continue;
            }
            tracing::info!(hero = *hero_id, "sending hero home");
            match self.client.go_home(*hero_id).await {
                Ok(update) => self.apply_update(update, HeroState::Home).await?,
                Err(error) => tracing::warn!(hero = *hero_id, %error, "go-home not confirmed"),
            }
        }

        Ok(())
    }

    /// Rounds over the working set until the grid is harvested out, nobody
    /// can work, or the bot is stopped. Heroes launch with a short stagger
    /// so requests do not burst on identical timestamps.
    async fn place_bombs(&self) -> Result<(), ClientError> {
        let mut pipelines: JoinSet<()> = JoinSet::new();

        loop {
            let workers = {
                let state = self.state.lock().await;
                if state.grid.is_depleted() || !state.running {
                    break;
                }
                state.working_ids()
            };
            if workers.is_empty() {
                break;
            }

            for hero_id in workers {
                tokio::time::sleep(self.policy.round_stagger).await;
                let bot = self.clone();
                pipelines.spawn(async move {
                    if let Err(error) = bot.place_for_hero(hero_id).await {
                        tracing::warn!(hero = hero_id, %error, "placement pipeline failed");
                    }
                });
            }

            // Reap settled pipelines so the set stays small.
            while pipelines.try_join_next().is_some() {}
        }

        while pipelines.join_next().await.is_some() {}
        Ok(())
    }

    /// One placement attempt for one hero. A failed placement is "could not
    /// confirm, try again next round", not an error of the loop.
    async fn place_for_hero(&self, hero_id: HeroId) -> Result<(), ClientError> {
        let now = Instant::now();
        let planned = {
            let mut guard = self.state.lock().await;
            let state = &mut *guard;
            let hero = match state.squad.hero(hero_id) {
                Ok(hero) => hero.clone(),
                // The squad was replaced while this pipeline was queued.
                Err(_) => return Ok(()),
            };
            if hero.state() != HeroState::Work || hero.energy() <= 0 {
                return Ok(());
            }
            let Some(target) = state.planner.next_target(&hero, &state.grid) else {
                return Ok(());
            };
            if !state.planner.can_place(&hero, target, now) {
                return Ok(());
            }
            let bomb_id = state.planner.begin_blast(&hero, target, now);
            (hero, target, bomb_id)
        };
        let (hero, target, bomb_id) = planned;

        tracing::info!(
            hero = %hero,
            i = target.i,
            j = target.j,
            damage = target.damage,
            "placing bomb"
        );
        tokio::time::sleep(self.policy.place_delay).await;

        let result = self
            .client
            .place_bomb(ExplodeInput {
                hero_id,
                bomb_id,
                i: target.i as u32,
                j: target.j as u32,
                blocks: Vec::new(),
            })
            .await;

        self.state.lock().await.planner.finish_blast(hero_id, bomb_id);

        let dto = match result {
            Ok(dto) => dto,
            Err(error) => {
                tracing::warn!(hero = hero_id, %error, "placement not confirmed");
                return Ok(());
            }
        };

        // Re-read state after the await: other pipelines ran meanwhile.
        let energy = {
            let mut state = self.state.lock().await;
            for block in &dto.blocks {
                state
                    .grid
                    .apply_damage(block.i as usize, block.j as usize, block.hp)?;
            }
            state.squad.apply_energy(dto.id, dto.energy)?;
            state.squad.hero(dto.id)?.energy()
        };

        if energy <= 0 {
            tracing::info!(hero = hero_id, "hero exhausted; sending to sleep");
            match self.client.go_sleep(hero_id).await {
                Ok(update) => self.apply_update(update, HeroState::Sleep).await?,
                Err(error) => tracing::warn!(hero = hero_id, %error, "go-sleep not confirmed"),
            }
            self.refresh_home().await?;
            self.refresh_selection().await?;
        }

        Ok(())
    }

    /// The side-quest branch: burn available keys on the rarest hero.
    async fn adventure(&self) -> Result<(), ClientError> {
        let rewards = self.client.get_reward().await?;
        let keys = rewards
            .iter()
            .map(|dto| translate::reward_from_dto(dto))
            .find(|reward| reward.kind == RewardKind::Key)
            .map(|reward| reward.value)
            .unwrap_or(0.0);

        if keys < 1.0 {
            tracing::info!("no keys to play right now");
            return Ok(());
        }

        for _ in 0..keys.floor() as u32 {
            let details = translate::story_from_dto(&self.client.get_story_details().await?);
            let Some(hero_id) = self
                .state
                .lock()
                .await
                .squad
                .rarest()
                .map(|hero| hero.id())
            else {
                return Ok(());
            };
            let level = details.next_level();

            tracing::info!(hero = hero_id, level, "playing side-quest level");
            self.client.get_story_map(hero_id, level).await?;
            tokio::time::sleep(STORY_ENTRY_DELAY).await;
            self.client.enter_door().await?;
        }

        Ok(())
    }

    async fn apply_update(
        &self,
        update: HeroUpdateDto,
        state: HeroState,
    ) -> Result<(), ClientError> {
        let mut guard = self.state.lock().await;
        guard.squad.apply_energy(update.id, update.energy)?;
        guard.squad.apply_state(update.id, state)?;
        Ok(())
    }

    // =========================================================================
    // Read-only accessors for the status surface
    // =========================================================================

    /// Human-readable squad and grid summary.
    pub async fn stats(&self) -> String {
        let state = self.state.lock().await;
        let line = |hero: &Hero| {
            format!(
                "{:?} [{}]: {}/{}",
                hero.stats().rarity,
                hero.id(),
                hero.energy(),
                hero.max_energy()
            )
        };

        let working: Vec<String> = state
            .working_ids()
            .iter()
            .filter_map(|id| state.squad.hero(*id).ok().map(line))
            .collect();
        let resting: Vec<String> = state.squad.not_working().iter().map(|h| line(h)).collect();

        format!(
            "{}\nWorking heroes ({}):\n{}\nResting heroes ({}):\n{}",
            state.grid,
            working.len(),
            working.join("\n"),
            resting.len(),
            resting.join("\n"),
        )
    }

    /// Pending rewards plus the claimable-value breakdown.
    pub async fn rewards(&self) -> Result<(Vec<Reward>, CoinDetailDto), ClientError> {
        let rewards = self
            .client
            .get_reward()
            .await?
            .iter()
            .map(|dto| translate::reward_from_dto(dto))
            .collect();
        let detail = self.client.coin_detail().await?;
        Ok((rewards, detail))
    }

    /// Claim a reward kind, if the server lets us claim it at all.
    pub async fn claim(&self, kind: RewardKind) -> Result<(), ClientError> {
        let code = kind
            .claim_code()
            .ok_or(ClientError::WrongUsage("reward kind is not claimable"))?;
        self.client.claim(code).await
    }
}

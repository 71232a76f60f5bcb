//! The protocol gateway: typed, awaitable game commands over the socket.
//!
//! Binds the correlation layer to specific commands, fans inbound frames out
//! to the event bus, and maps non-zero server result codes onto the pending
//! operation they belong to.

pub mod slots;

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use treasurebot_protocol::{
    ActiveHeroDto, BlockDto, ClaimInput, ClientFrame, CoinDetailDto, ExplodeDto, ExplodeInput,
    GameCommand, HeroIdInput, HeroUpdateDto, HouseDto, LoginParams, RewardDto, RosterHeroDto,
    ServerEvent, ServerFrame, StoryDetailsDto, StoryMapInput,
};

use crate::error::ClientError;
use crate::events::GameEvent;
use crate::infrastructure::messaging::{EventBus, SerialGroup, UniqueSlot};
use crate::infrastructure::websocket::{GameSocket, SocketEvent};
use self::slots::SlotRegistry;

pub struct GameClientConfig {
    pub url: String,
    pub login: LoginParams,
    pub salt: String,
    pub timeout: Duration,
}

struct ClientInner {
    socket: Arc<GameSocket>,
    slots: SlotRegistry,
    events: EventBus,
    login: LoginParams,
    salt: String,
    timeout: Duration,
    logged_in: AtomicBool,
    message_id: AtomicU32,
}

/// Cloneable handle to the game connection.
#[derive(Clone)]
pub struct GameClient {
    inner: Arc<ClientInner>,
}

impl GameClient {
    pub fn new(config: GameClientConfig) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                socket: Arc::new(GameSocket::new(config.url)),
                slots: SlotRegistry::new(),
                events: EventBus::new(),
                login: config.login,
                salt: config.salt,
                timeout: config.timeout,
                logged_in: AtomicBool::new(false),
                message_id: AtomicU32::new(0),
            }),
        }
    }

    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    pub fn is_connected(&self) -> bool {
        self.inner.socket.is_connected()
    }

    pub fn is_logged_in(&self) -> bool {
        self.inner.logged_in.load(Ordering::SeqCst)
    }

    pub fn wallet_id(&self) -> &str {
        self.inner.login.wallet_id()
    }

    fn next_id(&self) -> u32 {
        self.inner.message_id.fetch_add(1, Ordering::SeqCst)
    }

    fn ensure_logged_in(&self) -> Result<(), ClientError> {
        if self.is_logged_in() {
            Ok(())
        } else {
            Err(ClientError::WrongUsage("log in first"))
        }
    }

    /// Build, sign and queue one command frame. Synchronous: this is the
    /// starter body for every pending operation.
    fn send_command(&self, cmd: GameCommand, data: Value) -> Result<(), ClientError> {
        let sender = self.inner.socket.sender()?;
        let frame = ClientFrame::command(
            self.wallet_id(),
            &self.inner.salt,
            cmd,
            self.next_id(),
            data,
        );
        sender.send(frame)
    }

    fn encode<T: Serialize>(value: &T) -> Result<Value, ClientError> {
        serde_json::to_value(value).map_err(|error| ClientError::Encode(error.to_string()))
    }

    // =========================================================================
    // Connection lifecycle
    // =========================================================================

    pub async fn connect(&self) -> Result<(), ClientError> {
        if self.is_connected() {
            return Ok(());
        }

        let client = self.clone();
        self.inner
            .slots
            .connect
            .submit(
                move || {
                    tokio::spawn(async move {
                        match client.inner.socket.connect().await {
                            Ok(events) => {
                                client.spawn_dispatch(events);
                                client.inner.events.dispatch(&GameEvent::Connected).await;
                                client.inner.slots.connect.resolve(()).await;
                            }
                            Err(_) => {
                                client
                                    .inner
                                    .events
                                    .dispatch(&GameEvent::ConnectionFailed)
                                    .await;
                                client
                                    .inner
                                    .slots
                                    .connect
                                    .reject(ClientError::ConnectionFailed)
                                    .await;
                            }
                        }
                    });
                    Ok(())
                },
                self.inner.timeout,
            )
            .await
    }

    pub async fn disconnect(&self) -> Result<(), ClientError> {
        if !self.is_connected() {
            return Ok(());
        }

        let socket = Arc::clone(&self.inner.socket);
        self.inner
            .slots
            .disconnect
            .submit(
                move || {
                    socket.begin_close();
                    Ok(())
                },
                self.inner.timeout,
            )
            .await
    }

    pub async fn login(&self) -> Result<(), ClientError> {
        if self.is_logged_in() {
            return Ok(());
        }
        self.connect().await?;

        let client = self.clone();
        self.inner
            .slots
            .login
            .submit(
                move || {
                    let frame = ClientFrame::login(&client.inner.login, &client.inner.salt);
                    client.inner.socket.sender()?.send(frame)
                },
                self.inner.timeout,
            )
            .await
    }

    /// Shutdown: cancel every pending operation, then close the socket.
    pub async fn shutdown(&self) {
        self.inner.slots.cancel_all().await;
        self.inner.socket.begin_close();
    }

    // =========================================================================
    // Fetch commands (unique slots)
    // =========================================================================

    async fn unique<T: Clone + Send + 'static>(
        &self,
        cmd: GameCommand,
        slot: &UniqueSlot<T>,
        data: Value,
    ) -> Result<T, ClientError> {
        self.ensure_logged_in()?;
        let client = self.clone();
        slot.submit(move || client.send_command(cmd, data), self.inner.timeout)
            .await
    }

    pub async fn get_block_map(&self) -> Result<Vec<BlockDto>, ClientError> {
        self.unique(GameCommand::GetBlockMap, &self.inner.slots.block_map, json!({}))
            .await
    }

    pub async fn sync_house(&self) -> Result<Vec<HouseDto>, ClientError> {
        self.unique(GameCommand::SyncHouse, &self.inner.slots.sync_house, json!({}))
            .await
    }

    pub async fn get_active_heroes(&self) -> Result<Vec<ActiveHeroDto>, ClientError> {
        self.unique(
            GameCommand::GetActiveBomber,
            &self.inner.slots.active_heroes,
            json!({}),
        )
        .await
    }

    pub async fn sync_roster(&self) -> Result<Vec<RosterHeroDto>, ClientError> {
        self.unique(GameCommand::SyncBomberman, &self.inner.slots.roster, json!({}))
            .await
    }

    pub async fn open_session(&self) -> Result<(), ClientError> {
        self.unique(
            GameCommand::StartPve,
            &self.inner.slots.open_session,
            json!({}),
        )
        .await
    }

    pub async fn close_session(&self) -> Result<(), ClientError> {
        self.unique(
            GameCommand::StopPve,
            &self.inner.slots.close_session,
            json!({}),
        )
        .await
    }

    pub async fn get_reward(&self) -> Result<Vec<RewardDto>, ClientError> {
        self.unique(GameCommand::GetReward, &self.inner.slots.rewards, json!({}))
            .await
    }

    pub async fn coin_detail(&self) -> Result<CoinDetailDto, ClientError> {
        self.unique(
            GameCommand::CoinDetail,
            &self.inner.slots.coin_detail,
            json!({}),
        )
        .await
    }

    pub async fn claim(&self, reward_type: u32) -> Result<(), ClientError> {
        let data = Self::encode(&ClaimInput { reward_type })?;
        self.unique(GameCommand::ApproveClaim, &self.inner.slots.claim, data)
            .await
    }

    pub async fn get_hero_upgrade_power(&self) -> Result<(), ClientError> {
        self.unique(
            GameCommand::GetHeroUpgradePower,
            &self.inner.slots.upgrade_power,
            json!({}),
        )
        .await
    }

    pub async fn get_story_details(&self) -> Result<StoryDetailsDto, ClientError> {
        self.unique(
            GameCommand::GetStoryLevelDetail,
            &self.inner.slots.story_details,
            json!({}),
        )
        .await
    }

    pub async fn get_story_map(&self, hero_id: u64, level: u32) -> Result<(), ClientError> {
        let data = Self::encode(&StoryMapInput {
            level,
            hero_id,
            ticket_type: 0,
        })?;
        self.unique(GameCommand::GetStoryMap, &self.inner.slots.story_map, data)
            .await
    }

    pub async fn enter_door(&self) -> Result<(), ClientError> {
        self.unique(
            GameCommand::EnterDoor,
            &self.inner.slots.enter_door,
            json!({}),
        )
        .await
    }

    // =========================================================================
    // Per-hero actions (serialized per hero id)
    // =========================================================================

    async fn serialized<T: Clone + Send + 'static>(
        &self,
        cmd: GameCommand,
        group: &SerialGroup<T>,
        hero_id: u64,
        data: Value,
    ) -> Result<T, ClientError> {
        self.ensure_logged_in()?;
        let client = self.clone();
        group
            .submit(
                hero_id,
                move || client.send_command(cmd, data),
                self.inner.timeout,
            )
            .await
    }

    pub async fn place_bomb(&self, input: ExplodeInput) -> Result<ExplodeDto, ClientError> {
        let hero_id = input.hero_id;
        let data = Self::encode(&input)?;
        self.serialized(
            GameCommand::StartExplode,
            &self.inner.slots.explode,
            hero_id,
            data,
        )
        .await
    }

    pub async fn go_sleep(&self, hero_id: u64) -> Result<HeroUpdateDto, ClientError> {
        let data = Self::encode(&HeroIdInput { id: hero_id })?;
        self.serialized(GameCommand::GoSleep, &self.inner.slots.go_sleep, hero_id, data)
            .await
    }

    pub async fn go_home(&self, hero_id: u64) -> Result<HeroUpdateDto, ClientError> {
        let data = Self::encode(&HeroIdInput { id: hero_id })?;
        self.serialized(GameCommand::GoHome, &self.inner.slots.go_home, hero_id, data)
            .await
    }

    pub async fn go_work(&self, hero_id: u64) -> Result<HeroUpdateDto, ClientError> {
        let data = Self::encode(&HeroIdInput { id: hero_id })?;
        self.serialized(GameCommand::GoWork, &self.inner.slots.go_work, hero_id, data)
            .await
    }

    // =========================================================================
    // Inbound dispatch
    // =========================================================================

    fn spawn_dispatch(&self, mut events: mpsc::UnboundedReceiver<SocketEvent>) {
        let client = self.clone();
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                match event {
                    SocketEvent::Frame(frame) => client.handle_frame(frame).await,
                    SocketEvent::Closed => {
                        client.handle_closed().await;
                        break;
                    }
                }
            }
        });
    }

    async fn handle_closed(&self) {
        self.inner.logged_in.store(false, Ordering::SeqCst);
        self.inner.slots.disconnect.resolve(()).await;
        self.inner.events.dispatch(&GameEvent::ConnectionLost).await;
    }

    async fn handle_frame(&self, frame: ServerFrame) {
        let Some(cmd) = frame.command() else {
            tracing::warn!(tag = %frame.cmd, "unmapped inbound command tag");
            return;
        };

        if frame.ec != 0 {
            self.handle_message_error(cmd, frame.ec).await;
            return;
        }

        let event = match ServerEvent::parse(cmd, &frame.data) {
            Ok(event) => event,
            Err(error) => {
                tracing::warn!(%cmd, %error, "failed to decode inbound payload");
                return;
            }
        };

        self.settle(&event).await;
        self.inner.events.dispatch(&GameEvent::Server(event)).await;
    }

    /// Resolve the pending operation the event answers. Serial groups
    /// resolve by the hero id the payload carries.
    async fn settle(&self, event: &ServerEvent) {
        let slots = &self.inner.slots;
        match event {
            ServerEvent::LoggedIn => {
                self.inner.logged_in.store(true, Ordering::SeqCst);
                slots.login.resolve(()).await;
            }
            ServerEvent::Pong => {}
            ServerEvent::BlockMap(blocks) => slots.block_map.resolve(blocks.clone()).await,
            ServerEvent::Houses(houses) => slots.sync_house.resolve(houses.clone()).await,
            ServerEvent::ActiveHeroes(heroes) => {
                slots.active_heroes.resolve(heroes.clone()).await
            }
            ServerEvent::Roster(heroes) => slots.roster.resolve(heroes.clone()).await,
            ServerEvent::SessionOpened => slots.open_session.resolve(()).await,
            ServerEvent::SessionClosed => slots.close_session.resolve(()).await,
            ServerEvent::Exploded(dto) => slots.explode.resolve(dto.id, dto.clone()).await,
            ServerEvent::HeroSlept(update) => slots.go_sleep.resolve(update.id, *update).await,
            ServerEvent::HeroWentHome(update) => slots.go_home.resolve(update.id, *update).await,
            ServerEvent::HeroWorking(update) => slots.go_work.resolve(update.id, *update).await,
            ServerEvent::Rewards(rewards) => slots.rewards.resolve(rewards.clone()).await,
            ServerEvent::CoinDetail(detail) => slots.coin_detail.resolve(*detail).await,
            ServerEvent::Claimed => slots.claim.resolve(()).await,
            ServerEvent::UpgradePower => slots.upgrade_power.resolve(()).await,
            ServerEvent::StoryDetails(details) => {
                slots.story_details.resolve(details.clone()).await
            }
            ServerEvent::StoryMap => slots.story_map.resolve(()).await,
            ServerEvent::DoorEntered => slots.enter_door.resolve(()).await,
        }
    }

    /// Route a non-zero result code to the operation it failed, selected by
    /// command tag. Error frames do not carry a hero id, so serialized
    /// groups conservatively fail every in-flight action of that kind.
    async fn handle_message_error(&self, cmd: GameCommand, code: i32) {
        self.inner
            .events
            .dispatch(&GameEvent::MessageError { cmd, code })
            .await;

        let error = ClientError::MessageError { cmd, code };
        let slots = &self.inner.slots;
        match cmd {
            GameCommand::UserLogin => slots.login.reject(ClientError::LoginFailed(code)).await,
            GameCommand::PingPong => {}
            GameCommand::GetBlockMap => slots.block_map.reject(error).await,
            GameCommand::SyncHouse => slots.sync_house.reject(error).await,
            GameCommand::GetActiveBomber => slots.active_heroes.reject(error).await,
            GameCommand::SyncBomberman => slots.roster.reject(error).await,
            GameCommand::StartPve => slots.open_session.reject(error).await,
            GameCommand::StopPve => slots.close_session.reject(error).await,
            GameCommand::StartExplode => slots.explode.reject_all(error).await,
            GameCommand::GoSleep => slots.go_sleep.reject_all(error).await,
            GameCommand::GoHome => slots.go_home.reject_all(error).await,
            GameCommand::GoWork => slots.go_work.reject_all(error).await,
            GameCommand::GetReward => slots.rewards.reject(error).await,
            GameCommand::CoinDetail => slots.coin_detail.reject(error).await,
            GameCommand::ApproveClaim => slots.claim.reject(error).await,
            GameCommand::GetHeroUpgradePower => slots.upgrade_power.reject(error).await,
            GameCommand::GetStoryLevelDetail => slots.story_details.reject(error).await,
            GameCommand::GetStoryMap => slots.story_map.reject(error).await,
            GameCommand::EnterDoor => slots.enter_door.reject(error).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::GameEventKind;
    use std::sync::atomic::AtomicI32;

    fn client() -> GameClient {
        GameClient::new(GameClientConfig {
            url: "ws://localhost:9".into(),
            login: LoginParams::Wallet {
                address: "0xabc".into(),
            },
            salt: "salt".into(),
            timeout: Duration::from_secs(5),
        })
    }

    #[tokio::test]
    async fn commands_require_login() {
        let client = client();
        assert_eq!(
            client.get_block_map().await,
            Err(ClientError::WrongUsage("log in first"))
        );
        assert_eq!(
            client.go_sleep(1).await,
            Err(ClientError::WrongUsage("log in first"))
        );
    }

    #[tokio::test]
    async fn unknown_inbound_tags_are_dropped_with_a_diagnostic() {
        let client = client();
        // Must not panic or reject anything.
        client
            .handle_frame(ServerFrame {
                cmd: "MYSTERY_COMMAND".into(),
                ec: 0,
                data: json!({}),
            })
            .await;
    }

    #[tokio::test]
    async fn successful_frames_resolve_the_pending_operation() {
        let client = client();

        let slot = client.inner.slots.block_map.clone();
        let pending =
            tokio::spawn(async move { slot.submit(|| Ok(()), Duration::ZERO).await });
        tokio::time::sleep(Duration::from_millis(20)).await;

        let inner = json!([{ "type": 1, "i": 2, "j": 3, "hp": 7, "maxHp": 9 }]).to_string();
        client
            .handle_frame(ServerFrame {
                cmd: "GET_BLOCK_MAP".into(),
                ec: 0,
                data: json!({ "datas_pve": inner }),
            })
            .await;

        let blocks = pending.await.expect("task").expect("resolved");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].hp, 7);
    }

    #[tokio::test]
    async fn error_frames_reject_by_command_tag_and_publish() {
        let client = client();
        let seen_code = Arc::new(AtomicI32::new(0));

        let code = Arc::clone(&seen_code);
        client
            .events()
            .subscribe(GameEventKind::MessageError, move |event| {
                if let GameEvent::MessageError { code: c, .. } = event {
                    code.store(*c, Ordering::SeqCst);
                }
            })
            .await;

        let slot = client.inner.slots.rewards.clone();
        let pending =
            tokio::spawn(async move { slot.submit(|| Ok(()), Duration::ZERO).await });
        tokio::time::sleep(Duration::from_millis(20)).await;

        client
            .handle_frame(ServerFrame {
                cmd: "GET_REWARD".into(),
                ec: 42,
                data: json!({}),
            })
            .await;

        assert_eq!(
            pending.await.expect("task"),
            Err(ClientError::MessageError {
                cmd: GameCommand::GetReward,
                code: 42,
            })
        );
        assert_eq!(seen_code.load(Ordering::SeqCst), 42);
    }

    #[tokio::test]
    async fn hero_updates_resolve_the_matching_hero_queue() {
        let client = client();

        let group = client.inner.slots.go_sleep.clone();
        let pending = tokio::spawn(async move {
            group.submit(9, || Ok(()), Duration::ZERO).await
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        // An update for a different hero must not settle hero 9's queue.
        client
            .handle_frame(ServerFrame {
                cmd: "GO_SLEEP".into(),
                ec: 0,
                data: json!({ "id": 4, "energy": 12 }),
            })
            .await;
        assert!(!pending.is_finished());

        client
            .handle_frame(ServerFrame {
                cmd: "GO_SLEEP".into(),
                ec: 0,
                data: json!({ "id": 9, "energy": 3 }),
            })
            .await;
        let update = pending.await.expect("task").expect("resolved");
        assert_eq!(update.id, 9);
        assert_eq!(update.energy, 3);
    }

    #[tokio::test]
    async fn login_success_marks_the_session() {
        let client = client();
        assert!(!client.is_logged_in());
        client
            .handle_frame(ServerFrame {
                cmd: "USER_LOGIN".into(),
                ec: 0,
                data: json!({}),
            })
            .await;
        assert!(client.is_logged_in());
    }
}

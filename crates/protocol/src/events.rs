//! Typed decode of inbound command payloads.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::commands::GameCommand;
use crate::error::ProtocolError;
use crate::payloads::{
    ActiveHeroDto, BlockDto, CoinDetailDto, ExplodeDto, HeroUpdateDto, HouseDto, RewardDto,
    RosterHeroDto, StoryDetailsDto,
};

/// Every inbound command result, one arm per command tag.
///
/// The match in [`ServerEvent::parse`] is exhaustive over [`GameCommand`], so
/// adding a command without deciding its payload shape fails the build.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    LoggedIn,
    Pong,
    BlockMap(Vec<BlockDto>),
    Houses(Vec<HouseDto>),
    ActiveHeroes(Vec<ActiveHeroDto>),
    Roster(Vec<RosterHeroDto>),
    SessionOpened,
    SessionClosed,
    Exploded(ExplodeDto),
    HeroSlept(HeroUpdateDto),
    HeroWentHome(HeroUpdateDto),
    HeroWorking(HeroUpdateDto),
    Rewards(Vec<RewardDto>),
    CoinDetail(CoinDetailDto),
    Claimed,
    UpgradePower,
    StoryDetails(StoryDetailsDto),
    StoryMap,
    DoorEntered,
}

// Container keys the server wraps its lists in.
#[derive(Deserialize)]
struct Bombers<T> {
    bombers: Vec<T>,
}

#[derive(Deserialize)]
struct Houses {
    houses: Vec<HouseDto>,
}

#[derive(Deserialize)]
struct Rewards {
    rewards: Vec<RewardDto>,
}

/// The grid snapshot arrives JSON-encoded inside the frame's JSON.
#[derive(Deserialize)]
struct BlockMap {
    datas_pve: String,
}

fn decode<T: DeserializeOwned>(cmd: GameCommand, data: &Value) -> Result<T, ProtocolError> {
    serde_json::from_value(data.clone()).map_err(|source| ProtocolError::Payload { cmd, source })
}

impl ServerEvent {
    /// The command this event answered.
    pub fn command(&self) -> GameCommand {
        match self {
            Self::LoggedIn => GameCommand::UserLogin,
            Self::Pong => GameCommand::PingPong,
            Self::BlockMap(_) => GameCommand::GetBlockMap,
            Self::Houses(_) => GameCommand::SyncHouse,
            Self::ActiveHeroes(_) => GameCommand::GetActiveBomber,
            Self::Roster(_) => GameCommand::SyncBomberman,
            Self::SessionOpened => GameCommand::StartPve,
            Self::SessionClosed => GameCommand::StopPve,
            Self::Exploded(_) => GameCommand::StartExplode,
            Self::HeroSlept(_) => GameCommand::GoSleep,
            Self::HeroWentHome(_) => GameCommand::GoHome,
            Self::HeroWorking(_) => GameCommand::GoWork,
            Self::Rewards(_) => GameCommand::GetReward,
            Self::CoinDetail(_) => GameCommand::CoinDetail,
            Self::Claimed => GameCommand::ApproveClaim,
            Self::UpgradePower => GameCommand::GetHeroUpgradePower,
            Self::StoryDetails(_) => GameCommand::GetStoryLevelDetail,
            Self::StoryMap => GameCommand::GetStoryMap,
            Self::DoorEntered => GameCommand::EnterDoor,
        }
    }

    /// Decode the payload of a successful (`ec == 0`) inbound frame.
    pub fn parse(cmd: GameCommand, data: &Value) -> Result<Self, ProtocolError> {
        Ok(match cmd {
            GameCommand::UserLogin => Self::LoggedIn,
            GameCommand::PingPong => Self::Pong,
            GameCommand::GetBlockMap => {
                let wrap: BlockMap = decode(cmd, data)?;
                let blocks: Vec<BlockDto> = serde_json::from_str(&wrap.datas_pve)
                    .map_err(|source| ProtocolError::Payload { cmd, source })?;
                Self::BlockMap(blocks)
            }
            GameCommand::SyncHouse => Self::Houses(decode::<Houses>(cmd, data)?.houses),
            GameCommand::GetActiveBomber => {
                Self::ActiveHeroes(decode::<Bombers<ActiveHeroDto>>(cmd, data)?.bombers)
            }
            GameCommand::SyncBomberman => {
                Self::Roster(decode::<Bombers<RosterHeroDto>>(cmd, data)?.bombers)
            }
            GameCommand::StartPve => Self::SessionOpened,
            GameCommand::StopPve => Self::SessionClosed,
            GameCommand::StartExplode => Self::Exploded(decode(cmd, data)?),
            GameCommand::GoSleep => Self::HeroSlept(decode(cmd, data)?),
            GameCommand::GoHome => Self::HeroWentHome(decode(cmd, data)?),
            GameCommand::GoWork => Self::HeroWorking(decode(cmd, data)?),
            GameCommand::GetReward => Self::Rewards(decode::<Rewards>(cmd, data)?.rewards),
            GameCommand::CoinDetail => Self::CoinDetail(decode(cmd, data)?),
            GameCommand::ApproveClaim => Self::Claimed,
            GameCommand::GetHeroUpgradePower => Self::UpgradePower,
            GameCommand::GetStoryLevelDetail => Self::StoryDetails(decode(cmd, data)?),
            GameCommand::GetStoryMap => Self::StoryMap,
            GameCommand::EnterDoor => Self::DoorEntered,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn block_map_is_double_encoded() {
        let inner = json!([{ "type": 0, "i": 1, "j": 2, "hp": 4, "maxHp": 6 }]).to_string();
        let data = json!({ "datas_pve": inner });
        let event = ServerEvent::parse(GameCommand::GetBlockMap, &data).expect("decodes");
        match event {
            ServerEvent::BlockMap(blocks) => {
                assert_eq!(blocks.len(), 1);
                assert_eq!(blocks[0].hp, 4);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn hero_lists_unwrap_the_bombers_key() {
        let data = json!({
            "bombers": [{ "id": 9, "stage": 0, "gen_id": "1", "energy": 50 }]
        });
        let event = ServerEvent::parse(GameCommand::GetActiveBomber, &data).expect("decodes");
        match event {
            ServerEvent::ActiveHeroes(heroes) => assert_eq!(heroes[0].id, 9),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn bodyless_commands_decode_without_payload() {
        let event = ServerEvent::parse(GameCommand::StartPve, &json!({})).expect("decodes");
        assert_eq!(event, ServerEvent::SessionOpened);
    }

    #[test]
    fn malformed_payloads_name_the_command() {
        let err = ServerEvent::parse(GameCommand::GoSleep, &json!({ "nope": 1 }))
            .expect_err("must fail");
        assert!(matches!(
            err,
            ProtocolError::Payload {
                cmd: GameCommand::GoSleep,
                ..
            }
        ));
    }
}

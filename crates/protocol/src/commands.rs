//! The command vocabulary the bot speaks.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Every game command the client sends or correlates responses for.
///
/// Tags are SCREAMING_SNAKE on the wire. The enum is closed on purpose:
/// inbound dispatch matches it exhaustively, and an unknown inbound tag is
/// surfaced as a diagnostic instead of being silently dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameCommand {
    UserLogin,
    PingPong,
    GetBlockMap,
    SyncHouse,
    GetActiveBomber,
    SyncBomberman,
    StartPve,
    StopPve,
    StartExplode,
    GoSleep,
    GoHome,
    GoWork,
    GetReward,
    CoinDetail,
    ApproveClaim,
    GetHeroUpgradePower,
    GetStoryLevelDetail,
    GetStoryMap,
    EnterDoor,
}

impl GameCommand {
    /// The wire tag of this command.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::UserLogin => "USER_LOGIN",
            Self::PingPong => "PING_PONG",
            Self::GetBlockMap => "GET_BLOCK_MAP",
            Self::SyncHouse => "SYNC_HOUSE",
            Self::GetActiveBomber => "GET_ACTIVE_BOMBER",
            Self::SyncBomberman => "SYNC_BOMBERMAN",
            Self::StartPve => "START_PVE",
            Self::StopPve => "STOP_PVE",
            Self::StartExplode => "START_EXPLODE",
            Self::GoSleep => "GO_SLEEP",
            Self::GoHome => "GO_HOME",
            Self::GoWork => "GO_WORK",
            Self::GetReward => "GET_REWARD",
            Self::CoinDetail => "COIN_DETAIL",
            Self::ApproveClaim => "APPROVE_CLAIM",
            Self::GetHeroUpgradePower => "GET_HERO_UPGRADE_POWER",
            Self::GetStoryLevelDetail => "GET_STORY_LEVEL_DETAIL",
            Self::GetStoryMap => "GET_STORY_MAP",
            Self::EnterDoor => "ENTER_DOOR",
        }
    }

    /// Parse a wire tag; `None` for tags this client does not know.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Some(match tag {
            "USER_LOGIN" => Self::UserLogin,
            "PING_PONG" => Self::PingPong,
            "GET_BLOCK_MAP" => Self::GetBlockMap,
            "SYNC_HOUSE" => Self::SyncHouse,
            "GET_ACTIVE_BOMBER" => Self::GetActiveBomber,
            "SYNC_BOMBERMAN" => Self::SyncBomberman,
            "START_PVE" => Self::StartPve,
            "STOP_PVE" => Self::StopPve,
            "START_EXPLODE" => Self::StartExplode,
            "GO_SLEEP" => Self::GoSleep,
            "GO_HOME" => Self::GoHome,
            "GO_WORK" => Self::GoWork,
            "GET_REWARD" => Self::GetReward,
            "COIN_DETAIL" => Self::CoinDetail,
            "APPROVE_CLAIM" => Self::ApproveClaim,
            "GET_HERO_UPGRADE_POWER" => Self::GetHeroUpgradePower,
            "GET_STORY_LEVEL_DETAIL" => Self::GetStoryLevelDetail,
            "GET_STORY_MAP" => Self::GetStoryMap,
            "ENTER_DOOR" => Self::EnterDoor,
            _ => return None,
        })
    }
}

impl fmt::Display for GameCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [GameCommand; 19] = [
        GameCommand::UserLogin,
        GameCommand::PingPong,
        GameCommand::GetBlockMap,
        GameCommand::SyncHouse,
        GameCommand::GetActiveBomber,
        GameCommand::SyncBomberman,
        GameCommand::StartPve,
        GameCommand::StopPve,
        GameCommand::StartExplode,
        GameCommand::GoSleep,
        GameCommand::GoHome,
        GameCommand::GoWork,
        GameCommand::GetReward,
        GameCommand::CoinDetail,
        GameCommand::ApproveClaim,
        GameCommand::GetHeroUpgradePower,
        GameCommand::GetStoryLevelDetail,
        GameCommand::GetStoryMap,
        GameCommand::EnterDoor,
    ];

    #[test]
    fn tags_round_trip() {
        for cmd in ALL {
            assert_eq!(GameCommand::from_tag(cmd.tag()), Some(cmd));
        }
        assert_eq!(GameCommand::from_tag("NO_SUCH_COMMAND"), None);
    }

    #[test]
    fn serde_uses_the_wire_tag() {
        for cmd in ALL {
            let json = serde_json::to_string(&cmd).expect("serializes");
            assert_eq!(json, format!("\"{}\"", cmd.tag()));
        }
    }
}

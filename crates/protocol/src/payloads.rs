//! Wire DTOs. Field names mirror the server's JSON keys exactly.

use serde::{Deserialize, Serialize};

/// One destructible block in a grid snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockDto {
    #[serde(rename = "type")]
    pub kind: u32,
    pub i: u32,
    pub j: u32,
    pub hp: i32,
    #[serde(rename = "maxHp")]
    pub max_hp: i32,
}

/// A hero as returned by the active-roster fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveHeroDto {
    pub id: u64,
    pub stage: u32,
    pub gen_id: String,
    pub energy: i32,
}

/// A hero as returned by the full roster sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterHeroDto {
    pub id: u64,
    pub stage: u32,
    pub gen_id: String,
    pub energy: i32,
    pub restore_hp: i32,
    pub active: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HouseDto {
    pub house_gen_id: String,
    pub active: i32,
}

/// Confirmation payload for the sleep/home/work transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeroUpdateDto {
    pub id: u64,
    pub energy: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplodeBlockDto {
    pub i: u32,
    pub j: u32,
    pub hp: i32,
}

/// Confirmation payload for a placement: the acting hero's remaining energy
/// and the new hp of every block the blast touched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplodeDto {
    pub id: u64,
    pub energy: i32,
    pub blocks: Vec<ExplodeBlockDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardDto {
    pub remain_time: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoinDetailDto {
    pub mined: f64,
    pub invested: f64,
    pub rewards: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StoryLevelRewardDto {
    pub rare: u32,
    pub replay: f64,
    pub first_win: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryPlayedDto {
    pub id: u64,
    pub remaining_time: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryDetailsDto {
    pub level_rewards: Vec<StoryLevelRewardDto>,
    pub played_bombers: Vec<StoryPlayedDto>,
    pub is_new: bool,
    pub max_level: u32,
    pub current_level: u32,
    pub hero_id: u64,
}

// =============================================================================
// Outbound command data
// =============================================================================

/// Data for the sleep/home/work commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeroIdInput {
    pub id: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplodeTileInput {
    pub i: u32,
    pub j: u32,
}

/// Data for a placement command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplodeInput {
    #[serde(rename = "id")]
    pub hero_id: u64,
    #[serde(rename = "num")]
    pub bomb_id: u32,
    pub i: u32,
    pub j: u32,
    pub blocks: Vec<ExplodeTileInput>,
}

/// Data for the claim command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimInput {
    pub reward_type: u32,
}

/// Data for entering a side-quest map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryMapInput {
    pub level: u32,
    pub hero_id: u64,
    pub ticket_type: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_dto_uses_wire_field_names() {
        let json = r#"{"type":5,"i":3,"j":4,"hp":10,"maxHp":12}"#;
        let dto: BlockDto = serde_json::from_str(json).expect("decodes");
        assert_eq!(dto.kind, 5);
        assert_eq!(dto.max_hp, 12);
    }

    #[test]
    fn explode_input_uses_wire_field_names() {
        let input = ExplodeInput {
            hero_id: 9,
            bomb_id: 2,
            i: 1,
            j: 0,
            blocks: vec![ExplodeTileInput { i: 0, j: 0 }],
        };
        let value = serde_json::to_value(&input).expect("serializes");
        assert_eq!(value["id"], 9);
        assert_eq!(value["num"], 2);
        assert_eq!(value["blocks"][0]["i"], 0);
    }

    #[test]
    fn reward_dto_round_trips() {
        let json = r#"{"remain_time":30,"type":"BCOIN","value":12.5}"#;
        let dto: RewardDto = serde_json::from_str(json).expect("decodes");
        assert_eq!(dto.kind, "BCOIN");
        assert!((dto.value - 12.5).abs() < f64::EPSILON);
    }
}

//! Translates wire DTOs into domain types.
//!
//! Decode failures here mean the server and this client disagree about the
//! identifier layout; callers abort the enclosing step rather than retry.

use treasurebot_domain::{
    Block, BlockKind, DomainError, Hero, HeroState, HeroStats, House, HouseStats, PlayedHero,
    Rarity, Reward, RewardKind, StoryDetails, StoryReward,
};
use treasurebot_protocol::{
    ActiveHeroDto, BlockDto, HouseDto, RewardDto, RosterHeroDto, StoryDetailsDto,
};

pub fn block_from_dto(dto: &BlockDto) -> Block {
    Block {
        kind: BlockKind::from_code(dto.kind),
        i: dto.i as usize,
        j: dto.j as usize,
        hp: dto.hp,
        max_hp: dto.max_hp,
    }
}

/// Heroes from the active-roster fetch are active by definition.
pub fn hero_from_active(dto: &ActiveHeroDto) -> Result<Hero, DomainError> {
    let stats = HeroStats::decode(&dto.gen_id)?;
    Ok(Hero::new(
        dto.id,
        stats,
        HeroState::from_stage(dto.stage),
        dto.energy,
        true,
    ))
}

pub fn hero_from_roster(dto: &RosterHeroDto) -> Result<Hero, DomainError> {
    let stats = HeroStats::decode(&dto.gen_id)?;
    Ok(Hero::new(
        dto.id,
        stats,
        HeroState::from_stage(dto.stage),
        dto.energy + dto.restore_hp,
        dto.active != 0,
    ))
}

pub fn house_from_dto(dto: &HouseDto) -> Result<House, DomainError> {
    let stats = HouseStats::decode(&dto.house_gen_id)?;
    Ok(House::new(stats, dto.active != 0))
}

pub fn reward_from_dto(dto: &RewardDto) -> Reward {
    Reward {
        kind: RewardKind::from_tag(&dto.kind),
        value: dto.value,
        remain_time: dto.remain_time,
    }
}

pub fn story_from_dto(dto: &StoryDetailsDto) -> StoryDetails {
    StoryDetails {
        is_new: dto.is_new,
        current_level: dto.current_level,
        max_level: dto.max_level,
        hero_id: dto.hero_id,
        rewards: dto
            .level_rewards
            .iter()
            .map(|reward| StoryReward {
                rarity: Rarity::from_index(reward.rare),
                rarity_index: reward.rare,
                first_win: reward.first_win,
                replay: reward.replay,
            })
            .collect(),
        played: dto
            .played_bombers
            .iter()
            .map(|played| PlayedHero {
                id: played.id,
                remaining_time: played.remaining_time,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;

    /// Minimal well-formed hero gen id: stamina 4 at [60,65), 95+ bits long.
    fn hero_gen_id() -> String {
        let mut value = U256::from(4u64) << 60usize;
        value |= U256::from(1u64) << 95usize;
        value.to_string()
    }

    #[test]
    fn active_heroes_decode_as_active() {
        let dto = ActiveHeroDto {
            id: 5,
            stage: 1,
            gen_id: hero_gen_id(),
            energy: 120,
        };
        let hero = hero_from_active(&dto).expect("decodes");
        assert!(hero.active());
        assert_eq!(hero.state(), HeroState::Sleep);
        assert_eq!(hero.energy(), 120);
        assert_eq!(hero.max_energy(), 200);
    }

    #[test]
    fn roster_heroes_fold_in_restored_energy() {
        let dto = RosterHeroDto {
            id: 5,
            stage: 0,
            gen_id: hero_gen_id(),
            energy: 50,
            restore_hp: 30,
            active: 0,
        };
        let hero = hero_from_roster(&dto).expect("decodes");
        assert!(!hero.active());
        // Inactive heroes report zero regardless of the stored energy.
        assert_eq!(hero.energy(), 0);
    }

    #[test]
    fn bad_gen_ids_surface_as_domain_errors() {
        let dto = ActiveHeroDto {
            id: 5,
            stage: 0,
            gen_id: "12".into(),
            energy: 10,
        };
        assert!(matches!(
            hero_from_active(&dto),
            Err(DomainError::InvalidGenId(_))
        ));
    }

    #[test]
    fn unknown_reward_tags_become_unknown() {
        let dto = RewardDto {
            remain_time: 0,
            kind: "SHINY".into(),
            value: 1.0,
        };
        assert_eq!(reward_from_dto(&dto).kind, RewardKind::Unknown);
    }
}
